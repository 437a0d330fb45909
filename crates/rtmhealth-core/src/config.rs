// ── Runtime report configuration ──
//
// These types describe *what* to report on and *how* to reach the
// controller. They carry credential data and thresholds, but never touch
// disk. The CLI constructs them and hands them in; nothing mutates them
// once a run starts.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::classify::Thresholds;
use crate::error::CoreError;

/// Default controller endpoint.
pub const DEFAULT_CONTROLLER: &str = "https://api.elcapitan.cloudgenix.com";

/// Longest lookback a single run may walk (31 days).
pub const MAX_LOOKBACK_HOURS: u32 = 24 * 31;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (`--insecure`).
    DangerAcceptInvalid,
}

/// Configuration for connecting to the controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller URL (e.g., `https://api.elcapitan.cloudgenix.com`).
    pub url: Url,
    /// Static auth token.
    pub token: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout. `None` = unbounded.
    pub timeout: Option<Duration>,
}

/// Parameters of a single report run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportParams {
    /// Exact site name as shown by the controller.
    pub site_name: String,
    /// Exact application display name (e.g. `rtp`).
    pub app_name: String,
    /// How many hours of history to walk.
    pub lookback_hours: u32,
    /// Signed shift applied to the captured clock before windowing.
    pub time_offset_hours: i32,
    /// Flows at or below this length are ignored when over threshold.
    pub min_call_duration_ms: i64,
    /// Max packet loss (percent) still considered healthy.
    pub max_packet_loss: f64,
    /// Directory the CSV is written to.
    pub output_dir: PathBuf,
}

impl Default for ReportParams {
    fn default() -> Self {
        Self {
            site_name: String::new(),
            app_name: "rtp".into(),
            lookback_hours: 4,
            time_offset_hours: 0,
            min_call_duration_ms: 10_000,
            max_packet_loss: 3.0,
            output_dir: PathBuf::from("."),
        }
    }
}

impl ReportParams {
    /// Check the parameters before anything is fetched or written.
    ///
    /// Field names match the `report` flags.
    pub fn validate(&self) -> Result<(), CoreError> {
        let invalid = |field: &str, reason: String| {
            Err(CoreError::InvalidParameter {
                field: field.into(),
                reason,
            })
        };

        if self.site_name.trim().is_empty() {
            return invalid("site", "site name cannot be empty".into());
        }
        if self.app_name.trim().is_empty() {
            return invalid("app", "application name cannot be empty".into());
        }
        if self.lookback_hours > MAX_LOOKBACK_HOURS {
            return invalid(
                "hours",
                format!(
                    "at most {MAX_LOOKBACK_HOURS} hours may be walked, got {}",
                    self.lookback_hours
                ),
            );
        }
        if !self.max_packet_loss.is_finite() || self.max_packet_loss < 0.0 {
            return invalid(
                "max-loss",
                format!(
                    "must be a non-negative percentage, got {}",
                    self.max_packet_loss
                ),
            );
        }
        if self.min_call_duration_ms < 0 {
            return invalid("min-duration-ms", "must not be negative".into());
        }
        Ok(())
    }

    /// The classification limits for this run.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            max_packet_loss: self.max_packet_loss,
            min_call_duration_ms: self.min_call_duration_ms,
        }
    }
}
