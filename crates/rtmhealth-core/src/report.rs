// ── CSV report output ──
//
// `ReportWriter` owns the output file for the whole run. Construction
// writes the header; `finish` consumes the writer, so the trailer is
// written exactly once and nothing can be appended after it.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use rtmhealth_api::FlowRecord;

use crate::classify::{Direction, SummaryCounters};
use crate::error::CoreError;

/// Column names, in output order.
pub const HEADER: [&str; 18] = [
    "src_ip",
    "src_port",
    "dst_ip",
    "dst_port",
    "start_time",
    "end_time",
    "call_duration_secs",
    "media_type",
    "lan_to_wan",
    "avg_loss_svr_to_client",
    "avg_loss_client_to_svr",
    "max_loss_svr_to_client",
    "max_loss_client_to_svr",
    "avg_mos_c2s",
    "avg_mos_s2c",
    "path_id",
    "lan_dscp_lan_to_wan",
    "lan_dscp_wan_to_lan",
];

/// Rendering of an absent value.
const NULL: &str = "null";

/// `<site>.<app>.flowresults.<epoch>.csv`, with path separators in the
/// names replaced so the file always lands in the output directory.
pub fn report_file_name(site_name: &str, app_name: &str, run_epoch: i64) -> String {
    let clean = |s: &str| s.replace(['/', '\\'], "_");
    format!(
        "{}.{}.flowresults.{run_epoch}.csv",
        clean(site_name),
        clean(app_name)
    )
}

// ── Summary ─────────────────────────────────────────────────────────

/// Everything the trailer (and the console summary) reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub counters: SummaryCounters,
    pub max_packet_loss: f64,
    pub min_call_duration_ms: i64,
    /// Buckets in the window.
    pub buckets_total: usize,
    /// Buckets whose fetch failed.
    pub buckets_failed: usize,
    /// Buckets answered with a status other than 200.
    pub buckets_skipped: usize,
    pub rows_written: u64,
    /// Wall-clock time from start of run to trailer, in milliseconds.
    pub elapsed_ms: u64,
}

impl ReportSummary {
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// Minimum call duration in seconds, rendered as a decimal.
    #[allow(clippy::cast_precision_loss)]
    pub fn min_call_duration_secs(&self) -> String {
        decimal(self.min_call_duration_ms as f64 / 1000.0)
    }

    /// Trailer lines in output order, without the leading blank lines.
    pub fn lines(&self) -> Vec<String> {
        let c = &self.counters;
        let pl = self.max_packet_loss;
        let mut lines = vec!["  -----  Results Summary  -----".to_string()];
        lines.push(format!("Flow Records {}", c.total_flows));
        for direction in Direction::ALL {
            lines.push(format!(
                "Flows w/ PL LE {pl}% {direction}: {}",
                c.within(direction)
            ));
        }
        for direction in Direction::ALL {
            lines.push(format!(
                "Flows w/ PL Greater than {pl}% {direction}: {}",
                c.exceeded(direction)
            ));
        }
        lines.push(format!(
            "Minimum Call Duration Seconds: {}",
            self.min_call_duration_secs()
        ));
        lines.push(format!(
            "Total Query Time : {}",
            humantime::format_duration(self.elapsed())
        ));
        lines
    }
}

// ── Row encoding ────────────────────────────────────────────────────

/// One detail line of the report.
#[derive(Debug, Serialize)]
struct FlowRow {
    src_ip: String,
    src_port: String,
    dst_ip: String,
    dst_port: String,
    start_time: String,
    end_time: String,
    call_duration_secs: String,
    media_type: String,
    lan_to_wan: String,
    avg_loss_svr_to_client: String,
    avg_loss_client_to_svr: String,
    max_loss_svr_to_client: String,
    max_loss_client_to_svr: String,
    avg_mos_c2s: String,
    avg_mos_s2c: String,
    path_id: String,
    lan_dscp_lan_to_wan: String,
    lan_dscp_wan_to_lan: String,
}

impl From<&FlowRecord> for FlowRow {
    fn from(f: &FlowRecord) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let duration_secs = f.duration_ms().map(|ms| ms as f64 / 1000.0);
        Self {
            src_ip: text(f.source_ip.as_deref()),
            src_port: display(f.source_port),
            dst_ip: text(f.destination_ip.as_deref()),
            dst_port: display(f.destination_port),
            start_time: timestamp(f.flow_start_time_ms),
            end_time: timestamp(f.flow_end_time_ms),
            call_duration_secs: number(duration_secs),
            media_type: text(f.media_type.as_deref()),
            lan_to_wan: display(f.lan_to_wan),
            avg_loss_svr_to_client: number(f.avg_packet_loss_s2c),
            avg_loss_client_to_svr: number(f.avg_packet_loss_c2s),
            max_loss_svr_to_client: number(f.max_packet_loss_s2c),
            max_loss_client_to_svr: number(f.max_packet_loss_c2s),
            avg_mos_c2s: number(f.avg_mos_c2s),
            avg_mos_s2c: number(f.avg_mos_s2c),
            path_id: text(f.path_id.as_deref()),
            lan_dscp_lan_to_wan: dscp(f.lan_dscp_lan_to_wan.as_ref()),
            lan_dscp_wan_to_lan: dscp(f.lan_dscp_wan_to_lan.as_ref()),
        }
    }
}

fn text(value: Option<&str>) -> String {
    value.unwrap_or(NULL).to_owned()
}

fn display<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| NULL.to_owned(), |v| v.to_string())
}

/// Floats keep their fractional part (`5.0`, not `5`).
fn decimal(value: f64) -> String {
    serde_json::Value::from(value).to_string()
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| NULL.to_owned(), decimal)
}

fn timestamp(ms: Option<i64>) -> String {
    ms.and_then(DateTime::<Utc>::from_timestamp_millis).map_or_else(
        || NULL.to_owned(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

fn dscp(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => NULL.to_owned(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// ── Writer ──────────────────────────────────────────────────────────

/// Exclusive owner of the report output.
pub struct ReportWriter<W: Write> {
    csv: csv::Writer<W>,
    rows: u64,
}

impl ReportWriter<File> {
    /// Create (or truncate) the report file at `path` and write the header.
    pub fn create(path: &Path) -> Result<Self, CoreError> {
        let file = File::create(path)?;
        Self::new(file)
    }
}

impl<W: Write> ReportWriter<W> {
    /// Wrap `inner` and write the header row.
    pub fn new(inner: W) -> Result<Self, CoreError> {
        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);
        csv.write_record(HEADER)?;
        Ok(Self { csv, rows: 0 })
    }

    /// Append one detail row for `flow`.
    pub fn write_flow(&mut self, flow: &FlowRecord) -> Result<(), CoreError> {
        self.csv.serialize(FlowRow::from(flow))?;
        self.rows += 1;
        Ok(())
    }

    /// Detail rows written so far.
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Write the trailer and hand back the underlying writer.
    pub fn finish(self, summary: &ReportSummary) -> Result<W, CoreError> {
        let mut inner = self
            .csv
            .into_inner()
            .map_err(|e| CoreError::Io(e.into_error()))?;

        inner.write_all(b"\n\n")?;
        for line in summary.lines() {
            writeln!(inner, "{line}")?;
        }
        inner.flush()?;
        Ok(inner)
    }
}
