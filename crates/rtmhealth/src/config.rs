//! CLI configuration -- thin wrapper around `rtmhealth_config`.
//!
//! Adds resolution that respects `GlobalOpts` and `ReportArgs` overrides
//! (--controller, --token, --site, ...). Precedence is always
//! flag > env > profile > built-in default; clap folds env into the flag.

use std::time::Duration;

use secrecy::SecretString;

use rtmhealth_core::{ControllerConfig, ReportParams, TlsVerification};

use crate::cli::{GlobalOpts, ReportArgs};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use rtmhealth_config::{
    Config, Defaults, Profile, config_path, load_config, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names, for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// The profile to run with.
///
/// A profile named with `--profile` must exist. Without the flag a missing
/// profile is treated as empty, so flags and env vars alone are enough.
pub fn active_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);
    match config.profiles.get(&name) {
        Some(profile) => Ok((name, profile.clone())),
        None if global.profile.is_some() => Err(CliError::ProfileNotFound {
            available: available_profiles(config),
            name,
        }),
        None => Ok((name, Profile::default())),
    }
}

/// Translate a `Profile` + global flags into a `ControllerConfig`.
pub fn resolve_controller(
    config: &Config,
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<ControllerConfig, CliError> {
    // 1. Controller URL (flag > env > profile > default)
    let url_str = global
        .controller
        .as_deref()
        .unwrap_or_else(|| profile.controller_url());
    let url = rtmhealth_config::parse_controller_url(url_str)?;

    // 2. Token (flag > env > profile chain)
    let token = match global.token {
        Some(ref token) => SecretString::from(token.clone()),
        None => rtmhealth_config::resolve_token(profile, profile_name)?,
    };

    // 3. TLS verification
    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        rtmhealth_config::profile_tls(profile, config.defaults.insecure)
    };

    // 4. Timeout (unset means unbounded)
    let timeout = global
        .timeout
        .or(profile.timeout)
        .or(config.defaults.timeout)
        .map(Duration::from_secs);

    Ok(ControllerConfig {
        url,
        token,
        tls,
        timeout,
    })
}

/// Merge report flags over the profile's report defaults and validate.
pub fn resolve_report_params(profile: &Profile, args: &ReportArgs) -> Result<ReportParams, CliError> {
    let base = profile.report_params();

    let params = ReportParams {
        site_name: args.site.clone().unwrap_or(base.site_name),
        app_name: args.app.clone().unwrap_or(base.app_name),
        lookback_hours: args.hours.unwrap_or(base.lookback_hours),
        time_offset_hours: args.offset_hours.unwrap_or(base.time_offset_hours),
        min_call_duration_ms: args.min_duration_ms.unwrap_or(base.min_call_duration_ms),
        max_packet_loss: args.max_loss.unwrap_or(base.max_packet_loss),
        output_dir: args.output_dir.clone().unwrap_or(base.output_dir),
    };

    if params.site_name.is_empty() {
        return Err(CliError::MissingSite);
    }
    params.validate()?;

    Ok(params)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;
    use secrecy::ExposeSecret;

    use crate::cli::{Cli, Command};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rtmhealth").chain(args.iter().copied())).unwrap()
    }

    fn report_args(cli: Cli) -> ReportArgs {
        match cli.command {
            Command::Report(args) => args,
            other => panic!("expected report, got {other:?}"),
        }
    }

    fn profile() -> Profile {
        Profile {
            controller: Some("https://profile.example".into()),
            token: Some("profile-token".into()),
            site: Some("HQ".into()),
            max_packet_loss: Some(1.0),
            timeout: Some(20),
            ..Profile::default()
        }
    }

    #[test]
    fn flags_override_profile_report_defaults() {
        let cli = parse(&["report", "--site", "Branch", "--hours", "12"]);
        let params = resolve_report_params(&profile(), &report_args(cli)).unwrap();

        assert_eq!(params.site_name, "Branch");
        assert_eq!(params.lookback_hours, 12);
        assert!((params.max_packet_loss - 1.0).abs() < f64::EPSILON);
        assert_eq!(params.app_name, "rtp");
    }

    #[test]
    fn negative_offset_parses() {
        let cli = parse(&["report", "-s", "HQ", "--offset-hours", "-5"]);
        let params = resolve_report_params(&Profile::default(), &report_args(cli)).unwrap();
        assert_eq!(params.time_offset_hours, -5);
    }

    #[test]
    fn missing_site_is_a_usage_error() {
        let cli = parse(&["report"]);
        let err = resolve_report_params(&Profile::default(), &report_args(cli)).unwrap_err();
        assert!(matches!(err, CliError::MissingSite));
    }

    #[test]
    fn negative_loss_threshold_is_rejected() {
        let cli = parse(&["report", "-s", "HQ", "--max-loss", "-1"]);
        let err = resolve_report_params(&Profile::default(), &report_args(cli)).unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "max-loss"));
    }

    #[test]
    fn lookback_beyond_cap_is_a_usage_error() {
        let hours = (rtmhealth_core::MAX_LOOKBACK_HOURS + 1).to_string();
        let cli = parse(&["report", "-s", "HQ", "--hours", &hours]);
        let err = resolve_report_params(&Profile::default(), &report_args(cli)).unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "hours"));
        assert_eq!(err.exit_code(), crate::error::exit_code::USAGE);
    }

    #[test]
    fn controller_flags_override_profile() {
        let cli = parse(&[
            "--controller",
            "https://flag.example",
            "--token",
            "flag-token",
            "-k",
            "sites",
        ]);
        let cfg = Config::default();
        let controller = resolve_controller(&cfg, &profile(), "default", &cli.global).unwrap();

        assert_eq!(controller.url.as_str(), "https://flag.example/");
        assert_eq!(controller.token.expose_secret(), "flag-token");
        assert_eq!(controller.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(controller.timeout, Some(Duration::from_secs(20)));
    }

    #[test]
    fn profile_values_used_without_flags() {
        let cli = parse(&["sites"]);
        let cfg = Config::default();
        let controller = resolve_controller(&cfg, &profile(), "default", &cli.global).unwrap();

        assert_eq!(controller.url.as_str(), "https://profile.example/");
        assert_eq!(controller.token.expose_secret(), "profile-token");
        assert_eq!(controller.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn named_profile_must_exist() {
        let cli = parse(&["--profile", "lab", "sites"]);
        let err = active_profile(&cli.global, &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::ProfileNotFound { ref name, .. } if name == "lab"));
    }
}
