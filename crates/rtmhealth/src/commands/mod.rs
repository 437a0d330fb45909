//! Command handlers.
//!
//! `config` and `completions` run offline and are handled in `main`.
//! Everything here needs an authenticated controller connection.

pub mod config_cmd;
pub mod directory;
pub mod report;

use rtmhealth_core::Connection;

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Resolve configuration, connect, and run a controller-backed command.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = rtmhealth_config::load_config()?;
    let (profile_name, profile) = config::active_profile(global, &cfg)?;

    // Usage errors must surface before any network traffic.
    let report_params = match cmd {
        Command::Report(ref args) => Some(config::resolve_report_params(&profile, args)?),
        _ => None,
    };

    let controller_config = config::resolve_controller(&cfg, &profile, &profile_name, global)?;
    let color = output::should_color(&global.color);

    output::status(
        &output::heading(
            &format!(
                "rtmhealth v{} · {}",
                env!("CARGO_PKG_VERSION"),
                controller_config.url
            ),
            color,
        ),
        global.quiet,
    );

    let conn: Connection = rtmhealth_core::connect(&controller_config).await?;
    let who = conn
        .session
        .email
        .as_deref()
        .map_or_else(String::new, |email| format!(" as {email}"));
    output::status(
        &output::ok_line(
            &format!("authenticated{who} (tenant {})", conn.session.tenant_id),
            color,
        ),
        global.quiet,
    );

    tracing::debug!(command = ?cmd, profile = %profile_name, "dispatching command");
    match (cmd, report_params) {
        (Command::Report(_), Some(params)) => report::handle(&conn, params, global, color).await,
        (Command::Sites, _) => directory::sites(&conn.client, global).await,
        (Command::Apps, _) => directory::apps(&conn.client, global).await,
        (other, _) => Err(CliError::Validation {
            field: "command".into(),
            reason: format!("{other:?} does not use a controller connection"),
        }),
    }
}
