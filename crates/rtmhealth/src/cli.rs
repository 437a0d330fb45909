//! Clap derive structures for the `rtmhealth` CLI.
//!
//! Also compiled by `build.rs` for man page generation, so this module
//! must only depend on clap, clap_complete and std.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// rtmhealth -- packet-loss health report for real-time media flows
#[derive(Debug, Parser)]
#[command(
    name = "rtmhealth",
    version,
    about = "Report real-time media flows with excessive packet loss",
    long_about = "Walks an SD-WAN controller's flow telemetry hour by hour for one site\n\
        and one application, and writes every flow whose server-to-client or\n\
        client-to-server packet loss exceeds a threshold to a CSV report.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "RTMHEALTH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller URL (overrides profile)
    #[arg(long, short = 'c', env = "RTMHEALTH_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Controller auth token
    #[arg(long, env = "RTMHEALTH_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format for console results
    #[arg(
        long,
        short = 'o',
        env = "RTMHEALTH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Debug level (0 = warnings, 1 = info, 2 = per-flow detail)
    #[arg(
        long,
        short = 'D',
        global = true,
        value_parser = clap::value_parser!(u8).range(0..=2)
    )]
    pub debug: Option<u8>,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip TLS certificate verification
    #[arg(long, short = 'k', env = "RTMHEALTH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (default: none)
    #[arg(long, env = "RTMHEALTH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Walk the lookback window and write the flow-health CSV
    #[command(alias = "r")]
    Report(ReportArgs),

    /// List site names and ids
    Sites,

    /// List application display names and ids
    #[command(alias = "appdefs")]
    Apps,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  REPORT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Every option falls back to the active profile, then to the built-in
/// default.
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Site name, exactly as shown by the controller
    #[arg(long, short = 's', env = "RTMHEALTH_SITE")]
    pub site: Option<String>,

    /// Application display name [default: rtp]
    #[arg(long, short = 'a', env = "RTMHEALTH_APP")]
    pub app: Option<String>,

    /// Hours of history to walk [default: 4]
    #[arg(long, visible_alias = "lookback-hours")]
    pub hours: Option<u32>,

    /// Signed hours added to the current time before windowing [default: 0]
    #[arg(long, allow_negative_numbers = true)]
    pub offset_hours: Option<i32>,

    /// Over-threshold flows this short or shorter are ignored [default: 10000]
    #[arg(long, allow_negative_numbers = true)]
    pub min_duration_ms: Option<i64>,

    /// Max packet loss (percent) still considered healthy [default: 3.0]
    #[arg(long, allow_negative_numbers = true)]
    pub max_loss: Option<f64>,

    /// Directory to write the CSV into [default: .]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (token redacted)
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (e.g. "controller", "site", "max_packet_loss")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a token in the system keyring
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
