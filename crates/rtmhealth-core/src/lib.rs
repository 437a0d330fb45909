//! Report pipeline between `rtmhealth-api` and the CLI.
//!
//! - **[`connect()`]** builds the HTTP transport and binds the client to
//!   its tenant.
//! - **[`resolve_ids()`]** turns a site name and an application display
//!   name into backend ids.
//! - **[`TimeWindow`]** walks a lookback window in one-hour buckets from a
//!   single captured "now".
//! - **[`classify()`]** judges each direction of a flow against the
//!   packet-loss and call-duration [`Thresholds`].
//! - **[`ReportWriter`]** owns the CSV file: header on creation, trailer
//!   on [`finish()`](ReportWriter::finish).
//! - **[`generate_report()`]** ties them together behind the
//!   [`TelemetrySource`] and [`Clock`] seams.

pub mod classify;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod report;
pub mod resolver;
pub mod runner;
pub mod source;
pub mod window;

// ── Primary re-exports ──────────────────────────────────────────────
pub use classify::{Direction, SummaryCounters, Thresholds, Verdict, classify, classify_flow};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{
    ControllerConfig, DEFAULT_CONTROLLER, MAX_LOOKBACK_HOURS, ReportParams, TlsVerification,
};
pub use controller::{Connection, connect};
pub use error::CoreError;
pub use report::{HEADER, ReportSummary, ReportWriter, report_file_name};
pub use resolver::{NameIndex, ResolvedIds, lookup_app, lookup_site, resolve_ids};
pub use runner::{
    BucketOutcome, BucketProgress, ReportOutcome, ReportRunner, RunTally, generate_report,
};
pub use source::TelemetrySource;
pub use window::{BUCKET_SECS, Bucket, TimeWindow};
