//! `report` command handler.

use std::fmt::Write as _;

use indicatif::{ProgressBar, ProgressStyle};

use rtmhealth_core::{
    BucketOutcome, Connection, Direction, ReportOutcome, ReportParams, SystemClock,
    generate_report,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    conn: &Connection,
    params: ReportParams,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    let bar = bucket_bar(global.quiet);

    let result = generate_report(
        &conn.client,
        &params,
        &SystemClock,
        |ids, buckets| {
            output::status(
                &output::ok_line(
                    &format!("site '{}' → {}", params.site_name, ids.site_id),
                    color,
                ),
                global.quiet,
            );
            output::status(
                &output::ok_line(
                    &format!("app '{}' → {}", params.app_name, ids.app_id),
                    color,
                ),
                global.quiet,
            );
            bar.set_length(u64::try_from(buckets).unwrap_or(u64::MAX));
        },
        |progress| {
            let note = match progress.outcome {
                BucketOutcome::Processed { rows, .. } => format!("{rows} rows"),
                BucketOutcome::Skipped { .. } => "no flows".into(),
                BucketOutcome::Failed { .. } => "fetch failed".into(),
            };
            bar.set_message(format!("{} ({note})", progress.end_time));
            bar.inc(1);
        },
    )
    .await;
    bar.finish_and_clear();

    let outcome = result?;
    output::status(
        &output::ok_line(
            &format!("report written to {}", outcome.path.display()),
            color,
        ),
        global.quiet,
    );

    let out = output::render_single(
        &global.output,
        &outcome,
        |o| format_summary(o, color),
        |o| o.path.display().to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Bucket progress on stderr; hidden when quiet or not a terminal.
fn bucket_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} buckets {msg}",
    ) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

fn format_summary(outcome: &ReportOutcome, color: bool) -> String {
    let s = &outcome.summary;
    let c = &s.counters;
    let pl = s.max_packet_loss;
    let mut out = String::new();

    let _ = writeln!(out, "{}", output::heading("Results Summary", color));
    let _ = writeln!(out, "  Flow records           {}", c.total_flows);
    for direction in Direction::ALL {
        let _ = writeln!(
            out,
            "  PL <= {pl}% {direction}         {}",
            c.within(direction)
        );
    }
    for direction in Direction::ALL {
        let _ = writeln!(
            out,
            "  PL >  {pl}% {direction}         {}",
            c.exceeded(direction)
        );
    }
    let _ = writeln!(
        out,
        "  Min call duration (s)  {}",
        s.min_call_duration_secs()
    );
    let _ = writeln!(
        out,
        "  Buckets                {} ({} failed, {} skipped)",
        s.buckets_total, s.buckets_failed, s.buckets_skipped
    );
    let _ = writeln!(out, "  Rows written           {}", s.rows_written);
    let _ = writeln!(
        out,
        "  Query time             {}",
        humantime::format_duration(s.elapsed())
    );
    let _ = write!(
        out,
        "  Report                 {}",
        output::dim(&outcome.path.display().to_string(), color)
    );
    out
}
