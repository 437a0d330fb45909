// ── Report pipeline ──
//
// Resolve names, anchor the window, open the report, then walk the
// buckets strictly in order with one fetch in flight at a time. Fatal
// errors all happen before the report file exists; after that only I/O
// failures stop the run.

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use rtmhealth_api::{FlowQuery, FlowsPage};

use crate::classify::{SummaryCounters, Thresholds, Verdict, classify_flow};
use crate::clock::Clock;
use crate::config::ReportParams;
use crate::error::CoreError;
use crate::report::{ReportSummary, ReportWriter, report_file_name};
use crate::resolver::{ResolvedIds, resolve_ids};
use crate::source::TelemetrySource;
use crate::window::{Bucket, TimeWindow};

/// What happened to one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketOutcome {
    /// Status 200: every flow item was classified.
    Processed { flows: usize, rows: u64 },
    /// The controller answered with another status; nothing was processed.
    Skipped { status: Option<u16> },
    /// The fetch itself failed.
    Failed { message: String },
}

/// Progress notification emitted after each bucket.
#[derive(Debug, Clone)]
pub struct BucketProgress {
    pub bucket: Bucket,
    /// The boundary as sent to the controller.
    pub end_time: String,
    /// Buckets in the window.
    pub total: usize,
    pub outcome: BucketOutcome,
}

/// Totals of one pass over the window, before the trailer is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTally {
    pub counters: SummaryCounters,
    pub buckets_total: usize,
    pub buckets_failed: usize,
    pub buckets_skipped: usize,
}

/// Walks a window against one site/app pair.
pub struct ReportRunner<'a, S> {
    source: &'a S,
    ids: &'a ResolvedIds,
    thresholds: Thresholds,
}

impl<'a, S: TelemetrySource> ReportRunner<'a, S> {
    pub fn new(source: &'a S, ids: &'a ResolvedIds, thresholds: Thresholds) -> Self {
        Self {
            source,
            ids,
            thresholds,
        }
    }

    /// Fetch and classify every bucket of `window`, appending reportable
    /// flows to `writer`.
    pub async fn run<W, F>(
        &self,
        window: &TimeWindow,
        writer: &mut ReportWriter<W>,
        mut progress: F,
    ) -> Result<RunTally, CoreError>
    where
        W: Write,
        F: FnMut(&BucketProgress),
    {
        let total = window.bucket_count();
        let mut tally = RunTally {
            buckets_total: total,
            ..RunTally::default()
        };

        for bucket in window.buckets() {
            let end_time = bucket.end_time()?;
            let query = FlowQuery::new(&end_time, &self.ids.site_id, &self.ids.app_id);
            debug!(bucket = bucket.index, %end_time, "querying flows");

            let outcome = match self.source.query_flows(&query).await {
                Err(err) => {
                    warn!(
                        %end_time,
                        error = %err,
                        payload = err.raw_payload().unwrap_or_default(),
                        "flow query failed, skipping bucket"
                    );
                    tally.buckets_failed += 1;
                    BucketOutcome::Failed {
                        message: err.to_string(),
                    }
                }
                Ok(page) if !page.is_ok() => {
                    debug!(%end_time, status = ?page.status_code, "no flows to process");
                    tally.buckets_skipped += 1;
                    BucketOutcome::Skipped {
                        status: page.status_code,
                    }
                }
                Ok(page) => {
                    let before = writer.rows_written();
                    let flows = self.process_page(&page, writer, &mut tally.counters)?;
                    BucketOutcome::Processed {
                        flows,
                        rows: writer.rows_written() - before,
                    }
                }
            };

            progress(&BucketProgress {
                bucket,
                end_time,
                total,
                outcome,
            });
        }

        Ok(tally)
    }

    fn process_page<W: Write>(
        &self,
        page: &FlowsPage,
        writer: &mut ReportWriter<W>,
        counters: &mut SummaryCounters,
    ) -> Result<usize, CoreError> {
        let items = &page.flows.items;
        for flow in items {
            counters.record_flow();
            for (direction, verdict) in classify_flow(flow, &self.thresholds) {
                counters.record(direction, &verdict);
                match verdict {
                    Verdict::Exceeded { max_loss } => {
                        debug!(%direction, max_loss, "loss above threshold");
                        writer.write_flow(flow)?;
                    }
                    Verdict::TooShort { duration_ms } => {
                        debug!(%direction, ?duration_ms, "call too short to report");
                    }
                    Verdict::NoData | Verdict::WithinThreshold => {}
                }
            }
        }
        Ok(items.len())
    }
}

/// Result of a completed report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutcome {
    pub path: PathBuf,
    pub ids: ResolvedIds,
    pub summary: ReportSummary,
}

/// Run the whole pipeline and write the report into `params.output_dir`.
///
/// `on_resolved` fires once the ids are known, before any flow is
/// fetched. `progress` fires after each bucket.
pub async fn generate_report<S, C, R, F>(
    source: &S,
    params: &ReportParams,
    clock: &C,
    on_resolved: R,
    progress: F,
) -> Result<ReportOutcome, CoreError>
where
    S: TelemetrySource,
    C: Clock,
    R: FnOnce(&ResolvedIds, usize),
    F: FnMut(&BucketProgress),
{
    params.validate()?;
    let started = clock.now();
    let window = TimeWindow::new(started, params.lookback_hours, params.time_offset_hours)?;

    let ids = resolve_ids(source, &params.site_name, &params.app_name).await?;
    info!(site_id = %ids.site_id, app_id = %ids.app_id, "resolved ids");

    on_resolved(&ids, window.bucket_count());

    let path = params.output_dir.join(report_file_name(
        &params.site_name,
        &params.app_name,
        window.now_epoch(),
    ));
    let mut writer = ReportWriter::create(&path)?;
    info!(path = %path.display(), buckets = window.bucket_count(), "writing report");

    let thresholds = params.thresholds();
    let tally = ReportRunner::new(source, &ids, thresholds)
        .run(&window, &mut writer, progress)
        .await?;

    let elapsed_ms = (clock.now() - started)
        .to_std()
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));

    let summary = ReportSummary {
        counters: tally.counters,
        max_packet_loss: thresholds.max_packet_loss,
        min_call_duration_ms: thresholds.min_call_duration_ms,
        buckets_total: tally.buckets_total,
        buckets_failed: tally.buckets_failed,
        buckets_skipped: tally.buckets_skipped,
        rows_written: writer.rows_written(),
        elapsed_ms,
    };
    writer.finish(&summary)?;

    Ok(ReportOutcome {
        path,
        ids,
        summary,
    })
}
