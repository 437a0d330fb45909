// ── Hourly time-window iteration ──
//
// The flow endpoint only takes an end time, so a lookback window is
// walked as a series of one-hour buckets. "Now" is captured exactly once:
// the number of buckets is fixed before the first fetch goes out.

use chrono::{DateTime, Utc};

use crate::error::CoreError;

/// Width of one bucket in seconds.
pub const BUCKET_SECS: i64 = 3600;

/// A lookback window anchored at a captured instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    now_epoch: i64,
    start_epoch: i64,
}

impl TimeWindow {
    /// Build a window ending at `now` shifted by `offset_hours`, reaching
    /// back `lookback_hours`.
    ///
    /// Fails when either edge falls outside the representable calendar.
    pub fn new(
        now: DateTime<Utc>,
        lookback_hours: u32,
        offset_hours: i32,
    ) -> Result<Self, CoreError> {
        let now_epoch = now.timestamp() + i64::from(offset_hours) * BUCKET_SECS;
        let start_epoch = now_epoch - i64::from(lookback_hours) * BUCKET_SECS;
        for edge in [start_epoch, now_epoch] {
            boundary(edge)?;
        }
        Ok(Self {
            now_epoch,
            start_epoch,
        })
    }

    /// The shifted "now", in epoch seconds. Also used to name the report.
    pub fn now_epoch(&self) -> i64 {
        self.now_epoch
    }

    /// `floor((now - start) / 3600)`, never negative.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn bucket_count(&self) -> usize {
        ((self.now_epoch - self.start_epoch) / BUCKET_SECS).max(0) as usize
    }

    /// Iterate the bucket boundaries, oldest first.
    ///
    /// The first boundary is `start + 3600`; iteration continues while the
    /// boundary is `<= now`.
    pub fn buckets(&self) -> Buckets {
        Buckets {
            next_end: self.start_epoch + BUCKET_SECS,
            now_epoch: self.now_epoch,
            index: 0,
        }
    }
}

/// One hour-wide slice of the window, identified by its end boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// Zero-based position within the window.
    pub index: usize,
    /// End boundary in epoch seconds.
    pub end_epoch: i64,
}

impl Bucket {
    /// The boundary as the controller expects it: `YYYY-MM-DDTHH:MM:SS.000Z`.
    pub fn end_time(&self) -> Result<String, CoreError> {
        Ok(boundary(self.end_epoch)?
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string())
    }
}

fn boundary(epoch: i64) -> Result<DateTime<Utc>, CoreError> {
    DateTime::<Utc>::from_timestamp(epoch, 0).ok_or_else(|| CoreError::InvalidParameter {
        field: "offset-hours".into(),
        reason: format!("window edge {epoch}s is outside the supported date range"),
    })
}

/// Iterator returned by [`TimeWindow::buckets`].
#[derive(Debug, Clone)]
pub struct Buckets {
    next_end: i64,
    now_epoch: i64,
    index: usize,
}

impl Iterator for Buckets {
    type Item = Bucket;

    fn next(&mut self) -> Option<Bucket> {
        if self.next_end > self.now_epoch {
            return None;
        }
        let bucket = Bucket {
            index: self.index,
            end_epoch: self.next_end,
        };
        self.next_end += BUCKET_SECS;
        self.index += 1;
        Some(bucket)
    }
}
