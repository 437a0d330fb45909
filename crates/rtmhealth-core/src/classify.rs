// ── Per-direction packet-loss classification ──
//
// Each flow is judged twice, once per direction, on that direction's
// *maximum* loss. The two verdicts are independent: a flow may be
// healthy one way and reportable the other, or reportable both ways.

use serde::Serialize;
use strum::Display;

use rtmhealth_api::FlowRecord;

/// Direction of a media stream relative to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
pub enum Direction {
    #[strum(to_string = "S2C")]
    ServerToClient,
    #[strum(to_string = "C2S")]
    ClientToServer,
}

impl Direction {
    /// Both directions, in evaluation order.
    pub const ALL: [Direction; 2] = [Direction::ServerToClient, Direction::ClientToServer];

    /// This direction's maximum packet loss.
    pub fn max_loss(self, flow: &FlowRecord) -> Option<f64> {
        match self {
            Self::ServerToClient => flow.max_packet_loss_s2c,
            Self::ClientToServer => flow.max_packet_loss_c2s,
        }
    }
}

/// Limits a flow direction is judged against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Loss (percent) at or below which a direction is healthy.
    pub max_packet_loss: f64,
    /// Flows at or below this length are not reported.
    pub min_call_duration_ms: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_packet_loss: 3.0,
            min_call_duration_ms: 10_000,
        }
    }
}

/// Outcome of judging one direction of one flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// The controller sent no loss figure for this direction.
    NoData,
    /// Loss at or below the threshold.
    WithinThreshold,
    /// Loss above the threshold, but the call was too short to count, or
    /// its length is unknown.
    TooShort { duration_ms: Option<i64> },
    /// Loss above the threshold on a call long enough to report.
    Exceeded { max_loss: f64 },
}

/// Judge one direction of `flow`.
pub fn classify(flow: &FlowRecord, direction: Direction, thresholds: &Thresholds) -> Verdict {
    let Some(max_loss) = direction.max_loss(flow) else {
        return Verdict::NoData;
    };

    if max_loss <= thresholds.max_packet_loss {
        return Verdict::WithinThreshold;
    }

    match flow.duration_ms() {
        Some(ms) if ms > thresholds.min_call_duration_ms => Verdict::Exceeded { max_loss },
        duration_ms => Verdict::TooShort { duration_ms },
    }
}

/// Both verdicts for a flow, in evaluation order.
pub fn classify_flow(flow: &FlowRecord, thresholds: &Thresholds) -> [(Direction, Verdict); 2] {
    Direction::ALL.map(|direction| (direction, classify(flow, direction, thresholds)))
}

// ── Summary counters ────────────────────────────────────────────────

/// Running totals for a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounters {
    /// Flow items examined across all valid buckets.
    pub total_flows: u64,
    pub s2c_within: u64,
    pub c2s_within: u64,
    pub s2c_exceeded: u64,
    pub c2s_exceeded: u64,
}

impl SummaryCounters {
    /// Count one flow item, regardless of its verdicts.
    pub fn record_flow(&mut self) {
        self.total_flows += 1;
    }

    /// Fold one direction's verdict into the totals.
    ///
    /// `NoData` and `TooShort` leave every counter untouched.
    pub fn record(&mut self, direction: Direction, verdict: &Verdict) {
        let counter = match (direction, verdict) {
            (Direction::ServerToClient, Verdict::WithinThreshold) => &mut self.s2c_within,
            (Direction::ClientToServer, Verdict::WithinThreshold) => &mut self.c2s_within,
            (Direction::ServerToClient, Verdict::Exceeded { .. }) => &mut self.s2c_exceeded,
            (Direction::ClientToServer, Verdict::Exceeded { .. }) => &mut self.c2s_exceeded,
            (_, Verdict::NoData | Verdict::TooShort { .. }) => return,
        };
        *counter += 1;
    }

    pub fn within(&self, direction: Direction) -> u64 {
        match direction {
            Direction::ServerToClient => self.s2c_within,
            Direction::ClientToServer => self.c2s_within,
        }
    }

    pub fn exceeded(&self, direction: Direction) -> u64 {
        match direction {
            Direction::ServerToClient => self.s2c_exceeded,
            Direction::ClientToServer => self.c2s_exceeded,
        }
    }
}
