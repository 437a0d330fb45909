// Wire types for the controller REST API.
//
// Field names match the controller's JSON exactly; everything the
// controller may omit is `Option` or `#[serde(default)]` so a sparse
// record never fails a whole page.

use serde::{Deserialize, Serialize};

/// Generic `{ "items": [...] }` list envelope used by collection endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ItemsEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// `GET /v2.1/api/profile` -- the operator profile bound to a token.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRecord {
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A site as returned by the sites collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// An application definition. Name lookups key on `display_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppDefRecord {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

// ── Flow monitor ────────────────────────────────────────────────────

/// Request body for `POST .../monitor/flows`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowQuery {
    /// Bucket boundary, `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    pub end_time: String,
    pub filter: FlowFilter,
    pub debug_level: String,
}

impl FlowQuery {
    /// A query for flows ending at or before `end_time`, scoped to one
    /// site and one application.
    pub fn new(end_time: impl Into<String>, site_id: &str, app_id: &str) -> Self {
        Self {
            end_time: end_time.into(),
            filter: FlowFilter {
                site: vec![site_id.to_owned()],
                app: vec![app_id.to_owned()],
            },
            debug_level: "all".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowFilter {
    pub site: Vec<String>,
    pub app: Vec<String>,
}

/// Response of the flow monitor endpoint.
///
/// `status_code` mirrors the `_status_code` the controller embeds in the
/// payload. When the controller leaves it out, the client fills it from
/// the HTTP status line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlowsPage {
    #[serde(rename = "_status_code", default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub flows: FlowItems,
}

impl FlowsPage {
    /// `true` only for an embedded status of exactly 200.
    pub fn is_ok(&self) -> bool {
        self.status_code == Some(200)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlowItems {
    #[serde(default)]
    pub items: Vec<FlowRecord>,
}

/// One bidirectional media session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub source_ip: Option<String>,
    #[serde(default)]
    pub source_port: Option<u16>,
    #[serde(default)]
    pub destination_ip: Option<String>,
    #[serde(default)]
    pub destination_port: Option<u16>,
    #[serde(default)]
    pub flow_start_time_ms: Option<i64>,
    #[serde(default)]
    pub flow_end_time_ms: Option<i64>,
    #[serde(default)]
    pub avg_packet_loss_s2c: Option<f64>,
    #[serde(default)]
    pub avg_packet_loss_c2s: Option<f64>,
    #[serde(default)]
    pub max_packet_loss_s2c: Option<f64>,
    #[serde(default)]
    pub max_packet_loss_c2s: Option<f64>,
    #[serde(default)]
    pub avg_mos_c2s: Option<f64>,
    #[serde(default)]
    pub avg_mos_s2c: Option<f64>,
    #[serde(default)]
    pub path_id: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    /// DSCP marking; the controller sends a number, a string, or an object.
    #[serde(default)]
    pub lan_dscp_lan_to_wan: Option<serde_json::Value>,
    #[serde(default)]
    pub lan_dscp_wan_to_lan: Option<serde_json::Value>,
    #[serde(default)]
    pub lan_to_wan: Option<bool>,
}

impl FlowRecord {
    /// Session length in milliseconds (`end - start`), if both ends are known.
    pub fn duration_ms(&self) -> Option<i64> {
        self.flow_end_time_ms?.checked_sub(self.flow_start_time_ms?)
    }
}
