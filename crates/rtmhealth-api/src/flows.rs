// Flow monitor endpoint

use tracing::debug;

use crate::client::{ControllerClient, decode};
use crate::error::Error;
use crate::models::{FlowQuery, FlowsPage};

impl ControllerClient {
    /// Query media flows ending at or before `query.end_time`.
    ///
    /// `POST /v3.6/api/tenants/{tenant}/monitor/flows`
    ///
    /// The returned page always carries a status code: the embedded
    /// `_status_code` when present, otherwise the HTTP status. An empty
    /// body (e.g. `204 No Content`) yields a page with no flows.
    pub async fn query_flows(&self, query: &FlowQuery) -> Result<FlowsPage, Error> {
        let url = self.tenant_url("v3.6", "monitor/flows")?;
        debug!(end_time = %query.end_time, "querying flows");

        let raw = self.post_raw(url, query).await?;
        let mut page: FlowsPage = if raw.body.trim().is_empty() {
            FlowsPage::default()
        } else {
            decode(&raw.body)?
        };
        if page.status_code.is_none() {
            page.status_code = Some(raw.status);
        }
        Ok(page)
    }
}
