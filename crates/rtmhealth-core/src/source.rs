// ── Telemetry source seam ──
//
// The runner and resolver only need three reads from the controller.
// `ControllerClient` is the production implementation; tests substitute
// an in-memory source.

use std::future::Future;

use rtmhealth_api::{AppDefRecord, ControllerClient, Error, FlowQuery, FlowsPage, SiteRecord};

/// Read access to sites, application definitions, and flow telemetry.
pub trait TelemetrySource {
    fn list_sites(&self) -> impl Future<Output = Result<Vec<SiteRecord>, Error>> + Send;

    fn list_appdefs(&self) -> impl Future<Output = Result<Vec<AppDefRecord>, Error>> + Send;

    fn query_flows(
        &self,
        query: &FlowQuery,
    ) -> impl Future<Output = Result<FlowsPage, Error>> + Send;
}

impl TelemetrySource for ControllerClient {
    async fn list_sites(&self) -> Result<Vec<SiteRecord>, Error> {
        ControllerClient::list_sites(self).await
    }

    async fn list_appdefs(&self) -> Result<Vec<AppDefRecord>, Error> {
        ControllerClient::list_appdefs(self).await
    }

    async fn query_flows(&self, query: &FlowQuery) -> Result<FlowsPage, Error> {
        ControllerClient::query_flows(self, query).await
    }
}
