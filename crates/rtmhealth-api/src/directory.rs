// Site and application-definition listings
//
// These back the name -> id lookups the report needs before it can
// build a flow filter.

use tracing::debug;

use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::{AppDefRecord, ItemsEnvelope, SiteRecord};

impl ControllerClient {
    /// List all sites of the tenant.
    ///
    /// `GET /v4.7/api/tenants/{tenant}/sites`
    pub async fn list_sites(&self) -> Result<Vec<SiteRecord>, Error> {
        let url = self.tenant_url("v4.7", "sites")?;
        debug!("listing sites");
        let envelope: ItemsEnvelope<SiteRecord> = self.get(url).await?;
        Ok(envelope.items)
    }

    /// List all application definitions of the tenant.
    ///
    /// `GET /v2.3/api/tenants/{tenant}/appdefs`
    pub async fn list_appdefs(&self) -> Result<Vec<AppDefRecord>, Error> {
        let url = self.tenant_url("v2.3", "appdefs")?;
        debug!("listing application definitions");
        let envelope: ItemsEnvelope<AppDefRecord> = self.get(url).await?;
        Ok(envelope.items)
    }
}
