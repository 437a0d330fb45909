// Token authentication
//
// The controller has no session login for tokens: the token is sent as a
// header on every call. "Authenticating" means fetching the operator
// profile and recording the tenant it belongs to.

use tracing::debug;

use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::ProfileRecord;

/// Result of a successful authentication.
#[derive(Debug, Clone)]
pub struct TenantSession {
    pub tenant_id: String,
    pub email: Option<String>,
}

impl ControllerClient {
    /// Validate the token and bind this client to its tenant.
    ///
    /// `GET /v2.1/api/profile`. Fails with [`Error::Authentication`] if the
    /// token is rejected or the profile carries no tenant id.
    pub async fn authenticate(&mut self) -> Result<TenantSession, Error> {
        let url = self.api_url("v2.1", "profile")?;
        debug!("fetching operator profile");

        let profile: ProfileRecord = self.get(url).await?;

        let tenant_id = profile
            .tenant_id
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Authentication {
                message: "token login failure: profile has no tenant".into(),
            })?;

        debug!(tenant = %tenant_id, "authenticated");
        self.set_tenant_id(tenant_id.clone());

        Ok(TenantSession {
            tenant_id,
            email: profile.email,
        })
    }
}
