// ── Controller connection ──
//
// Builds the HTTP transport from a `ControllerConfig` and binds the client
// to its tenant. Everything downstream takes the connected client through
// the `TelemetrySource` seam.

use tracing::{debug, info};

use rtmhealth_api::{ControllerClient, TenantSession, TlsMode, TransportConfig};

use crate::config::{ControllerConfig, TlsVerification};
use crate::error::CoreError;

/// A client that has passed token authentication.
pub struct Connection {
    pub client: ControllerClient,
    pub session: TenantSession,
}

/// Build a client for `config` and authenticate it.
pub async fn connect(config: &ControllerConfig) -> Result<Connection, CoreError> {
    let transport = build_transport(config);
    let mut client = ControllerClient::new(config.url.clone(), &config.token, &transport)?;

    debug!(url = %config.url, "authenticating");
    let session = client.authenticate().await.map_err(|err| {
        if err.is_connect() {
            CoreError::ConnectionFailed {
                url: config.url.to_string(),
                reason: err.to_string(),
            }
        } else {
            CoreError::from(err)
        }
    })?;
    info!(tenant = %session.tenant_id, "token accepted");

    Ok(Connection { client, session })
}

fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
