// rtmhealth-api: Async Rust client for the SD-WAN controller REST API

pub mod auth;
pub mod client;
pub mod directory;
pub mod error;
pub mod flows;
pub mod models;
pub mod transport;

pub use auth::TenantSession;
pub use client::ControllerClient;
pub use error::Error;
pub use models::{AppDefRecord, FlowFilter, FlowItems, FlowQuery, FlowRecord, FlowsPage, SiteRecord};
pub use transport::{TlsMode, TransportConfig};
