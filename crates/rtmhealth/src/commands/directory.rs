//! `sites` and `apps` handlers: print the name → id dictionaries a report
//! resolves against, so users can copy exact names.

use serde::Serialize;
use tabled::Tabled;

use rtmhealth_core::{CoreError, NameIndex, TelemetrySource};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct NamedId {
    name: String,
    id: String,
}

#[derive(Tabled)]
struct NamedIdRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl From<&NamedId> for NamedIdRow {
    fn from(n: &NamedId) -> Self {
        Self {
            name: n.name.clone(),
            id: n.id.clone(),
        }
    }
}

fn entries(index: &NameIndex) -> Vec<NamedId> {
    index
        .iter()
        .map(|(name, id)| NamedId {
            name: name.to_owned(),
            id: id.to_owned(),
        })
        .collect()
}

fn print(index: &NameIndex, global: &GlobalOpts) {
    let data = entries(index);
    let out = output::render_list(
        &global.output,
        &data,
        |n| NamedIdRow::from(n),
        |n| n.name.clone(),
    );
    output::print_output(&out, global.quiet);
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn sites<S: TelemetrySource>(source: &S, global: &GlobalOpts) -> Result<(), CliError> {
    let sites = source.list_sites().await.map_err(CoreError::from)?;
    print(&NameIndex::from_sites(&sites), global);
    Ok(())
}

pub async fn apps<S: TelemetrySource>(source: &S, global: &GlobalOpts) -> Result<(), CliError> {
    let apps = source.list_appdefs().await.map_err(CoreError::from)?;
    print(&NameIndex::from_appdefs(&apps), global);
    Ok(())
}
