// ── Name -> id resolution ──
//
// Users name sites and applications the way the portal shows them; the
// flow filter needs backend ids. Lookups are exact and case-sensitive.
// An unknown name is fatal for the run.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use rtmhealth_api::{AppDefRecord, SiteRecord};

use crate::error::CoreError;
use crate::source::TelemetrySource;

/// A name -> id dictionary.
///
/// Records without a name are left out. If two records share a name the
/// later one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameIndex {
    by_name: BTreeMap<String, String>,
}

impl NameIndex {
    /// Index sites by `name`.
    pub fn from_sites(sites: &[SiteRecord]) -> Self {
        sites
            .iter()
            .filter_map(|s| s.name.as_ref().map(|n| (n.clone(), s.id.clone())))
            .collect()
    }

    /// Index application definitions by `display_name`.
    pub fn from_appdefs(apps: &[AppDefRecord]) -> Self {
        apps.iter()
            .filter_map(|a| a.display_name.as_ref().map(|n| (n.clone(), a.id.clone())))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// `(name, id)` pairs, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_name.iter().map(|(n, id)| (n.as_str(), id.as_str()))
    }
}

impl FromIterator<(String, String)> for NameIndex {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            by_name: iter.into_iter().collect(),
        }
    }
}

/// Backend ids for the site and application a report targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedIds {
    pub site_id: String,
    pub app_id: String,
}

/// The id of site `name`, or `SiteNotFound`.
pub fn lookup_site(sites: &NameIndex, name: &str) -> Result<String, CoreError> {
    sites
        .get(name)
        .map(str::to_owned)
        .ok_or_else(|| CoreError::SiteNotFound {
            name: name.to_owned(),
        })
}

/// The id of application `name`, or `AppNotFound`.
pub fn lookup_app(apps: &NameIndex, name: &str) -> Result<String, CoreError> {
    apps.get(name)
        .map(str::to_owned)
        .ok_or_else(|| CoreError::AppNotFound {
            name: name.to_owned(),
        })
}

/// Fetch the dictionaries from `source` and resolve the two names.
///
/// The site is checked before application definitions are requested, so
/// an unknown site is reported as such whatever the appdefs call does.
pub async fn resolve_ids<S: TelemetrySource>(
    source: &S,
    site_name: &str,
    app_name: &str,
) -> Result<ResolvedIds, CoreError> {
    let sites = NameIndex::from_sites(&source.list_sites().await?);
    debug!(count = sites.len(), "site directory loaded");
    if sites.is_empty() {
        warn!("controller returned no named sites");
    }
    let site_id = lookup_site(&sites, site_name)?;

    let apps = NameIndex::from_appdefs(&source.list_appdefs().await?);
    debug!(count = apps.len(), "application directory loaded");
    if apps.is_empty() {
        warn!("controller returned no named application definitions");
    }
    let app_id = lookup_app(&apps, app_name)?;

    Ok(ResolvedIds { site_id, app_id })
}
