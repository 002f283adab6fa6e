//! Declarative catalog configuration.
//!
//! The catalog is configured as a mapping from dataset name to an entry
//! describing its kind, location, and options. Parsing is handled by
//! figment; the core only consumes the extracted mappings.

use std::collections::BTreeMap;

use common::VersionToken;
use datasets::FormatArgs;
use figment::{
    Figment,
    providers::{Env, Format as _, Json, Toml},
};
use serde::Deserialize;
use weir_object_store::StoreCredentials;

use crate::CatalogConfigError;

/// Run parameters substituted into `${key}` location templates.
pub type Parameters = BTreeMap<String, String>;

/// Named credential sets, referenced by catalog entries.
pub type Credentials = BTreeMap<String, StoreCredentials>;

/// One catalog entry: everything needed to construct a dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    /// Dataset kind, resolved against the registry (`json`, `text`,
    /// `memory`, or anything registered by the embedding application).
    pub kind: String,

    /// Artifact location: a filesystem path (absolute, or relative to the
    /// catalog base path) or an object store URL such as
    /// `s3://bucket/data/cars.json`. May contain `${parameter}` templates.
    #[serde(default)]
    pub location: Option<String>,

    /// Name of a credentials entry to apply to the storage backend.
    #[serde(default)]
    pub credentials: Option<String>,

    #[serde(default)]
    pub load_args: FormatArgs,

    #[serde(default)]
    pub save_args: FormatArgs,

    /// Whether saves write immutable timestamped snapshots.
    #[serde(default)]
    pub versioned: bool,

    /// Pins loads to a specific snapshot instead of the latest.
    #[serde(default)]
    pub load_version: Option<VersionToken>,
}

/// The full catalog configuration: dataset name to entry.
pub type CatalogConfig = BTreeMap<String, DatasetConfig>;

/// Loads catalog configuration from a TOML or JSON file.
///
/// `WEIR_CATALOG_*` environment variables override file entries, e.g.
/// `WEIR_CATALOG_CARS__VERSIONED=true`.
pub fn load_catalog_config(
    path: impl AsRef<std::path::Path>,
) -> Result<CatalogConfig, CatalogConfigError> {
    let path = path.as_ref();
    let figment = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Figment::new().merge(Json::file(path)),
        _ => Figment::new().merge(Toml::file(path)),
    };
    Ok(figment
        .merge(Env::prefixed("WEIR_CATALOG_").split("__"))
        .extract()?)
}

/// Expands `${key}` templates in a location string.
pub(crate) fn expand_template(
    dataset: &str,
    template: &str,
    parameters: &Parameters,
) -> Result<String, CatalogConfigError> {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        expanded.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // No closing brace: treat the remainder as literal text.
            expanded.push_str(&rest[start..]);
            return Ok(expanded);
        };
        let key = &after[..end];
        let value =
            parameters
                .get(key)
                .ok_or_else(|| CatalogConfigError::MissingParameter {
                    name: dataset.to_string(),
                    key: key.to_string(),
                })?;
        expanded.push_str(value);
        rest = &after[end + 1..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}
