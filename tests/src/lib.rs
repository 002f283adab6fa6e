#[cfg(test)]
mod tests;

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use catalog::{CatalogConfig, CatalogContext, DataCatalog, load_catalog_config};
    use common::VersionToken;
    use tempfile::TempDir;

    /// Creates a temp project directory with a `catalog.toml` and a `data/`
    /// directory, returning the parsed catalog configuration.
    pub fn project(catalog_toml: &str) -> (TempDir, CatalogConfig) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();

        let config_path = dir.path().join("catalog.toml");
        std::fs::write(&config_path, catalog_toml).unwrap();

        let config = load_catalog_config(&config_path).unwrap();
        (dir, config)
    }

    /// Builds a catalog for the project with an injected run token.
    pub fn catalog_for_run(
        config: &CatalogConfig,
        base: &Path,
        run_id: Option<VersionToken>,
    ) -> DataCatalog {
        let context = CatalogContext {
            base_path: Some(base.to_path_buf()),
            save_version: run_id,
            ..Default::default()
        };
        DataCatalog::from_config(config, &context).unwrap()
    }
}
