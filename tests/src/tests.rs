mod it_catalog_config;
mod it_runners;
mod it_versioning;
