//! Declarative catalog construction scenarios.

use std::sync::Arc;

use catalog::{
    CatalogConfigError, CatalogContext, DataCatalog, DatasetRegistry, load_catalog_config,
};
use datasets::MemoryDataset;
use monitoring::logging;
use serde_json::json;

use crate::test_support::project;

#[tokio::test]
async fn parameters_expand_into_locations() {
    logging::init();

    let (dir, config) = project(
        r#"
[cars]
kind = "json"
location = "data/${env}/cars.json"
"#,
    );
    std::fs::create_dir_all(dir.path().join("data/staging")).unwrap();

    let context = CatalogContext {
        parameters: [("env".to_string(), "staging".to_string())].into(),
        base_path: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let catalog = DataCatalog::from_config(&config, &context).unwrap();

    catalog.save("cars", &json!([1])).await.unwrap();
    assert!(dir.path().join("data/staging/cars.json").exists());
}

#[test]
fn missing_parameter_fails_fast_naming_the_key() {
    let (dir, config) = project(
        r#"
[cars]
kind = "json"
location = "data/${env}/cars.json"
"#,
    );

    let context = CatalogContext {
        base_path: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let result = DataCatalog::from_config(&config, &context);

    match result {
        Err(CatalogConfigError::MissingParameter { name, key }) => {
            assert_eq!(name, "cars");
            assert_eq!(key, "env");
        }
        other => panic!("expected missing parameter, got {other:?}"),
    }
}

#[test]
fn missing_credentials_fail_fast_naming_the_reference() {
    let (dir, config) = project(
        r#"
[remote_cars]
kind = "json"
location = "s3://weir-data/cars.json"
credentials = "prod_s3"
"#,
    );

    let context = CatalogContext {
        base_path: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let result = DataCatalog::from_config(&config, &context);

    match result {
        Err(CatalogConfigError::MissingCredentials { name, reference }) => {
            assert_eq!(name, "remote_cars");
            assert_eq!(reference, "prod_s3");
        }
        other => panic!("expected missing credentials, got {other:?}"),
    }
}

#[test]
fn s3_entry_with_credentials_constructs() {
    let (dir, config) = project(
        r#"
[remote_cars]
kind = "json"
location = "s3://weir-data/cars.json"
credentials = "prod_s3"
"#,
    );

    let context = CatalogContext {
        credentials: [(
            "prod_s3".to_string(),
            [
                ("aws_access_key_id".to_string(), "testing".to_string()),
                ("aws_secret_access_key".to_string(), "testing".to_string()),
                ("aws_region".to_string(), "us-east-1".to_string()),
            ]
            .into(),
        )]
        .into(),
        base_path: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    let catalog = DataCatalog::from_config(&config, &context).unwrap();
    let attrs = catalog.get("remote_cars").unwrap().describe();

    // The location is reported; the credentials are not.
    assert!(attrs.get("filepath").unwrap().contains("weir-data"));
    assert!(attrs.values().all(|value| !value.contains("testing")));
}

#[test]
fn custom_registered_kind_is_constructible() {
    let (dir, config) = project(
        r#"
[defaults]
kind = "constant"
"#,
    );

    let mut registry = DatasetRegistry::with_defaults();
    registry
        .register(
            "constant",
            Arc::new(|ctx: &catalog::DatasetContext<'_>| {
                Ok(Arc::new(MemoryDataset::with_value(
                    ctx.name.clone(),
                    json!("constant"),
                )) as Arc<dyn datasets::Dataset>)
            }),
        )
        .unwrap();

    let context = CatalogContext {
        base_path: Some(dir.path().to_path_buf()),
        registry,
        ..Default::default()
    };
    let catalog = DataCatalog::from_config(&config, &context).unwrap();

    assert!(catalog.contains("defaults"));
}

#[test]
fn config_file_loader_accepts_toml_and_json() {
    let dir = tempfile::tempdir().unwrap();

    let toml_path = dir.path().join("catalog.toml");
    std::fs::write(&toml_path, "[cars]\nkind = \"memory\"\n").unwrap();
    let toml_config = load_catalog_config(&toml_path).unwrap();
    assert_eq!(toml_config["cars"].kind, "memory");

    let json_path = dir.path().join("catalog.json");
    std::fs::write(&json_path, r#"{"cars": {"kind": "memory"}}"#).unwrap();
    let json_config = load_catalog_config(&json_path).unwrap();
    assert_eq!(json_config["cars"].kind, "memory");
}
