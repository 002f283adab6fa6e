//! Versioned lineage across runs.

use std::sync::Arc;

use common::VersionToken;
use monitoring::logging;
use pipeline::{Pipeline, node};
use runner::ProjectContext;
use serde_json::{Value, json};

use crate::test_support::{catalog_for_run, project};

const VERSIONED_CATALOG_TOML: &str = r#"
[cars]
kind = "json"
location = "data/cars.json"
versioned = true

[boats]
kind = "json"
location = "data/boats.json"
versioned = true
"#;

fn token(s: &str) -> VersionToken {
    s.parse().unwrap()
}

#[tokio::test]
async fn save_then_load_resolves_the_just_saved_version() {
    logging::init();

    let (dir, config) = project(VERSIONED_CATALOG_TOML);
    let catalog = catalog_for_run(&config, dir.path(), None);

    catalog.save("cars", &json!({"wheels": 4})).await.unwrap();
    assert!(catalog.exists("cars").await.unwrap());
    assert_eq!(catalog.load("cars").await.unwrap(), json!({"wheels": 4}));
}

#[tokio::test]
async fn later_runs_win_latest_resolution_and_stay_addressable() {
    logging::init();

    let (dir, config) = project(VERSIONED_CATALOG_TOML);

    let first_run = token("2026-08-06T10.00.00.000000Z");
    let second_run = token("2026-08-07T10.00.00.000000Z");

    let catalog = catalog_for_run(&config, dir.path(), Some(first_run.clone()));
    catalog.save("cars", &json!("first")).await.unwrap();

    let catalog = catalog_for_run(&config, dir.path(), Some(second_run.clone()));
    catalog.save("cars", &json!("second")).await.unwrap();

    // An unpinned reader resolves to the later run.
    let catalog = catalog_for_run(&config, dir.path(), None);
    assert_eq!(catalog.load("cars").await.unwrap(), json!("second"));

    // Pinning the load version addresses the earlier snapshot.
    let mut pinned_config = config.clone();
    pinned_config.get_mut("cars").unwrap().load_version = Some(first_run.clone());
    let catalog = catalog_for_run(&pinned_config, dir.path(), None);
    assert_eq!(catalog.load("cars").await.unwrap(), json!("first"));

    // Snapshots are laid out as <location>/<token>/<basename>.
    for run in [&first_run, &second_run] {
        let snapshot = dir
            .path()
            .join(format!("data/cars.json/{run}/cars.json"));
        assert!(snapshot.exists(), "missing snapshot {}", snapshot.display());
    }
}

#[tokio::test]
async fn all_datasets_of_one_run_share_the_run_token() {
    logging::init();

    let (dir, config) = project(VERSIONED_CATALOG_TOML);

    let run_id = VersionToken::generate();
    let catalog = Arc::new(catalog_for_run(&config, dir.path(), Some(run_id.clone())));

    let pipeline = Pipeline::new(vec![
        node(
            |inputs: Vec<Value>| Ok(inputs),
            &["cars"],
            &["boats"],
        )
        .unwrap()
        .named("float"),
    ])
    .unwrap();

    let context = ProjectContext::new(dir.path(), pipeline, catalog.clone())
        .with_run_id(run_id.clone());

    catalog.save("cars", &json!(["corolla"])).await.unwrap();
    context.run(None).await.unwrap();

    for dataset in ["cars", "boats"] {
        let snapshot = dir
            .path()
            .join(format!("data/{dataset}.json/{run_id}/{dataset}.json"));
        assert!(
            snapshot.exists(),
            "dataset '{dataset}' did not save under run token {run_id}"
        );
    }
}

#[tokio::test]
async fn loading_an_empty_versioned_dataset_reports_no_versions() {
    logging::init();

    let (dir, config) = project(VERSIONED_CATALOG_TOML);
    let catalog = catalog_for_run(&config, dir.path(), None);

    assert!(!catalog.exists("cars").await.unwrap());

    let result = catalog.load("cars").await;
    match result {
        Err(err) => {
            let message = err.to_string();
            assert!(
                message.contains("no versions found"),
                "unexpected error: {message}"
            );
            assert!(message.contains("cars"));
        }
        Ok(value) => panic!("expected no versions, loaded {value}"),
    }
}

#[tokio::test]
async fn repeated_saves_in_one_run_reuse_the_token() {
    logging::init();

    let (dir, config) = project(VERSIONED_CATALOG_TOML);
    let catalog = catalog_for_run(&config, dir.path(), None);

    catalog.save("cars", &json!(1)).await.unwrap();
    catalog.save("cars", &json!(2)).await.unwrap();

    let snapshots: Vec<_> = std::fs::read_dir(dir.path().join("data/cars.json"))
        .unwrap()
        .collect();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(catalog.load("cars").await.unwrap(), json!(2));
}

#[tokio::test]
async fn unversioned_and_versioned_datasets_coexist() {
    logging::init();

    let (dir, config) = project(
        r#"
[cars]
kind = "json"
location = "data/cars.json"
versioned = true

[summary]
kind = "text"
location = "data/summary.txt"
"#,
    );
    let catalog = catalog_for_run(&config, dir.path(), None);

    catalog.save("cars", &json!([1])).await.unwrap();
    catalog.save("summary", &json!("one car")).await.unwrap();

    // The unversioned artifact is a plain file at its location.
    let summary = std::fs::read_to_string(dir.path().join("data/summary.txt")).unwrap();
    assert_eq!(summary, "one car");

    // The versioned artifact is a snapshot directory.
    assert!(dir.path().join("data/cars.json").is_dir());
}
