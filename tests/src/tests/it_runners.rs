//! End-to-end runner scenarios over storage-backed catalogs.

use std::sync::Arc;

use monitoring::logging;
use pipeline::{Pipeline, node};
use runner::{ParallelRunner, ProjectContext, Runner, SequentialRunner};
use serde_json::{Value, json};

use crate::test_support::{catalog_for_run, project};

const CATALOG_TOML: &str = r#"
[cars]
kind = "json"
location = "data/cars.json"

[boats]
kind = "json"
location = "data/boats.json"

[scratch]
kind = "memory"
"#;

fn double(inputs: Vec<Value>) -> common::BoxResult<Vec<Value>> {
    let numbers = inputs[0]
        .as_array()
        .ok_or("expected an array of numbers")?;
    let doubled = numbers
        .iter()
        .map(|n| n.as_i64().map(|n| json!(n * 2)))
        .collect::<Option<Vec<_>>>()
        .ok_or("expected integers")?;
    Ok(vec![Value::Array(doubled)])
}

fn sum(inputs: Vec<Value>) -> common::BoxResult<Vec<Value>> {
    let mut total = 0;
    for value in &inputs {
        for n in value.as_array().ok_or("expected an array of numbers")? {
            total += n.as_i64().ok_or("expected integers")?;
        }
    }
    Ok(vec![json!(total)])
}

fn processing_pipeline() -> Pipeline {
    Pipeline::new(vec![
        node(double, &["cars"], &["boats"]).unwrap().named("double"),
        node(double, &["boats"], &["scratch"]).unwrap().named("double_again"),
        node(sum, &["boats", "scratch"], &["total"]).unwrap().named("sum"),
    ])
    .unwrap()
}

async fn run_project(runner: &dyn Runner) -> (tempfile::TempDir, serde_json::Value) {
    let (dir, config) = project(CATALOG_TOML);
    let catalog = Arc::new(catalog_for_run(&config, dir.path(), None));
    catalog.add_feed([("cars", json!([1, 2, 3]))]).unwrap();

    let mut result = runner.run(&processing_pipeline(), catalog).await.unwrap();
    let total = result.remove("total").unwrap();
    (dir, total)
}

#[tokio::test]
async fn sequential_run_end_to_end() {
    logging::init();

    let (dir, total) = run_project(&SequentialRunner::new()).await;

    // cars doubled to boats, boats doubled to scratch, both summed.
    assert_eq!(total, json!(36));
    let boats = std::fs::read_to_string(dir.path().join("data/boats.json")).unwrap();
    assert_eq!(boats, "[2,4,6]");
}

#[tokio::test(flavor = "multi_thread")]
async fn parallel_run_matches_sequential() {
    logging::init();

    let (sequential_dir, sequential_total) = run_project(&SequentialRunner::new()).await;
    let (parallel_dir, parallel_total) = run_project(&ParallelRunner::new()).await;

    assert_eq!(sequential_total, parallel_total);

    let sequential_boats =
        std::fs::read_to_string(sequential_dir.path().join("data/boats.json")).unwrap();
    let parallel_boats =
        std::fs::read_to_string(parallel_dir.path().join("data/boats.json")).unwrap();
    assert_eq!(sequential_boats, parallel_boats);
}

#[tokio::test]
async fn tag_filtered_run_skips_unmatched_nodes() {
    logging::init();

    let (dir, config) = project(CATALOG_TOML);
    let catalog = Arc::new(catalog_for_run(&config, dir.path(), None));
    catalog.add_feed([("cars", json!([10]))]).unwrap();

    let pipeline = Pipeline::new(vec![
        node(double, &["cars"], &["boats"]).unwrap().named("double").tagged(&["tag1"]),
        node(double, &["boats"], &["trains"]).unwrap().named("downstream"),
    ])
    .unwrap();

    let context = ProjectContext::new(dir.path(), pipeline, catalog.clone());
    context.run(Some(&["tag1"])).await.unwrap();

    // The tagged node ran and persisted its output; the untagged sibling
    // never executed.
    assert_eq!(catalog.load("boats").await.unwrap(), json!([20]));
    assert!(!catalog.contains("trains"));
    assert!(dir.path().join("data/boats.json").exists());
}

#[tokio::test]
async fn failed_node_keeps_already_saved_outputs() {
    logging::init();

    let (dir, config) = project(CATALOG_TOML);
    let catalog = Arc::new(catalog_for_run(&config, dir.path(), None));
    catalog.add_feed([("cars", json!([5]))]).unwrap();

    let pipeline = Pipeline::new(vec![
        node(double, &["cars"], &["boats"]).unwrap(),
        node(|_| Err("downstream broke".into()), &["boats"], &["wrecks"])
            .unwrap()
            .named("wrecker"),
    ])
    .unwrap();

    let result = SequentialRunner::new().run(&pipeline, catalog).await;
    assert!(result.is_err());

    // The first node's artifact survives the failure.
    assert!(dir.path().join("data/boats.json").exists());
}
