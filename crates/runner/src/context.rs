//! The project run entry point.
//!
//! A [`ProjectContext`] bundles everything one run needs: the project
//! directory, the pipeline, the catalog, and the run identifier shared by
//! every versioned save. It is passed explicitly; there is no implicit
//! "currently loaded project" state. The optional [`ProjectContext::activate`]
//! guard enforces a one-project-per-process constraint as a single allowed
//! unset-to-set transition.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use catalog::DataCatalog;
use common::VersionToken;
use pipeline::{Pipeline, PipelineError};
use serde_json::Value;

use crate::{Runner, RunnerError, SequentialRunner};

static ACTIVE_PROJECT: OnceLock<PathBuf> = OnceLock::new();

pub struct ProjectContext {
    project_path: PathBuf,
    pipeline: Pipeline,
    catalog: Arc<DataCatalog>,
    run_id: VersionToken,
}

impl ProjectContext {
    /// Creates a context with a freshly generated run identifier.
    pub fn new(
        project_path: impl Into<PathBuf>,
        pipeline: Pipeline,
        catalog: Arc<DataCatalog>,
    ) -> Self {
        ProjectContext {
            project_path: project_path.into(),
            pipeline,
            catalog,
            run_id: VersionToken::generate(),
        }
    }

    /// Replaces the generated run identifier.
    ///
    /// Use this when the catalog was constructed with an injected save
    /// version, so the context reports the same token the datasets use.
    pub fn with_run_id(mut self, run_id: VersionToken) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn catalog(&self) -> &Arc<DataCatalog> {
        &self.catalog
    }

    /// The token every versioned save of this run shares.
    pub fn run_id(&self) -> &VersionToken {
        &self.run_id
    }

    /// Claims this process for the context's project.
    ///
    /// The first activation wins and is permanent for the process lifetime.
    /// Re-activating the same path is a no-op; a different path is a
    /// structural error.
    pub fn activate(&self) -> Result<(), ContextError> {
        let active = ACTIVE_PROJECT.get_or_init(|| self.project_path.clone());
        if *active != self.project_path {
            return Err(ContextError::ProjectAlreadyActive {
                active: active.clone(),
                requested: self.project_path.clone(),
            });
        }
        Ok(())
    }

    /// Runs the pipeline with the sequential runner.
    pub async fn run(
        &self,
        tags: Option<&[&str]>,
    ) -> Result<BTreeMap<String, Value>, ContextError> {
        self.run_with(tags, &SequentialRunner).await
    }

    /// Runs the pipeline, optionally filtered to nodes carrying any of
    /// `tags`, with the given runner.
    ///
    /// Fails before executing anything if the filter selects no nodes.
    pub async fn run_with(
        &self,
        tags: Option<&[&str]>,
        runner: &dyn Runner,
    ) -> Result<BTreeMap<String, Value>, ContextError> {
        let filtered = match tags {
            Some(tags) => self.pipeline.only_nodes_with_tags(tags)?,
            None => self.pipeline.clone(),
        };

        if filtered.nodes().is_empty() {
            return Err(ContextError::EmptyPipeline {
                tags: tags.map(|tags| tags.join(", ")),
            });
        }

        tracing::info!(
            project = %self.project_path.display(),
            run_id = %self.run_id,
            nodes = filtered.nodes().len(),
            "running pipeline"
        );

        Ok(runner.run(&filtered, self.catalog.clone()).await?)
    }
}

/// Errors raised by the project context.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// The run selection contains no nodes.
    #[error("pipeline contains no nodes{}", tags.as_deref().map(|tags| format!(" with tags: {tags}")).unwrap_or_default())]
    EmptyPipeline { tags: Option<String> },

    /// Another project has already been activated in this process.
    #[error(
        "cannot activate project '{}': project '{}' is already active",
        requested.display(),
        active.display()
    )]
    ProjectAlreadyActive { active: PathBuf, requested: PathBuf },

    /// A tag or structural filter failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The run itself failed.
    #[error(transparent)]
    Runner(#[from] RunnerError),
}
