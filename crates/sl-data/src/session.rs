//! Caller-owned cache of the last successful load

use sl_core::{Dataset, LoadFailure, LoadOutcome, SourceDescriptor};
use tracing::info;

use crate::loader::{Loader, SourcePlan};

/// Keeps the last successfully loaded dataset across interactions.
///
/// The default plan is tried once per session; after that the dataset only
/// changes when an explicit upload succeeds.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<(Dataset, SourceDescriptor)>,
    default_attempted: bool,
    last_failures: Vec<LoadFailure>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the default plan unless it was already tried this session
    pub fn ensure_loaded(&mut self, loader: &Loader, plan: &SourcePlan) -> Option<&Dataset> {
        if !self.default_attempted {
            self.default_attempted = true;
            let outcome = loader.load_plan(plan);
            self.absorb(outcome);
        }
        self.dataset()
    }

    /// Load an explicit upload, bypassing the default plan.
    ///
    /// On success the upload replaces the current dataset; on failure the
    /// previous dataset is kept. The outcome is returned either way so the
    /// caller can report it.
    pub fn upload(&mut self, loader: &Loader, upload: SourceDescriptor) -> LoadOutcome {
        let plan = SourcePlan::new().with_upload(upload);
        let outcome = loader.load_plan(&plan);
        self.absorb(outcome.clone());
        outcome
    }

    fn absorb(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded {
                dataset,
                source,
                failures,
            } => {
                info!("Session dataset replaced by {}", source);
                self.current = Some((dataset, source));
                self.last_failures = failures;
            }
            LoadOutcome::Unavailable { failures } => {
                self.last_failures = failures;
            }
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.current.as_ref().map(|(dataset, _)| dataset)
    }

    /// Source of the current dataset
    pub fn source(&self) -> Option<&SourceDescriptor> {
        self.current.as_ref().map(|(_, source)| source)
    }

    /// Failures recorded by the most recent load attempt
    pub fn last_failures(&self) -> &[LoadFailure] {
        &self.last_failures
    }

    /// Forget the dataset and allow the default plan to run again
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
