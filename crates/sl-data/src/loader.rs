//! Multi-source resolution: first source that yields a table wins

use std::borrow::Cow;

use sl_core::{
    Dataset, FailureReason, LoadFailure, LoadOutcome, SourceDescriptor, SourceFormat,
    SourceLocation,
};
use tracing::{debug, info, warn};

use crate::config::{LoaderConfig, NullConfig};
use crate::normalize::normalize;
use crate::sources::{DelimitedReader, HttpFetcher, RemoteFetcher, SpreadsheetReader};
use crate::DataError;

/// Ordered list of sources to try
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePlan {
    sources: Vec<SourceDescriptor>,
}

impl SourcePlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source with the lowest priority so far
    pub fn push(&mut self, source: SourceDescriptor) {
        self.sources.push(source);
    }

    /// Replace the whole plan with a single upload.
    ///
    /// An explicit upload always wins over the automatic sources, so
    /// nothing else is consulted for that load cycle.
    pub fn with_upload(self, upload: SourceDescriptor) -> Self {
        Self {
            sources: vec![upload],
        }
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl From<Vec<SourceDescriptor>> for SourcePlan {
    fn from(sources: Vec<SourceDescriptor>) -> Self {
        Self { sources }
    }
}

/// Stateless loader resolving a dataset from candidate sources
pub struct Loader {
    fetcher: Box<dyn RemoteFetcher>,
    null_config: NullConfig,
}

impl Loader {
    /// Create a loader fetching remote sources over HTTP
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            fetcher: Box::new(HttpFetcher::new(config.remote_timeout)),
            null_config: config.null_config.clone(),
        }
    }

    /// Create a loader with a custom remote transport
    pub fn with_fetcher(fetcher: impl RemoteFetcher + 'static, null_config: NullConfig) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            null_config,
        }
    }

    /// Try every source in order and return the first normalized dataset.
    ///
    /// Never fails: per-source problems are collected into the outcome.
    pub fn load(&self, sources: &[SourceDescriptor]) -> LoadOutcome {
        let mut failures = Vec::new();

        for source in sources {
            match self.load_source(source) {
                Ok(dataset) => {
                    info!(
                        "Loaded {} rows x {} columns from {}",
                        dataset.num_rows(),
                        dataset.num_columns(),
                        source
                    );
                    return LoadOutcome::Loaded {
                        dataset,
                        source: source.clone(),
                        failures,
                    };
                }
                Err(reason) => {
                    if reason.is_skip() {
                        debug!("Skipping {}: {}", source, reason);
                    } else {
                        warn!("Failed to read {}: {}", source, reason);
                    }
                    failures.push(LoadFailure {
                        source: source.clone(),
                        reason,
                    });
                }
            }
        }

        warn!("No dataset available after trying {} source(s)", failures.len());
        LoadOutcome::Unavailable { failures }
    }

    /// Load the sources of a plan
    pub fn load_plan(&self, plan: &SourcePlan) -> LoadOutcome {
        self.load(plan.sources())
    }

    /// Read, parse and normalize a single source
    pub fn load_source(&self, source: &SourceDescriptor) -> Result<Dataset, FailureReason> {
        if let SourceLocation::LocalPath { path } = &source.location {
            if !path.exists() {
                return Err(FailureReason::NotFound);
            }
        }

        let format = source.resolved_format().ok_or_else(|| {
            FailureReason::Unsupported(
                source
                    .extension()
                    .map(|ext| format!(".{}", ext))
                    .unwrap_or_else(|| "(none)".to_string()),
            )
        })?;

        let parsed = self.read_bytes(source).and_then(|bytes| match format {
            SourceFormat::Delimited => DelimitedReader::new(&self.null_config).read(&bytes),
            SourceFormat::Spreadsheet => SpreadsheetReader::read(&bytes, &source.sheet),
        });

        Ok(parsed.and_then(normalize)?)
    }

    fn read_bytes<'s>(&self, source: &'s SourceDescriptor) -> Result<Cow<'s, [u8]>, DataError> {
        match &source.location {
            SourceLocation::LocalPath { path } => Ok(Cow::Owned(std::fs::read(path)?)),
            SourceLocation::Upload { bytes, .. } => Ok(Cow::Borrowed(bytes.as_slice())),
            SourceLocation::Remote { url } => Ok(Cow::Owned(self.fetcher.fetch(url)?)),
        }
    }
}
