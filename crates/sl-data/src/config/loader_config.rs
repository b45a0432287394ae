//! Loader configuration: where to look for a dataset and how to read it

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sl_core::{SheetSelector, SourceDescriptor};
use tracing::warn;

use super::null_handling::NullConfig;
use crate::loader::SourcePlan;

/// Environment variable overriding the remote CSV URL
pub const REMOTE_URL_ENV: &str = "SHEETLOAD_REMOTE_URL";

/// Environment variable overriding the local data file name
pub const DATA_FILE_ENV: &str = "SHEETLOAD_DATA_FILE";

/// Environment variable bounding remote reads, in humantime syntax (`30s`)
pub const REMOTE_TIMEOUT_ENV: &str = "SHEETLOAD_REMOTE_TIMEOUT";

/// File looked up under the `data/` directories when nothing else is set
pub const DEFAULT_DATA_FILE: &str = "dataset.xlsx";

/// Configuration for the default load cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Remote CSV export consulted after the local candidates
    pub remote_url: Option<String>,

    /// File name looked up under each candidate `data/` directory
    pub data_file: String,

    /// Bound on remote reads; unbounded when absent
    pub remote_timeout: Option<Duration>,

    /// Sheet read from workbook sources
    pub sheet: SheetSelector,

    /// Cell values treated as missing
    pub null_config: NullConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            data_file: DEFAULT_DATA_FILE.to_string(),
            remote_timeout: None,
            sheet: SheetSelector::default(),
            null_config: NullConfig::default(),
        }
    }
}

impl LoaderConfig {
    /// Build a configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(REMOTE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.remote_url = Some(url.trim().to_string());
        }

        if let Some(file) = lookup(DATA_FILE_ENV).filter(|v| !v.trim().is_empty()) {
            config.data_file = file.trim().to_string();
        }

        if let Some(raw) = lookup(REMOTE_TIMEOUT_ENV) {
            match humantime::parse_duration(raw.trim()) {
                Ok(timeout) => config.remote_timeout = Some(timeout),
                Err(e) => warn!("Ignoring {}={:?}: {}", REMOTE_TIMEOUT_ENV, raw, e),
            }
        }

        config
    }

    /// Candidate local paths, in priority order.
    ///
    /// `data/<file>` next to the executable, under the working directory,
    /// and relative to wherever the process happens to resolve it.
    pub fn local_candidates(&self) -> Vec<PathBuf> {
        let relative = Path::new("data").join(&self.data_file);
        let mut candidates = Vec::with_capacity(3);

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            candidates.push(exe_dir.join(&relative));
        }

        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(&relative));
        }

        candidates.push(relative);
        candidates
    }

    /// Default source plan: local candidates first, then the remote URL
    pub fn source_plan(&self) -> SourcePlan {
        let mut plan = SourcePlan::new();

        for path in self.local_candidates() {
            plan.push(SourceDescriptor::local(path).with_sheet(self.sheet.clone()));
        }

        if let Some(url) = &self.remote_url {
            plan.push(SourceDescriptor::remote(url.clone()).with_sheet(self.sheet.clone()));
        }

        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = LoaderConfig::from_vars(|_| None);

        assert_eq!(config, LoaderConfig::default());
        assert_eq!(config.data_file, DEFAULT_DATA_FILE);
        assert!(config.remote_url.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = LoaderConfig::from_vars(lookup(&[
            (REMOTE_URL_ENV, " https://host/export?format=csv "),
            (DATA_FILE_ENV, "base.csv"),
            (REMOTE_TIMEOUT_ENV, "1m 30s"),
        ]));

        assert_eq!(config.remote_url.as_deref(), Some("https://host/export?format=csv"));
        assert_eq!(config.data_file, "base.csv");
        assert_eq!(config.remote_timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_invalid_timeout_is_ignored() {
        let config = LoaderConfig::from_vars(lookup(&[(REMOTE_TIMEOUT_ENV, "soon")]));
        assert!(config.remote_timeout.is_none());
    }

    #[test]
    fn test_blank_url_is_ignored() {
        let config = LoaderConfig::from_vars(lookup(&[(REMOTE_URL_ENV, "  ")]));
        assert!(config.remote_url.is_none());
    }

    #[test]
    fn test_source_plan_order() {
        let config = LoaderConfig {
            remote_url: Some("http://example/data.csv".to_string()),
            ..LoaderConfig::default()
        };
        let plan = config.source_plan();
        let sources = plan.sources();

        let last = sources.last().unwrap();
        assert_eq!(*last, SourceDescriptor::remote("http://example/data.csv"));
        assert_eq!(
            sources[sources.len() - 2],
            SourceDescriptor::local(Path::new("data").join(DEFAULT_DATA_FILE))
        );
        assert!(sources.len() <= 4);
    }
}
