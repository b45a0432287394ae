//! Troubleshooting report for when nothing loads

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use sl_data::LoaderConfig;

#[derive(Debug, Serialize)]
pub struct CandidatePath {
    pub path: PathBuf,
    pub exists: bool,
}

/// Where the loader looked and what the working directory holds
#[derive(Debug, Serialize)]
pub struct Diagnostics {
    pub remote_url: Option<String>,
    pub candidates: Vec<CandidatePath>,
    pub cwd: Option<PathBuf>,
    /// Files in the working directory, or the error listing it
    pub cwd_files: Result<Vec<String>, String>,
}

impl Diagnostics {
    pub fn collect(config: &LoaderConfig) -> Self {
        let candidates = config
            .local_candidates()
            .into_iter()
            .map(|path| CandidatePath {
                exists: path.is_file(),
                path,
            })
            .collect();

        let cwd = std::env::current_dir().ok();
        let cwd_files = match &cwd {
            Some(dir) => list_files(dir),
            None => Err("working directory unavailable".to_string()),
        };

        Self {
            remote_url: config.remote_url.clone(),
            candidates,
            cwd,
            cwd_files,
        }
    }
}

fn list_files(dir: &std::path::Path) -> Result<Vec<String>, String> {
    let entries = std::fs::read_dir(dir).map_err(|e| e.to_string())?;
    let mut files: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    Ok(files)
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Remote URL in use: {}", self.remote_url.as_deref().unwrap_or("(empty)"))?;
        writeln!(f, "Local paths checked:")?;
        for candidate in &self.candidates {
            let mark = if candidate.exists { "found" } else { "missing" };
            writeln!(f, "  {} [{}]", candidate.path.display(), mark)?;
        }
        match &self.cwd {
            Some(cwd) => writeln!(f, "Working directory: {}", cwd.display())?,
            None => writeln!(f, "Working directory: (unknown)")?,
        }
        match &self.cwd_files {
            Ok(files) if files.is_empty() => writeln!(f, "Files in working directory: (none)"),
            Ok(files) => writeln!(f, "Files in working directory: {}", files.join(", ")),
            Err(e) => writeln!(f, "Files in working directory: (could not list: {})", e),
        }
    }
}
