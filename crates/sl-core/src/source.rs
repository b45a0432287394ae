//! Source descriptors naming where a dataset may be loaded from

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Extensions read with the workbook reader
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Extensions read with the delimited-text reader
const DELIMITED_EXTENSIONS: &[&str] = &["csv", "txt"];

/// Where the bytes of a dataset come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceLocation {
    /// A file on the local filesystem
    LocalPath { path: PathBuf },
    /// Bytes supplied interactively, with the name they were uploaded under
    Upload {
        name: String,
        #[serde(skip)]
        bytes: Arc<Vec<u8>>,
    },
    /// A URL returning the dataset
    Remote { url: String },
}

/// How the bytes of a dataset are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Comma separated text, with a semicolon fallback
    Delimited,
    /// Multi-sheet workbook with typed cells
    Spreadsheet,
}

impl SourceFormat {
    /// Map a file extension (without the dot, any case) onto a format
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            Some(SourceFormat::Spreadsheet)
        } else if DELIMITED_EXTENSIONS.contains(&ext.as_str()) {
            Some(SourceFormat::Delimited)
        } else {
            None
        }
    }
}

/// Which sheet of a workbook to read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetSelector {
    Index(usize),
    Name(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

impl SheetSelector {
    /// Parse a selector: all-digit input is an index, anything else a name
    pub fn parse(value: &str) -> Self {
        match value.trim().parse::<usize>() {
            Ok(idx) => SheetSelector::Index(idx),
            Err(_) => SheetSelector::Name(value.to_string()),
        }
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Index(idx) => write!(f, "#{}", idx),
            SheetSelector::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// One place a dataset may be loaded from, plus its format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDescriptor {
    pub location: SourceLocation,
    /// Declared format; sniffed from the extension when absent
    pub format: Option<SourceFormat>,
    /// Sheet to read for workbook sources
    pub sheet: SheetSelector,
}

impl SourceDescriptor {
    fn with_location(location: SourceLocation) -> Self {
        Self {
            location,
            format: None,
            sheet: SheetSelector::default(),
        }
    }

    /// A local file path
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::with_location(SourceLocation::LocalPath { path: path.into() })
    }

    /// An uploaded byte buffer
    pub fn upload(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::with_location(SourceLocation::Upload {
            name: name.into(),
            bytes: Arc::new(bytes),
        })
    }

    /// A remote URL
    pub fn remote(url: impl Into<String>) -> Self {
        Self::with_location(SourceLocation::Remote { url: url.into() })
    }

    /// Declare the format instead of sniffing it
    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Select the workbook sheet
    pub fn with_sheet(mut self, sheet: SheetSelector) -> Self {
        self.sheet = sheet;
        self
    }

    /// Lower-cased extension of the path, upload name or URL path
    pub fn extension(&self) -> Option<String> {
        let name = match &self.location {
            SourceLocation::LocalPath { path } => {
                return path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_ascii_lowercase());
            }
            SourceLocation::Upload { name, .. } => name.as_str(),
            SourceLocation::Remote { url } => strip_query(url),
        };
        let file = name.rsplit('/').next().unwrap_or(name);
        Path::new(file)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Format used to read this source.
    ///
    /// A declared format always wins. Otherwise the extension decides;
    /// uploads and remote URLs with no recognised extension are read as
    /// delimited text, local paths with one return `None`.
    pub fn resolved_format(&self) -> Option<SourceFormat> {
        if let Some(format) = self.format {
            return Some(format);
        }
        let sniffed = self.extension().and_then(|ext| SourceFormat::from_extension(&ext));
        match &self.location {
            SourceLocation::LocalPath { .. } => sniffed,
            SourceLocation::Upload { .. } | SourceLocation::Remote { .. } => {
                Some(sniffed.unwrap_or(SourceFormat::Delimited))
            }
        }
    }

    /// Short human readable name
    pub fn display_name(&self) -> String {
        match &self.location {
            SourceLocation::LocalPath { path } => path.display().to_string(),
            SourceLocation::Upload { name, .. } => format!("upload '{}'", name),
            SourceLocation::Remote { url } => url.clone(),
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}
