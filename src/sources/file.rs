//! Source backed by an efetch XML file saved to disk.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::models::SearchQuery;
use crate::sources::{Source, SourceError};

/// Reads a `PubmedArticleSet` document from a file.
///
/// The query text and filters are not applied; the whole file is the result.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Source for FileSource {
    fn id(&self) -> &str {
        "file"
    }

    fn name(&self) -> &str {
        "Local XML file"
    }

    async fn fetch_documents(&self, query: &SearchQuery) -> Result<String, SourceError> {
        if !query.query.trim().is_empty() || !query.ids.is_empty() || query.year.is_some() {
            tracing::debug!(
                "Query filters are not applied to {}",
                self.path.display()
            );
        }

        match tokio::fs::read_to_string(&self.path).await {
            Ok(xml) => {
                tracing::debug!("Read {} bytes from {}", xml.len(), self.path.display());
                Ok(xml)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SourceError::NotFound(
                format!("input file {}", self.path.display()),
            )),
            Err(e) => Err(SourceError::Io(e)),
        }
    }
}
