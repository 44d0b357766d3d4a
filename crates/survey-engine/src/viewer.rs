use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ViewerError;

/// A document returned by the results service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content_type: String,
    pub body: String,
}

impl Document {
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            content_type: "text/html".to_string(),
            body: body.into(),
        }
    }
}

/// Surface that shows a fetched document to the user.
pub trait DocumentViewer: Send + Sync {
    fn open(&self, document: &Document) -> Result<(), ViewerError>;
}

/// Writes the document to `<dir>/<catalog-id>-results.html`.
#[derive(Debug, Clone)]
pub struct FileViewer {
    dir: PathBuf,
    file_name: String,
}

impl FileViewer {
    pub fn new(dir: impl Into<PathBuf>, catalog_id: &str) -> Self {
        Self {
            dir: dir.into(),
            file_name: format!("{catalog_id}-results.html"),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DocumentViewer for FileViewer {
    fn open(&self, document: &Document) -> Result<(), ViewerError> {
        if !self.dir.is_dir() {
            return Err(ViewerError::Unavailable(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }
        let path = self.path();
        fs::write(&path, &document.body).map_err(|source| ViewerError::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "results document written");
        Ok(())
    }
}
