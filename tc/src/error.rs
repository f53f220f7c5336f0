//! Template cache error types

use thiserror::Error;

/// Errors that can occur while loading, parsing or rendering a template
#[derive(Debug, Error)]
pub enum TemplateCacheError {
    #[error("Template not found: {path}")]
    NotFound { path: String },

    #[error("Failed to read template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Template parsing error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Rendering error in {path}: {message}")]
    Render { path: String, message: String },

    #[error("Template registry error: {0}")]
    Registry(String),
}

impl TemplateCacheError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Template path the error refers to, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::NotFound { path } | Self::Io { path, .. } | Self::Parse { path, .. } | Self::Render { path, .. } => {
                Some(path)
            }
            Self::Registry(_) => None,
        }
    }
}
