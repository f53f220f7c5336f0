//! Page rendering
//!
//! Adds the site-wide globals to a page payload and hands it to the template
//! cache. Failures map onto plain-text HTTP responses.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::{Datelike, Utc};
use serde_json::Value;
use templatecache::{TemplateCache, TemplateCacheError};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::site::PageData;

/// Errors surfaced to the client while producing a page
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Not found")]
    NotFound,

    #[error("Template parsing error: {0}")]
    Parse(String),

    #[error("Rendering error: {0}")]
    Render(String),
}

impl PageError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::TemplateNotFound(_) | Self::NotFound => StatusCode::NOT_FOUND,
            Self::Parse(_) | Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TemplateCacheError> for PageError {
    fn from(err: TemplateCacheError) -> Self {
        debug!(path = ?err.path(), "PageError::from: {}", err);
        match err {
            TemplateCacheError::NotFound { path } => Self::TemplateNotFound(path),
            TemplateCacheError::Parse { message, .. } => Self::Parse(message),
            TemplateCacheError::Render { message, .. } => Self::Render(message),
            other @ (TemplateCacheError::Io { .. } | TemplateCacheError::Registry(_)) => Self::Render(other.to_string()),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, "Page failed: {}", self);
        } else {
            warn!(%status, "Page failed: {}", self);
        }

        (status, self.to_string()).into_response()
    }
}

/// Renders pages through the shared template cache
#[derive(Debug, Clone)]
pub struct PageRenderer {
    cache: Arc<TemplateCache>,
    site_name: String,
}

impl PageRenderer {
    pub fn new(cache: Arc<TemplateCache>, site_name: impl Into<String>) -> Self {
        Self {
            cache,
            site_name: site_name.into(),
        }
    }

    /// Render `path` with `data` plus the `current_year` and `site_name` globals
    pub fn render(&self, path: &str, data: PageData) -> Result<String, PageError> {
        debug!(%path, keys = data.len(), "PageRenderer::render: called");
        let bindings = self.bindings(data);
        Ok(self.cache.render(path, &bindings)?)
    }

    /// Same as [`render`](Self::render), wrapped as an HTML response body
    pub fn render_page(&self, path: &str, data: PageData) -> Result<Html<String>, PageError> {
        self.render(path, data).map(Html)
    }

    fn bindings(&self, mut data: PageData) -> Value {
        data.insert("current_year".to_string(), Value::from(Utc::now().year()));
        data.insert("site_name".to_string(), Value::String(self.site_name.clone()));
        Value::Object(data)
    }
}
