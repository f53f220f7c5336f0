//! Template sources
//!
//! A source hands out raw template text by relative path. The cache decides
//! when to ask for it again.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use crate::error::TemplateCacheError;

/// Directory (relative to the source root) holding partial templates
pub const PARTIALS_DIR: &str = "partials";

/// File extension for templates and partials
pub const TEMPLATE_EXT: &str = "hbs";

/// Where template text comes from
pub trait TemplateSource: Send + Sync {
    /// Read the raw text of the template at `path`
    fn load(&self, path: &str) -> Result<String, TemplateCacheError>;

    /// List every partial as `(name, text)`
    fn list_partials(&self) -> Result<Vec<(String, String)>, TemplateCacheError>;
}

/// Reads templates from a directory on disk
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        debug!(?root, "FsSource::new: called");
        Self { root }
    }

    /// Resolve a request path below the root, refusing anything that escapes it
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        let mut named = false;
        for component in relative.components() {
            match component {
                Component::Normal(_) => named = true,
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    warn!(%path, "FsSource::resolve: rejected path outside template root");
                    return None;
                }
            }
        }

        if named {
            Some(self.root.join(relative))
        } else {
            warn!(%path, "FsSource::resolve: path names no file");
            None
        }
    }
}

impl TemplateSource for FsSource {
    fn load(&self, path: &str) -> Result<String, TemplateCacheError> {
        debug!(%path, "FsSource::load: called");
        let full = self.resolve(path).ok_or_else(|| TemplateCacheError::NotFound {
            path: path.to_string(),
        })?;

        std::fs::read_to_string(&full).map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                debug!(?full, "FsSource::load: file not found");
                TemplateCacheError::NotFound {
                    path: path.to_string(),
                }
            }
            _ => TemplateCacheError::Io {
                path: path.to_string(),
                source: e,
            },
        })
    }

    fn list_partials(&self) -> Result<Vec<(String, String)>, TemplateCacheError> {
        let dir = self.root.join(PARTIALS_DIR);
        if !dir.is_dir() {
            debug!(?dir, "FsSource::list_partials: no partials directory");
            return Ok(Vec::new());
        }

        let pattern = format!(
            "{}/*.{}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            TEMPLATE_EXT
        );
        let entries = glob::glob(&pattern).map_err(|e| TemplateCacheError::Registry(e.to_string()))?;

        let mut partials = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| TemplateCacheError::Registry(e.to_string()))?;
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let text = std::fs::read_to_string(&path).map_err(|source| TemplateCacheError::Io {
                path: path.display().to_string(),
                source,
            })?;
            partials.push((name, text));
        }

        partials.sort_by(|a, b| a.0.cmp(&b.0));
        debug!(count = partials.len(), "FsSource::list_partials: loaded partials");
        Ok(partials)
    }
}

/// In-memory templates keyed by path; partials live under `partials/<name>.hbs`
#[derive(Debug, Default)]
pub struct MemorySource {
    templates: RwLock<HashMap<String, String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a template
    pub fn insert(&self, path: impl Into<String>, text: impl Into<String>) {
        if let Ok(mut templates) = self.templates.write() {
            templates.insert(path.into(), text.into());
        }
    }

    pub fn with(self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }
}

impl TemplateSource for MemorySource {
    fn load(&self, path: &str) -> Result<String, TemplateCacheError> {
        let templates = self
            .templates
            .read()
            .map_err(|e| TemplateCacheError::Registry(e.to_string()))?;
        templates.get(path).cloned().ok_or_else(|| TemplateCacheError::NotFound {
            path: path.to_string(),
        })
    }

    fn list_partials(&self) -> Result<Vec<(String, String)>, TemplateCacheError> {
        let templates = self
            .templates
            .read()
            .map_err(|e| TemplateCacheError::Registry(e.to_string()))?;
        let prefix = format!("{}/", PARTIALS_DIR);
        let suffix = format!(".{}", TEMPLATE_EXT);

        let mut partials: Vec<(String, String)> = templates
            .iter()
            .filter_map(|(path, text)| {
                let name = path.strip_prefix(&prefix)?.strip_suffix(&suffix)?;
                Some((name.to_string(), text.clone()))
            })
            .collect();
        partials.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(partials)
    }
}
