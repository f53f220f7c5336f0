//! Template Cache
//!
//! Maps a template path to a parsed, renderable handlebars template.
//!
//! - **Development**: every render builds a fresh registry from the source,
//!   so edits and deletions on disk show up without a restart. The shared
//!   registry is left alone.
//! - **Production**: the registry is checked under a read lock first. On a miss
//!   the template is read and parsed without holding any lock, then inserted
//!   under the write lock. Concurrent misses on the same path may both parse;
//!   the last insert wins and both parses are equivalent.
//!
//! Nothing is ever evicted.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use handlebars::{Handlebars, Template};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TemplateCacheError;
use crate::helpers::register_helpers;
use crate::source::TemplateSource;

/// Environment variable selecting the cache mode
pub const MODE_ENV_VAR: &str = "APP_ENV";

/// Whether templates are reloaded on every render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Re-read and re-parse on every render
    #[default]
    Development,
    /// Parse once, serve from memory afterwards
    Production,
}

impl Mode {
    /// `"production"` (any case) selects production, anything else development
    pub fn from_env_value(value: Option<&str>) -> Self {
        debug!(?value, "Mode::from_env_value: called");
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("production") => Self::Production,
            _ => Self::Development,
        }
    }

    /// Read the mode from `APP_ENV`
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(MODE_ENV_VAR).ok().as_deref())
    }

    pub fn is_development(&self) -> bool {
        *self == Self::Development
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Counters describing how the cache has been used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Renders served from an already parsed template
    pub hits: u64,
    /// Renders that had to read and parse the template
    pub loads: u64,
}

/// Process-wide template cache backed by a handlebars registry
pub struct TemplateCache {
    registry: RwLock<Handlebars<'static>>,
    source: Arc<dyn TemplateSource>,
    mode: Mode,
    hits: AtomicU64,
    loads: AtomicU64,
}

impl TemplateCache {
    /// Build a registry with helpers and partials for the given source
    pub fn new(source: Arc<dyn TemplateSource>, mode: Mode) -> Result<Self, TemplateCacheError> {
        debug!(%mode, "TemplateCache::new: called");
        let hbs = new_registry(source.as_ref())?;

        info!("Template cache ready (mode: {})", mode);
        Ok(Self {
            registry: RwLock::new(hbs),
            source,
            mode,
            hits: AtomicU64::new(0),
            loads: AtomicU64::new(0),
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
        }
    }

    /// Whether `path` will be served without touching the source
    pub fn is_cached(&self, path: &str) -> bool {
        if self.mode.is_development() {
            return false;
        }
        self.read().map(|hbs| hbs.has_template(path)).unwrap_or(false)
    }

    /// Parse `path` without rendering it. In production the result is kept.
    pub fn prepare(&self, path: &str) -> Result<(), TemplateCacheError> {
        debug!(%path, "TemplateCache::prepare: called");
        if self.mode.is_development() {
            self.fresh_registry(path)?;
            return Ok(());
        }
        let template = self.fetch(path)?;
        self.write()?.register_template(path, template);
        Ok(())
    }

    /// Render the template at `path` with `data` as its binding
    pub fn render<T: Serialize>(&self, path: &str, data: &T) -> Result<String, TemplateCacheError> {
        debug!(%path, mode = %self.mode, "TemplateCache::render: called");

        if self.mode.is_development() {
            let hbs = self.fresh_registry(path)?;
            return render_registered(&hbs, path, data);
        }

        {
            let hbs = self.read()?;
            if hbs.has_template(path) {
                debug!(%path, "TemplateCache::render: cache hit");
                self.hits.fetch_add(1, Ordering::Relaxed);
                return render_registered(&hbs, path, data);
            }
        }
        debug!(%path, "TemplateCache::render: cache miss");

        self.prepare(path)?;
        let hbs = self.read()?;
        render_registered(&hbs, path, data)
    }

    /// Read and parse a template; no lock is held while doing so
    fn fetch(&self, path: &str) -> Result<Template, TemplateCacheError> {
        let text = self.source.load(path)?;
        self.loads.fetch_add(1, Ordering::Relaxed);
        debug!(%path, len = text.len(), "TemplateCache::fetch: loaded template text");

        Template::compile(&text).map_err(|e| TemplateCacheError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Registry holding only what is on the source right now, plus `path`
    fn fresh_registry(&self, path: &str) -> Result<Handlebars<'static>, TemplateCacheError> {
        let template = self.fetch(path)?;
        let mut hbs = new_registry(self.source.as_ref())?;
        hbs.register_template(path, template);
        Ok(hbs)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Handlebars<'static>>, TemplateCacheError> {
        self.registry
            .read()
            .map_err(|e| TemplateCacheError::Registry(format!("registry lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Handlebars<'static>>, TemplateCacheError> {
        self.registry
            .write()
            .map_err(|e| TemplateCacheError::Registry(format!("registry lock poisoned: {}", e)))
    }
}

impl fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateCache")
            .field("mode", &self.mode)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

fn new_registry(source: &dyn TemplateSource) -> Result<Handlebars<'static>, TemplateCacheError> {
    let mut hbs = Handlebars::new();
    hbs.set_strict_mode(false);
    register_helpers(&mut hbs);
    register_partials(&mut hbs, source)?;
    Ok(hbs)
}

fn register_partials(hbs: &mut Handlebars<'static>, source: &dyn TemplateSource) -> Result<(), TemplateCacheError> {
    for (name, text) in source.list_partials()? {
        debug!(%name, "register_partials: registering partial");
        hbs.register_partial(&name, text).map_err(|e| TemplateCacheError::Parse {
            path: format!("partials/{}", name),
            message: e.to_string(),
        })?;
    }
    Ok(())
}

fn render_registered<T: Serialize>(hbs: &Handlebars<'static>, path: &str, data: &T) -> Result<String, TemplateCacheError> {
    hbs.render(path, data).map_err(|e| TemplateCacheError::Render {
        path: path.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use serde_json::json;

    fn cache(source: MemorySource, mode: Mode) -> TemplateCache {
        TemplateCache::new(Arc::new(source), mode).unwrap()
    }

    #[test]
    fn test_mode_from_env_value() {
        assert_eq!(Mode::from_env_value(Some("production")), Mode::Production);
        assert_eq!(Mode::from_env_value(Some("PRODUCTION")), Mode::Production);
        assert_eq!(Mode::from_env_value(Some("development")), Mode::Development);
        assert_eq!(Mode::from_env_value(Some("staging")), Mode::Development);
        assert_eq!(Mode::from_env_value(None), Mode::Development);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Production.to_string(), "production");
        assert_eq!(Mode::Development.to_string(), "development");
    }

    #[test]
    fn test_render_with_binding() {
        let cache = cache(MemorySource::new().with("hi.hbs", "Hello {{name}}!"), Mode::Production);
        let out = cache.render("hi.hbs", &json!({"name": "Grill"})).unwrap();
        assert_eq!(out, "Hello Grill!");
    }

    #[test]
    fn test_production_memoizes() {
        let cache = cache(MemorySource::new().with("a.hbs", "a"), Mode::Production);
        assert!(!cache.is_cached("a.hbs"));

        cache.render("a.hbs", &json!({})).unwrap();
        cache.render("a.hbs", &json!({})).unwrap();

        assert!(cache.is_cached("a.hbs"));
        assert_eq!(cache.stats(), CacheStats { hits: 1, loads: 1 });
    }

    #[test]
    fn test_development_reloads() {
        let cache = cache(MemorySource::new().with("a.hbs", "a"), Mode::Development);

        cache.render("a.hbs", &json!({})).unwrap();
        cache.render("a.hbs", &json!({})).unwrap();

        assert!(!cache.is_cached("a.hbs"));
        assert_eq!(cache.stats(), CacheStats { hits: 0, loads: 2 });
    }

    #[test]
    fn test_development_prepare_leaves_registry_alone() {
        let cache = cache(MemorySource::new().with("a.hbs", "a"), Mode::Development);
        cache.prepare("a.hbs").unwrap();
        assert!(!cache.read().unwrap().has_template("a.hbs"));
    }

    #[test]
    fn test_missing_template() {
        let cache = cache(MemorySource::new(), Mode::Production);
        let err = cache.render("nope.hbs", &json!({})).unwrap_err();
        assert!(err.is_not_found());
        assert!(!cache.is_cached("nope.hbs"));
    }

    #[test]
    fn test_parse_error_is_not_cached() {
        let cache = cache(MemorySource::new().with("bad.hbs", "{{#if x}}open{{/each}}"), Mode::Production);
        let err = cache.render("bad.hbs", &json!({})).unwrap_err();
        assert!(matches!(err, TemplateCacheError::Parse { .. }));
        assert!(!cache.is_cached("bad.hbs"));
    }

    #[test]
    fn test_render_error_from_missing_partial() {
        let cache = cache(MemorySource::new().with("p.hbs", "{{> nowhere}}"), Mode::Production);
        let err = cache.render("p.hbs", &json!({})).unwrap_err();
        assert!(matches!(err, TemplateCacheError::Render { .. }));
    }

    #[test]
    fn test_partials_are_available() {
        let source = MemorySource::new()
            .with("partials/header.hbs", "<h1>{{site_name}}</h1>")
            .with("page.hbs", "{{> header}}<p>body</p>");
        let cache = cache(source, Mode::Production);

        let out = cache.render("page.hbs", &json!({"site_name": "Gourmet Grill"})).unwrap();
        assert_eq!(out, "<h1>Gourmet Grill</h1><p>body</p>");
    }

    #[test]
    fn test_helpers_are_registered() {
        let cache = cache(MemorySource::new().with("m.hbs", "{{money 3949}}"), Mode::Production);
        assert_eq!(cache.render("m.hbs", &json!({})).unwrap(), "$39.49");
    }

    #[test]
    fn test_html_is_escaped() {
        let cache = cache(MemorySource::new().with("e.hbs", "{{v}}"), Mode::Production);
        let out = cache.render("e.hbs", &json!({"v": "<script>"})).unwrap();
        assert_eq!(out, "&lt;script&gt;");
    }
}
