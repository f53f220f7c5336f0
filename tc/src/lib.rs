//! TemplateCache - handlebars templates with a development/production cache
//!
//! Templates are read from a [`TemplateSource`] by relative path and rendered
//! through a shared handlebars registry.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use templatecache::{FsSource, Mode, TemplateCache};
//!
//! let cache = TemplateCache::new(Arc::new(FsSource::new("templates")), Mode::from_env())?;
//! let html = cache.render("index.hbs", &serde_json::json!({ "title": "Home" }))?;
//! ```

pub mod cache;
pub mod error;
pub mod helpers;
pub mod source;

pub use cache::{CacheStats, MODE_ENV_VAR, Mode, TemplateCache};
pub use error::TemplateCacheError;
pub use source::{FsSource, MemorySource, PARTIALS_DIR, TEMPLATE_EXT, TemplateSource};
