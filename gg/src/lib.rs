//! Gourmet Grill - server-rendered restaurant site
//!
//! A handful of routes render handlebars templates from literal site data.
//! Templates go through a shared [`templatecache::TemplateCache`] that reloads
//! on every request in development and memoizes in production.
//!
//! # Modules
//!
//! - [`site`] - Hardcoded page content (hero, categories, products, cart)
//! - [`render`] - Global injection and error-to-response mapping
//! - [`routes`] - Page handlers
//! - [`server`] - Router, static files and graceful shutdown
//! - [`publish`] - Static snapshots of every page
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod publish;
pub mod render;
pub mod routes;
pub mod server;
pub mod site;

// Re-export commonly used types
pub use config::Config;
pub use publish::{Snapshot, publish};
pub use render::{PageError, PageRenderer};
pub use routes::AppState;
pub use server::{build_router, build_state, serve};
