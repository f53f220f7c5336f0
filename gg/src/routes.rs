//! HTTP route handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Html;
use tracing::debug;

use crate::render::{PageError, PageRenderer};
use crate::site::{self, PageData};

pub const INDEX_TEMPLATE: &str = "index.hbs";
pub const MENU_TEMPLATE: &str = "menu.hbs";
pub const CHECKOUT_TEMPLATE: &str = "checkout.hbs";
pub const PRODUCT_TEMPLATE: &str = "product.hbs";

/// Every page template served by the site
pub const PAGE_TEMPLATES: [&str; 4] = [INDEX_TEMPLATE, MENU_TEMPLATE, CHECKOUT_TEMPLATE, PRODUCT_TEMPLATE];

/// Shared request state
#[derive(Debug)]
pub struct AppState {
    pub renderer: PageRenderer,
    pub locale: String,
}

impl AppState {
    pub fn new(renderer: PageRenderer, locale: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            renderer,
            locale: locale.into(),
        })
    }
}

/// Render off the async workers; template reads and the registry lock block
async fn render_blocking(state: Arc<AppState>, template: &'static str, data: PageData) -> Result<Html<String>, PageError> {
    tokio::task::spawn_blocking(move || state.renderer.render_page(template, data))
        .await
        .map_err(|e| PageError::Render(format!("render task failed: {}", e)))?
}

pub async fn home_handler(State(state): State<Arc<AppState>>) -> Result<Html<String>, PageError> {
    debug!("home_handler: called");
    let data = site::home_page(&state.locale);
    render_blocking(state, INDEX_TEMPLATE, data).await
}

pub async fn menu_handler(State(state): State<Arc<AppState>>) -> Result<Html<String>, PageError> {
    debug!("menu_handler: called");
    let data = site::menu_page(&state.locale);
    render_blocking(state, MENU_TEMPLATE, data).await
}

pub async fn checkout_handler(State(state): State<Arc<AppState>>) -> Result<Html<String>, PageError> {
    debug!("checkout_handler: called");
    let data = site::checkout_page(&state.locale);
    render_blocking(state, CHECKOUT_TEMPLATE, data).await
}

pub async fn product_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Html<String>, PageError> {
    debug!(%slug, "product_handler: called");
    let data = site::product_page(&slug, &state.locale).ok_or(PageError::NotFound)?;
    render_blocking(state, PRODUCT_TEMPLATE, data).await
}
