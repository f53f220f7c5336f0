//! Integration tests for the HTTP surface
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot` against
//! the real templates shipped in the workspace.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Datelike, Utc};
use tempfile::TempDir;
use tower::ServiceExt;

use gourmetgrill::render::PageRenderer;
use gourmetgrill::routes::AppState;
use gourmetgrill::server::build_router;
use templatecache::{FsSource, Mode, TemplateCache, TemplateCacheError, TemplateSource};

fn workspace_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join(name)
}

/// Wraps a filesystem source and counts reads per request
struct CountingSource {
    inner: FsSource,
    reads: AtomicUsize,
}

impl TemplateSource for CountingSource {
    fn load(&self, path: &str) -> Result<String, TemplateCacheError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(path)
    }

    fn list_partials(&self) -> Result<Vec<(String, String)>, TemplateCacheError> {
        self.inner.list_partials()
    }
}

fn router_for(source: Arc<dyn TemplateSource>, mode: Mode) -> Router {
    let cache = TemplateCache::new(source, mode).expect("template cache");
    let renderer = PageRenderer::new(Arc::new(cache), "Gourmet Grill");
    let state = AppState::new(renderer, "en");
    build_router(state, &workspace_dir("static"), &workspace_dir("public/snapshots"))
}

fn site_router(mode: Mode) -> Router {
    router_for(Arc::new(FsSource::new(workspace_dir("templates"))), mode)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8_lossy(&bytes).into_owned())
}

/// Copy the shipped templates into a temp dir so tests can break them
fn scratch_templates() -> TempDir {
    let dir = TempDir::new().unwrap();
    let src = workspace_dir("templates");
    std::fs::create_dir_all(dir.path().join("partials")).unwrap();
    for sub in ["", "partials"] {
        for entry in std::fs::read_dir(src.join(sub)).unwrap() {
            let entry = entry.unwrap();
            if entry.file_type().unwrap().is_file() {
                std::fs::copy(entry.path(), dir.path().join(sub).join(entry.file_name())).unwrap();
            }
        }
    }
    dir
}

// =============================================================================
// Pages
// =============================================================================

#[tokio::test]
async fn test_pages_render_html() {
    let app = site_router(Mode::Production);

    for uri in ["/", "/menu", "/checkout", "/product/classic-ribeye"] {
        let (status, content_type, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri} returned {status}: {body}");
        assert!(
            content_type.as_deref().is_some_and(|ct| ct.starts_with("text/html")),
            "{uri} content type was {content_type:?}"
        );
        assert!(body.contains("<!DOCTYPE html>"));
    }
}

#[tokio::test]
async fn test_home_page_content() {
    let app = site_router(Mode::Production);
    let (_, _, body) = get(&app, "/").await;

    assert!(body.contains("<title>Gourmet Grill | Best Steaks in Town</title>"));
    assert!(body.contains("Experience Culinary Excellence"));
    assert!(body.contains("Signature Steaks"));
    assert!(body.contains("Craft Cocktails"));
}

#[tokio::test]
async fn test_menu_page_content() {
    let app = site_router(Mode::Production);
    let (_, _, body) = get(&app, "/menu").await;

    assert!(body.contains("Classic Ribeye"));
    assert!(body.contains("$34.99"));
    assert!(body.contains("Atlantic Salmon"));
    assert!(body.contains("Large Cut (+$8.00)"));
    assert!(body.contains("Truffle Butter (+$4.50)"));
    assert!(body.contains("Add to Cart"));
}

#[tokio::test]
async fn test_checkout_total() {
    let app = site_router(Mode::Production);
    let (_, _, body) = get(&app, "/checkout").await;

    assert!(body.contains("Medium Rare"));
    assert!(body.contains(r#"<th class="total">$39.49</th>"#));
}

#[tokio::test]
async fn test_globals_in_output() {
    let app = site_router(Mode::Development);
    let (_, _, body) = get(&app, "/checkout").await;

    let year = Utc::now().year().to_string();
    assert!(body.contains(&format!("&copy; {year} Gourmet Grill")));
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let app = site_router(Mode::Production);
    let (status, _, body) = get(&app, "/product/veggie-burger").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Not found");
}

// =============================================================================
// Failure modes
// =============================================================================

#[tokio::test]
async fn test_missing_template_is_404() {
    let dir = scratch_templates();
    std::fs::remove_file(dir.path().join("menu.hbs")).unwrap();
    let app = router_for(Arc::new(FsSource::new(dir.path())), Mode::Production);

    let (status, content_type, body) = get(&app, "/menu").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(content_type.is_some_and(|ct| ct.starts_with("text/plain")));
    assert_eq!(body, "Template not found: menu.hbs");

    // Other pages are unaffected
    let (status, _, _) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_template_is_500() {
    let dir = scratch_templates();
    std::fs::write(dir.path().join("checkout.hbs"), "{{#each cart_items}}{{/if}}").unwrap();
    let app = router_for(Arc::new(FsSource::new(dir.path())), Mode::Production);

    let (status, _, body) = get(&app, "/checkout").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Template parsing error: "), "body was {body}");
}

#[tokio::test]
async fn test_unreadable_template_is_500() {
    let dir = scratch_templates();
    std::fs::remove_file(dir.path().join("menu.hbs")).unwrap();
    std::fs::create_dir(dir.path().join("menu.hbs")).unwrap();
    let app = router_for(Arc::new(FsSource::new(dir.path())), Mode::Production);

    let (status, content_type, body) = get(&app, "/menu").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(content_type.is_some_and(|ct| ct.starts_with("text/plain")));
    assert!(body.starts_with("Rendering error: "), "body was {body}");
}

#[tokio::test]
async fn test_checkout_has_no_dangling_form() {
    let app = site_router(Mode::Production);
    let (_, _, body) = get(&app, "/checkout").await;

    assert!(!body.contains("method=\"post\""));
    assert!(body.contains(r#"<a class="button" href="/menu">Continue Shopping</a>"#));
}

// =============================================================================
// Cache modes
// =============================================================================

#[tokio::test]
async fn test_production_reads_template_once() {
    let source = Arc::new(CountingSource {
        inner: FsSource::new(workspace_dir("templates")),
        reads: AtomicUsize::new(0),
    });
    let app = router_for(source.clone(), Mode::Production);

    assert_eq!(get(&app, "/menu").await.0, StatusCode::OK);
    assert_eq!(get(&app, "/menu").await.0, StatusCode::OK);
    assert_eq!(source.reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_development_reads_template_every_request() {
    let dir = scratch_templates();
    let source = Arc::new(CountingSource {
        inner: FsSource::new(dir.path()),
        reads: AtomicUsize::new(0),
    });
    let app = router_for(source.clone(), Mode::Development);

    assert_eq!(get(&app, "/menu").await.0, StatusCode::OK);
    std::fs::write(dir.path().join("menu.hbs"), "edited {{site_name}}").unwrap();
    let (status, _, body) = get(&app, "/menu").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "edited Gourmet Grill");
    assert_eq!(source.reads.load(Ordering::SeqCst), 2);
}

// =============================================================================
// Static files
// =============================================================================

#[tokio::test]
async fn test_static_files_are_served() {
    let app = site_router(Mode::Production);
    let (status, content_type, body) = get(&app, "/static/css/site.css").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.is_some_and(|ct| ct.starts_with("text/css")));
    assert!(body.contains(".site-header"));
}

#[tokio::test]
async fn test_missing_static_file_is_404() {
    let app = site_router(Mode::Production);
    let (status, _, _) = get(&app, "/static/nope.js").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
