//! Static snapshots
//!
//! Renders every public page to HTML files under
//! `<snapshots>/<snapshot-id>/` so the site can be served without templates.
//!
//! ```text
//! public/snapshots/
//! └── 2026-10-16T09-30-00-000Z/
//!     ├── index.html
//!     ├── menu/index.html
//!     ├── product/classic-ribeye/index.html
//!     └── static/...
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use eyre::{Context, Result, eyre};
use templatecache::{FsSource, Mode, TemplateCache};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::Config;
use crate::render::PageRenderer;
use crate::routes::{INDEX_TEMPLATE, MENU_TEMPLATE, PRODUCT_TEMPLATE};
use crate::site::{self, PageData};

/// A page to write into a snapshot
#[derive(Debug, Clone)]
pub struct SnapshotPage {
    pub template: &'static str,
    pub data: PageData,
    /// Output path relative to the snapshot directory
    pub path: PathBuf,
}

/// Result of a publish run
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: String,
    pub dir: PathBuf,
    /// Written pages, relative to `dir`
    pub pages: Vec<PathBuf>,
    /// Number of static files copied
    pub static_files: usize,
}

impl Snapshot {
    /// URL of the snapshot's home page when served under `/snapshots`
    pub fn index_url(&self) -> String {
        format!("/snapshots/{}/index.html", self.id)
    }
}

/// Snapshot id from a timestamp: ISO 8601 with `:` and `.` replaced by `-`
pub fn snapshot_id(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true).replace([':', '.'], "-")
}

/// Home, menu and one page per product
pub fn snapshot_pages(locale: &str) -> Vec<SnapshotPage> {
    let mut pages = vec![
        SnapshotPage {
            template: INDEX_TEMPLATE,
            data: site::home_page(locale),
            path: PathBuf::from("index.html"),
        },
        SnapshotPage {
            template: MENU_TEMPLATE,
            data: site::menu_page(locale),
            path: PathBuf::from("menu").join("index.html"),
        },
    ];

    for product in site::products() {
        if let Some(data) = site::product_page(&product.slug, locale) {
            pages.push(SnapshotPage {
                template: PRODUCT_TEMPLATE,
                data,
                path: PathBuf::from("product").join(&product.slug).join("index.html"),
            });
        }
    }

    pages
}

/// Publish a snapshot using the configured directories
pub fn publish(config: &Config) -> Result<Snapshot> {
    // Snapshots always parse each template once
    let source = Arc::new(FsSource::new(&config.paths.templates));
    let cache = TemplateCache::new(source, Mode::Production)
        .context(format!("Failed to load templates from {}", config.paths.templates.display()))?;
    let renderer = PageRenderer::new(Arc::new(cache), config.site.name.clone());

    publish_to(
        &renderer,
        &snapshot_pages(&config.site.locale),
        &config.paths.snapshots,
        Some(&config.paths.static_dir),
        &snapshot_id(Utc::now()),
    )
}

/// Render `pages` into `<out_root>/<id>/` and copy `static_dir` alongside
pub fn publish_to(
    renderer: &PageRenderer,
    pages: &[SnapshotPage],
    out_root: &Path,
    static_dir: Option<&Path>,
    id: &str,
) -> Result<Snapshot> {
    let dir = out_root.join(id);
    if dir.exists() {
        return Err(eyre!("Snapshot directory already exists: {}", dir.display()));
    }
    fs::create_dir_all(&dir).context(format!("Failed to create {}", dir.display()))?;
    info!("Publishing snapshot {} to {}", id, dir.display());

    let mut written = Vec::with_capacity(pages.len());
    for page in pages {
        debug!(template = page.template, path = ?page.path, "publish_to: rendering page");
        let html = renderer
            .render(page.template, page.data.clone())
            .map_err(|e| eyre!("Failed to render {}: {}", page.template, e))?;

        let full = dir.join(&page.path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).context(format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&full, html).context(format!("Failed to write {}", full.display()))?;
        written.push(page.path.clone());
    }

    let static_files = match static_dir {
        Some(src) if src.is_dir() => copy_tree(src, &dir.join("static"))?,
        _ => 0,
    };

    Ok(Snapshot {
        id: id.to_string(),
        dir,
        pages: written,
        static_files,
    })
}

/// Copy every file under `src` into `dst`, keeping the layout
fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(src) {
        let entry = entry.context(format!("Failed to walk {}", src.display()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .context("Walked outside the static directory")?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).context(format!("Failed to create {}", target.display()))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).context(format!("Failed to copy {}", entry.path().display()))?;
            copied += 1;
        }
    }
    debug!(copied, "copy_tree: done");
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use templatecache::MemorySource;
    use tempfile::TempDir;

    fn renderer() -> PageRenderer {
        let source = MemorySource::new()
            .with(INDEX_TEMPLATE, "<h1>{{hero.title}}</h1>")
            .with(MENU_TEMPLATE, "{{#each products}}{{name}};{{/each}}")
            .with(PRODUCT_TEMPLATE, "<h1>{{product.name}}</h1>");
        let cache = TemplateCache::new(Arc::new(source), Mode::Production).unwrap();
        PageRenderer::new(Arc::new(cache), "Gourmet Grill")
    }

    #[test]
    fn test_snapshot_id_format() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 5).unwrap();
        assert_eq!(snapshot_id(at), "2026-10-16T09-30-05-000Z");
    }

    #[test]
    fn test_snapshot_pages_cover_every_product() {
        let pages = snapshot_pages("en");
        assert_eq!(pages.len(), 2 + site::products().len());
        assert!(
            pages
                .iter()
                .any(|p| p.path == PathBuf::from("product/atlantic-salmon/index.html"))
        );
    }

    #[test]
    fn test_publish_writes_pages_and_static() {
        let out = TempDir::new().unwrap();
        let static_dir = TempDir::new().unwrap();
        fs::create_dir_all(static_dir.path().join("css")).unwrap();
        fs::write(static_dir.path().join("css").join("site.css"), "body{}").unwrap();

        let snapshot = publish_to(
            &renderer(),
            &snapshot_pages("en"),
            out.path(),
            Some(static_dir.path()),
            "snap-1",
        )
        .unwrap();

        assert_eq!(snapshot.pages.len(), 4);
        assert_eq!(snapshot.static_files, 1);
        assert_eq!(snapshot.index_url(), "/snapshots/snap-1/index.html");

        let index = fs::read_to_string(snapshot.dir.join("index.html")).unwrap();
        assert_eq!(index, "<h1>Experience Culinary Excellence</h1>");
        let menu = fs::read_to_string(snapshot.dir.join("menu/index.html")).unwrap();
        assert_eq!(menu, "Classic Ribeye;Atlantic Salmon;");
        assert!(snapshot.dir.join("product/classic-ribeye/index.html").exists());
        assert!(snapshot.dir.join("static/css/site.css").exists());
    }

    #[test]
    fn test_publish_refuses_existing_snapshot() {
        let out = TempDir::new().unwrap();
        fs::create_dir_all(out.path().join("taken")).unwrap();

        let result = publish_to(&renderer(), &snapshot_pages("en"), out.path(), None, "taken");
        assert!(result.is_err());
    }

    #[test]
    fn test_publish_fails_on_missing_template() {
        let out = TempDir::new().unwrap();
        let cache = TemplateCache::new(Arc::new(MemorySource::new()), Mode::Production).unwrap();
        let renderer = PageRenderer::new(Arc::new(cache), "Gourmet Grill");

        let err = publish_to(&renderer, &snapshot_pages("en"), out.path(), None, "s").unwrap_err();
        assert!(err.to_string().contains("index.hbs"));
    }
}
