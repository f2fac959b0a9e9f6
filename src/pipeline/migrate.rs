// Image migration: scan → download → upload → rewrite → report

use super::{reserve_stored_paths, transfer_assets, RunOptions, RunReport};
use crate::assets::{AssetCatalog, CdnMatcher};
use crate::content::{load_documents, rewrite_urls, ContentFile};
use crate::storage::ObjectStore;
use crate::types::ContentCategory;
use reqwest::Client;
use tracing::{info, warn};

/// Move every legacy CDN image referenced by the selected content into
/// object storage and point the content at the new URLs.
///
/// With `options.dry_run` set, or without a store, only the scan runs and
/// nothing is downloaded, uploaded or written.
pub async fn run_migration(
    options: &RunOptions,
    client: &Client,
    store: Option<&dyn ObjectStore>,
) -> anyhow::Result<RunReport> {
    let matcher = CdnMatcher::new(options.cdn_hosts.as_slice())?;
    let mut report = RunReport::default();

    let scan = load_documents(&options.content_dir, &options.categories).await;
    for err in scan.errors {
        report.record(err);
    }
    let files = scan.files;
    report.documents = files.len();

    let mut catalog = AssetCatalog::new();
    if let Some(store) = store {
        reserve_stored_paths(&mut catalog, files.iter().map(|f| f.text.as_str()), store)?;
    }
    scan_assets(&mut catalog, &files, &matcher);
    report.found = catalog.len();
    info!(documents = files.len(), assets = catalog.len(), "Scan complete");

    for category in &options.categories {
        let count = count_by_category(&catalog, *category);
        if count > 0 {
            info!(category = %category, assets = count, "Assets found");
        }
    }

    let store = match store {
        Some(store) if !options.dry_run => store,
        _ => {
            for asset in catalog.assets() {
                info!(source = %asset.source_url, target = %asset.storage_path, "Would migrate");
            }
            return Ok(report);
        }
    };

    let map = transfer_assets(catalog.into_assets(), client, store, &mut report).await;
    if map.is_empty() {
        warn!("No assets were uploaded, leaving content untouched");
        return Ok(report);
    }

    for file in &files {
        let rewrite = rewrite_urls(&file.text, &map);
        if !rewrite.changed() {
            continue;
        }
        match file.write(&rewrite.text).await {
            Ok(()) => {
                report.modified += 1;
                info!(path = %file.path.display(), replacements = rewrite.replacements, "Rewrote document");
            }
            Err(e) => report.record(e),
        }
    }

    Ok(report)
}

/// Add every CDN URL in `files` to `catalog`, in document order.
pub fn scan_assets(catalog: &mut AssetCatalog, files: &[ContentFile], matcher: &CdnMatcher) {
    for file in files {
        for url in matcher.find_urls(&file.text) {
            catalog.add(&url, file.category);
        }
    }
}

/// Number of assets per category in a catalog.
pub fn count_by_category(catalog: &AssetCatalog, category: ContentCategory) -> usize {
    catalog.assets().iter().filter(|a| a.category == category).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::path::PathBuf;

    fn file(category: ContentCategory, name: &str, text: &str) -> ContentFile {
        ContentFile {
            path: PathBuf::from(format!("content/{}/{}", category.as_str(), name)),
            category,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_scan_assets_across_categories() {
        let matcher = CdnMatcher::with_default_hosts().unwrap();
        let files = vec![
            file(
                ContentCategory::Blog,
                "a.mdx",
                "![](https://cdn.prod.website-files.com/x/1_photo.jpg) ![](https://cdn.prod.website-files.com/x/2_photo.jpg)",
            ),
            file(
                ContentCategory::Features,
                "b.mdx",
                "![](https://cdn.prod.website-files.com/x/1_photo.jpg) ![](https://cdn.prod.website-files.com/x/3_icon.svg)",
            ),
        ];

        let mut catalog = AssetCatalog::new();
        scan_assets(&mut catalog, &files, &matcher);

        assert_eq!(catalog.len(), 3);
        assert_eq!(count_by_category(&catalog, ContentCategory::Blog), 2);
        assert_eq!(count_by_category(&catalog, ContentCategory::Features), 1);
        let paths: Vec<&str> = catalog.assets().iter().map(|a| a.storage_path.as_str()).collect();
        assert_eq!(paths, vec!["blog/photo.jpg", "blog/photo-1.jpg", "features/icon.svg"]);
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let blog = dir.path().join("blog");
        std::fs::create_dir_all(&blog).unwrap();
        let text = "---\nimage: https://cdn.prod.website-files.com/x/1_cover.jpg\n---\nbody\n";
        std::fs::write(blog.join("post.mdx"), text).unwrap();

        let mut options = RunOptions::new(dir.path());
        options.dry_run = true;
        let store = MemoryStore::new("https://storage.test");

        let report = run_migration(&options, &Client::new(), Some(&store)).await.unwrap();

        assert_eq!(report.documents, 1);
        assert_eq!(report.found, 1);
        assert_eq!(report.downloaded, 0);
        assert!(store.paths().await.is_empty());
        assert_eq!(std::fs::read_to_string(blog.join("post.mdx")).unwrap(), text);
    }

    #[tokio::test]
    async fn test_existing_storage_objects_are_not_overwritten() {
        let mut cdn = mockito::Server::new_async().await;
        cdn.mock("GET", "/x/9_photo.jpg")
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body("new")
            .create_async()
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let blog = dir.path().join("blog");
        std::fs::create_dir_all(&blog).unwrap();
        std::fs::write(blog.join("old.mdx"), "![Old](https://storage.test/blog/photo.jpg)\n").unwrap();
        std::fs::write(
            blog.join("new.mdx"),
            format!("![New](http://{}/x/9_photo.jpg)\n", cdn.host_with_port()),
        )
        .unwrap();

        let mut options = RunOptions::new(dir.path());
        options.cdn_hosts = vec![cdn.host_with_port()];
        let store = MemoryStore::new("https://storage.test");

        let report = run_migration(&options, &Client::new(), Some(&store)).await.unwrap();

        assert_eq!(report.uploaded, 1);
        assert_eq!(store.paths().await, vec!["blog/photo-1.jpg"]);
        assert_eq!(
            std::fs::read_to_string(blog.join("new.mdx")).unwrap(),
            "![New](https://storage.test/blog/photo-1.jpg)\n"
        );
    }
}
