// End-to-end image migration against a mock CDN and an in-memory bucket

use reqwest::Client;
use site_migrator::pipeline::{run_migration, RunOptions};
use site_migrator::storage::MemoryStore;
use site_migrator::ContentCategory;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

#[tokio::test]
async fn test_migration_rewrites_only_referencing_documents() {
    let mut cdn = mockito::Server::new_async().await;
    cdn.mock("GET", "/site/64f1_hero-shot.jpg")
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body("jpeg-bytes")
        .create_async()
        .await;
    cdn.mock("GET", "/site/77aa_diagram.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body("png-bytes")
        .create_async()
        .await;
    cdn.mock("GET", "/site/9911_gone.gif")
        .with_status(404)
        .create_async()
        .await;

    let base = format!("http://{}", cdn.host_with_port());
    let dir = TempDir::new().unwrap();
    let content = dir.path().join("content");

    let post = format!(
        "---\ntitle: \"Asset tracking 101\"\nimage: \"{base}/site/64f1_hero-shot.jpg\"\n---\n\n\
         ![Diagram]({base}/site/77aa_diagram.png)\n\n![Old]({base}/site/9911_gone.gif)\n"
    );
    let untouched = "---\ntitle: \"Plain\"\n---\n\nNo images here.\n";
    let feature = format!("---\ntitle: \"Scanning\"\n---\n\n![Hero]({base}/site/64f1_hero-shot.jpg)\n");

    write(&content, "blog/asset-tracking-101.mdx", &post);
    write(&content, "blog/plain.md", untouched);
    write(&content, "features/scanning.mdx", &feature);

    let mut options = RunOptions::new(&content);
    options.cdn_hosts = vec![cdn.host_with_port()];
    let store = MemoryStore::new("https://project.supabase.co/storage/v1/object/public/website-images");

    let report = run_migration(&options, &Client::new(), Some(&store)).await.unwrap();

    assert_eq!(report.documents, 3);
    assert_eq!(report.found, 3);
    assert_eq!(report.downloaded, 2);
    assert_eq!(report.uploaded, 2);
    assert_eq!(report.modified, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind(), "download");

    assert_eq!(store.paths().await, vec!["blog/diagram.png", "blog/hero-shot.jpg"]);

    let rewritten = fs::read_to_string(content.join("blog/asset-tracking-101.mdx")).unwrap();
    assert!(rewritten.contains(
        "image: \"https://project.supabase.co/storage/v1/object/public/website-images/blog/hero-shot.jpg\""
    ));
    assert!(rewritten.contains("/website-images/blog/diagram.png)"));
    assert!(rewritten.contains(&format!("{base}/site/9911_gone.gif")));

    // Shared URLs are uploaded once, under the first category that referenced them.
    let feature_after = fs::read_to_string(content.join("features/scanning.mdx")).unwrap();
    assert!(feature_after.contains("/website-images/blog/hero-shot.jpg)"));

    assert_eq!(fs::read_to_string(content.join("blog/plain.md")).unwrap(), untouched);

    let log = dir.path().join("migration-errors.log");
    assert!(report.write_error_log(&log).await.unwrap());
    let log_text = fs::read_to_string(&log).unwrap();
    assert_eq!(log_text.lines().count(), 1);
    assert!(log_text.starts_with("[download]"));
}

#[tokio::test]
async fn test_type_filter_limits_the_scan() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "blog/a.mdx",
        "![](https://cdn.prod.website-files.com/x/1_a.png)",
    );
    write(
        dir.path(),
        "solutions/b.mdx",
        "![](https://cdn.prod.website-files.com/x/2_b.png)",
    );

    let mut options = RunOptions::new(dir.path());
    options.categories = vec![ContentCategory::Solutions];
    options.dry_run = true;

    let report = run_migration(&options, &Client::new(), None).await.unwrap();

    assert_eq!(report.documents, 1);
    assert_eq!(report.found, 1);
    assert!(!report.has_errors());
}
