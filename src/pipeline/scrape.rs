// Legacy page scrape: fetch → convert → migrate assets → splice into documents

use super::{reserve_stored_paths, transfer_assets, RunOptions, RunReport};
use crate::assets::{AssetCatalog, CdnMatcher};
use crate::content::{load_documents, rewrite_urls, ContentFile, Document};
use crate::scrape::{legacy_url_for, scrape_page, ExtractionError, LegacyPage};
use crate::storage::ObjectStore;
use crate::types::MigrateError;
use crate::utils::{settle_in_batches, Settled};
use reqwest::Client;
use tracing::{info, warn};

pub const PAGE_BATCH_SIZE: usize = 5;

/// A content file paired with the page scraped for it.
struct Scraped {
    file: ContentFile,
    page: LegacyPage,
}

/// Replace the body of each selected document with the article scraped from
/// its legacy page.
///
/// Documents whose page cannot be fetched or whose markup does not contain
/// the expected region are recorded as extraction errors and left alone.
/// With `options.dry_run` set, or without a store, pages are fetched and
/// converted but nothing is uploaded or written.
pub async fn run_scrape(
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
    report.documents = scan.files.len();

    let mut catalog = AssetCatalog::new();
    if let Some(store) = store {
        reserve_stored_paths(&mut catalog, scan.files.iter().map(|f| f.text.as_str()), store)?;
    }

    let mut targets = Vec::new();
    for file in scan.files {
        match legacy_url_for(&file, options.legacy_site_url.as_deref()) {
            Ok(url) => targets.push((file, url)),
            Err(e) => report.record(extraction_error(&file, e)),
        }
    }

    info!(pages = targets.len(), batch_size = PAGE_BATCH_SIZE, "Fetching legacy pages");
    let labels: Vec<String> = targets.iter().map(|(f, _)| f.path.display().to_string()).collect();
    let outcomes = settle_in_batches(targets, PAGE_BATCH_SIZE, |(file, url)| async move {
        scrape_page(client, &url)
            .await
            .map(|page| Scraped { file, page })
    })
    .await;

    let mut scraped = Vec::new();
    for (document, outcome) in labels.into_iter().zip(outcomes) {
        match outcome {
            Settled::Fulfilled(item) => scraped.push(item),
            Settled::Rejected(reason) => report.record(MigrateError::Extraction { document, reason }),
        }
    }
    report.scraped = scraped.len();

    // Splice first, so asset discovery sees the new bodies and filled image fields.
    let rebuilt: Vec<(ContentFile, String)> = scraped
        .into_iter()
        .map(|item| {
            let text = splice_page(&item.file.text, &item.page);
            (item.file, text)
        })
        .collect();

    for (file, text) in &rebuilt {
        for url in matcher.find_urls(text) {
            catalog.add(&url, file.category);
        }
    }
    report.found = catalog.len();

    let store = match store {
        Some(store) if !options.dry_run => store,
        _ => {
            for (file, text) in &rebuilt {
                info!(
                    path = %file.path.display(),
                    chars = text.len(),
                    changed = *text != file.text,
                    "Would update document"
                );
            }
            return Ok(report);
        }
    };

    let map = transfer_assets(catalog.into_assets(), client, store, &mut report).await;

    for (file, text) in &rebuilt {
        let rewritten = rewrite_urls(text, &map).text;
        if rewritten == file.text {
            continue;
        }
        match file.write(&rewritten).await {
            Ok(()) => {
                report.modified += 1;
                info!(path = %file.path.display(), "Updated document from legacy page");
            }
            Err(e) => report.record(e),
        }
    }

    Ok(report)
}

/// New document text: scraped body in place of the old one, frontmatter
/// kept, and a blank `image` field filled from the page's `og:image`.
pub fn splice_page(original: &str, page: &LegacyPage) -> String {
    let mut doc = Document::parse(original);
    doc.set_body(&page.markdown);

    if doc.field("image").is_none() {
        if let Some(og_image) = &page.og_image {
            if !doc.set_field("image", og_image) {
                warn!(url = %page.url, "Document has no frontmatter, og:image not recorded");
            }
        }
    }

    doc.render()
}

fn extraction_error(file: &ContentFile, e: ExtractionError) -> MigrateError {
    MigrateError::Extraction {
        document: file.path.display().to_string(),
        reason: e.to_string(),
    }
}
