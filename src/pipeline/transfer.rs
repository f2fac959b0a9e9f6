// Download → upload phases for a set of assets

use super::RunReport;
use crate::assets::{download_asset, AssetRef};
use crate::content::UrlMap;
use crate::storage::{ObjectStore, StorageError};
use crate::types::MigrateError;
use crate::utils::{settle_in_batches, Settled};
use reqwest::Client;
use tracing::info;

pub const DOWNLOAD_BATCH_SIZE: usize = 10;
pub const UPLOAD_BATCH_SIZE: usize = 5;

/// Move `assets` from the legacy CDN into `store`.
///
/// Returns old URL → public URL for every asset that was both downloaded and
/// uploaded. Failed assets are recorded in `report` and left out of the map,
/// so their original URLs stay in place.
pub async fn transfer_assets(
    assets: Vec<AssetRef>,
    client: &Client,
    store: &dyn ObjectStore,
    report: &mut RunReport,
) -> UrlMap {
    let mut map = UrlMap::new();
    if assets.is_empty() {
        return map;
    }

    info!(count = assets.len(), batch_size = DOWNLOAD_BATCH_SIZE, "Downloading assets");
    let sources: Vec<String> = assets.iter().map(|a| a.source_url.clone()).collect();
    let downloads = settle_in_batches(assets, DOWNLOAD_BATCH_SIZE, |asset| download_asset(client, asset)).await;

    let mut downloaded = Vec::new();
    for (url, outcome) in sources.into_iter().zip(downloads) {
        match outcome {
            Settled::Fulfilled(asset) => downloaded.push(asset),
            Settled::Rejected(reason) => report.record(MigrateError::Download { url, reason }),
        }
    }
    report.downloaded += downloaded.len();

    info!(count = downloaded.len(), batch_size = UPLOAD_BATCH_SIZE, "Uploading assets");
    let paths: Vec<String> = downloaded.iter().map(|a| a.storage_path.clone()).collect();
    let uploads = settle_in_batches(downloaded, UPLOAD_BATCH_SIZE, |asset| upload_asset(store, asset)).await;

    for (path, outcome) in paths.into_iter().zip(uploads) {
        match outcome {
            Settled::Fulfilled((source_url, public_url)) => {
                report.uploaded += 1;
                map.insert(source_url, public_url);
            }
            Settled::Rejected(reason) => report.record(MigrateError::Upload { path, reason }),
        }
    }

    map
}

/// Upload one downloaded asset; yields (source URL, public URL).
async fn upload_asset(store: &dyn ObjectStore, asset: AssetRef) -> Result<(String, String), StorageError> {
    let buffer = asset
        .buffer
        .clone()
        .ok_or_else(|| StorageError::MissingContent(asset.source_url.clone()))?;
    let content_type = asset
        .content_type
        .clone()
        .unwrap_or_else(|| crate::assets::guess_content_type(&asset.filename));

    store.put_object(&asset.storage_path, buffer, &content_type).await?;
    Ok((asset.source_url, store.public_url(&asset.storage_path)))
}
