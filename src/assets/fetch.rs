// Asset download

use super::AssetRef;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

/// Fetch the asset's source URL into memory.
///
/// Non-2xx responses are errors; nothing is retried.
pub async fn download_asset(client: &Client, asset: AssetRef) -> Result<AssetRef, reqwest::Error> {
    let response = client
        .get(&asset.source_url)
        .send()
        .await?
        .error_for_status()?;

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<mime::Mime>().ok())
        .map(|m| m.essence_str().to_string());

    let buffer = response.bytes().await?;
    debug!(url = %asset.source_url, bytes = buffer.len(), "Downloaded asset");

    Ok(asset.with_download(buffer, content_type))
}
