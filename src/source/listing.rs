use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use regex::Regex;
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

const USER_AGENT: &str = concat!("permit-ocr/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentLink {
    pub url: String,
    pub title: String,
}

pub fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .build()
        .context("failed to build HTTP client")
}

pub fn fetch_listing(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("failed to fetch listing page {url}"))?;
    let status = response.status();
    if !status.is_success() {
        bail!("listing page {url} returned status {status}");
    }

    let html = response
        .text()
        .with_context(|| format!("failed to read listing page body {url}"))?;
    info!(url = %url, bytes = html.len(), "fetched listing page");
    Ok(html)
}

pub fn fetch_document(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("failed to download {url}"))?;
    let status = response.status();
    if !status.is_success() {
        bail!("document {url} returned status {status}");
    }

    let bytes = response
        .bytes()
        .with_context(|| format!("failed to read document body {url}"))?;
    if bytes.is_empty() {
        bail!("document {url} has an empty body");
    }

    debug!(url = %url, bytes = bytes.len(), "downloaded document");
    Ok(bytes.to_vec())
}

/// Collects links to PDF documents in page order, resolved against the
/// listing URL and deduplicated by absolute URL.
pub fn extract_pdf_links(html: &str, base_url: &str) -> Result<Vec<DocumentLink>> {
    let base = Url::parse(base_url).with_context(|| format!("invalid listing URL {base_url}"))?;
    let anchor_re = Regex::new(
        r#"(?is)<a[^>]*href\s*=\s*["'](?P<href>[^"'#>]+\.pdf(?:\?[^"'#>]*)?)["'][^>]*>(?P<text>.*?)</a>"#,
    )
    .context("failed to compile anchor regex")?;
    let tags_re = Regex::new(r"(?is)<[^>]+>").context("failed to compile tag regex")?;

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for capture in anchor_re.captures_iter(html) {
        let Some(href) = capture.name("href") else {
            continue;
        };
        let href = href.as_str().trim().replace("&amp;", "&");
        let Ok(joined) = base.join(&href) else {
            debug!(href = %href, "skipping unresolvable link");
            continue;
        };

        let raw_text = capture
            .name("text")
            .map(|value| value.as_str())
            .unwrap_or_default();
        let title = tags_re
            .replace_all(raw_text, " ")
            .split_whitespace()
            .collect::<Vec<&str>>()
            .join(" ");

        let url = joined.to_string();
        if seen.insert(url.clone()) {
            links.push(DocumentLink { url, title });
        }
    }

    Ok(links)
}
