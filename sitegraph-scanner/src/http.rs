use crate::error::{Result, ScanError};
use crate::source::{Asset, ErrorCallback, Link, Outs, Source, SourceRef};
use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub fn build_client(timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .user_agent("Sitegraph/0.1 (https://github.com/trapdoorsec/sitegraph)")
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
        .pool_max_idle_per_host(50)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()?;
    Ok(client)
}

/// A page fetched over HTTP(S). Only references on the crawl host (and
/// port) are reported; `<a href>` targets are links, every other `href`/`src` is an
/// asset.
#[derive(Clone)]
pub struct HttpSource {
    url: Url,
    key: String,
    authority: String,
    client: Client,
    on_error: ErrorCallback,
}

impl HttpSource {
    pub fn new(url: &str, client: Client, on_error: ErrorCallback) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
        Self::from_url(parsed, client, on_error)
    }

    fn from_url(url: Url, client: Client, on_error: ErrorCallback) -> Result<Self> {
        if !supported_scheme(url.scheme()) {
            return Err(ScanError::UnsupportedScheme(url.scheme().to_string()));
        }
        let authority =
            authority(&url).ok_or_else(|| ScanError::InvalidUrl(format!("{}: no host", url)))?;

        Ok(Self {
            key: url.to_string(),
            url,
            authority,
            client,
            on_error,
        })
    }

    fn child(&self, url: Url) -> Self {
        Self {
            key: url.to_string(),
            url,
            authority: self.authority.clone(),
            client: self.client.clone(),
            on_error: Arc::clone(&self.on_error),
        }
    }

    fn report(&self, error: &ScanError) {
        (self.on_error)(&self.key, error);
    }

    async fn fetch(&self) -> Outs {
        info!("GET {}", self.key);

        let response = match self.client.get(self.url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                self.report(&ScanError::HttpError(e));
                return Outs::empty();
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            self.report(&ScanError::Status(status));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("text/html"))
            .unwrap_or(false);
        if !is_html {
            return Outs::empty();
        }

        // Redirects may have taken us off the crawl host.
        let final_url = response.url().clone();
        let on_host = authority(&final_url)
            .map(|a| host_matches(&self.authority, &a))
            .unwrap_or(false);
        if !on_host {
            debug!("Redirected off host: {} -> {}", self.key, final_url);
            return Outs::empty();
        }

        match response.text().await {
            Ok(body) => self.parse_html(&final_url, &body),
            Err(e) => {
                self.report(&ScanError::HttpError(e));
                Outs::empty()
            }
        }
    }

    /// Extracts same-host references from `html`, resolved against `base`.
    /// Each of links and assets is deduplicated, keeping document order.
    pub fn parse_html(&self, base: &Url, html: &str) -> Outs {
        let document = Html::parse_document(html);
        let Ok(selector) = Selector::parse("[href], [src]") else {
            return Outs::empty();
        };

        let mut outs = Outs::empty();
        let mut seen_links = HashSet::new();
        let mut seen_assets = HashSet::new();

        for element in document.select(&selector) {
            let is_anchor = element.value().name() == "a";

            for attr in ["href", "src"] {
                let Some(raw) = element.value().attr(attr) else {
                    continue;
                };
                let Some(url) = normalize_url(base, &self.authority, raw) else {
                    continue;
                };
                let key = url.to_string();

                if is_anchor && attr == "href" {
                    if seen_links.insert(key.clone()) {
                        let source: SourceRef = Arc::new(self.child(url));
                        outs.links.push(Link::new(key, source));
                    }
                } else if seen_assets.insert(key.clone()) {
                    outs.assets.push(Asset::new(key));
                }
            }
        }

        outs
    }
}

impl Source for HttpSource {
    fn key(&self) -> &str {
        &self.key
    }

    fn outs(&self) -> BoxFuture<'_, Outs> {
        Box::pin(self.fetch())
    }
}

/// Resolves `href` against `base`, dropping fragments, non-HTTP schemes and
/// references outside `crawl_authority` (`host` or `host:port`).
pub fn normalize_url(base: &Url, crawl_authority: &str, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !supported_scheme(url.scheme()) {
        return None;
    }
    if authority(&url).as_deref() != Some(crawl_authority) {
        return None;
    }

    url.set_fragment(None);
    Some(url)
}

fn supported_scheme(scheme: &str) -> bool {
    scheme == "http" || scheme == "https"
}

/// Lowercased host plus the port when one is written. Default ports are
/// never written, so `http://foo.com` and `https://foo.com` share one.
fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// `authority` is the crawl authority or a subdomain of it on the same port.
fn host_matches(crawl_authority: &str, authority: &str) -> bool {
    authority == crawl_authority || authority.ends_with(&format!(".{}", crawl_authority))
}
