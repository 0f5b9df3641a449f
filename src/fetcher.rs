use crate::assembler::render_article;
use crate::config::ScraperConfig;
use crate::dom::parse_html;
use crate::parsing::{ArticleParser, MacroTable};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use url::Url;

/// Where the per-article MathJax macro definitions live, relative to the
/// article URL.
pub const MACROS_FILE: &str = "local.js";

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Not an encyclopedia URL: {0}")]
    InvalidDomain(String),

    #[error("Not an article URL: {0}")]
    InvalidPath(String),

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("Timeout fetching {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Network error fetching {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Request limit closed before fetching {url}")]
    Closed { url: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Checks that `url` points at an article on one of the configured hosts.
pub fn validate_url(url: &str, config: &ScraperConfig) -> Result<Url, ScrapeError> {
    let parsed = Url::parse(url).map_err(|source| ScrapeError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    let host = parsed.host_str().unwrap_or_default();
    if !config.allowed_domains.iter().any(|domain| domain == host) {
        return Err(ScrapeError::InvalidDomain(url.to_string()));
    }
    if !parsed.path().starts_with(&config.article_prefix) {
        return Err(ScrapeError::InvalidPath(url.to_string()));
    }
    Ok(parsed)
}

/// HTTP access for articles, macro files and appendix pages. Cloning is
/// cheap and shares the underlying connection pool.
///
/// Every clone also shares one request limit: at most `config.concurrency`
/// requests are in flight at a time across all of them.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    config: Arc<ScraperConfig>,
    requests: Arc<Semaphore>,
}

impl Fetcher {
    pub fn new(config: ScraperConfig) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ScrapeError::Client)?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: ScraperConfig) -> Self {
        let requests = Arc::new(Semaphore::new(config.concurrency.max(1)));
        Fetcher {
            client,
            config: Arc::new(config),
            requests,
        }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        let _permit = self
            .requests
            .acquire()
            .await
            .map_err(|_| ScrapeError::Closed { url: url.to_string() })?;
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| classify(url, e))?;
        response.text().await.map_err(|e| classify(url, e))
    }

    /// The article's macro table, or an empty table if the file is missing or
    /// cannot be read.
    pub async fn fetch_macros(&self, article_url: &str) -> MacroTable {
        let macros_url = match Url::parse(article_url).and_then(|url| url.join(MACROS_FILE)) {
            Ok(url) => url,
            Err(e) => {
                debug!("No macro URL for {article_url}: {e}");
                return MacroTable::new();
            }
        };

        match self.fetch_page(macros_url.as_str()).await {
            Ok(source) => {
                let macros = MacroTable::parse_js(&source);
                debug!("Loaded {} macros from {macros_url}", macros.len());
                macros
            }
            Err(e) => {
                debug!("No macros for {article_url}: {e}");
                MacroTable::new()
            }
        }
    }

    /// Fetches `(label, url)` pairs concurrently under the shared request
    /// limit. Returns `(label, html)` for the pages that succeeded, in input
    /// order.
    pub async fn fetch_many(&self, pages: Vec<(String, String)>) -> Vec<(String, String)> {
        let handles: Vec<_> = pages
            .into_iter()
            .map(|(label, url)| {
                let fetcher = self.clone();
                tokio::spawn(async move {
                    match fetcher.fetch_page(&url).await {
                        Ok(html) => Some((label, html)),
                        Err(e) => {
                            warn!("Skipping {label}: {e}");
                            None
                        }
                    }
                })
            })
            .collect();

        let mut fetched = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(Some(page)) => fetched.push(page),
                Ok(None) => {}
                Err(e) => warn!("Fetch task failed: {e}"),
            }
        }
        fetched
    }
}

fn classify(url: &str, error: reqwest::Error) -> ScrapeError {
    let url = url.to_string();
    if error.is_timeout() {
        ScrapeError::Timeout { url }
    } else if let Some(status) = error.status() {
        ScrapeError::Status {
            url,
            status: status.as_u16(),
        }
    } else {
        ScrapeError::Network { url, source: error }
    }
}

/// Fetches one article with its macros and appendices and converts it to
/// Markdown.
pub async fn scrape_article(fetcher: &Fetcher, url: &str) -> Result<String, ScrapeError> {
    validate_url(url, fetcher.config())?;

    let (html, macros) = tokio::join!(fetcher.fetch_page(url), fetcher.fetch_macros(url));
    let html = html?;

    let document = parse_html(&html);
    let parser = ArticleParser::new(&document, url, macros);

    let links = parser.appendix_links();
    if !links.is_empty() {
        info!("Fetching {} appendices for {url}", links.len());
    }
    let pages = fetcher
        .fetch_many(links.into_iter().map(|link| (link.title, link.url)).collect())
        .await;

    Ok(render_article(&parser, &pages))
}
