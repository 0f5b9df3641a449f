use crate::dom::parse_html;
use crate::fetcher::{Fetcher, ScrapeError, scrape_article};
use log::{info, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Url;

const ENTRY_MARKER: &str = "entries/";

/// Collects every entry link on a table-of-contents page as an absolute URL
/// ending in `/`, without fragments, sorted and de-duplicated.
pub fn collect_entry_urls(contents_html: &str, base_url: &str) -> Result<Vec<String>, ScrapeError> {
    let base = Url::parse(base_url).map_err(|source| ScrapeError::InvalidUrl {
        url: base_url.to_string(),
        source,
    })?;

    let document = parse_html(contents_html);
    let mut urls = BTreeSet::new();
    for anchor in document.find_all(|el| el.is("a")) {
        let Some(href) = anchor.attr("href").filter(|href| href.contains(ENTRY_MARKER)) else {
            continue;
        };
        let Ok(mut url) = base.join(href) else {
            warn!("Skipping unresolvable entry link {href:?}");
            continue;
        };
        url.set_fragment(None);
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        urls.insert(url.to_string());
    }
    Ok(urls.into_iter().collect())
}

/// The entry's short name, i.e. the last non-empty path segment.
pub fn entry_name(url: &str) -> String {
    let path = Url::parse(url)
        .map(|parsed| parsed.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    path.split('/')
        .rfind(|segment| !segment.is_empty())
        .unwrap_or_default()
        .to_string()
}

pub fn entry_path(out_dir: &Path, url: &str) -> PathBuf {
    out_dir.join(format!("{}.md", entry_name(url)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Written(PathBuf),
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryResult {
    pub url: String,
    pub outcome: EntryOutcome,
}

/// Per-entry results of a batch run, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub entries: Vec<EntryResult>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.count(|outcome| matches!(outcome, EntryOutcome::Written(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| *outcome == EntryOutcome::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, EntryOutcome::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            EntryOutcome::Failed(message) => Some((entry.url.as_str(), message.as_str())),
            _ => None,
        })
    }

    pub fn summary(&self) -> String {
        format!(
            "Completed: {} scraped, {} skipped, {} failed",
            self.written(),
            self.skipped(),
            self.failed()
        )
    }

    fn count(&self, pred: impl Fn(&EntryOutcome) -> bool) -> usize {
        self.entries.iter().filter(|entry| pred(&entry.outcome)).count()
    }
}

/// Downloads the configured table of contents and collects its entry URLs.
pub async fn fetch_entry_urls(fetcher: &Fetcher) -> Result<Vec<String>, ScrapeError> {
    let contents_url = fetcher.config().contents_url.clone();
    let html = fetcher.fetch_page(&contents_url).await?;
    collect_entry_urls(&html, &contents_url)
}

/// Scrapes every URL into `out_dir/<entry>.md`, at most `concurrency` entries
/// at a time. Their HTTP requests all draw on the fetcher's shared request
/// limit. Entries whose file already exists are skipped. A failed entry is
/// recorded and does not stop the others.
pub async fn scrape_all(
    fetcher: &Fetcher,
    urls: &[String],
    out_dir: &Path,
    concurrency: usize,
) -> BatchReport {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let handles: Vec<_> = urls
        .iter()
        .map(|url| {
            let fetcher = fetcher.clone();
            let semaphore = Arc::clone(&semaphore);
            let url = url.clone();
            let path = entry_path(out_dir, &url);
            tokio::spawn(async move {
                let outcome = scrape_entry(&fetcher, &url, path, &semaphore).await;
                EntryResult { url, outcome }
            })
        })
        .collect();

    let mut report = BatchReport::default();
    for (url, handle) in urls.iter().zip(handles) {
        let result = handle.await.unwrap_or_else(|e| EntryResult {
            url: url.clone(),
            outcome: EntryOutcome::Failed(format!("task failed: {e}")),
        });
        match &result.outcome {
            EntryOutcome::Written(path) => info!("{}: written to {}", entry_name(url), path.display()),
            EntryOutcome::Skipped => {}
            EntryOutcome::Failed(message) => warn!("{}: FAILED - {message}", entry_name(url)),
        }
        report.entries.push(result);
    }
    report
}

async fn scrape_entry(
    fetcher: &Fetcher,
    url: &str,
    path: PathBuf,
    semaphore: &Semaphore,
) -> EntryOutcome {
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return EntryOutcome::Skipped;
    }

    let Ok(_permit) = semaphore.acquire().await else {
        return EntryOutcome::Failed("scraper shut down".to_string());
    };

    let markdown = match scrape_article(fetcher, url).await {
        Ok(markdown) => markdown,
        Err(e) => return EntryOutcome::Failed(e.to_string()),
    };

    match tokio::fs::write(&path, markdown).await {
        Ok(()) => EntryOutcome::Written(path),
        Err(source) => EntryOutcome::Failed(ScrapeError::Io { path, source }.to_string()),
    }
}
