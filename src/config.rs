use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("sep2md/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ScraperConfig {
    pub timeout_secs: u64,
    /// Upper bound on simultaneous requests, for both appendices and batch runs.
    pub concurrency: usize,
    pub user_agent: String,
    pub allowed_domains: Vec<String>,
    pub article_prefix: String,
    pub contents_url: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            concurrency: 20,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            allowed_domains: vec![
                "plato.stanford.edu".to_string(),
                "seop.illc.uva.nl".to_string(),
            ],
            article_prefix: "/entries/".to_string(),
            contents_url: "https://plato.stanford.edu/contents.html".to_string(),
        }
    }
}

impl ScraperConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Loads `file_path` if given. Read or parse failures are logged and the
    /// defaults are used instead.
    pub fn load_or_default(file_path: Option<&str>) -> Self {
        match file_path {
            Some(path) => Self::load_from_file(path).unwrap_or_else(|e| {
                log::error!("Failed to load config from {path}: {e}");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let path = Path::new(file_path);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;
        if config.concurrency == 0 {
            log::warn!("concurrency of 0 in {file_path}, using 1");
            config.concurrency = 1;
        }
        Ok(config)
    }
}
