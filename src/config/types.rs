use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for zhk-scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

impl Config {
    /// Builds a configuration with defaults for everything but the site root
    pub fn for_site(base_url: impl Into<String>) -> Self {
        Self {
            site: SiteConfig {
                base_url: base_url.into(),
            },
            crawler: CrawlerConfig::default(),
            user_agent: UserAgentConfig::default(),
            selectors: SelectorConfig::default(),
        }
    }
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Root page of the site; also fixes the crawl origin
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// How the crawl is seeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrawlMode {
    /// City list when the root has one, generic crawl otherwise
    Auto,
    /// Root city list seeds the listing pages
    Cities,
    /// Follow every same-origin link from the root
    Generic,
}

/// When the orchestrator stops pulling from the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopPolicy {
    /// Stop after the page that produced the first match
    FirstMatch,
    /// Keep crawling until the result set is full
    ResultCap,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pages fetched in one search
    #[serde(rename = "page-cap")]
    pub page_cap: usize,

    /// Maximum number of records returned
    #[serde(rename = "result-cap")]
    pub result_cap: usize,

    /// Total timeout of a single fetch (seconds)
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Frontier entries fetched in parallel within one search
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: usize,

    pub mode: CrawlMode,

    #[serde(rename = "stop-policy")]
    pub stop_policy: StopPolicy,

    /// Fetch each matched complex's detail page for its description
    #[serde(rename = "enrich-details")]
    pub enrich_details: bool,
}

impl CrawlerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_cap: 100,
            result_cap: 5,
            fetch_timeout_secs: 15,
            connect_timeout_secs: 5,
            max_concurrent_fetches: 1,
            mode: CrawlMode::Auto,
            stop_policy: StopPolicy::FirstMatch,
            enrich_details: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "ZhkScout".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// CSS selectors describing the target site's markup
///
/// Markup of the target site is not a contract, so every selector the
/// extractor uses lives here and can be overridden from the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// City entries on the root page (`<option>` or `<a>`)
    pub cities: String,

    /// Repeated complex cards on a listing page
    pub card: String,

    /// Title inside a card
    #[serde(rename = "card-title")]
    pub card_title: String,

    /// Detail link inside a card
    #[serde(rename = "card-link")]
    pub card_link: String,

    /// Short inline description inside a card
    #[serde(rename = "card-description")]
    pub card_description: String,

    /// Pagination link to the next listing page
    #[serde(rename = "next-page")]
    pub next_page: String,

    /// Canonical title on a detail page
    #[serde(rename = "detail-title")]
    pub detail_title: String,

    /// Long description block on a detail page
    #[serde(rename = "detail-description")]
    pub detail_description: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            cities: "select option[value], nav.cities a[href], ul.cities a[href], .city-list a[href]"
                .to_string(),
            card: ".complex-card, .zhk-card, .complex-item".to_string(),
            card_title: ".complex-card__title, .title, h2, h3".to_string(),
            card_link: "a[href]".to_string(),
            card_description: ".complex-card__description, .description, p".to_string(),
            next_page: "a[rel=next], .pagination a.next".to_string(),
            detail_title: "h1".to_string(),
            detail_description: ".complex-description, .description, article".to_string(),
        }
    }
}
