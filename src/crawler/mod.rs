//! Crawler module for finding housing complexes on the target site
//!
//! This module contains the core search logic, including:
//! - HTTP fetching with failure classification
//! - HTML extraction of cities, complex cards and detail pages
//! - The crawl frontier with its visited set and page cap
//! - Query matching and per-query crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod matcher;

pub use coordinator::{Coordinator, SearchReport, SearchStatus};
pub use extractor::{
    CandidateRecord, CityLink, DetailPage, ExtractionGap, Extractor, PageExtraction, Selectors,
    NO_DESCRIPTION,
};
pub use fetcher::{build_http_client, fetch_page, FetchOutcome, FetchedPage};
pub use frontier::{Frontier, QueuedUrl};
pub use matcher::matches;

use crate::config::{validate, Config};
use crate::url::SiteOrigin;
use crate::ScoutError;
use reqwest::Client;

/// Long-lived search service
///
/// Holds the validated configuration, the compiled selectors and one HTTP
/// connection pool. Every call to [`Searcher::search`] runs its own crawl with
/// its own frontier, so one `Searcher` can serve concurrent queries (share it
/// behind an `Arc`).
///
/// # Example
///
/// ```no_run
/// use zhk_scout::{Config, Searcher};
///
/// # async fn run() -> Result<(), zhk_scout::ScoutError> {
/// let searcher = Searcher::new(Config::for_site("https://novostroyki.example/"))?;
/// let report = searcher.search("ЖК Рассвет").await?;
/// for record in &report.records {
///     println!("{} {}", record.title, record.detail_url);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Searcher {
    config: Config,
    extractor: Extractor,
    client: Client,
}

impl Searcher {
    /// Validates the configuration, compiles selectors and builds the HTTP client
    ///
    /// # Returns
    ///
    /// * `Ok(Searcher)` - Ready to serve queries
    /// * `Err(ScoutError)` - Invalid configuration or HTTP client failure
    pub fn new(config: Config) -> Result<Self, ScoutError> {
        validate(&config)?;

        let origin = SiteOrigin::new(&config.site.base_url)?;
        let selectors = Selectors::compile(&config.selectors)?;
        let client = build_http_client(&config.user_agent, &config.crawler)?;

        Ok(Self {
            extractor: Extractor::new(selectors, origin),
            client,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn origin(&self) -> &SiteOrigin {
        self.extractor.origin()
    }

    /// Runs one bounded crawl for `query`
    ///
    /// Per-page failures are counted in the report's statistics. The only
    /// error is [`ScoutError::SiteUnavailable`] when the root page cannot be
    /// fetched.
    pub async fn search(&self, query: &str) -> Result<SearchReport, ScoutError> {
        Coordinator::new(&self.config, &self.extractor, self.client.clone(), query)
            .run()
            .await
    }
}
