//! Crawler coordinator - per-query crawl orchestration
//!
//! This module contains the crawl loop for a single search, including:
//! - Seeding the frontier from the site root (city list or generic links)
//! - Dispatching fetch batches and merging their results in order
//! - Matching extracted records and deciding when to stop
//! - Enriching matched records from their detail pages

use crate::config::{Config, CrawlMode, CrawlerConfig, StopPolicy};
use crate::crawler::extractor::{CandidateRecord, Extractor, PageExtraction};
use crate::crawler::fetcher::{fetch_page, FetchOutcome, FetchedPage};
use crate::crawler::frontier::{Frontier, QueuedUrl};
use crate::crawler::matcher::matches;
use crate::output::CrawlStats;
use crate::state::{CrawlState, PageRole};
use crate::{FetchError, ScoutError};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::HashSet;
use std::fmt;
use std::time::Instant;
use tokio::task::JoinSet;

/// How a search ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// At least one record matched the query
    Matched,

    /// The reachable part of the site was crawled without a match
    NoMatchFound,

    /// The page cap was hit before anything matched
    CrawlBudgetExhausted,
}

impl SearchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::NoMatchFound => "no_match_found",
            Self::CrawlBudgetExhausted => "crawl_budget_exhausted",
        }
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one search
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub query: String,
    pub status: SearchStatus,

    /// Matching records in discovery order, at most `result-cap` of them
    pub records: Vec<CandidateRecord>,

    /// Terminal state the crawl ended in
    pub final_state: CrawlState,

    pub stats: CrawlStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SearchReport {
    pub fn is_match(&self) -> bool {
        self.status == SearchStatus::Matched
    }
}

/// Crawl context for a single query
///
/// Only the HTTP client and the compiled extractor are shared with other
/// searches; the frontier, result set and counters live and die here.
pub struct Coordinator<'a> {
    crawler: &'a CrawlerConfig,
    extractor: &'a Extractor,
    client: Client,
    query: String,
    frontier: Frontier,
    state: CrawlState,
    records: Vec<CandidateRecord>,
    matched_urls: HashSet<String>,
    stats: CrawlStats,
}

impl<'a> Coordinator<'a> {
    /// Creates a coordinator for one query
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `extractor` - Extractor built from the configured selectors
    /// * `client` - Shared HTTP client (clones reuse its connection pool)
    /// * `query` - Free-text query matched against complex titles
    pub fn new(config: &'a Config, extractor: &'a Extractor, client: Client, query: &str) -> Self {
        Self {
            crawler: &config.crawler,
            extractor,
            client,
            query: query.to_string(),
            frontier: Frontier::new(config.crawler.page_cap),
            state: CrawlState::Idle,
            records: Vec::new(),
            matched_urls: HashSet::new(),
            stats: CrawlStats::new(),
        }
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Runs the crawl to a terminal state and builds the report
    ///
    /// The only error a well-formed configuration can produce is
    /// [`ScoutError::SiteUnavailable`] when the root page cannot be fetched.
    pub async fn run(mut self) -> Result<SearchReport, ScoutError> {
        let started_at = Utc::now();
        let timer = Instant::now();

        tracing::info!(
            "Search '{}' started at {} (mode {:?}, page cap {})",
            self.query,
            self.extractor.origin().root(),
            self.crawler.mode,
            self.crawler.page_cap
        );

        self.transition(CrawlState::Seeding)?;
        self.seed().await?;

        while !self.state.is_terminal() {
            self.visit_batch().await?;
        }

        if self.crawler.enrich_details && !self.records.is_empty() {
            self.enrich().await;
        }

        self.stats.elapsed = timer.elapsed();

        let status = if !self.records.is_empty() {
            SearchStatus::Matched
        } else if self.state == CrawlState::Capped {
            SearchStatus::CrawlBudgetExhausted
        } else {
            SearchStatus::NoMatchFound
        };

        tracing::info!(
            "Search '{}' finished: {} ({} records, {} pages fetched, {} failures, {:.2}s)",
            self.query,
            status,
            self.records.len(),
            self.stats.pages_fetched,
            self.stats.total_failures(),
            self.stats.elapsed.as_secs_f64()
        );

        Ok(SearchReport {
            query: self.query,
            status,
            records: self.records,
            final_state: self.state,
            stats: self.stats,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Fetches the root and fills the frontier according to the crawl mode
    async fn seed(&mut self) -> Result<(), ScoutError> {
        let root = self.extractor.origin().root().clone();
        self.frontier.mark_visited(&root);
        self.stats.pages_dispatched += 1;

        let page = match fetch_page(&self.client, &root).await.into_result() {
            Ok(page) => page,
            Err(source) => {
                self.stats.record_failure(&source);
                tracing::warn!("Root page {} unavailable: {}", root, source);
                return Err(ScoutError::SiteUnavailable {
                    url: root.to_string(),
                    source,
                });
            }
        };
        self.frontier.record_success();
        self.stats.pages_fetched += 1;

        let role = match self.crawler.mode {
            CrawlMode::Generic => PageRole::Generic,
            CrawlMode::Auto | CrawlMode::Cities => PageRole::Root,
        };
        let mut extraction = self.extractor.extract(&page.html, &page.final_url, role);

        if !extraction.cities.is_empty() {
            tracing::info!("Found {} cities on {}", extraction.cities.len(), root);
            for city in &extraction.cities {
                tracing::debug!("Seeding city {} ({})", city.name, city.url);
                self.frontier.seed(city.url.clone(), PageRole::Listing);
            }
        } else if self.crawler.mode == CrawlMode::Cities {
            tracing::info!("No city list on {}, nothing to crawl", root);
            self.stats.record_gaps(&extraction.gaps);
            return self.transition(CrawlState::Exhausted);
        } else {
            if role == PageRole::Root {
                tracing::info!("No city list on {}, falling back to link discovery", root);
            }
            // Root links are generic pages, not listings
            let links = std::mem::take(&mut extraction.links);
            self.stats.links_discovered += links.len() as u64;
            for link in links {
                self.frontier.seed(link, PageRole::Generic);
            }
        }

        self.absorb(PageRole::Root, &page, extraction);
        let next = if self.should_stop() {
            CrawlState::Matched
        } else {
            self.idle_state()
        };
        self.transition(next)
    }

    /// Dispatches up to `max-concurrent-fetches` URLs and merges their results
    async fn visit_batch(&mut self) -> Result<(), ScoutError> {
        let mut batch: Vec<QueuedUrl> = Vec::new();
        while batch.len() < self.crawler.max_concurrent_fetches && self.frontier.has_capacity() {
            let Some(next) = self.frontier.pop() else {
                break;
            };
            if !self.frontier.mark_visited(&next.url) {
                continue;
            }
            self.stats.pages_dispatched += 1;
            batch.push(next);
        }

        if batch.is_empty() {
            let next = self.idle_state();
            return self.transition(next);
        }

        let mut tasks = JoinSet::new();
        for (index, queued) in batch.iter().enumerate() {
            let client = self.client.clone();
            let url = queued.url.clone();
            tasks.spawn(async move { (index, fetch_page(&client, &url).await) });
        }

        let mut outcomes: Vec<Option<FetchOutcome>> = vec![None; batch.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => tracing::warn!("Fetch task failed: {}", e),
            }
        }

        // Pop order, not completion order
        for (queued, outcome) in batch.into_iter().zip(outcomes) {
            let result = match outcome {
                Some(outcome) => outcome.into_result(),
                None => Err(FetchError::Network("fetch task aborted".to_string())),
            };

            let page = match result {
                Ok(page) => {
                    self.frontier.record_success();
                    self.stats.pages_fetched += 1;
                    page
                }
                Err(e) => {
                    tracing::debug!("Skipping {} after failure: {}", queued.url, e);
                    self.stats.record_failure(&e);
                    continue;
                }
            };

            if self.state.is_terminal() {
                tracing::debug!("Discarding {} fetched after the crawl stopped", queued.url);
                continue;
            }

            self.process_page(&queued, page)?;
        }

        if self.state == CrawlState::Visiting && !self.frontier.has_capacity() {
            tracing::info!("Page cap of {} reached", self.frontier.page_cap());
        }

        Ok(())
    }

    fn process_page(&mut self, queued: &QueuedUrl, page: FetchedPage) -> Result<(), ScoutError> {
        self.transition(CrawlState::Extracting)?;

        let extraction = self.extractor.extract(&page.html, &page.final_url, queued.role);

        let mut pushed = 0;
        self.stats.links_discovered += extraction.links.len() as u64;
        for link in &extraction.links {
            if self.frontier.push(link.clone(), queued.role) {
                pushed += 1;
            }
        }
        tracing::debug!(
            "Processed {} page {}: {} cards, {} new links",
            queued.role,
            queued.url,
            extraction.records.len(),
            pushed
        );

        self.absorb(queued.role, &page, extraction);
        let next = if self.should_stop() {
            CrawlState::Matched
        } else {
            CrawlState::Visiting
        };
        self.transition(next)
    }

    /// Counts gaps and cards, keeps matching records; returns how many were added
    fn absorb(&mut self, role: PageRole, page: &FetchedPage, extraction: PageExtraction) -> usize {
        for gap in &extraction.gaps {
            tracing::debug!("Extraction gap on {} page {}: {}", role, page.final_url, gap);
        }
        self.stats.record_gaps(&extraction.gaps);
        self.stats.cards_seen += extraction.records.len() as u64;

        let mut added = 0;
        for record in extraction.records {
            if self.records.len() >= self.crawler.result_cap {
                break;
            }
            if !matches(&record.title, &self.query) {
                continue;
            }
            if !self.matched_urls.insert(record.detail_url.as_str().to_string()) {
                continue;
            }
            tracing::info!("Match '{}' at {}", record.title, record.detail_url);
            self.records.push(record);
            added += 1;
        }
        added
    }

    fn should_stop(&self) -> bool {
        if self.records.len() >= self.crawler.result_cap {
            return true;
        }
        match self.crawler.stop_policy {
            StopPolicy::FirstMatch => !self.records.is_empty(),
            StopPolicy::ResultCap => false,
        }
    }

    /// State to move to when no page is being extracted
    fn idle_state(&self) -> CrawlState {
        if self.frontier.is_empty() {
            CrawlState::Exhausted
        } else if !self.frontier.has_capacity() {
            CrawlState::Capped
        } else {
            CrawlState::Visiting
        }
    }

    /// Replaces each record with its detail-page version where possible
    async fn enrich(&mut self) {
        let records = std::mem::take(&mut self.records);
        let mut enriched = Vec::with_capacity(records.len());
        for record in records {
            enriched.push(self.enrich_record(record).await);
        }
        self.records = enriched;
    }

    async fn enrich_record(&mut self, record: CandidateRecord) -> CandidateRecord {
        if !self.frontier.mark_visited(&record.detail_url) {
            tracing::debug!(
                "Not enriching '{}': detail page already visited or page cap reached",
                record.title
            );
            return record;
        }
        self.stats.pages_dispatched += 1;

        let page = match fetch_page(&self.client, &record.detail_url).await.into_result() {
            Ok(page) => page,
            Err(e) => {
                self.stats.record_failure(&e);
                return record;
            }
        };
        self.frontier.record_success();
        self.stats.pages_fetched += 1;

        let extraction = self
            .extractor
            .extract(&page.html, &page.final_url, PageRole::Detail);
        for gap in &extraction.gaps {
            tracing::debug!("Extraction gap on detail page {}: {}", page.final_url, gap);
        }
        self.stats.record_gaps(&extraction.gaps);

        match extraction.detail {
            Some(detail) => {
                self.stats.details_enriched += 1;
                record.enriched(&detail)
            }
            None => record,
        }
    }

    fn transition(&mut self, next: CrawlState) -> Result<(), ScoutError> {
        if !self.state.can_transition_to(next) {
            return Err(ScoutError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        if next.is_terminal() {
            tracing::info!("Crawl state {} -> {}", self.state, next);
        } else {
            tracing::trace!("Crawl state {} -> {}", self.state, next);
        }
        self.state = next;
        Ok(())
    }
}
