//! Crawl frontier: pending queue, visited set and page cap
//!
//! This module handles:
//! - FIFO (breadth-first) ordering of URLs to visit
//! - Deduplication against both the queue and the visited set
//! - The page ceiling that bounds one crawl run

use crate::state::PageRole;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL queued for fetching together with its expected role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    /// The normalized URL to fetch
    pub url: Url,

    /// Extraction mode for the page
    pub role: PageRole,
}

/// Frontier for a single crawl run
///
/// Invariants:
/// - a URL is queued at most once and never after it was visited
/// - the visited set only grows
/// - at most `page_cap` URLs are ever marked visited, so the success
///   counter cannot pass the cap either
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<QueuedUrl>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    fetched: usize,
    page_cap: usize,
}

impl Frontier {
    /// Creates an empty frontier with the given page ceiling
    pub fn new(page_cap: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            fetched: 0,
            page_cap,
        }
    }

    /// Adds a starting URL; same rules as [`Frontier::push`]
    pub fn seed(&mut self, url: Url, role: PageRole) -> bool {
        self.push(url, role)
    }

    /// Appends a URL to the back of the queue
    ///
    /// Returns false (and does nothing) if the URL was already visited or is
    /// already waiting in the queue.
    pub fn push(&mut self, url: Url, role: PageRole) -> bool {
        let key = url.as_str();
        if self.visited.contains(key) || self.queued.contains(key) {
            tracing::trace!("Frontier skip (already seen): {}", url);
            return false;
        }

        self.queued.insert(key.to_string());
        self.queue.push_back(QueuedUrl { url, role });
        true
    }

    /// Takes the oldest queued URL
    pub fn pop(&mut self) -> Option<QueuedUrl> {
        let next = self.queue.pop_front()?;
        self.queued.remove(next.url.as_str());
        Some(next)
    }

    /// Commits a URL to the visited set before it is fetched
    ///
    /// Returns false if the URL was already visited or the page cap is used up;
    /// the caller must not fetch it in that case.
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        if !self.has_capacity() {
            return false;
        }
        self.visited.insert(url.as_str().to_string())
    }

    /// Records one successful fetch
    pub fn record_success(&mut self) {
        self.fetched += 1;
    }

    /// Returns false once the page cap is reached
    pub fn has_capacity(&self) -> bool {
        self.visited.len() < self.page_cap && self.fetched < self.page_cap
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Number of URLs dispatched so far (successful or not)
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of successful fetches so far
    pub fn fetched_count(&self) -> usize {
        self.fetched
    }

    /// Number of URLs waiting in the queue
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn page_cap(&self) -> usize {
        self.page_cap
    }
}
