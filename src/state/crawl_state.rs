/// Orchestrator state definitions for a single search
///
/// This module defines the states a crawl moves through and which transitions
/// between them are legal.
use std::fmt;

/// Represents the current state of one crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    // ===== Active States =====
    /// Created, nothing fetched yet
    Idle,

    /// Fetching the root page and seeding the frontier
    Seeding,

    /// Pulling the next batch of URLs from the frontier
    Visiting,

    /// Extracting records and links from fetched pages
    Extracting,

    // ===== Terminal States =====
    /// Early-stop condition reached with at least one match
    Matched,

    /// Frontier ran dry
    Exhausted,

    /// Page cap reached
    Capped,
}

impl CrawlState {
    /// Returns true if this is a terminal state (the crawl is over)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Matched | Self::Exhausted | Self::Capped)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        use CrawlState::*;

        matches!(
            (self, next),
            (Idle, Seeding)
                | (Seeding, Visiting)
                | (Seeding, Exhausted)
                | (Seeding, Capped)
                | (Seeding, Matched)
                | (Visiting, Extracting)
                | (Visiting, Exhausted)
                | (Visiting, Capped)
                | (Extracting, Visiting)
                | (Extracting, Matched)
        )
    }

    /// Short lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Seeding => "seeding",
            Self::Visiting => "visiting",
            Self::Extracting => "extracting",
            Self::Matched => "matched",
            Self::Exhausted => "exhausted",
            Self::Capped => "capped",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
