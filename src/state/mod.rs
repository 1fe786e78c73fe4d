//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the orchestrator's state machine (seeding, visiting, terminal states)
//! - `PageRole`: what a queued page is expected to be (root, listing, detail, generic)

mod crawl_state;
mod page_role;

// Re-export main types
pub use crawl_state::CrawlState;
pub use page_role::PageRole;
