//! Output module for search statistics and user-facing replies
//!
//! This module handles:
//! - Counting what a crawl did (pages, failures, gaps)
//! - Rendering replies into chat-sized text chunks
//! - Delivering replies through a sink

mod reply;
pub mod stats;
mod traits;

pub use reply::{render_reply, Reply, StdoutSink, DEFAULT_MAX_CHUNK_CHARS};
pub use stats::{write_statistics, CrawlStats};
pub use traits::{OutputError, OutputResult, ReplySink};
