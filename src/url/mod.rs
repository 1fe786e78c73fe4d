//! URL handling module for zhk-scout
//!
//! This module provides URL normalization and the fixed site origin that all
//! discovered links are resolved against.

mod normalize;
mod origin;

pub use normalize::{normalize_parsed, normalize_url};
pub use origin::SiteOrigin;
