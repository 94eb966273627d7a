//! URL handling module for midi-mirror
//!
//! This module turns the possibly relative, possibly unencoded hrefs found in
//! catalog markup into absolute, canonically encoded, fetchable URLs.

mod normalize;

// Re-export main functions
pub use normalize::normalize_url;
