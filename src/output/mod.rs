//! Output-tree concerns: safe naming and run summaries
//!
//! The mirrored tree is laid out as
//! `<root>/<slugified-category-name>/<slugified-file-basename>.<ext>`;
//! this module owns the naming rules and the end-of-run counters.

pub mod naming;
pub mod stats;

pub use naming::{filename_from_url, slugify, SLUG_MAX_LEN};
pub use stats::{print_summary, RunStats};
