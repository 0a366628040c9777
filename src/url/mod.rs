//! URL handling module for Kraul
//!
//! This module turns raw `href` values into absolute, fragment-free
//! addresses and provides the small predicates the scheduler uses to decide
//! what enters the frontier.

mod normalize;
mod resolve;

// Re-export main functions
pub use normalize::{is_web_url, parse_seed, strip_fragment, visit_key};
pub use resolve::resolve;
