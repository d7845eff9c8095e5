//! Response normalization module
//!
//! # Overview
//!
//! The [`Normalizer`] is the dispatch boundary between the harness and the
//! per-feed extraction functions:
//!
//! 1. a non-success status fails fast with the status code
//! 2. XML feeds get their `Response_Data` subtree located and walked; a
//!    document without one is an empty page
//! 3. report feeds get the raw response
//! 4. data errors are tagged with the feed name exactly once, here
//!
//! Nothing here performs I/O or retries.

mod normalizer;
mod types;

pub use normalizer::{page_info, Normalizer};
pub use types::{PageInfo, RESPONSE_DATA, RESPONSE_RESULTS};
