//! Source page access
//!
//! Fetching and extraction for the upstream price board. Fetching sits behind
//! the [`PageSource`] trait so the pipeline can run against canned HTML in
//! tests and offline development.

mod extract;
mod http;
mod mock;
mod traits;

pub use extract::*;
pub use http::*;
pub use mock::*;
pub use traits::*;
