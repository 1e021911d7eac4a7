//! Price persistence
//!
//! Append-only storage for mapped price records. The store owns the
//! `display_time` uniqueness guard, so concurrent cycles racing on the same
//! source stamp resolve to exactly one row without failing either caller.

mod memory;
mod repository;
mod traits;

pub use memory::*;
pub use repository::*;
pub use traits::*;
