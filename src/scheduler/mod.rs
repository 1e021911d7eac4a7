//! Periodic price refresh
//!
//! Optional in-process scheduling for fetch cycles. Deployments that prefer
//! an external cron can leave this disabled and hit the cron endpoint
//! instead.

mod cron;
mod refresh;

pub use cron::*;
pub use refresh::*;
