//! Database Models
//!
//! SQLx row types mapping to the Postgres schema in `migrations/`.

mod delivery_attempt;
mod queue_task;
mod subscription;
mod webhook;

pub use delivery_attempt::*;
pub use queue_task::*;
pub use subscription::*;
pub use webhook::*;
