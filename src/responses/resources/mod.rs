//! API Resources (DTOs for responses)
//!
//! Transform models into API-safe response formats — notably, strip the
//! subscription `secret` before it ever reaches a caller.

mod delivery_attempt_resource;
mod subscription_resource;

pub use delivery_attempt_resource::*;
pub use subscription_resource::*;
