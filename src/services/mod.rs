//! Business Logic Services

mod delivery_service;
mod ingest_service;
mod retention_service;
mod subscription_service;

pub use delivery_service::*;
pub use ingest_service::*;
pub use retention_service::*;
pub use subscription_service::*;
