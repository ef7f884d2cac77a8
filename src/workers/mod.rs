//! Background workers: long-running `tokio::spawn` loops started from
//! `main`, each polling one queue lane to completion-dependent decisions
//! (ack/nack) rather than fire-and-forget.

mod delivery_worker;
mod retention_sweeper;
mod scheduler;

pub use delivery_worker::DeliveryWorker;
pub use retention_sweeper::RetentionSweeper;
pub use scheduler::Scheduler;
