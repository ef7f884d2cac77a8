//! Retention Service (spec §4.4) — purges `DeliveryAttempt` rows older
//! than the retention horizon in bounded batches. Idempotent: running it
//! twice concurrently is safe because each DELETE targets rows by `id`.

use chrono::{Duration as ChronoDuration, Utc};
use sqlx::PgPool;

use crate::{errors::AppError, repositories::DeliveryAttemptRepository};

pub struct RetentionService<'a> {
    db: &'a PgPool,
    retention_hours: i64,
    batch_size: i64,
}

impl<'a> RetentionService<'a> {
    pub fn new(db: &'a PgPool, retention_hours: i64, batch_size: i64) -> Self {
        Self {
            db,
            retention_hours,
            batch_size,
        }
    }

    /// Delete every attempt older than `now - retention_hours`, in batches
    /// of `batch_size`, until none remain. Returns the total rows removed.
    #[tracing::instrument(skip(self))]
    pub async fn sweep(&self) -> Result<u64, AppError> {
        let cutoff = Utc::now() - ChronoDuration::hours(self.retention_hours);
        let repo = DeliveryAttemptRepository::new(self.db);
        let mut total = 0u64;
        loop {
            let deleted = repo.delete_older_than(cutoff, self.batch_size).await?;
            total += deleted;
            if deleted < self.batch_size as u64 {
                break;
            }
        }
        Ok(total)
    }
}
