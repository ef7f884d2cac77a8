//! Subscription Service
//!
//! Deliberately thin (spec §1: the full CRUD surface is an external
//! collaborator) — persistence only, no business logic beyond that.
use sqlx::PgPool;

use crate::{errors::AppError, models::Subscription, repositories::SubscriptionRepository};

pub struct SubscriptionService<'a> {
    db: &'a PgPool,
}

impl<'a> SubscriptionService<'a> {
    pub fn new(db: &'a PgPool) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        target_url: &str,
        secret: &str,
        event_types: &[String],
    ) -> Result<Subscription, AppError> {
        SubscriptionRepository::new(self.db)
            .create(target_url, secret, event_types)
            .await
    }

    pub async fn find(&self, id: i64) -> Result<Option<Subscription>, AppError> {
        SubscriptionRepository::new(self.db).find(id).await
    }

    pub async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<Subscription>, i64), AppError> {
        let repo = SubscriptionRepository::new(self.db);
        let offset = (page.max(1) - 1) * per_page;
        let subscriptions = repo.list(per_page, offset).await?;
        let total = repo.count().await?;
        Ok((subscriptions, total))
    }
}
