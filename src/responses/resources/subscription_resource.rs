//! Subscription Resource
use serde::Serialize;

use crate::models::Subscription;

#[derive(Debug, Serialize)]
pub struct SubscriptionResource {
    pub id: i64,
    pub target_url: String,
    pub event_types: Vec<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Subscription> for SubscriptionResource {
    fn from(s: Subscription) -> Self {
        Self {
            id: s.id,
            target_url: s.target_url,
            event_types: s.event_types,
            is_active: s.is_active,
            created_at: s.created_at.to_rfc3339(),
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}
