//! QueueTask Model
//!
//! Row shape backing the `queue_tasks` table. See `crate::queue` for the
//! enqueue/consume/ack contract built on top of this table.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Deliver,
    Cleanup,
}

impl Lane {
    pub fn as_str(self) -> &'static str {
        match self {
            Lane::Deliver => "deliver",
            Lane::Cleanup => "cleanup",
        }
    }
}

impl std::str::FromStr for Lane {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deliver" => Ok(Lane::Deliver),
            "cleanup" => Ok(Lane::Cleanup),
            other => Err(format!("unknown queue lane: {other}")),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct QueueTaskRow {
    pub id: i64,
    pub lane: String,
    pub payload: serde_json::Value,
    pub visible_at: DateTime<Utc>,
    pub locked_at: Option<DateTime<Utc>>,
    pub locked_by: Option<String>,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

/// Payload for a `deliver` lane task: attempt `attempt_number` for `webhook_id`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeliverTask {
    pub webhook_id: i64,
    pub attempt_number: i32,
}

/// Payload for a `cleanup` lane task. Carries no data; idempotent by design.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CleanupTask {}
