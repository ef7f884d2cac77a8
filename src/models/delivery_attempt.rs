//! DeliveryAttempt Model
//!
//! One row per HTTP call made against a subscriber's `target_url`. The
//! webhook's delivery state is derived from the set of attempts for its
//! `webhook_id`, not stored anywhere directly.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeliveryAttempt {
    pub id: i64,
    pub subscription_id: i64,
    pub webhook_id: i64,
    pub attempt_number: i32,
    pub status_code: Option<i32>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub is_success: bool,
    pub created_at: DateTime<Utc>,
}

/// Outcome classification for a single delivery attempt (spec step 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Retryable,
    Permanent,
}

/// Classify an attempt's HTTP status. `None` means a transport-level
/// failure (timeout, connection reset, DNS failure, ...), which is always
/// retryable.
pub fn classify(status: Option<u16>) -> Outcome {
    match status {
        None => Outcome::Retryable,
        Some(code) if (200..300).contains(&code) => Outcome::Success,
        Some(408) | Some(429) => Outcome::Retryable,
        Some(code) if (500..600).contains(&code) => Outcome::Retryable,
        Some(_) => Outcome::Permanent,
    }
}

/// Terminal/ongoing state of a webhook, derived from its attempt chain.
/// Not persisted; computed on read from `DeliveryAttemptRepository`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    Pending,
    Delivered,
    Exhausted,
    Rejected,
}

impl DeliveryState {
    /// Derive from a webhook's attempts, ordered by `attempt_number` ascending.
    pub fn derive(attempts: &[DeliveryAttempt], max_attempts: i32) -> Self {
        let Some(last) = attempts.last() else {
            return DeliveryState::Pending;
        };
        match classify(last.status_code.map(|c| c as u16)) {
            Outcome::Success => DeliveryState::Delivered,
            Outcome::Permanent => DeliveryState::Rejected,
            Outcome::Retryable => {
                if last.attempt_number >= max_attempts {
                    DeliveryState::Exhausted
                } else {
                    DeliveryState::Pending
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_success_range() {
        assert_eq!(classify(Some(200)), Outcome::Success);
        assert_eq!(classify(Some(299)), Outcome::Success);
    }

    #[test]
    fn classifies_retryable_statuses() {
        assert_eq!(classify(Some(408)), Outcome::Retryable);
        assert_eq!(classify(Some(429)), Outcome::Retryable);
        assert_eq!(classify(Some(500)), Outcome::Retryable);
        assert_eq!(classify(Some(503)), Outcome::Retryable);
        assert_eq!(classify(None), Outcome::Retryable);
    }

    #[test]
    fn classifies_permanent_statuses() {
        assert_eq!(classify(Some(400)), Outcome::Permanent);
        assert_eq!(classify(Some(404)), Outcome::Permanent);
        assert_eq!(classify(Some(422)), Outcome::Permanent);
    }

    #[test]
    fn derives_pending_with_no_attempts() {
        assert_eq!(DeliveryState::derive(&[], 5), DeliveryState::Pending);
    }

    #[rstest::rstest]
    #[case(Some(200), Outcome::Success)]
    #[case(Some(204), Outcome::Success)]
    #[case(Some(299), Outcome::Success)]
    #[case(Some(300), Outcome::Permanent)]
    #[case(Some(400), Outcome::Permanent)]
    #[case(Some(404), Outcome::Permanent)]
    #[case(Some(408), Outcome::Retryable)]
    #[case(Some(429), Outcome::Retryable)]
    #[case(Some(500), Outcome::Retryable)]
    #[case(Some(503), Outcome::Retryable)]
    #[case(None, Outcome::Retryable)]
    fn classify_matrix(#[case] status: Option<u16>, #[case] expected: Outcome) {
        assert_eq!(classify(status), expected);
    }
}
