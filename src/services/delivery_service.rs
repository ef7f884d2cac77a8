//! Delivery Service (spec §4.3) — one delivery attempt for a
//! `(webhook_id, attempt_number)` pair, end to end: load, resolve
//! subscription, sign, POST, classify, record, decide.

use chrono::Duration as ChronoDuration;
use futures_util::StreamExt;
use rand::Rng;
use reqwest::redirect::Policy;
use sqlx::{error::DatabaseError, PgPool};

use crate::{
    cache::SubscriptionCache,
    config::DeliverySettings,
    errors::AppError,
    models::{classify, DeliverTask, DeliveryAttempt, Outcome},
    queue::QueueClient,
    repositories::{DeliveryAttemptRepository, WebhookRepository},
    signing,
};

/// What the worker should do with the queue task after this attempt ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptDisposition {
    /// Webhook or delivery chain is terminal (success, rejected,
    /// exhausted) or the task was a stale duplicate. Ack.
    Terminal,
    /// Next attempt has been enqueued. Ack the current task.
    Rescheduled,
}

pub struct DeliveryService {
    db: PgPool,
    cache: SubscriptionCache,
    queue: QueueClient,
    http: reqwest::Client,
    settings: DeliverySettings,
}

impl DeliveryService {
    pub fn new(
        db: PgPool,
        cache: SubscriptionCache,
        queue: QueueClient,
        settings: DeliverySettings,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(std::time::Duration::from_secs(settings.request_timeout_seconds))
            .build()?;
        Ok(Self {
            db,
            cache,
            queue,
            http,
            settings,
        })
    }

    /// Deterministic backoff per spec §4.3, with optional ±20% jitter.
    pub fn backoff_delay(&self, attempt_number: i32) -> ChronoDuration {
        let index = (attempt_number - 1).max(0) as usize;
        let base = self
            .settings
            .backoff_schedule_seconds
            .get(index)
            .copied()
            .unwrap_or(900);

        let seconds = if self.settings.jitter {
            let factor = rand::thread_rng().gen_range(0.8..1.2);
            ((base as f64) * factor).round() as i64
        } else {
            base
        };
        ChronoDuration::seconds(seconds)
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, task: DeliverTask) -> Result<AttemptDisposition, AppError> {
        // Step 1: load the webhook. Missing (deleted via cascade) is a
        // silent terminal drop.
        let Some(webhook) = WebhookRepository::new(&self.db).find(task.webhook_id).await? else {
            return Ok(AttemptDisposition::Terminal);
        };

        let attempts_repo = DeliveryAttemptRepository::new(&self.db);

        // At-least-once redelivery of the same (webhook_id, attempt_number):
        // the unique constraint guards the DS insert, but checking first
        // avoids paying for a duplicate outbound POST.
        if attempts_repo
            .exists(webhook.id, task.attempt_number)
            .await?
        {
            return Ok(AttemptDisposition::Terminal);
        }

        // Step 2: resolve subscription via the cache.
        let subscription = self.cache.get(&self.db, webhook.subscription_id).await?;
        let subscription = match subscription {
            Some(s) if s.is_active => s,
            _ => {
                self.record(
                    &attempts_repo,
                    webhook.subscription_id,
                    webhook.id,
                    task.attempt_number,
                    None,
                    None,
                    Some("subscription inactive or missing"),
                    false,
                )
                .await?;
                return Ok(AttemptDisposition::Terminal);
            }
        };

        // Step 3: build the request — canonical body and signature over
        // the exact same bytes.
        let body = signing::canonical_body(&webhook.payload)?;
        let signature = signing::sign(&subscription.secret, &body);

        // Step 4: execute, capturing at most response_body_capture_bytes
        // of the response body without buffering the whole thing.
        let (status_code, response_body, error_message) = self
            .send(
                &subscription.target_url,
                body,
                &signature,
                &webhook.event_type,
                webhook.id,
                task.attempt_number,
            )
            .await;

        // Step 5: classify.
        let outcome = classify(status_code.map(|c| c as u16));
        let is_success = outcome == Outcome::Success;

        // Step 6: record.
        let recorded = self
            .record(
                &attempts_repo,
                webhook.subscription_id,
                webhook.id,
                task.attempt_number,
                status_code,
                response_body.as_deref(),
                error_message.as_deref(),
                is_success,
            )
            .await?;

        if !recorded {
            // Lost the race to a concurrent redelivery of the same task;
            // the other attempt's outcome is authoritative.
            return Ok(AttemptDisposition::Terminal);
        }

        // Step 7: decide next action.
        match outcome {
            Outcome::Success | Outcome::Permanent => Ok(AttemptDisposition::Terminal),
            Outcome::Retryable => {
                if task.attempt_number < self.settings.max_attempts {
                    let delay = self.backoff_delay(task.attempt_number);
                    self.queue
                        .enqueue_deliver(
                            DeliverTask {
                                webhook_id: webhook.id,
                                attempt_number: task.attempt_number + 1,
                            },
                            delay,
                        )
                        .await?;
                    Ok(AttemptDisposition::Rescheduled)
                } else {
                    Ok(AttemptDisposition::Terminal)
                }
            }
        }
    }

    async fn send(
        &self,
        target_url: &str,
        body: Vec<u8>,
        signature: &str,
        event_type: &str,
        webhook_id: i64,
        attempt_number: i32,
    ) -> (Option<i32>, Option<String>, Option<String>) {
        let request = self
            .http
            .post(target_url)
            .header("Content-Type", "application/json")
            .header("X-Webhook-Signature", signature)
            .header("X-Webhook-Event", event_type)
            .header("X-Webhook-Id", webhook_id.to_string())
            .header("X-Webhook-Attempt", attempt_number.to_string())
            .body(body);

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return (None, None, Some(transport_error_message(&e))),
        };

        let status = response.status().as_u16() as i32;
        let cap = self.settings.response_body_capture_bytes;
        let mut captured = Vec::with_capacity(cap.min(4096));
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => {
                    let remaining = cap.saturating_sub(captured.len());
                    if remaining == 0 {
                        break;
                    }
                    captured.extend_from_slice(&bytes[..bytes.len().min(remaining)]);
                    if captured.len() >= cap {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        let body_text = String::from_utf8_lossy(&captured).into_owned();
        (Some(status), Some(body_text), None)
    }

    #[allow(clippy::too_many_arguments)]
    async fn record(
        &self,
        attempts_repo: &DeliveryAttemptRepository<'_>,
        subscription_id: i64,
        webhook_id: i64,
        attempt_number: i32,
        status_code: Option<i32>,
        response_body: Option<&str>,
        error_message: Option<&str>,
        is_success: bool,
    ) -> Result<bool, AppError> {
        match attempts_repo
            .insert(
                subscription_id,
                webhook_id,
                attempt_number,
                status_code,
                response_body,
                error_message,
                is_success,
            )
            .await
        {
            Ok(_attempt) => Ok(true),
            Err(AppError::Database(sqlx::Error::Database(e))) if e.is_unique_violation() => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

fn transport_error_message(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}

/// Pure helper kept alongside the service it classifies outcomes for —
/// exposed for completeness checks at the call site.
pub fn attempt_is_terminal(attempt: &DeliveryAttempt, max_attempts: i32) -> bool {
    attempt.is_success
        || classify(attempt.status_code.map(|c| c as u16)) == Outcome::Permanent
        || attempt.attempt_number >= max_attempts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeliverySettings;

    fn settings(jitter: bool) -> DeliverySettings {
        DeliverySettings {
            max_attempts: 5,
            backoff_schedule_seconds: vec![10, 30, 60, 300, 900],
            request_timeout_seconds: 10,
            response_body_capture_bytes: 4096,
            outbound_concurrency: 200,
            jitter,
        }
    }

    fn service_with(settings: DeliverySettings) -> DeliveryService {
        DeliveryService {
            db: unreachable_pool(),
            cache: SubscriptionCache::new(None, 300),
            queue: QueueClient::new(unreachable_pool()),
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn unreachable_pool() -> PgPool {
        PgPool::connect_lazy("postgres://localhost/nonexistent")
            .expect("lazy pool construction does not touch the network")
    }

    #[test]
    fn backoff_matches_deterministic_schedule() {
        let service = service_with(settings(false));
        assert_eq!(service.backoff_delay(1), ChronoDuration::seconds(10));
        assert_eq!(service.backoff_delay(2), ChronoDuration::seconds(30));
        assert_eq!(service.backoff_delay(3), ChronoDuration::seconds(60));
        assert_eq!(service.backoff_delay(4), ChronoDuration::seconds(300));
    }

    #[test]
    fn backoff_with_jitter_stays_within_twenty_percent() {
        let service = service_with(settings(true));
        for _ in 0..50 {
            let delay = service.backoff_delay(2).num_seconds();
            assert!((24..=36).contains(&delay), "delay {delay} out of jitter bounds");
        }
    }
}
