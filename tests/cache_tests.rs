//! Subscription cache behavior that doesn't need a live Redis or Postgres:
//! the disabled-cache passthrough path (spec §4.2 — degrade gracefully
//! when Redis isn't configured).

use webhook_relay_api::cache::SubscriptionCache;

#[tokio::test]
async fn invalidate_without_redis_is_a_harmless_noop() {
    let cache = SubscriptionCache::new(None, 300);
    // Must not panic or block even though nothing is actually cached.
    cache.invalidate(1).await;
}
