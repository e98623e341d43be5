use anyhow::Result;
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::time::Duration;

use crate::store::HrStore;

/// true  => email is TAKEN
/// false => email is AVAILABLE (usually we store only taken)
pub static EMAIL_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000) // tune based on memory
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

#[inline]
fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Mark a single email as taken
pub async fn mark_taken(email: &str) {
    EMAIL_CACHE.insert(normalize(email), true).await;
}

/// Check if email is known to be taken. A miss says nothing.
pub async fn is_taken(email: &str) -> bool {
    EMAIL_CACHE.get(&normalize(email)).await.unwrap_or(false)
}

/// Batch mark emails as taken
async fn batch_mark(emails: &[String]) {
    let futures: Vec<_> = emails
        .iter()
        .map(|e| EMAIL_CACHE.insert(normalize(e), true))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load only RECENT sign-ins into the cache, in batches.
pub async fn warmup_email_cache(store: &dyn HrStore, days: u32, batch_size: usize) -> Result<()> {
    let emails = store.recent_sign_in_emails(days).await?;

    for chunk in emails.chunks(batch_size.max(1)) {
        batch_mark(chunk).await;
    }

    tracing::info!(
        "Email cache warmup complete: {} recent accounts (last {} days)",
        emails.len(),
        days
    );

    Ok(())
}
