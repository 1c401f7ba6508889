// Minimum account age check

use chrono::{DateTime, TimeDelta, Utc};

/// Discord epoch (2015-01-01T00:00:00Z) in unix milliseconds
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// Whether an account created at `created_at` is at least `min_days` old at `now`.
/// A threshold of zero or less always passes.
pub fn is_old_enough(created_at: DateTime<Utc>, min_days: i64, now: DateTime<Utc>) -> bool {
    if min_days <= 0 {
        return true;
    }
    match TimeDelta::try_days(min_days) {
        Some(min_age) => now.signed_duration_since(created_at) >= min_age,
        // Threshold beyond chrono's range: no account can satisfy it
        None => false,
    }
}

/// Creation time encoded in a snowflake id, to the millisecond
pub fn snowflake_created_at(id: u64) -> DateTime<Utc> {
    let millis = (id >> 22) + DISCORD_EPOCH_MS;
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or(DateTime::UNIX_EPOCH)
}
