use chrono::Utc;
use uuid::Uuid;

/// Length of the random suffix appended to every generated id.
const RANDOM_SUFFIX_LEN: usize = 9;

/// Generates a unique id of the form `{prefix}_{unix_millis}_{random}`.
///
/// Uniqueness comes from the millisecond timestamp plus nine hex characters
/// of a v4 UUID; no shared counter is involved.
pub fn generate_id(prefix: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        prefix,
        Utc::now().timestamp_millis(),
        &random[..RANDOM_SUFFIX_LEN]
    )
}
