//! ID generation utilities for reelplan
//!
//! Provides functions for generating unique identifiers for plans and
//! shared timestamp helpers.

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a unique plan ID
///
/// Format: `{timestamp_ms}-{random_hex}`
/// Example: `1738300800123-a1b2`
pub fn generate_plan_id() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("{}-{:04x}", timestamp, random)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms_returns_reasonable_timestamp() {
        let ts = now_ms();
        assert!(ts > 1577836800000); // after 2020-01-01
        assert!(ts < 4102444800000); // before 2100-01-01
    }

    #[test]
    fn test_generate_plan_id_format() {
        let before = now_ms();
        let id = generate_plan_id();
        let (stamp, suffix) = id.split_once('-').expect("id should contain a hyphen");
        let stamp: i64 = stamp.parse().expect("timestamp prefix should be numeric");
        assert!(stamp >= before);
        assert!(stamp <= now_ms());
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_plan_id_uniqueness() {
        let id1 = generate_plan_id();
        let id2 = generate_plan_id();
        // With random component, should be different
        assert_ne!(id1, id2);
    }
}
