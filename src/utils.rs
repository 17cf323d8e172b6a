//! Utility functions for the rankings service

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Ordering that puts higher ratings first; NaN compares equal
pub fn by_rating_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Normalize a group name for uniqueness checks
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_rating_desc() {
        let mut ratings = vec![984.0, 1016.0, 1000.0];
        ratings.sort_by(|a, b| by_rating_desc(*a, *b));
        assert_eq!(ratings, vec![1016.0, 1000.0, 984.0]);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Office League "), "office league");
    }
}
