use serde::{Deserialize, Serialize};

use crate::models::MatchRecord;

/// Aggregate counters over persisted matches. Pure read-side; zero
/// matches yields all zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchStatistics {
    /// Live records counted.
    pub total: usize,
    /// Score >= 0.8.
    pub high: usize,
    /// Score in [0.5, 0.8).
    pub medium: usize,
    /// Score < 0.5.
    pub low: usize,
    /// Presented to the customer (sunuldu and beyond).
    pub presented: usize,
    /// Awaiting a decision (yeni or incelendi).
    pub fresh: usize,
    pub max_score: f64,
    pub mean_score: f64,
}

/// Aggregate live match records into [`MatchStatistics`].
///
/// Soft-deactivated records are audit history and are skipped.
pub fn aggregate(matches: &[MatchRecord]) -> MatchStatistics {
    let mut stats = MatchStatistics::default();
    let mut score_sum = 0.0;

    for record in matches.iter().filter(|m| m.active) {
        stats.total += 1;
        score_sum += record.score;

        if record.score >= 0.8 {
            stats.high += 1;
        } else if record.score >= 0.5 {
            stats.medium += 1;
        } else {
            stats.low += 1;
        }

        if record.status.is_decided() {
            stats.presented += 1;
        } else {
            stats.fresh += 1;
        }

        if record.score > stats.max_score {
            stats.max_score = record.score;
        }
    }

    if stats.total > 0 {
        stats.mean_score = score_sum / stats.total as f64;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(score: f64, status: MatchStatus, active: bool) -> MatchRecord {
        MatchRecord {
            request_id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            score,
            status,
            active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_zero_matches_all_zero() {
        let stats = aggregate(&[]);
        assert_eq!(stats, MatchStatistics::default());
        assert_eq!(stats.max_score, 0.0);
        assert_eq!(stats.mean_score, 0.0);
    }

    #[test]
    fn test_score_bands() {
        let stats = aggregate(&[
            record(0.95, MatchStatus::Yeni, true),
            record(0.80, MatchStatus::Yeni, true),
            record(0.79, MatchStatus::Yeni, true),
            record(0.50, MatchStatus::Yeni, true),
            record(0.49, MatchStatus::Yeni, true),
        ]);

        assert_eq!(stats.total, 5);
        assert_eq!(stats.high, 2);
        assert_eq!(stats.medium, 2);
        assert_eq!(stats.low, 1);
        assert_eq!(stats.max_score, 0.95);
    }

    #[test]
    fn test_status_buckets() {
        let stats = aggregate(&[
            record(0.9, MatchStatus::Yeni, true),
            record(0.9, MatchStatus::Incelendi, true),
            record(0.9, MatchStatus::Sunuldu, true),
            record(0.9, MatchStatus::KabulEdildi, true),
            record(0.9, MatchStatus::Reddedildi, true),
        ]);

        assert_eq!(stats.fresh, 2);
        assert_eq!(stats.presented, 3);
    }

    #[test]
    fn test_deactivated_records_skipped() {
        let stats = aggregate(&[
            record(0.9, MatchStatus::Yeni, true),
            record(0.4, MatchStatus::Yeni, false),
        ]);

        assert_eq!(stats.total, 1);
        assert_eq!(stats.low, 0);
        assert_eq!(stats.mean_score, 0.9);
    }

    #[test]
    fn test_mean_score() {
        let stats = aggregate(&[
            record(0.6, MatchStatus::Yeni, true),
            record(0.8, MatchStatus::Yeni, true),
        ]);

        assert!((stats.mean_score - 0.7).abs() < 1e-9);
    }
}
