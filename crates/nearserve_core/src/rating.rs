//! crates/nearserve_core/src/rating.rs
//!
//! Rolling rating aggregates for services and providers.
//!
//! Aggregates are always recomputed from the full review set rather than
//! adjusted incrementally, so a delete followed by a create can never drift
//! the stored average away from the true mean.

use serde::{Deserialize, Serialize};

/// A recomputed rating aggregate: mean rounded to one decimal place, plus
/// the number of reviews that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: f64,
    pub count: i64,
}

impl Default for Rating {
    fn default() -> Self {
        Self { average: 0.0, count: 0 }
    }
}

impl Rating {
    /// Computes the aggregate for a set of star ratings. An empty set yields
    /// the zero aggregate, matching a service or provider with no reviews.
    pub fn from_ratings(ratings: &[i16]) -> Self {
        if ratings.is_empty() {
            return Self::default();
        }
        let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
        let mean = sum as f64 / ratings.len() as f64;
        Self {
            average: round_to_tenth(mean),
            count: ratings.len() as i64,
        }
    }
}

/// Rounds to one decimal place, half away from zero.
fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Per-star review counts for a service, indexed 1 through 5.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatingDistribution {
    #[serde(rename = "1")]
    pub one: i64,
    #[serde(rename = "2")]
    pub two: i64,
    #[serde(rename = "3")]
    pub three: i64,
    #[serde(rename = "4")]
    pub four: i64,
    #[serde(rename = "5")]
    pub five: i64,
}

impl RatingDistribution {
    pub fn from_ratings(ratings: &[i16]) -> Self {
        let mut dist = Self::default();
        for rating in ratings {
            match rating {
                1 => dist.one += 1,
                2 => dist.two += 1,
                3 => dist.three += 1,
                4 => dist.four += 1,
                5 => dist.five += 1,
                _ => {}
            }
        }
        dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_is_zero() {
        assert_eq!(Rating::from_ratings(&[]), Rating { average: 0.0, count: 0 });
    }

    #[test]
    fn mean_is_rounded_to_one_decimal() {
        // 4 + 5 + 5 = 14 / 3 = 4.666... -> 4.7
        let rating = Rating::from_ratings(&[4, 5, 5]);
        assert_eq!(rating.average, 4.7);
        assert_eq!(rating.count, 3);

        // 1 + 2 = 3 / 2 = 1.5 stays exact
        assert_eq!(Rating::from_ratings(&[1, 2]).average, 1.5);
    }

    #[test]
    fn recompute_after_delete_matches_remaining_set() {
        let all = [5i16, 3, 4, 4];
        let after_delete = [5i16, 4, 4];
        assert_eq!(Rating::from_ratings(&all).average, 4.0);
        assert_eq!(Rating::from_ratings(&after_delete).average, 4.3);
        assert_eq!(Rating::from_ratings(&after_delete).count, 3);
    }

    #[test]
    fn distribution_counts_each_star() {
        let dist = RatingDistribution::from_ratings(&[5, 5, 4, 1, 3, 5]);
        assert_eq!(dist.five, 3);
        assert_eq!(dist.four, 1);
        assert_eq!(dist.three, 1);
        assert_eq!(dist.two, 0);
        assert_eq!(dist.one, 1);
    }
}
