//! Health and watering statistics over a plant collection.

use chrono::{DateTime, Utc};

use crate::plant_model::{PlantStats, SavedPlant};

pub struct StatsAggregator;

impl StatsAggregator {
    /// Computes statistics as of the current wall-clock time.
    pub fn compute(plants: &[SavedPlant]) -> PlantStats {
        Self::compute_at(plants, Utc::now())
    }

    /// Computes all counters in one pass over `plants`. The average health score
    /// is rounded to the nearest integer and is 0 for an empty collection.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::Utc;
    /// use plant_care_core::stats_aggregator::StatsAggregator;
    ///
    /// let stats = StatsAggregator::compute_at(&[], Utc::now());
    /// assert_eq!(stats.total_plants, 0);
    /// assert_eq!(stats.average_health_score, 0);
    /// ```
    pub fn compute_at(plants: &[SavedPlant], now: DateTime<Utc>) -> PlantStats {
        let mut stats = PlantStats::default();
        let mut score_sum: u64 = 0;

        for plant in plants {
            stats.total_plants += 1;
            score_sum += u64::from(plant.analysis.health_score);

            if plant.is_healthy() {
                stats.healthy_plants += 1;
            }
            if plant.needs_care() {
                stats.plants_needing_care += 1;
            }
            if plant.needs_water(now) {
                stats.plants_needing_water += 1;
            }
        }

        if stats.total_plants > 0 {
            let mean = score_sum as f64 / stats.total_plants as f64;
            stats.average_health_score = mean.round() as u8;
        }

        stats
    }
}
