//! Planner tuning parameters.
//!
//! The link range is the one value every component must agree on within a request;
//! the remaining weights are empirically chosen heuristics kept overridable here.

use crate::error::{PlanError, Result};
use serde::{Deserialize, Serialize};

/// Reference maximum point-to-point link distance.
pub const DEFAULT_LINK_RANGE_KM: f64 = 10.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Maximum great-circle distance of a single radio hop
    pub link_range_km: f64,
    pub search: SearchWeights,
    pub smoothing: SmoothingConfig,
    pub interpolation: InterpolationConfig,
    pub ring: RingConfig,
    pub repair: RepairConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            link_range_km: DEFAULT_LINK_RANGE_KM,
            search: SearchWeights::default(),
            smoothing: SmoothingConfig::default(),
            interpolation: InterpolationConfig::default(),
            ring: RingConfig::default(),
            repair: RepairConfig::default(),
        }
    }
}

impl PlannerConfig {
    pub fn with_link_range(mut self, link_range_km: f64) -> Self {
        self.link_range_km = link_range_km;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.link_range_km.is_finite() || self.link_range_km <= 0.0 {
            return Err(PlanError::InvalidConfig(format!(
                "link range must be positive, got {}",
                self.link_range_km
            )));
        }
        let fraction = self.interpolation.step_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(PlanError::InvalidConfig(format!(
                "interpolation step fraction must be in (0, 1], got {fraction}"
            )));
        }
        let progress = self.interpolation.min_progress_fraction;
        if !(progress > 0.0 && progress <= 1.0) {
            return Err(PlanError::InvalidConfig(format!(
                "interpolation progress fraction must be in (0, 1], got {progress}"
            )));
        }
        if self.search.excursion_allowance_km < 0.0 {
            return Err(PlanError::InvalidConfig(
                "excursion allowance cannot be negative".to_string(),
            ));
        }
        if self.ring.destinations_per_extra_edge == 0 {
            return Err(PlanError::InvalidConfig(
                "ring destinations_per_extra_edge must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Scoring constants for the direction-biased search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchWeights {
    /// Multiplier on straight-line distance to the goal
    pub goal_weight: f64,
    /// Penalty per degree of deviation from the start→goal bearing
    pub bearing_weight: f64,
    /// How much farther from the goal a hop may move before it is pruned
    pub excursion_allowance_km: f64,
}

impl Default for SearchWeights {
    fn default() -> Self {
        Self {
            goal_weight: 1.5,
            bearing_weight: 0.1,
            excursion_allowance_km: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub max_passes: usize,
    /// Bearing change at a relay above which a straighter replacement is searched
    pub turn_threshold_deg: f64,
    /// Per-degree weight on replacement bearing deviation
    pub bearing_weight: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            max_passes: 2,
            turn_threshold_deg: 45.0,
            bearing_weight: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationConfig {
    /// Step length as a fraction of the link range
    pub step_fraction: f64,
    pub ideal_weight: f64,
    pub bearing_weight: f64,
    pub remaining_weight: f64,
    /// Minimum progress toward the goal a real tower must make, as a fraction of the step
    pub min_progress_fraction: f64,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            step_fraction: 0.6,
            ideal_weight: 0.7,
            bearing_weight: 0.2,
            remaining_weight: 0.1,
            min_progress_fraction: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    pub max_extra_edges: usize,
    pub destinations_per_extra_edge: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            max_extra_edges: 3,
            destinations_per_extra_edge: 3,
        }
    }
}

impl RingConfig {
    /// Number of redundant destination-to-destination edges for a ring of this size.
    pub fn extra_edges(&self, destinations: usize) -> usize {
        self.max_extra_edges
            .min(destinations / self.destinations_per_extra_edge.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Recursion limit when bridging an over-long hop with real towers
    pub max_depth: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self { max_depth: 8 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PlannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.link_range_km, 10.1);
        assert_eq!(config.search.goal_weight, 1.5);
        assert_eq!(config.search.bearing_weight, 0.1);
        assert_eq!(config.search.excursion_allowance_km, 3.0);
    }

    #[test]
    fn rejects_non_positive_range() {
        let config = PlannerConfig::default().with_link_range(0.0);
        assert!(matches!(config.validate(), Err(PlanError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_out_of_range_step_fraction() {
        let mut config = PlannerConfig::default();
        config.interpolation.step_fraction = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn ring_extra_edges_scale_with_destinations() {
        let ring = RingConfig::default();
        assert_eq!(ring.extra_edges(2), 0);
        assert_eq!(ring.extra_edges(8), 2);
        assert_eq!(ring.extra_edges(30), 3);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: PlannerConfig =
            serde_json::from_str(r#"{"link_range_km": 8.0, "search": {"goal_weight": 2.0}}"#)
                .unwrap();
        assert_eq!(config.link_range_km, 8.0);
        assert_eq!(config.search.goal_weight, 2.0);
        assert_eq!(config.search.bearing_weight, 0.1);
        assert_eq!(config.smoothing.max_passes, 2);
    }
}
