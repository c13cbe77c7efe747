use crate::error::{PlanError, Result};
use crate::models::Node;

/// Reject the path at its first hop longer than `max_km`.
///
/// This is the last check every path passes before it leaves the planner.
pub fn validate_path(path: &[Node], max_km: f64) -> Result<()> {
    for pair in path.windows(2) {
        let distance_km = pair[0].distance_km(&pair[1]);
        if distance_km > max_km {
            return Err(PlanError::SegmentTooLong {
                from: pair[0].describe(),
                to: pair[1].describe(),
                distance_km,
                max_km,
            });
        }
    }
    Ok(())
}
