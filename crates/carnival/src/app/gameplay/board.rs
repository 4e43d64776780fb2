use engine::Vec3;
use serde::{Deserialize, Serialize};

/// Region of the dart board where a thrown dart sticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardZone {
    pub half_width: f32,
    pub near_depth: f32,
    pub far_depth: f32,
}

impl Default for BoardZone {
    fn default() -> Self {
        Self {
            half_width: 2.5,
            near_depth: 4.75,
            far_depth: 6.5,
        }
    }
}

impl BoardZone {
    pub fn contains(&self, point: Vec3) -> bool {
        point.is_finite()
            && point.x.abs() <= self.half_width
            && point.z >= self.near_depth
            && point.z <= self.far_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_inclusive() {
        let zone = BoardZone::default();
        assert!(zone.contains(Vec3::new(2.5, 0.0, 4.75)));
        assert!(zone.contains(Vec3::new(-2.5, 9.0, 6.5)));
    }

    #[test]
    fn outside_points_miss() {
        let zone = BoardZone::default();
        assert!(!zone.contains(Vec3::new(2.6, 0.0, 5.0)));
        assert!(!zone.contains(Vec3::new(0.0, 0.0, 4.7)));
        assert!(!zone.contains(Vec3::new(0.0, 0.0, 6.6)));
        assert!(!zone.contains(Vec3::new(f32::NAN, 0.0, 5.0)));
    }
}
