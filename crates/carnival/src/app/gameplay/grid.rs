use engine::Vec3;
use serde::{Deserialize, Serialize};

pub const LEFT_SWEEP_COLUMNS: usize = 5;
pub const RIGHT_SWEEP_COLUMNS: usize = 4;
pub const GRID_ROWS: usize = 3;
pub const GRID_CELL_COUNT: usize = (LEFT_SWEEP_COLUMNS + RIGHT_SWEEP_COLUMNS) * GRID_ROWS;
pub const DEFAULT_SPACING_X: f32 = 0.45;
pub const DEFAULT_SPACING_Y: f32 = 0.42;
pub const DEFAULT_GRID_ORIGIN: Vec3 = Vec3::new(0.0, 2.2, 6.0);

/// Where the balloon wall sits and how far apart its cells are.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub origin: Vec3,
    pub spacing_x: f32,
    pub spacing_y: f32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            origin: DEFAULT_GRID_ORIGIN,
            spacing_x: DEFAULT_SPACING_X,
            spacing_y: DEFAULT_SPACING_Y,
        }
    }
}

impl GridSpec {
    pub fn positions(&self) -> Vec<Vec3> {
        compute_positions(self.origin, self.spacing_x, self.spacing_y)
    }
}

/// Spawn points for one balloon wall.
///
/// The left sweep walks from the origin column outward (`origin.x - i * spacing_x` for
/// `i in 0..5`), then the right sweep continues one column past the origin
/// (`origin.x + i * spacing_x` for `i in 1..=4`). Each column lists its rows top to bottom.
/// Inputs are not validated.
pub fn compute_positions(origin: Vec3, spacing_x: f32, spacing_y: f32) -> Vec<Vec3> {
    let left = (0..LEFT_SWEEP_COLUMNS).map(|i| origin.x - i as f32 * spacing_x);
    let right = (1..=RIGHT_SWEEP_COLUMNS).map(|i| origin.x + i as f32 * spacing_x);

    left.chain(right)
        .flat_map(|x| {
            (0..GRID_ROWS).map(move |row| Vec3::new(x, origin.y - row as f32 * spacing_y, origin.z))
        })
        .collect()
}
