// ============================================================
// Layer 3 — Sensor Layout
// ============================================================
// The reconstruction model only ever sees the field at a handful
// of fixed grid points. The default layout puts 8 sensors in the
// wake behind the cylinder: two rows straddling the centreline
// where the vortices shed, plus centreline sensors further
// downstream.

use serde::{Deserialize, Serialize};

/// Default sensor positions as fractions of (height, width)
const CYLINDER_SENSORS: [(f64, f64); 8] = [
    (0.50, 0.25),
    (0.40, 0.35),
    (0.60, 0.35),
    (0.50, 0.45),
    (0.40, 0.55),
    (0.60, 0.55),
    (0.50, 0.70),
    (0.50, 0.85),
];

/// Fixed sensor positions as `(row, col)` grid coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorLayout {
    positions: Vec<(usize, usize)>,
}

impl SensorLayout {
    /// Build a layout from explicit positions.
    /// Fails if any sensor falls outside a `height × width` grid.
    pub fn new(positions: Vec<(usize, usize)>, height: usize, width: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(!positions.is_empty(), "sensor layout must contain at least one sensor");
        for &(r, c) in &positions {
            anyhow::ensure!(
                r < height && c < width,
                "sensor ({r}, {c}) lies outside the {height}x{width} grid"
            );
        }
        Ok(Self { positions })
    }

    /// The 8-sensor cylinder wake layout scaled to the given grid.
    /// Fails on an empty grid, where no position can hold a sensor.
    pub fn cylinder_wake(height: usize, width: usize) -> anyhow::Result<Self> {
        let scale = |frac: f64, n: usize| ((frac * n as f64) as usize).min(n.saturating_sub(1));
        let positions = CYLINDER_SENSORS
            .iter()
            .map(|&(fr, fc)| (scale(fr, height), scale(fc, width)))
            .collect();
        Self::new(positions, height, width)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Read the sensor values out of a row-major `field` of the given width.
    pub fn sample(&self, field: &[f32], width: usize) -> Vec<f32> {
        self.positions
            .iter()
            .map(|&(r, c)| field[r * width + c])
            .collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cylinder_layout_on_default_grid() {
        let layout = SensorLayout::cylinder_wake(112, 192).unwrap();
        assert_eq!(layout.len(), 8);
        assert_eq!(layout.positions[0], (56, 48));
        assert!(layout.positions.iter().all(|&(r, c)| r < 112 && c < 192));
    }

    #[test]
    fn test_cylinder_layout_on_tiny_grid_stays_inside() {
        let layout = SensorLayout::cylinder_wake(2, 3).unwrap();
        assert!(layout.positions.iter().all(|&(r, c)| r < 2 && c < 3));
    }

    #[test]
    fn test_cylinder_layout_on_empty_grid_rejected() {
        assert!(SensorLayout::cylinder_wake(0, 192).is_err());
        assert!(SensorLayout::cylinder_wake(112, 0).is_err());
    }

    #[test]
    fn test_out_of_grid_sensor_rejected() {
        assert!(SensorLayout::new(vec![(0, 0), (4, 1)], 4, 4).is_err());
        assert!(SensorLayout::new(vec![], 4, 4).is_err());
        assert!(SensorLayout::new(vec![(3, 3)], 4, 4).is_ok());
    }

    #[test]
    fn test_sample_reads_row_major() {
        let field: Vec<f32> = (0..12).map(|v| v as f32).collect(); // 3x4
        let layout = SensorLayout::new(vec![(0, 1), (2, 3)], 3, 4).unwrap();
        assert_eq!(layout.sample(&field, 4), vec![1.0, 11.0]);
    }
}
