// ============================================================
// Layer 4 — Synthetic Cylinder Wake
// ============================================================
// Without the CFD export on disk we still want the full pipeline
// to run end to end, so this module computes an analytic Kármán
// vortex street on demand.
//
// Geometry (all in grid cells):
//   - cylinder centre at (0.5·H, 0.2·W), radius H/16
//   - vortices of alternating sign shed every half wavelength λ/2,
//     offset ±0.1·H from the centreline
//   - each vortex is a Gaussian core of width σ = H/14
//   - the street advects downstream one wavelength per `period`
//     snapshots, so snapshot t and t + period are identical
//   - vortex strength ramps up with distance from the cylinder
//
// Field values are vorticity-like, roughly in [-1, 1], and zero
// inside the cylinder.

use std::f64::consts::PI;

use crate::domain::traits::FieldSource;

#[derive(Debug, Clone)]
pub struct SyntheticWake {
    count:  usize,
    height: usize,
    width:  usize,
    period: usize,
}

impl Default for SyntheticWake {
    fn default() -> Self {
        Self::new(5000, 112, 192)
    }
}

impl SyntheticWake {
    pub fn new(count: usize, height: usize, width: usize) -> Self {
        Self { count, height, width, period: 32 }
    }

    fn value_at(&self, t: usize, row: usize, col: usize) -> f64 {
        let h = self.height as f64;
        let w = self.width as f64;
        let (yc, xc) = (0.5 * h, 0.2 * w);
        let radius   = h / 16.0;
        let (x, y)   = (col as f64, row as f64);

        if (x - xc).powi(2) + (y - yc).powi(2) <= radius * radius {
            return 0.0;
        }

        let lambda = w / 4.0;
        let offset = 0.1 * h;
        let sigma  = h / 14.0;
        let phase  = lambda * (t % self.period) as f64 / self.period as f64;

        // Enough vortices to cover the domain downstream of the cylinder
        let n = (2.0 * (w - xc) / lambda).ceil() as i64 + 2;
        let mut value = 0.0;
        for k in -2..n {
            let xk = xc + radius + phase + k as f64 * lambda / 2.0;
            if xk < xc {
                continue;
            }
            let (sign, yk) = if k.rem_euclid(2) == 0 { (1.0, yc - offset) } else { (-1.0, yc + offset) };
            let ramp = 1.0 - (-(xk - xc) / lambda).exp();
            let r2   = (x - xk).powi(2) + (y - yk).powi(2);
            value += sign * ramp * (-r2 / (2.0 * sigma * sigma)).exp();
        }
        // Weak standing wave so the far field is not exactly zero
        value + 0.05 * (2.0 * PI * (x - phase) / lambda).sin() * (-(y - yc).powi(2) / (h * h / 8.0)).exp()
    }
}

impl FieldSource for SyntheticWake {
    fn len(&self) -> usize {
        self.count
    }

    fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    fn snapshot(&self, index: usize) -> Option<Vec<f32>> {
        if index >= self.count {
            return None;
        }
        let mut field = Vec::with_capacity(self.height * self.width);
        for r in 0..self.height {
            for c in 0..self.width {
                field.push(self.value_at(index, r, c) as f32);
            }
        }
        Some(field)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    impl SyntheticWake {
        fn with_period(mut self, period: usize) -> Self {
            self.period = period;
            self
        }
    }

    #[test]
    fn test_shape_and_bounds() {
        let wake = SyntheticWake::new(10, 16, 32);
        assert_eq!(wake.len(), 10);
        assert_eq!(wake.shape(), (16, 32));
        assert_eq!(wake.snapshot(0).unwrap().len(), 16 * 32);
        assert!(wake.snapshot(10).is_none());
    }

    #[test]
    fn test_periodic_in_time() {
        let wake = SyntheticWake::new(100, 16, 32).with_period(8);
        assert_eq!(wake.snapshot(3), wake.snapshot(11));
        assert_ne!(wake.snapshot(3), wake.snapshot(4));
    }

    #[test]
    fn test_zero_inside_cylinder_and_finite() {
        let wake  = SyntheticWake::new(1, 112, 192);
        let field = wake.snapshot(0).unwrap();
        // cylinder centre: row 56, col 38
        assert_eq!(field[56 * 192 + 38], 0.0);
        assert!(field.iter().all(|v| v.is_finite() && v.abs() < 2.0));
        assert!(field.iter().any(|v| v.abs() > 0.1));
    }
}
