use std::sync::Arc;

use burn::data::dataset::Dataset;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::noise::add_noise;
use crate::domain::{range::IndexRange, sensor::SensorLayout, traits::FieldSource};

/// One (noisy sensors, full field) training pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSample {
    pub sensors: Vec<f32>,
    pub field:   Vec<f32>,
}

/// How sensor noise is drawn on each read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoiseMode {
    /// Clean sensor values
    Off,
    /// Fresh noise every time a sample is read (training / validation)
    Random { snr_db: f64 },
    /// Same noise for the same snapshot on every read (test)
    Seeded { snr_db: f64, seed: u64 },
}

impl NoiseMode {
    /// `Random`, or `Off` for clean sensors.
    pub fn random(snr_db: f64, noisy: bool) -> Self {
        if noisy { Self::Random { snr_db } } else { Self::Off }
    }

    /// `Seeded`, or `Off` for clean sensors.
    pub fn seeded(snr_db: f64, seed: u64, noisy: bool) -> Self {
        if noisy { Self::Seeded { snr_db, seed } } else { Self::Off }
    }
}

/// Cylinder wake snapshots in `range`, observed through `layout`.
pub struct CylinderSnrDataset {
    source: Arc<dyn FieldSource>,
    layout: SensorLayout,
    range:  IndexRange,
    noise:  NoiseMode,
}

impl CylinderSnrDataset {
    pub fn new(
        source: Arc<dyn FieldSource>,
        layout: SensorLayout,
        range:  IndexRange,
        noise:  NoiseMode,
    ) -> Self {
        Self { source, layout, range, noise }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.source.shape()
    }

    pub fn sensor_num(&self) -> usize {
        self.layout.len()
    }
}

impl Dataset<FieldSample> for CylinderSnrDataset {
    fn get(&self, index: usize) -> Option<FieldSample> {
        let snapshot = self.range.index(index)?;
        let field    = self.source.snapshot(snapshot)?;
        let (_, w)   = self.source.shape();

        let mut sensors = self.layout.sample(&field, w);
        match self.noise {
            NoiseMode::Off => {}
            NoiseMode::Random { snr_db } => {
                add_noise(&mut sensors, snr_db, &mut rand::thread_rng());
            }
            NoiseMode::Seeded { snr_db, seed } => {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(snapshot as u64));
                add_noise(&mut sensors, snr_db, &mut rng);
            }
        }
        Some(FieldSample { sensors, field })
    }

    fn len(&self) -> usize {
        // Clip to the source so a too-long range never yields None mid-epoch
        self.range.end.min(self.source.len()).saturating_sub(self.range.start)
    }
}
