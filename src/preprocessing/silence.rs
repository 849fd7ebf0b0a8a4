//! RMS energy gating

/// Root-mean-square energy of a block (0.0 for an empty block)
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&x| (x as f64) * (x as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

/// Energy gate for analysis windows
#[derive(Debug, Clone, Copy)]
pub struct EnergyGate {
    /// Windows with RMS strictly below this value are rejected (default: 0.01)
    pub min_rms: f32,
}

impl Default for EnergyGate {
    fn default() -> Self {
        Self { min_rms: 0.01 }
    }
}

impl EnergyGate {
    /// Returns the window's RMS if it passes the gate
    pub fn admit(&self, samples: &[f32]) -> Option<f32> {
        let energy = rms(samples);
        if energy < self.min_rms || !energy.is_finite() {
            None
        } else {
            Some(energy)
        }
    }
}
