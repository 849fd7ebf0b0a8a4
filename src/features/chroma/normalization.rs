//! Chroma normalization strategies

const EPSILON: f32 = 1e-10;

/// Scale a chroma vector so its largest bin is 1.0
///
/// All-zero vectors are returned unchanged.
pub fn normalize_max(chroma: &mut [f32; 12]) {
    let max = chroma.iter().copied().fold(0.0f32, f32::max);
    if max > EPSILON {
        for v in chroma.iter_mut() {
            *v /= max;
        }
    }
}

/// Scale a chroma vector to unit L2 norm
///
/// All-zero vectors are returned unchanged.
pub fn normalize_l2(chroma: &mut [f32; 12]) {
    let norm = chroma.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > EPSILON {
        for v in chroma.iter_mut() {
            *v /= norm;
        }
    }
}

/// Sharpen chroma vector to emphasize prominent semitones
///
/// # Arguments
///
/// * `chroma` - 12-element chroma vector
/// * `power` - Sharpening power (e.g., 1.5 or 2.0); 1.0 leaves the shape unchanged
///
/// # Returns
///
/// Sharpened chroma vector (L2 normalized)
pub fn sharpen_chroma(chroma: &[f32; 12], power: f32) -> [f32; 12] {
    let mut sharpened = chroma.map(|v| v.max(0.0).powf(power));
    normalize_l2(&mut sharpened);
    sharpened
}

/// Population variance of the bins; 0.0 means a flat (atonal) vector
pub fn chroma_variance(chroma: &[f32; 12]) -> f32 {
    let mean = chroma.iter().sum::<f32>() / 12.0;
    chroma.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / 12.0
}
