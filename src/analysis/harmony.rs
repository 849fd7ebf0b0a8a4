//! Circle-of-fifths relationships between keys
//!
//! All checks are symmetric in their two arguments.

use super::result::KeyLabel;

/// Harmonic relationship between two candidate keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    /// Relative major/minor: same wheel position, opposite sides
    Relative,
    /// Tonic and dominant: roots a perfect fifth apart (any modes)
    Cadence {
        /// The I side of the V-I pair
        tonic: KeyLabel,
    },
    /// Opposite sides, neighbouring wheel positions
    Diagonal,
    /// Same key
    Identical,
    /// None of the above
    Unrelated,
}

/// True when `a` and `b` are relative keys (e.g. C major / A minor)
pub fn is_relative(a: KeyLabel, b: KeyLabel) -> bool {
    let (ca, cb) = (a.camelot(), b.camelot());
    ca.position == cb.position && ca.side != cb.side
}

/// Tonic of a V-I pair, if the roots are a perfect fifth apart
///
/// The tonic is the key whose root lies a fifth below the other's; its mode
/// is kept. The result does not depend on argument order.
///
/// ```
/// use tonic_dsp::analysis::harmony::cadence_tonic;
/// use tonic_dsp::analysis::result::KeyLabel;
///
/// let c = KeyLabel::major(0);
/// let g = KeyLabel::major(7);
/// assert_eq!(cadence_tonic(g, c), Some(c));
/// assert_eq!(cadence_tonic(c, g), Some(c));
/// ```
pub fn cadence_tonic(a: KeyLabel, b: KeyLabel) -> Option<KeyLabel> {
    let interval = (b.tonic() as i32 - a.tonic() as i32).rem_euclid(12);
    match interval {
        7 => Some(a),
        5 => Some(b),
        _ => None,
    }
}

/// True when the two roots are a perfect fifth apart
pub fn is_cadence(a: KeyLabel, b: KeyLabel) -> bool {
    cadence_tonic(a, b).is_some()
}

/// True when the keys sit diagonally across the Camelot wheel
/// (e.g. C major 8B / E minor 9A)
pub fn is_diagonal(a: KeyLabel, b: KeyLabel) -> bool {
    let (ca, cb) = (a.camelot(), b.camelot());
    ca.side != cb.side && ca.is_adjacent_position(&cb)
}

/// Minor tonic that a major key would be the dominant (V) of
///
/// For a major key rooted at `p` this is the minor key rooted a perfect
/// fourth above (`p + 5`). Minor keys have no target.
pub fn dominant_target(key: KeyLabel) -> Option<KeyLabel> {
    if key.is_major() {
        Some(KeyLabel::minor((key.tonic() as u32 + 5) % 12))
    } else {
        None
    }
}

/// Classify the relationship between two keys
///
/// Relative is checked before cadence, cadence before diagonal.
pub fn relationship(a: KeyLabel, b: KeyLabel) -> Relationship {
    if a == b {
        Relationship::Identical
    } else if is_relative(a, b) {
        Relationship::Relative
    } else if let Some(tonic) = cadence_tonic(a, b) {
        Relationship::Cadence { tonic }
    } else if is_diagonal(a, b) {
        Relationship::Diagonal
    } else {
        Relationship::Unrelated
    }
}
