//! Analysis result types
//!
//! Key labels, the per-window timeline, and the records handed to the
//! presentation layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical chromatic spellings, index = pitch class (0 = C)
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Flat spellings accepted by [`KeyLabel::parse`] and normalized to sharps
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Key mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mode {
    /// Major (Ionian)
    Major,
    /// Natural minor (Aeolian)
    Minor,
}

impl Mode {
    /// Lowercase mode name ("major" / "minor")
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
        }
    }

    /// The other mode
    pub fn opposite(&self) -> Mode {
        match self {
            Mode::Major => Mode::Minor,
            Mode::Minor => Mode::Major,
        }
    }
}

/// Musical key: tonic pitch class plus mode
///
/// The tonic is always stored normalized to `0..12`, so every label maps to
/// exactly one of the canonical spellings in [`NOTE_NAMES`]. Serialized as
/// its display name (e.g. `"A minor"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct KeyLabel {
    tonic: u8,
    mode: Mode,
}

impl KeyLabel {
    /// Create a key label, wrapping the tonic into `0..12`
    pub fn new(tonic: u32, mode: Mode) -> Self {
        Self {
            tonic: (tonic % 12) as u8,
            mode,
        }
    }

    /// Major key on the given tonic (0 = C, 1 = C#, ..., 11 = B)
    pub fn major(tonic: u32) -> Self {
        Self::new(tonic, Mode::Major)
    }

    /// Minor key on the given tonic (0 = C, 1 = C#, ..., 11 = B)
    pub fn minor(tonic: u32) -> Self {
        Self::new(tonic, Mode::Minor)
    }

    /// Tonic pitch class in `0..12`
    pub fn tonic(&self) -> u8 {
        self.tonic
    }

    /// Key mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// True for major keys
    pub fn is_major(&self) -> bool {
        self.mode == Mode::Major
    }

    /// True for minor keys
    pub fn is_minor(&self) -> bool {
        self.mode == Mode::Minor
    }

    /// Canonical tonic spelling (sharps)
    pub fn tonic_name(&self) -> &'static str {
        NOTE_NAMES[self.tonic as usize]
    }

    /// Full name, e.g. "C major", "F# minor"
    ///
    /// ```
    /// use tonic_dsp::analysis::result::KeyLabel;
    ///
    /// assert_eq!(KeyLabel::major(0).name(), "C major");
    /// assert_eq!(KeyLabel::minor(6).name(), "F# minor");
    /// ```
    pub fn name(&self) -> String {
        format!("{} {}", self.tonic_name(), self.mode.name())
    }

    /// Short chord-style name, e.g. "C", "Am", "F#m"
    pub fn short_name(&self) -> String {
        match self.mode {
            Mode::Major => self.tonic_name().to_string(),
            Mode::Minor => format!("{}m", self.tonic_name()),
        }
    }

    /// Key transposed by a number of semitones (mode unchanged)
    pub fn transpose(&self, semitones: i32) -> Self {
        let tonic = (self.tonic as i32 + semitones).rem_euclid(12) as u32;
        Self::new(tonic, self.mode)
    }

    /// Position on the Camelot wheel
    ///
    /// Minor keys sit on side A, major keys on side B; 8A = A minor and
    /// 8B = C major. Stepping one position clockwise moves up a fifth.
    ///
    /// ```
    /// use tonic_dsp::analysis::result::KeyLabel;
    ///
    /// assert_eq!(KeyLabel::minor(9).camelot().to_string(), "8A");
    /// assert_eq!(KeyLabel::major(0).camelot().to_string(), "8B");
    /// assert_eq!(KeyLabel::major(11).camelot().to_string(), "1B");
    /// ```
    pub fn camelot(&self) -> CamelotCode {
        let tonic = self.tonic as u32;
        match self.mode {
            Mode::Major => CamelotCode {
                position: ((tonic * 7 + 7) % 12 + 1) as u8,
                side: CamelotSide::B,
            },
            Mode::Minor => CamelotCode {
                position: ((tonic * 7 + 4) % 12 + 1) as u8,
                side: CamelotSide::A,
            },
        }
    }

    /// Key at a Camelot wheel position
    pub fn from_camelot(code: CamelotCode) -> Self {
        // 7 is its own inverse mod 12, so position = 7 * tonic + c  =>  tonic = 7 * (position - c)
        let index = (code.position as u32 + 11) % 12;
        match code.side {
            CamelotSide::B => Self::major((7 * (index + 12 - 7)) % 12),
            CamelotSide::A => Self::minor((7 * (index + 12 - 4)) % 12),
        }
    }

    /// Parse a key name
    ///
    /// Accepts "A minor", "A min", "Am", "C", "C major", "Db major" and
    /// Camelot codes ("8A"). Flat spellings are normalized to sharps.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(code) = CamelotCode::parse(text) {
            return Some(Self::from_camelot(code));
        }

        let mut parts = text.split_whitespace();
        let note = parts.next()?;
        let mode_word = parts.next();
        if parts.next().is_some() {
            return None;
        }

        let (note, mut mode) = match note.strip_suffix('m') {
            Some(stripped) if mode_word.is_none() && !stripped.is_empty() => (stripped, Mode::Minor),
            _ => (note, Mode::Major),
        };

        if let Some(word) = mode_word {
            mode = match word.to_ascii_lowercase().as_str() {
                "major" | "maj" => Mode::Major,
                "minor" | "min" => Mode::Minor,
                _ => return None,
            };
        }

        let tonic = NOTE_NAMES
            .iter()
            .position(|n| n.eq_ignore_ascii_case(note))
            .or_else(|| FLAT_NAMES.iter().position(|n| n.eq_ignore_ascii_case(note)))?;

        Some(Self::new(tonic as u32, mode))
    }

    /// Root-position triad (root, third, fifth) frequencies in Hz
    ///
    /// `octave` follows scientific pitch notation: octave 4 places the root
    /// between C4 and B4, so A minor in octave 4 starts at 440 Hz.
    pub fn triad_frequencies(&self, octave: i32) -> [f32; 3] {
        let root_midi = 12 * (octave + 1) + self.tonic as i32;
        let third = match self.mode {
            Mode::Major => 4,
            Mode::Minor => 3,
        };
        [root_midi, root_midi + third, root_midi + 7]
            .map(|midi| 440.0 * 2f32.powf((midi - 69) as f32 / 12.0))
    }
}

impl fmt::Display for KeyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<KeyLabel> for String {
    fn from(key: KeyLabel) -> Self {
        key.name()
    }
}

impl TryFrom<String> for KeyLabel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        KeyLabel::parse(&value).ok_or_else(|| format!("unrecognized key label '{}'", value))
    }
}

/// Side of the Camelot wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CamelotSide {
    /// Minor keys
    A,
    /// Major keys
    B,
}

/// Camelot wheel position (1-12) and side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CamelotCode {
    /// Wheel position, 1-12
    pub position: u8,
    /// Wheel side
    pub side: CamelotSide,
}

impl CamelotCode {
    /// Parse "8A" / "12B" notation
    pub fn parse(notation: &str) -> Option<Self> {
        let (last, _) = notation.char_indices().last()?;
        if last == 0 {
            return None;
        }

        let (num_str, suffix) = notation.split_at(last);
        let position: u8 = num_str.parse().ok()?;
        if !(1..=12).contains(&position) {
            return None;
        }

        let side = match suffix {
            "A" | "a" => CamelotSide::A,
            "B" | "b" => CamelotSide::B,
            _ => return None,
        };

        Some(Self { position, side })
    }

    /// Clockwise distance around the wheel in `0..12`
    pub fn steps_to(&self, other: &CamelotCode) -> u8 {
        ((other.position as i32 - self.position as i32).rem_euclid(12)) as u8
    }

    /// True when the two positions are neighbours on the wheel (either side)
    pub fn is_adjacent_position(&self, other: &CamelotCode) -> bool {
        matches!(self.steps_to(other), 1 | 11)
    }
}

impl fmt::Display for CamelotCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side {
            CamelotSide::A => 'A',
            CamelotSide::B => 'B',
        };
        write!(f, "{}{}", self.position, side)
    }
}

/// Key estimate for one analysis window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowObservation {
    /// Window start in whole seconds
    pub start_time: u32,

    /// Best-correlating key
    pub key: KeyLabel,

    /// Pearson correlation against the winning profile (-1.0 to 1.0)
    pub score: f32,

    /// RMS energy of the window (vote weight)
    pub energy: f32,
}

impl WindowObservation {
    /// Correlation as a display percentage: ×100, one decimal, never negative
    pub fn confidence_pct(&self) -> f32 {
        ((self.score.max(0.0) * 1000.0).round() / 10.0).min(100.0)
    }
}

/// Change of local key between two consecutive windows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyChange {
    /// Start of the window where the new key is first observed (seconds)
    pub timestamp: u32,

    /// Key before change
    pub from_key: KeyLabel,

    /// Key after change
    pub to_key: KeyLabel,

    /// Mean correlation of the two windows (0.0-1.0)
    pub confidence: f32,
}

/// Chronological sequence of accepted window observations
///
/// Windows rejected by the energy gate are absent, not zero-filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeline {
    observations: Vec<WindowObservation>,
}

impl Timeline {
    /// Build a timeline; observations must already be in chronological order
    pub fn new(observations: Vec<WindowObservation>) -> Self {
        Self { observations }
    }

    /// Number of accepted windows
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// True when no window survived the energy gate
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// All observations in chronological order
    pub fn observations(&self) -> &[WindowObservation] {
        &self.observations
    }

    /// Iterate observations in chronological order
    pub fn iter(&self) -> std::slice::Iter<'_, WindowObservation> {
        self.observations.iter()
    }

    /// Last observed window
    pub fn last(&self) -> Option<&WindowObservation> {
        self.observations.last()
    }

    /// Distinct keys in order of first appearance
    pub fn distinct_keys(&self) -> Vec<KeyLabel> {
        let mut keys: Vec<KeyLabel> = Vec::new();
        for obs in &self.observations {
            if !keys.contains(&obs.key) {
                keys.push(obs.key);
            }
        }
        keys
    }

    /// Number of windows labelled `key`
    pub fn count(&self, key: KeyLabel) -> usize {
        self.observations.iter().filter(|o| o.key == key).count()
    }

    /// Percentage (0-100) of windows labelled `key`
    pub fn presence(&self, key: KeyLabel) -> f32 {
        if self.observations.is_empty() {
            return 0.0;
        }
        self.count(key) as f32 * 100.0 / self.observations.len() as f32
    }

    /// Mean correlation percentage (0-100) over windows labelled `key`
    ///
    /// Negative correlations count as zero. Returns 0.0 when `key` was never
    /// observed.
    pub fn mean_confidence(&self, key: KeyLabel) -> f32 {
        let scores: Vec<f32> = self
            .observations
            .iter()
            .filter(|o| o.key == key)
            .map(|o| o.score.clamp(0.0, 1.0) * 100.0)
            .collect();
        if scores.is_empty() {
            return 0.0;
        }
        scores.iter().sum::<f32>() / scores.len() as f32
    }

    /// Windows labelled `key` that directly follow a window with the same label
    pub fn consecutive_repeats(&self, key: KeyLabel) -> usize {
        self.observations
            .windows(2)
            .filter(|pair| pair[0].key == key && pair[1].key == key)
            .count()
    }

    /// Local key changes between consecutive windows
    pub fn key_changes(&self) -> Vec<KeyChange> {
        self.observations
            .windows(2)
            .filter(|pair| pair[0].key != pair[1].key)
            .map(|pair| KeyChange {
                timestamp: pair[1].start_time,
                from_key: pair[0].key,
                to_key: pair[1].key,
                confidence: ((pair[0].score.max(0.0) + pair[1].score.max(0.0)) / 2.0).min(1.0),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a WindowObservation;
    type IntoIter = std::slice::Iter<'a, WindowObservation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

/// Qualitative confidence tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfidenceTier {
    /// Nothing to analyze (every window rejected)
    NoSignal,
    /// Low or ambiguous confidence
    Complex,
    /// Middle tier
    VeryReliable,
    /// Highest tier
    Indisputable,
}

impl ConfidenceTier {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::Indisputable => "Indisputable key",
            ConfidenceTier::VeryReliable => "Very reliable key",
            ConfidenceTier::Complex => "Complex analysis",
            ConfidenceTier::NoSignal => "No usable signal",
        }
    }

    /// Display color (hex)
    pub fn color(&self) -> &'static str {
        match self {
            ConfidenceTier::Indisputable => "#00b09b",
            ConfidenceTier::VeryReliable => "#2193b0",
            ConfidenceTier::Complex => "#f83600",
            ConfidenceTier::NoSignal => "#d32f2f",
        }
    }
}

/// Candidate key with the share of windows that voted for it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyCandidate {
    /// Candidate key
    pub key: KeyLabel,

    /// Percentage (0-100) of accepted windows labelled with this key
    pub presence: f32,
}

/// Most stable ("resting") key and its mean confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestingKey {
    /// Key with the highest stability score
    pub key: KeyLabel,

    /// Mean correlation percentage of its windows (0-100)
    pub confidence: u8,
}

/// Which music-theory rules fired during resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFlags {
    /// Major votes were moved onto a minor tonic a fourth above
    pub dominant_redirect: bool,

    /// Top-2 candidates are relative major/minor
    pub is_relative: bool,

    /// Top-2 candidates are a perfect fifth apart (V-I)
    pub is_cadence: bool,

    /// Top-2 candidates sit diagonally on the Camelot wheel
    pub is_diagonal: bool,

    /// The resting key replaced the majority vote
    pub resting_override: bool,
}

/// Analysis metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Audio duration in seconds
    pub duration_seconds: f32,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Global tuning offset in fractions of a semitone
    pub tuning_offset: f32,

    /// Windows the signal was partitioned into
    pub windows_examined: usize,

    /// Windows rejected by the energy gate or as atonal
    pub windows_rejected: usize,

    /// Algorithm version
    pub algorithm_version: String,
}

/// Complete analysis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Source identifier (display name)
    pub source: String,

    /// Recommended key
    pub recommended: KeyLabel,

    /// Final confidence (0-100)
    pub confidence: u8,

    /// Qualitative tier for `confidence`
    pub tier: ConfidenceTier,

    /// Winner of the resolved vote
    pub majority: KeyCandidate,

    /// Top-1 and (when present) top-2 resolved candidates
    pub top_candidates: Vec<KeyCandidate>,

    /// Most stable key
    pub resting: RestingKey,

    /// Global tempo in BPM (0 when no pulse was found)
    pub tempo_bpm: u32,

    /// Energy proxy (1-10)
    pub energy: u8,

    /// Per-window key estimates
    pub timeline: Timeline,

    /// Local key changes along the timeline
    pub key_changes: Vec<KeyChange>,

    /// Music-theory rules that fired
    pub rules: RuleFlags,

    /// Analysis metadata
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// Top-1 candidate
    pub fn top1(&self) -> Option<&KeyCandidate> {
        self.top_candidates.first()
    }

    /// Top-2 candidate, absent when only one key was observed
    pub fn top2(&self) -> Option<&KeyCandidate> {
        self.top_candidates.get(1)
    }

    /// Plain-text caption for notification forwarders
    pub fn caption(&self) -> String {
        format!(
            "FILE: {}\nKEY: {} ({})\nConfidence: {}% ({})\nBPM: {}",
            self.source,
            self.recommended,
            self.recommended.camelot(),
            self.confidence,
            self.tier.label(),
            self.tempo_bpm
        )
    }
}

/// Result for a recording where every window was rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoSignalResult {
    /// Source identifier (display name)
    pub source: String,

    /// Always 0
    pub confidence: u8,

    /// Always [`ConfidenceTier::NoSignal`]
    pub tier: ConfidenceTier,

    /// Analysis metadata
    pub metadata: AnalysisMetadata,
}

/// Outcome of analyzing one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisOutcome {
    /// Key and tempo were estimated
    Analyzed(AnalysisResult),

    /// No window carried usable signal
    NoUsableSignal(NoSignalResult),
}

impl AnalysisOutcome {
    /// Source identifier
    pub fn source(&self) -> &str {
        match self {
            AnalysisOutcome::Analyzed(r) => &r.source,
            AnalysisOutcome::NoUsableSignal(r) => &r.source,
        }
    }

    /// The full result, if analysis produced one
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisOutcome::Analyzed(r) => Some(r),
            AnalysisOutcome::NoUsableSignal(_) => None,
        }
    }

    /// True for [`AnalysisOutcome::NoUsableSignal`]
    pub fn is_no_signal(&self) -> bool {
        matches!(self, AnalysisOutcome::NoUsableSignal(_))
    }

    /// Final confidence (0 for no signal)
    pub fn confidence(&self) -> u8 {
        match self {
            AnalysisOutcome::Analyzed(r) => r.confidence,
            AnalysisOutcome::NoUsableSignal(r) => r.confidence,
        }
    }

    /// Confidence tier
    pub fn tier(&self) -> ConfidenceTier {
        match self {
            AnalysisOutcome::Analyzed(r) => r.tier,
            AnalysisOutcome::NoUsableSignal(r) => r.tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(start_time: u32, key: KeyLabel, score: f32) -> WindowObservation {
        WindowObservation {
            start_time,
            key,
            score,
            energy: 0.1,
        }
    }

    #[test]
    fn test_key_names() {
        assert_eq!(KeyLabel::major(0).name(), "C major");
        assert_eq!(KeyLabel::minor(9).name(), "A minor");
        assert_eq!(KeyLabel::major(6).short_name(), "F#");
        assert_eq!(KeyLabel::minor(1).short_name(), "C#m");
        assert_eq!(KeyLabel::major(14).tonic(), 2, "tonic wraps into 0..12");
    }

    #[test]
    fn test_camelot_matches_wheel() {
        // Minor side: 1A = G#m ... 8A = Am ... 12A = C#m
        let minor = [(8, 1), (3, 2), (10, 3), (5, 4), (0, 5), (7, 6), (2, 7), (9, 8), (4, 9), (11, 10), (6, 11), (1, 12)];
        for (tonic, position) in minor {
            let code = KeyLabel::minor(tonic).camelot();
            assert_eq!(code.position, position, "minor tonic {}", tonic);
            assert_eq!(code.side, CamelotSide::A);
        }

        // Major side: 1B = B ... 8B = C ... 12B = E
        let major = [(11, 1), (6, 2), (1, 3), (8, 4), (3, 5), (10, 6), (5, 7), (0, 8), (7, 9), (2, 10), (9, 11), (4, 12)];
        for (tonic, position) in major {
            let code = KeyLabel::major(tonic).camelot();
            assert_eq!(code.position, position, "major tonic {}", tonic);
            assert_eq!(code.side, CamelotSide::B);
        }
    }

    #[test]
    fn test_camelot_inverse() {
        for tonic in 0..12 {
            for key in [KeyLabel::major(tonic), KeyLabel::minor(tonic)] {
                assert_eq!(KeyLabel::from_camelot(key.camelot()), key, "{}", key);
            }
        }
    }

    #[test]
    fn test_camelot_parse() {
        assert_eq!(
            CamelotCode::parse("8A"),
            Some(CamelotCode { position: 8, side: CamelotSide::A })
        );
        assert_eq!(CamelotCode::parse("12b").map(|c| c.position), Some(12));
        assert_eq!(CamelotCode::parse("0A"), None);
        assert_eq!(CamelotCode::parse("13B"), None);
        assert_eq!(CamelotCode::parse("5C"), None);
        assert_eq!(CamelotCode::parse("A"), None);
        assert_eq!(CamelotCode::parse(""), None);
    }

    #[test]
    fn test_parse_non_ascii_suffix() {
        assert_eq!(CamelotCode::parse("8é"), None);
        assert_eq!(CamelotCode::parse("é"), None);
        assert_eq!(CamelotCode::parse("1２"), None);
        assert_eq!(KeyLabel::parse("8é"), None);
        assert_eq!(KeyLabel::parse("Cé"), None);
        assert!(serde_json::from_str::<KeyLabel>("\"1é\"").is_err());
    }

    #[test]
    fn test_parse_key_names() {
        assert_eq!(KeyLabel::parse("A minor"), Some(KeyLabel::minor(9)));
        assert_eq!(KeyLabel::parse("Am"), Some(KeyLabel::minor(9)));
        assert_eq!(KeyLabel::parse("C"), Some(KeyLabel::major(0)));
        assert_eq!(KeyLabel::parse("Db major"), Some(KeyLabel::major(1)));
        assert_eq!(KeyLabel::parse("bb min"), Some(KeyLabel::minor(10)));
        assert_eq!(KeyLabel::parse("8B"), Some(KeyLabel::major(0)));
        assert_eq!(KeyLabel::parse("H major"), None);
        assert_eq!(KeyLabel::parse("C lydian"), None);
        assert_eq!(KeyLabel::parse(""), None);
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&KeyLabel::minor(6)).unwrap();
        assert_eq!(json, "\"F# minor\"");
        let back: KeyLabel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, KeyLabel::minor(6));
        assert!(serde_json::from_str::<KeyLabel>("\"X minor\"").is_err());
    }

    #[test]
    fn test_triad_frequencies() {
        let [root, third, fifth] = KeyLabel::minor(9).triad_frequencies(4);
        assert!((root - 440.0).abs() < 0.01);
        assert!((third - 523.25).abs() < 0.05);
        assert!((fifth - 659.26).abs() < 0.05);

        let [c, e, _] = KeyLabel::major(0).triad_frequencies(4);
        assert!((c - 261.63).abs() < 0.05);
        assert!((e - 329.63).abs() < 0.05);
    }

    #[test]
    fn test_confidence_pct_rounding_and_clamp() {
        assert_eq!(obs(0, KeyLabel::major(0), 0.87654).confidence_pct(), 87.7);
        assert_eq!(obs(0, KeyLabel::major(0), -0.3).confidence_pct(), 0.0);
        assert_eq!(obs(0, KeyLabel::major(0), 1.0).confidence_pct(), 100.0);
    }

    #[test]
    fn test_timeline_statistics() {
        let am = KeyLabel::minor(9);
        let c = KeyLabel::major(0);
        let timeline = Timeline::new(vec![
            obs(0, am, 0.8),
            obs(10, am, 0.9),
            obs(20, c, 0.7),
            obs(30, am, -0.2),
        ]);

        assert_eq!(timeline.len(), 4);
        assert_eq!(timeline.distinct_keys(), vec![am, c]);
        assert_eq!(timeline.count(am), 3);
        assert!((timeline.presence(am) - 75.0).abs() < 1e-4);
        assert!((timeline.mean_confidence(am) - (80.0 + 90.0 + 0.0) / 3.0).abs() < 1e-3);
        assert_eq!(timeline.mean_confidence(KeyLabel::major(5)), 0.0);
        assert_eq!(timeline.consecutive_repeats(am), 1);
        assert_eq!(timeline.consecutive_repeats(c), 0);

        let changes = timeline.key_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].timestamp, 20);
        assert_eq!(changes[0].from_key, am);
        assert_eq!(changes[0].to_key, c);
    }

    #[test]
    fn test_empty_timeline_is_safe() {
        let timeline = Timeline::default();
        assert!(timeline.is_empty());
        assert_eq!(timeline.presence(KeyLabel::major(0)), 0.0);
        assert!(timeline.key_changes().is_empty());
        assert!(timeline.last().is_none());
    }

    #[test]
    fn test_tier_ordering() {
        assert!(ConfidenceTier::Indisputable > ConfidenceTier::VeryReliable);
        assert!(ConfidenceTier::VeryReliable > ConfidenceTier::Complex);
        assert!(ConfidenceTier::Complex > ConfidenceTier::NoSignal);
        assert_ne!(ConfidenceTier::Indisputable.color(), ConfidenceTier::Complex.color());
    }
}
