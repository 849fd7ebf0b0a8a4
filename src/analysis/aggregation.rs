//! Vote aggregation over the key timeline
//!
//! Builds the vote tally (count or RMS-weighted), applies dominant-to-tonic
//! redirection, and scores each observed key's stability.

use super::harmony::dominant_target;
use super::result::{KeyLabel, Timeline};

/// Aggregate vote weight per key, in order of first appearance
///
/// Insertion order makes ranking ties deterministic: the key seen first wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoteTally {
    entries: Vec<(KeyLabel, f32)>,
}

impl VoteTally {
    /// Empty tally
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally the timeline's votes
    ///
    /// With `weighted` each window votes with its RMS energy, otherwise 1.0.
    pub fn from_timeline(timeline: &Timeline, weighted: bool) -> Self {
        let mut tally = Self::new();
        for obs in timeline {
            tally.add(obs.key, vote_weight(obs.energy, weighted));
        }
        tally
    }

    /// Add weight to a key
    pub fn add(&mut self, key: KeyLabel, weight: f32) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, w)) => *w += weight,
            None => self.entries.push((key, weight)),
        }
    }

    /// Weight of a key (0.0 if absent)
    pub fn weight(&self, key: KeyLabel) -> f32 {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map_or(0.0, |(_, w)| *w)
    }

    /// True if the key received any vote
    pub fn contains(&self, key: KeyLabel) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no votes were cast
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by weight, highest first; ties keep first-appearance order
    pub fn ranked(&self) -> Vec<(KeyLabel, f32)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Highest-weighted key
    pub fn winner(&self) -> Option<KeyLabel> {
        self.ranked().first().map(|(k, _)| *k)
    }
}

fn vote_weight(energy: f32, weighted: bool) -> f32 {
    if weighted {
        energy
    } else {
        1.0
    }
}

/// Tally with dominant votes moved onto their minor tonic
///
/// A major key at pitch class `p` whose minor tonic `p + 5` also appears in
/// the raw tally is treated as that tonic's dominant: each of its votes adds
/// `weight * multiplier` to the minor tonic instead of counting for itself.
///
/// Returns the redirected tally and whether any vote was moved.
pub fn redirect_dominants(timeline: &Timeline, weighted: bool, multiplier: f32) -> (VoteTally, bool) {
    let raw = VoteTally::from_timeline(timeline, weighted);
    let mut tally = VoteTally::new();
    let mut redirected = false;

    for obs in timeline {
        let weight = vote_weight(obs.energy, weighted);
        match dominant_target(obs.key).filter(|target| raw.contains(*target)) {
            Some(tonic) => {
                tally.add(tonic, weight * multiplier);
                redirected = true;
            }
            None => tally.add(obs.key, weight),
        }
    }

    if redirected {
        log::debug!("Dominant redirection moved votes: {:?}", tally.ranked());
    }
    (tally, redirected)
}

/// Weights of the stability ("resting key") score
#[derive(Debug, Clone, Copy)]
pub struct StabilityWeights {
    /// Per occurrence
    pub count: f32,
    /// Per point of mean confidence percentage
    pub confidence: f32,
    /// Per consecutive repeat
    pub repeat: f32,
    /// If the key labels the last window
    pub last_window: f32,
}

/// Stability score of one key
pub fn stability_score(timeline: &Timeline, key: KeyLabel, weights: &StabilityWeights) -> f32 {
    let is_last = timeline.last().is_some_and(|o| o.key == key);
    timeline.count(key) as f32 * weights.count
        + timeline.mean_confidence(key) * weights.confidence
        + timeline.consecutive_repeats(key) as f32 * weights.repeat
        + if is_last { weights.last_window } else { 0.0 }
}

/// Most stable key of the timeline; ties go to the key observed first
pub fn most_stable_key(timeline: &Timeline, weights: &StabilityWeights) -> Option<KeyLabel> {
    let mut best: Option<(KeyLabel, f32)> = None;
    for key in timeline.distinct_keys() {
        let score = stability_score(timeline, key, weights);
        match best {
            Some((_, s)) if score <= s => {}
            _ => best = Some((key, score)),
        }
    }
    best.map(|(k, _)| k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::WindowObservation;

    fn timeline(entries: &[(KeyLabel, f32, f32)]) -> Timeline {
        Timeline::new(
            entries
                .iter()
                .enumerate()
                .map(|(i, &(key, score, energy))| WindowObservation {
                    start_time: i as u32 * 10,
                    key,
                    score,
                    energy,
                })
                .collect(),
        )
    }

    fn weights() -> StabilityWeights {
        StabilityWeights {
            count: 1.0,
            confidence: 0.05,
            repeat: 2.0,
            last_window: 1.0,
        }
    }

    #[test]
    fn test_weighted_and_counted_tally() {
        let am = KeyLabel::minor(9);
        let c = KeyLabel::major(0);
        let tl = timeline(&[(am, 0.8, 0.1), (c, 0.8, 0.5), (am, 0.8, 0.1)]);

        let counted = VoteTally::from_timeline(&tl, false);
        assert_eq!(counted.weight(am), 2.0);
        assert_eq!(counted.winner(), Some(am));

        let weighted = VoteTally::from_timeline(&tl, true);
        assert!((weighted.weight(am) - 0.2).abs() < 1e-6);
        assert_eq!(weighted.winner(), Some(c), "loud window outweighs two quiet ones");
    }

    #[test]
    fn test_ranking_ties_keep_first_appearance() {
        let mut tally = VoteTally::new();
        tally.add(KeyLabel::major(0), 1.0);
        tally.add(KeyLabel::minor(9), 1.0);
        tally.add(KeyLabel::major(7), 2.0);
        let ranked: Vec<KeyLabel> = tally.ranked().into_iter().map(|(k, _)| k).collect();
        assert_eq!(ranked, vec![KeyLabel::major(7), KeyLabel::major(0), KeyLabel::minor(9)]);
    }

    #[test]
    fn test_dominant_redirect() {
        // E major is V of A minor
        let e = KeyLabel::major(4);
        let am = KeyLabel::minor(9);
        let tl = timeline(&[(e, 0.8, 1.0), (e, 0.8, 1.0), (am, 0.8, 1.0)]);

        let (tally, redirected) = redirect_dominants(&tl, false, 1.5);
        assert!(redirected);
        assert!(!tally.contains(e));
        assert!((tally.weight(am) - 4.0).abs() < 1e-6, "1 + 2 * 1.5");
        assert_eq!(tally.winner(), Some(am));
    }

    #[test]
    fn test_no_redirect_without_minor_tonic() {
        let e = KeyLabel::major(4);
        let c = KeyLabel::major(0);
        let tl = timeline(&[(e, 0.8, 1.0), (c, 0.8, 1.0)]);
        let (tally, redirected) = redirect_dominants(&tl, false, 1.5);
        assert!(!redirected);
        assert_eq!(tally, VoteTally::from_timeline(&tl, false));
    }

    #[test]
    fn test_stability_rewards_sustained_regions() {
        let c = KeyLabel::major(0);
        let g = KeyLabel::major(7);
        // G appears as often as C but never twice in a row
        let tl = timeline(&[
            (c, 0.7, 1.0),
            (c, 0.7, 1.0),
            (g, 0.9, 1.0),
            (c, 0.7, 1.0),
            (g, 0.9, 1.0),
            (g, 0.9, 1.0),
        ]);
        assert!((stability_score(&tl, c, &weights()) - (3.0 + 3.5 + 2.0)).abs() < 1e-4);
        assert!((stability_score(&tl, g, &weights()) - (3.0 + 4.5 + 2.0 + 1.0)).abs() < 1e-4);
        assert_eq!(most_stable_key(&tl, &weights()), Some(g));
    }

    #[test]
    fn test_stability_tie_goes_to_first_seen() {
        let c = KeyLabel::major(0);
        let d = KeyLabel::major(2);
        let no_last = StabilityWeights {
            last_window: 0.0,
            ..weights()
        };
        let tl = timeline(&[(c, 0.8, 1.0), (d, 0.8, 1.0)]);
        assert_eq!(most_stable_key(&tl, &no_last), Some(c));
        assert_eq!(most_stable_key(&Timeline::default(), &no_last), None);
    }
}
