//! Music-theory resolver
//!
//! Turns a key timeline into one recommended key:
//!
//! 1. Tally votes (count or RMS-weighted) and move dominant votes onto their
//!    minor tonic
//! 2. Rank the tally; when two or more keys were voted for, classify the top-2
//!    pair (relative, V-I cadence, diagonal) and pick the winner of the pair
//! 3. Find the most stable ("resting") key; it overrides the vote when its own
//!    mean confidence is high enough
//! 4. Score: `purity * w_purity + mean_confidence * w_confidence + bonus`,
//!    clamped to 0-100, then mapped to a tier
//!
//! Relationship bonuses are mutually exclusive and only count when the
//! recommended key belongs to the top-2 pair.

use super::aggregation::{most_stable_key, redirect_dominants, StabilityWeights, VoteTally};
use super::confidence::{confidence_tier, energy_level, musical_score};
use super::harmony::{dominant_target, relationship, Relationship};
use super::result::{ConfidenceTier, KeyCandidate, KeyLabel, RestingKey, RuleFlags, Timeline};
use crate::config::{AnalysisConfig, RelativePreference};

/// Outcome of resolving a non-empty timeline
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Recommended key
    pub recommended: KeyLabel,

    /// Musical score (0-100)
    pub confidence: u8,

    /// Tier of `confidence`
    pub tier: ConfidenceTier,

    /// Energy proxy (1-10)
    pub energy: u8,

    /// Winner of the resolved vote, before any resting-key override
    pub majority: KeyCandidate,

    /// Top-1 and (when present) top-2 of the redirected tally
    pub top_candidates: Vec<KeyCandidate>,

    /// Most stable key
    pub resting: RestingKey,

    /// Share of windows (0-100) whose resolved vote is the recommended key
    pub purity: f32,

    /// Mean correlation percentage of the recommended key's windows
    pub mean_confidence: f32,

    /// Relationship bonus that entered the score
    pub bonus: f32,

    /// Rules that fired
    pub rules: RuleFlags,
}

/// Each window's vote after dominant redirection
fn resolved_votes(timeline: &Timeline, redirect: bool) -> Vec<KeyLabel> {
    let raw = VoteTally::from_timeline(timeline, false);
    timeline
        .iter()
        .map(|obs| {
            if !redirect {
                return obs.key;
            }
            dominant_target(obs.key)
                .filter(|target| raw.contains(*target))
                .unwrap_or(obs.key)
        })
        .collect()
}

/// Percentage (0-100) of votes equal to `key`
fn vote_share(votes: &[KeyLabel], key: KeyLabel) -> f32 {
    if votes.is_empty() {
        return 0.0;
    }
    votes.iter().filter(|&&v| v == key).count() as f32 * 100.0 / votes.len() as f32
}

/// Winner of a top-2 pair and the bonus it earns
fn resolve_pair(
    first: KeyLabel,
    second: KeyLabel,
    config: &AnalysisConfig,
    rules: &mut RuleFlags,
) -> (KeyLabel, f32) {
    match relationship(first, second) {
        Relationship::Relative => {
            rules.is_relative = true;
            let preferred = match config.relative_preference {
                RelativePreference::Minor => [first, second].into_iter().find(|k| k.is_minor()),
                RelativePreference::Major => [first, second].into_iter().find(|k| k.is_major()),
            };
            let winner = preferred.unwrap_or(first);
            log::debug!(
                "Relative pair {} / {}: preferring {}",
                first,
                second,
                winner
            );
            (winner, config.relative_bonus)
        }
        Relationship::Cadence { tonic } => {
            rules.is_cadence = true;
            let winner = if config.cadence_redirect { tonic } else { first };
            log::debug!("V-I pair {} / {}: tonic {}, choosing {}", first, second, tonic, winner);
            (winner, config.cadence_bonus)
        }
        Relationship::Diagonal => {
            rules.is_diagonal = true;
            log::debug!("Diagonal pair {} / {}", first, second);
            (first, config.diagonal_bonus)
        }
        Relationship::Identical | Relationship::Unrelated => (first, 0.0),
    }
}

/// Resolve a timeline into a recommended key
///
/// Returns `None` for an empty timeline; the caller reports that as a
/// no-signal outcome.
pub fn resolve(timeline: &Timeline, config: &AnalysisConfig) -> Option<Resolution> {
    if timeline.is_empty() {
        return None;
    }

    let mut rules = RuleFlags::default();

    let tally = if config.dominant_redirect_enabled {
        let (tally, redirected) =
            redirect_dominants(timeline, config.weighted_votes, config.dominant_redirect_weight);
        rules.dominant_redirect = redirected;
        tally
    } else {
        VoteTally::from_timeline(timeline, config.weighted_votes)
    };
    let votes = resolved_votes(timeline, rules.dominant_redirect);

    let ranked = tally.ranked();
    let top: Vec<KeyLabel> = ranked.iter().take(2).map(|(k, _)| *k).collect();
    let first = *top.first()?;

    let (majority, pair_bonus) = match top.get(1) {
        Some(&second) => resolve_pair(first, second, config, &mut rules),
        None => (first, 0.0),
    };

    let weights = StabilityWeights {
        count: config.stability_count_weight,
        confidence: config.stability_confidence_weight,
        repeat: config.stability_repeat_weight,
        last_window: config.stability_last_window_bonus,
    };
    let resting_key = most_stable_key(timeline, &weights).unwrap_or(majority);
    let resting_confidence = timeline.mean_confidence(resting_key);

    let recommended = if resting_key != majority
        && resting_confidence >= config.resting_override_confidence
    {
        log::debug!(
            "Resting key {} ({:.1}%) overrides majority {}",
            resting_key,
            resting_confidence,
            majority
        );
        rules.resting_override = true;
        resting_key
    } else {
        majority
    };

    let bonus = if top.contains(&recommended) { pair_bonus } else { 0.0 };
    let purity = vote_share(&votes, recommended);
    let mean_confidence = timeline.mean_confidence(recommended);
    let confidence = musical_score(purity, mean_confidence, bonus, config);

    Some(Resolution {
        recommended,
        confidence,
        tier: confidence_tier(confidence, config),
        energy: energy_level(confidence),
        majority: KeyCandidate {
            key: majority,
            presence: vote_share(&votes, majority),
        },
        top_candidates: top
            .iter()
            .map(|&key| KeyCandidate {
                key,
                presence: vote_share(&votes, key),
            })
            .collect(),
        resting: RestingKey {
            key: resting_key,
            confidence: resting_confidence.round().clamp(0.0, 100.0) as u8,
        },
        purity,
        mean_confidence,
        bonus,
        rules,
    })
}
