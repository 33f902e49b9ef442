//! Voice-leading assignment
//!
//! Turns a [`Progression`] into concrete soprano, alto, tenor and bass pitches
//! for a set of tessituras. Two assigners are available: a greedy chord-by-chord
//! fold and an exhaustive search that minimizes total movement. Both are pure
//! given their inputs; the only source of variation is an explicit seed.

pub mod exhaustive;
pub mod greedy;

use crate::types::chord::ResolvedChord;
use crate::types::formation::{Tessituras, Voice};
use crate::types::note::Note;
use crate::types::progression::Progression;
use crate::types::voicing::{VoicedProgression, Voicing, VoicingWarning, WarningKind};
use anyhow::{anyhow, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::str::FromStr;

/// Working form of a voicing: MIDI pitches, soprano first
pub type Pitches = [i32; 4];

/// Index of the bass in [`Pitches`]
pub(crate) const BASS: usize = 3;

pub const DEFAULT_CANDIDATE_CAP: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VoicingAlgorithm {
    #[default]
    Greedy,
    Exhaustive,
}

impl fmt::Display for VoicingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoicingAlgorithm::Greedy => write!(f, "greedy"),
            VoicingAlgorithm::Exhaustive => write!(f, "exhaustive"),
        }
    }
}

impl FromStr for VoicingAlgorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "greedy" => Ok(VoicingAlgorithm::Greedy),
            "exhaustive" | "optimal" => Ok(VoicingAlgorithm::Exhaustive),
            other => Err(anyhow!(
                "Unknown voicing algorithm '{}'. Use 'greedy' or 'exhaustive'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoicingOptions {
    pub algorithm: VoicingAlgorithm,
    /// Most candidate voicings kept per chord by the exhaustive search
    pub candidate_cap: usize,
    /// `Some` breaks ties between equally good choices at random
    pub seed: Option<u64>,
}

impl Default for VoicingOptions {
    fn default() -> Self {
        VoicingOptions {
            algorithm: VoicingAlgorithm::Greedy,
            candidate_cap: DEFAULT_CANDIDATE_CAP,
            seed: None,
        }
    }
}

impl VoicingOptions {
    pub fn with_seed(self, seed: u64) -> Self {
        VoicingOptions {
            seed: Some(seed),
            ..self
        }
    }
}

/// Assign four voices to every chord of `progression`.
///
/// Only a malformed tessitura map is an error. An empty progression gives an
/// empty result with a warning; range trouble is reported as warnings.
pub fn assign(
    progression: &Progression,
    tessituras: &Tessituras,
    options: &VoicingOptions,
) -> Result<VoicedProgression> {
    tessituras.validate()?;
    if progression.is_empty() {
        tracing::warn!("asked to voice an empty progression");
        return Ok(VoicedProgression::empty(WarningKind::EmptyProgression));
    }

    let mut rng = options.seed.map(ChaCha8Rng::seed_from_u64);
    let (pitches, warnings) = match options.algorithm {
        VoicingAlgorithm::Greedy => greedy::voice(progression, tessituras, rng.as_mut()),
        VoicingAlgorithm::Exhaustive => {
            match exhaustive::voice(progression, tessituras, options.candidate_cap, rng.as_mut())
            {
                Some(path) => (path, Vec::new()),
                None => {
                    let (path, mut warnings) = greedy::voice(progression, tessituras, rng.as_mut());
                    warnings.insert(0, VoicingWarning::whole(WarningKind::ExhaustiveFallback));
                    (path, warnings)
                }
            }
        }
    };

    for warning in &warnings {
        tracing::warn!("{}: {}", progression, warning);
    }

    let voicings = progression
        .chords()
        .zip(pitches)
        .map(|(chord, p)| to_voicing(chord, p))
        .collect::<Result<Vec<_>>>();
    match voicings {
        Ok(voicings) => Ok(VoicedProgression::new(voicings, warnings)),
        Err(e) => {
            tracing::warn!("could not voice {}: {}", progression, e);
            Ok(VoicedProgression::empty(WarningKind::Degenerate(e.to_string())))
        }
    }
}

/// Spell each pitch the way the chord spells that pitch class
fn to_voicing(chord: &ResolvedChord, pitches: Pitches) -> Result<Voicing> {
    let spelled = pitches.map(|p| {
        let spelling = chord
            .triad()
            .iter()
            .find(|n| n.pitch_class() as i32 == p.rem_euclid(12))
            .map_or(chord.root().spelling(), |n| n.spelling());
        Note::from_midi(p, spelling)
    });
    Voicing::new(spelled[0], spelled[1], spelled[2], spelled[3])
}

/// Pitch of `pitch_class` closest to `target`, ignoring any range
pub(crate) fn nearest_unbounded(pitch_class: u8, target: i32) -> i32 {
    let up = (pitch_class as i32 - target).rem_euclid(12);
    if up <= 6 {
        target + up
    } else {
        target + up - 12
    }
}

/// Circular semitone distance between a pitch class and a pitch
pub(crate) fn class_distance(pitch_class: u8, pitch: i32) -> i32 {
    let d = (pitch_class as i32 - pitch).rem_euclid(12);
    d.min(12 - d)
}

/// Pick one of several equally good options: the first, or a random one
pub(crate) fn break_tie<T: Copy>(ties: &[T], rng: Option<&mut ChaCha8Rng>) -> Option<T> {
    match rng {
        Some(rng) => ties.choose(rng).copied(),
        None => ties.first().copied(),
    }
}

/// Generate all permutations of a slice
pub(crate) fn permutations(items: &[usize]) -> Vec<Vec<usize>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }

    let mut result = Vec::new();
    for (i, &item) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(i);
        for mut perm in permutations(&rest) {
            perm.insert(0, item);
            result.push(perm);
        }
    }
    result
}

/// Distance of every voice from the middle of its range
pub(crate) fn midpoint_cost(pitches: &Pitches, tessituras: &Tessituras) -> u32 {
    Voice::ALL
        .iter()
        .zip(pitches)
        .map(|(&v, p)| (p - tessituras.get(v).midpoint()).unsigned_abs())
        .sum()
}

/// Total absolute motion between two voicings
pub(crate) fn movement(from: &Pitches, to: &Pitches) -> u32 {
    from.iter().zip(to).map(|(a, b)| (a - b).unsigned_abs()).sum()
}
