//! Minimum-movement voicing over the whole progression
//!
//! Every chord gets a bounded list of candidate voicings that respect the bass,
//! strict ordering and all ranges. A dynamic program over consecutive chords
//! then picks the path with the least total motion.

use super::{midpoint_cost, movement, permutations, Pitches};
use crate::types::chord::ResolvedChord;
use crate::types::formation::Tessituras;
use crate::types::progression::Progression;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Widest gap allowed between adjacent upper voices when avoidable
const MAX_UPPER_SPACING: i32 = 12;

/// Candidate voicings for one chord, best placed first, at most `cap`
pub fn candidates(chord: &ResolvedChord, tessituras: &Tessituras, cap: usize) -> Vec<Pitches> {
    let bass_class = chord.bass_tone().pitch_class();
    let pool: Vec<u8> = chord.upper_pool().iter().map(|n| n.pitch_class()).collect();

    let mut assignments: Vec<[u8; 3]> = permutations(&[0, 1, 2])
        .iter()
        .map(|perm| [pool[perm[0]], pool[perm[1]], pool[perm[2]]])
        .collect();
    assignments.sort_unstable();
    assignments.dedup();

    let mut found = Vec::new();
    for bass in tessituras.bass.representatives(bass_class) {
        for &[soprano_class, alto_class, tenor_class] in &assignments {
            for tenor in tessituras.tenor.representatives(tenor_class).filter(|&p| p > bass) {
                for alto in tessituras.alto.representatives(alto_class).filter(|&p| p > tenor) {
                    for soprano in tessituras
                        .soprano
                        .representatives(soprano_class)
                        .filter(|&p| p > alto)
                    {
                        found.push([soprano, alto, tenor, bass]);
                    }
                }
            }
        }
    }

    let close: Vec<Pitches> = found
        .iter()
        .copied()
        .filter(|p| p[0] - p[1] <= MAX_UPPER_SPACING && p[1] - p[2] <= MAX_UPPER_SPACING)
        .collect();
    let mut chosen = if close.is_empty() { found } else { close };
    chosen.sort_by_key(|p| (midpoint_cost(p, tessituras), *p));
    chosen.truncate(cap.max(1));
    chosen
}

/// Least-movement path through every chord's candidates.
///
/// Returns `None` when some chord has no candidate at all.
pub fn voice(
    progression: &Progression,
    tessituras: &Tessituras,
    cap: usize,
    mut rng: Option<&mut ChaCha8Rng>,
) -> Option<Vec<Pitches>> {
    let mut layers: Vec<Vec<Pitches>> = Vec::with_capacity(progression.len());
    for chord in progression.chords() {
        let mut layer = candidates(chord, tessituras, cap);
        if layer.is_empty() {
            tracing::debug!("no in-range voicing for {}", chord);
            return None;
        }
        if let Some(rng) = rng.as_deref_mut() {
            layer.shuffle(rng);
        }
        layers.push(layer);
    }

    let mut cost: Vec<u32> = layers
        .first()?
        .iter()
        .map(|p| midpoint_cost(p, tessituras))
        .collect();
    // back[i][j]: best predecessor in layer i of candidate j in layer i + 1
    let mut back: Vec<Vec<usize>> = Vec::with_capacity(layers.len());

    for pair in layers.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        let mut next_cost = Vec::with_capacity(to.len());
        let mut links = Vec::with_capacity(to.len());
        for target in to {
            let (best, total) = cheapest(from.iter().enumerate().map(|(k, source)| {
                (k, cost[k] + movement(source, target))
            }))?;
            next_cost.push(total);
            links.push(best);
        }
        cost = next_cost;
        back.push(links);
    }

    let (mut j, _) = cheapest(cost.iter().copied().enumerate())?;
    let mut path = vec![layers.last()?[j]];
    for (i, links) in back.iter().enumerate().rev() {
        j = links[j];
        path.push(layers[i][j]);
    }
    path.reverse();
    Some(path)
}

/// First entry with the lowest cost
fn cheapest(costs: impl Iterator<Item = (usize, u32)>) -> Option<(usize, u32)> {
    let mut best: Option<(usize, u32)> = None;
    for (i, c) in costs {
        if best.map_or(true, |(_, b)| c < b) {
            best = Some((i, c));
        }
    }
    best
}
