//! Greedy chord-by-chord voicing
//!
//! Each chord is voiced from the previous voicing alone: [`step`] is a pure
//! function of (chord, previous pitches) and [`voice`] folds it over the
//! progression.

use super::{break_tie, class_distance, nearest_unbounded, permutations, Pitches, BASS};
use crate::types::chord::ResolvedChord;
use crate::types::formation::{Tessitura, Tessituras, Voice};
use crate::types::progression::Progression;
use crate::types::voicing::{VoicingWarning, WarningKind};
use rand_chacha::ChaCha8Rng;

/// Semitones of motion a voice is worth before it gives up its chosen pitch class
const REASSIGN_COST: u32 = 6;
/// Octave placements tried per voice
const REACH: usize = 4;

const SOPRANO: usize = 0;
const ALTO: usize = 1;
const TENOR: usize = 2;

/// Voice every chord in order, each one from the voicing before it
pub fn voice(
    progression: &Progression,
    tessituras: &Tessituras,
    mut rng: Option<&mut ChaCha8Rng>,
) -> (Vec<Pitches>, Vec<VoicingWarning>) {
    let mut voiced: Vec<Pitches> = Vec::with_capacity(progression.len());
    let mut warnings = Vec::new();
    for (index, chord) in progression.chords().enumerate() {
        let (pitches, chord_warnings) =
            step(index, chord, voiced.last(), tessituras, rng.as_deref_mut());
        voiced.push(pitches);
        warnings.extend(chord_warnings);
    }
    (voiced, warnings)
}

/// Voice one chord given the previous voicing, if any
pub fn step(
    index: usize,
    chord: &ResolvedChord,
    previous: Option<&Pitches>,
    tessituras: &Tessituras,
    mut rng: Option<&mut ChaCha8Rng>,
) -> (Pitches, Vec<VoicingWarning>) {
    let mut warnings = Vec::new();
    let classes = upper_classes(chord, previous, rng.as_deref_mut());
    let bass_class = chord.bass_tone().pitch_class();

    let mut pitches = [0; 4];
    pitches[BASS] = match previous {
        None => place(
            index,
            Voice::Bass,
            bass_class,
            tessituras.bass.midpoint(),
            tessituras,
            &mut warnings,
        ),
        Some(prev) => {
            let window = bass_window(&tessituras.bass, bass_class, prev[BASS]);
            match break_tie(&window, rng.as_deref_mut()) {
                Some(pitch) => pitch,
                None => place(
                    index,
                    Voice::Bass,
                    bass_class,
                    tessituras.bass.midpoint(),
                    tessituras,
                    &mut warnings,
                ),
            }
        }
    };

    let targets: [i32; 3] = std::array::from_fn(|slot| match previous {
        Some(prev) => prev[slot],
        None => tessituras.get(Voice::UPPER[slot]).midpoint(),
    });
    let held: [bool; 3] = std::array::from_fn(|slot| {
        previous.is_some_and(|prev| prev[slot].rem_euclid(12) == classes[slot] as i32)
    });

    let mut bass_options = vec![pitches[BASS]];
    bass_options.extend(
        near_representatives(&tessituras.bass, bass_class, pitches[BASS])
            .into_iter()
            .filter(|&p| p != pitches[BASS]),
    );
    let mut arranged = None;
    for bass in bass_options {
        if let Some(upper) = arrange(classes, targets, held, bass, tessituras, rng.as_deref_mut()) {
            arranged = Some((bass, upper));
            break;
        }
    }

    match arranged {
        Some((bass, upper)) => {
            pitches = [upper[SOPRANO], upper[ALTO], upper[TENOR], bass];
        }
        None => {
            for (slot, voice) in Voice::UPPER.into_iter().enumerate() {
                pitches[slot] =
                    place(index, voice, classes[slot], targets[slot], tessituras, &mut warnings);
            }
            // Nothing fits: top down, drop any voice not strictly below its neighbour
            for slot in 1..4 {
                while pitches[slot] >= pitches[slot - 1] {
                    pitches[slot] -= 12;
                }
            }
        }
    }

    for (slot, voice) in Voice::ALL.into_iter().enumerate() {
        let range = tessituras.get(voice);
        if !range.contains(pitches[slot]) {
            warnings.push(VoicingWarning::at(
                index,
                voice,
                WarningKind::OutOfRange {
                    pitch: pitches[slot],
                    min: range.min,
                    max: range.max,
                },
            ));
        }
    }

    (pitches, warnings)
}

/// Pitch classes for soprano, alto and tenor
fn upper_classes(
    chord: &ResolvedChord,
    previous: Option<&Pitches>,
    mut rng: Option<&mut ChaCha8Rng>,
) -> [u8; 3] {
    let mut pool: Vec<u8> = chord.upper_pool().iter().map(|n| n.pitch_class()).collect();
    let root = chord.root().pitch_class();
    let third = chord.third().pitch_class();
    let fifth = chord.fifth().pitch_class();
    let mut classes: [Option<u8>; 3] = [None; 3];

    let Some(prev) = previous else {
        for (slot, wanted) in [(SOPRANO, third), (TENOR, fifth), (ALTO, root)] {
            classes[slot] = take(&mut pool, wanted).or_else(|| take_first(&mut pool));
        }
        return classes.map(|c| c.unwrap_or(root));
    };

    // Common tones stay in the voice that held them
    for slot in [SOPRANO, ALTO, TENOR] {
        classes[slot] = take(&mut pool, prev[slot].rem_euclid(12) as u8);
    }

    if classes[TENOR].is_none() {
        classes[TENOR] = take(&mut pool, fifth);
    }

    for slot in [SOPRANO, ALTO, TENOR] {
        if classes[slot].is_some() {
            continue;
        }
        let Some(best) = pool.iter().map(|&pc| class_distance(pc, prev[slot])).min() else {
            break;
        };
        let mut ties: Vec<u8> = pool
            .iter()
            .copied()
            .filter(|&pc| class_distance(pc, prev[slot]) == best)
            .collect();
        ties.sort_unstable();
        ties.dedup();
        let choice = if slot == SOPRANO && ties.contains(&third) {
            Some(third)
        } else {
            break_tie(&ties, rng.as_deref_mut())
        };
        classes[slot] = choice.and_then(|pc| take(&mut pool, pc));
    }

    classes.map(|c| c.unwrap_or(root))
}

/// In-range upper voices over a fixed bass, or `None` if none exist.
///
/// Octave placements and swaps of pitch classes between voices are both
/// considered. Options are ranked by how many held common tones they give up,
/// then by motion from `targets` plus [`REASSIGN_COST`] per reassigned voice.
fn arrange(
    classes: [u8; 3],
    targets: [i32; 3],
    held: [bool; 3],
    bass: i32,
    tessituras: &Tessituras,
    rng: Option<&mut ChaCha8Rng>,
) -> Option<[i32; 3]> {
    let mut best_key: Option<(usize, u32)> = None;
    let mut best: Vec<[i32; 3]> = Vec::new();

    for order in permutations(&[SOPRANO, ALTO, TENOR]) {
        let assigned: [u8; 3] = std::array::from_fn(|slot| classes[order[slot]]);
        let released = (0..3)
            .filter(|&slot| held[slot] && assigned[slot] != classes[slot])
            .count();
        let reassigned = (0..3).filter(|&slot| assigned[slot] != classes[slot]).count() as u32;
        let options: [Vec<i32>; 3] = std::array::from_fn(|slot| {
            near_representatives(
                tessituras.get(Voice::UPPER[slot]),
                assigned[slot],
                targets[slot],
            )
        });

        for &tenor in options[TENOR].iter().filter(|&&p| p > bass) {
            for &alto in options[ALTO].iter().filter(|&&p| p > tenor) {
                for &soprano in options[SOPRANO].iter().filter(|&&p| p > alto) {
                    let upper = [soprano, alto, tenor];
                    let motion: u32 = upper
                        .iter()
                        .zip(targets)
                        .map(|(p, t)| (p - t).unsigned_abs())
                        .sum();
                    let key = (released, motion + REASSIGN_COST * reassigned);
                    match best_key {
                        Some(current) if key > current => {}
                        Some(current) if key == current => {
                            if !best.contains(&upper) {
                                best.push(upper);
                            }
                        }
                        _ => {
                            best_key = Some(key);
                            best = vec![upper];
                        }
                    }
                }
            }
        }
    }

    break_tie(&best, rng)
}

/// Up to [`REACH`] in-range pitches of `pitch_class`, nearest `target` first
fn near_representatives(range: &Tessitura, pitch_class: u8, target: i32) -> Vec<i32> {
    let base = nearest_unbounded(pitch_class, range.clamp(target));
    let mut found: Vec<i32> = (-2..=2)
        .map(|octave| base + 12 * octave)
        .filter(|&p| range.contains(p))
        .collect();
    found.sort_by_key(|&p| ((p - target).abs(), p));
    found.truncate(REACH);
    found
}

/// Candidate bass pitches one octave either side of the previous bass, nearest first
fn bass_window(range: &Tessitura, pitch_class: u8, previous: i32) -> Vec<i32> {
    let base = previous - previous.rem_euclid(12) + pitch_class as i32;
    let mut window: Vec<i32> = [base - 12, base, base + 12]
        .into_iter()
        .filter(|&p| range.contains(p))
        .collect();
    let Some(best) = window.iter().map(|p| (p - previous).abs()).min() else {
        return window;
    };
    window.retain(|p| (p - previous).abs() == best);
    window
}

/// In-range pitch of `pitch_class` nearest `target`, or the clamped natural pitch
fn place(
    index: usize,
    voice: Voice,
    pitch_class: u8,
    target: i32,
    tessituras: &Tessituras,
    warnings: &mut Vec<VoicingWarning>,
) -> i32 {
    let range = tessituras.get(voice);
    range.nearest(pitch_class, target).unwrap_or_else(|| {
        let pitch = range.clamp(nearest_unbounded(pitch_class, target));
        warnings.push(VoicingWarning::at(
            index,
            voice,
            WarningKind::ClampedOffChord { pitch },
        ));
        pitch
    })
}

fn take(pool: &mut Vec<u8>, pitch_class: u8) -> Option<u8> {
    let i = pool.iter().position(|&pc| pc == pitch_class)?;
    Some(pool.remove(i))
}

fn take_first(pool: &mut Vec<u8>) -> Option<u8> {
    if pool.is_empty() {
        None
    } else {
        Some(pool.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::roman_numeral::Mode;

    fn voiced(tokens: &str) -> Vec<Pitches> {
        let progression = Progression::parse(tokens, "C", Mode::Major).unwrap();
        voice(&progression, &Tessituras::default(), None).0
    }

    #[test]
    fn test_first_chord_placement() {
        assert_eq!(voiced("I")[0], [64, 60, 55, 48]);
    }

    #[test]
    fn test_common_tone_is_held() {
        let v = voiced("I IV");
        // C stays in the alto, soprano steps E to F, tenor G to A, bass up to F
        assert_eq!(v[1], [65, 60, 57, 53]);
    }

    #[test]
    fn test_bass_moves_by_smallest_interval() {
        let v = voiced("I V I");
        assert_eq!(v[1][BASS], 43);
        assert_eq!(v[2][BASS], 48);
    }

    #[test]
    fn test_inversion_bass() {
        let v = voiced("I ii/1 V I");
        assert_eq!(v[1][BASS].rem_euclid(12), 5);
    }

    #[test]
    fn test_window_prefers_nearest() {
        let range = Tessitura::new(40, 60).unwrap();
        assert_eq!(bass_window(&range, 7, 48), vec![43]);
        assert_eq!(bass_window(&range, 6, 48), vec![42, 54]);
        assert!(bass_window(&Tessitura::new(61, 62).unwrap(), 0, 48).is_empty());
    }

    #[test]
    fn test_clamp_reports_warning() {
        let tessituras = Tessituras::default();
        let mut warnings = Vec::new();
        let mut narrow = tessituras;
        narrow.bass = Tessitura::new(49, 50).unwrap();
        let pitch = place(0, Voice::Bass, 0, 48, &narrow, &mut warnings);
        assert_eq!(pitch, 49);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::ClampedOffChord { pitch: 49 });
    }

    #[test]
    fn test_swaps_classes_rather_than_leave_range() {
        let progression = Progression::parse("I vi iii V I", "C", Mode::Major).unwrap();
        let (pitches, warnings) = voice(&progression, &Tessituras::default(), None);
        assert_eq!(
            pitches,
            vec![
                [64, 60, 55, 48],
                [64, 60, 57, 45],
                // E held in the soprano, G and B trade places below it
                [64, 59, 55, 40],
                [62, 59, 55, 43],
                [64, 60, 55, 48],
            ]
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_arrange_prefers_assigned_classes() {
        let tessituras = Tessituras::default();
        let upper = arrange([4, 0, 7], [69, 64, 57], [false; 3], 48, &tessituras, None);
        assert_eq!(upper, Some([64, 60, 55]));

        let narrow = Tessitura::new(61, 62).unwrap();
        let cramped = Tessituras::new(narrow, narrow, narrow, tessituras.bass).unwrap();
        assert_eq!(arrange([4, 0, 7], [62, 62, 62], [false; 3], 48, &cramped, None), None);
    }

    #[test]
    fn test_near_representatives() {
        let range = Tessitura::new(48, 67).unwrap();
        assert_eq!(near_representatives(&range, 11, 57), vec![59]);
        assert_eq!(near_representatives(&range, 7, 57), vec![55, 67]);
        // Target far outside the range still finds the in-range pitches
        assert_eq!(near_representatives(&range, 0, 10), vec![48, 60]);
    }
}
