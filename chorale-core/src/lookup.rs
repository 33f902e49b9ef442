//! Harmonic lookup: scale degree + tonality + mode to a resolved triad
//!
//! Pure and total over the seven diatonic degrees. Minor keys use harmonic
//! minor (raised leading tone for V and vii°) with a major mediant.

use crate::types::chord::ResolvedChord;
use crate::types::note::{parse_tonality, Note, Spelling};
use crate::types::roman_numeral::{DegreeToken, Mode, ScaleDegree};
use anyhow::{Context, Result};

const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const HARMONIC_MINOR_SCALE: [u8; 7] = [0, 2, 3, 5, 7, 8, 11];

/// Semitone offsets from the tonic of the root, third and fifth of a degree
fn triad_offsets(degree: ScaleDegree, mode: Mode) -> [u8; 3] {
    if mode == Mode::Minor && degree == ScaleDegree::III {
        // Mediant keeps the natural seventh so it stays a major triad
        return [3, 7, 10];
    }
    let scale = match mode {
        Mode::Major => &MAJOR_SCALE,
        Mode::Minor => &HARMONIC_MINOR_SCALE,
    };
    let d = degree.index();
    [scale[d], scale[(d + 2) % 7], scale[(d + 4) % 7]]
}

/// Minor keys whose signatures carry flats: C, D, F and G minor
const FLAT_MINOR_TONICS: [u8; 4] = [0, 2, 5, 7];

fn key_spelling(tonic: Note, mode: Mode) -> Spelling {
    match mode {
        Mode::Major => tonic.spelling(),
        Mode::Minor if FLAT_MINOR_TONICS.contains(&tonic.pitch_class()) => Spelling::Flat,
        Mode::Minor => tonic.spelling(),
    }
}

/// Resolve a degree token against a tonic note.
pub fn lookup(token: DegreeToken, tonic: Note, mode: Mode) -> Result<ResolvedChord> {
    let offsets = triad_offsets(token.degree, mode);
    let spelling = key_spelling(tonic, mode);
    let mut triad = [tonic; 3];
    for (slot, offset) in triad.iter_mut().zip(offsets) {
        let pitch_class = (tonic.pitch_class() + offset) % 12;
        // The raised leading tone of harmonic minor is always written sharp
        let slot_spelling = if mode == Mode::Minor && offset == 11 {
            Spelling::Sharp
        } else {
            spelling
        };
        *slot = Note::new(pitch_class)?.respelled(slot_spelling);
    }
    ResolvedChord::from_triad(token, mode, triad)
}

/// String-facing form: `lookup_degree("V/2", "C", Mode::Major)`
pub fn lookup_degree(token: &str, tonality: &str, mode: Mode) -> Result<ResolvedChord> {
    let token: DegreeToken = token.parse()?;
    let tonic = parse_tonality(tonality)?;
    lookup(token, tonic, mode).with_context(|| format!("resolving {} in {} {}", token, tonality, mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::chord::HarmonicFunction;

    fn names(chord: &ResolvedChord) -> Vec<String> {
        chord.triad().iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_c_major_triads() {
        let expected = [
            ("I", "C", vec!["C", "E", "G"]),
            ("ii", "Dm", vec!["D", "F", "A"]),
            ("iii", "Em", vec!["E", "G", "B"]),
            ("IV", "F", vec!["F", "A", "C"]),
            ("V", "G", vec!["G", "B", "D"]),
            ("vi", "Am", vec!["A", "C", "E"]),
            ("vii°", "Bdim", vec!["B", "D", "F"]),
        ];
        for (degree, symbol, notes) in expected {
            let chord = lookup_degree(degree, "C", Mode::Major).unwrap();
            assert_eq!(chord.roman_label(), degree);
            assert_eq!(chord.chord_symbol(), symbol);
            assert_eq!(names(&chord), notes);
        }
    }

    #[test]
    fn test_key_spelling() {
        let iv = lookup_degree("IV", "F", Mode::Major).unwrap();
        assert_eq!(iv.chord_symbol(), "Bb");

        let v = lookup_degree("V", "D", Mode::Major).unwrap();
        assert_eq!(names(&v), vec!["A", "C#", "E"]);

        let ii = lookup_degree("ii", "Eb", Mode::Major).unwrap();
        assert_eq!(ii.chord_symbol(), "Fm");
        assert_eq!(names(&ii), vec!["F", "Ab", "C"]);
    }

    #[test]
    fn test_harmonic_minor() {
        let v = lookup_degree("V", "A", Mode::Minor).unwrap();
        assert_eq!(names(&v), vec!["E", "G#", "B"]);
        assert_eq!(v.roman_label(), "V");

        let i = lookup_degree("I", "A", Mode::Minor).unwrap();
        assert_eq!(i.roman_label(), "i");
        assert_eq!(i.chord_symbol(), "Am");

        let iii = lookup_degree("III", "A", Mode::Minor).unwrap();
        assert_eq!(iii.chord_symbol(), "C");

        let ii = lookup_degree("ii", "A", Mode::Minor).unwrap();
        assert_eq!(ii.roman_label(), "ii°");
        assert_eq!(ii.chord_symbol(), "Bdim");

        let iv = lookup_degree("iv", "D", Mode::Minor).unwrap();
        assert_eq!(names(&iv), vec!["G", "Bb", "D"]);
        let v = lookup_degree("V", "D", Mode::Minor).unwrap();
        assert_eq!(names(&v), vec!["A", "C#", "E"]);
    }

    #[test]
    fn test_functions_and_inversions() {
        let v64 = lookup_degree("V/2", "C", Mode::Major).unwrap();
        assert_eq!(v64.roman_label(), "V6/4");
        assert_eq!(v64.bass_tone().to_string(), "D");
        assert_eq!(v64.function(), HarmonicFunction::Dominant);

        let ii6 = lookup_degree("ii/1", "C", Mode::Major).unwrap();
        assert_eq!(ii6.roman_label(), "ii6");
        assert_eq!(ii6.chord_symbol(), "Dm/F");
        assert_eq!(ii6.function(), HarmonicFunction::Subdominant);
    }

    #[test]
    fn test_invalid_input() {
        assert!(lookup_degree("I", "H", Mode::Major).is_err());
        assert!(lookup_degree("IX", "C", Mode::Major).is_err());
    }
}
