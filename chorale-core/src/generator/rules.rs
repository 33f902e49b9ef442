//! Validity predicate applied to every candidate step of the search
//!
//! Checks run in a fixed order and the first failure wins: repetition,
//! common tone, leading-tone adjacency, then the strategy's inversion rules.

use crate::lookup::lookup;
use crate::types::note::Note;
use crate::types::roman_numeral::{DegreeToken, Inversion, Mode, ScaleDegree};
use std::fmt;

/// Why a candidate was pruned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The degree (ignoring inversion) is already in the sequence
    Repeated,
    /// The two triads share no pitch class
    NoCommonTone,
    /// vii° must resolve to iii
    LeadingToneUnresolved,
    /// vii° may only follow ii or IV
    LeadingToneUnprepared,
    /// A second-inversion chord right after any inverted chord
    SecondInversionAfterInversion,
    ConsecutiveSecondInversions,
    /// More inverted chords than the configured cap
    InversionCapExceeded,
    /// The harmonic lookup could not resolve the candidate
    LookupFailed(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Repeated => write!(f, "degree already used"),
            RejectReason::NoCommonTone => write!(f, "no common tone with previous chord"),
            RejectReason::LeadingToneUnresolved => write!(f, "vii° must be followed by iii"),
            RejectReason::LeadingToneUnprepared => write!(f, "vii° must be preceded by ii or IV"),
            RejectReason::SecondInversionAfterInversion => {
                write!(f, "second inversion after an inverted chord")
            }
            RejectReason::ConsecutiveSecondInversions => {
                write!(f, "two second inversions in a row")
            }
            RejectReason::InversionCapExceeded => write!(f, "too many inversions"),
            RejectReason::LookupFailed(e) => write!(f, "lookup failed: {}", e),
        }
    }
}

/// A pruned candidate together with the sequence it was tried against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub sequence: Vec<DegreeToken>,
    pub candidate: DegreeToken,
    pub reason: RejectReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seq: Vec<String> = self.sequence.iter().map(|t| t.to_string()).collect();
        write!(f, "[{}] + {}: {}", seq.join(" "), self.candidate, self.reason)
    }
}

/// Everything the predicate needs to judge one step
pub struct Step<'a> {
    pub sequence: &'a [DegreeToken],
    pub candidate: DegreeToken,
    /// The candidate fills the last slot with the closing tonic
    pub is_final_tonic: bool,
    pub tonic: Note,
    pub mode: Mode,
}

impl Step<'_> {
    pub fn last(&self) -> Option<DegreeToken> {
        self.sequence.last().copied()
    }

    pub fn inversions_used(&self) -> usize {
        self.sequence
            .iter()
            .filter(|t| t.inversion.is_inverted())
            .count()
    }
}

/// Rules shared by every strategy: repetition, common tone and vii° adjacency
pub fn check_common(step: &Step) -> Result<(), RejectReason> {
    let Some(last) = step.last() else {
        return Ok(());
    };
    let next = step.candidate;

    if !step.is_final_tonic && step.sequence.iter().any(|t| t.degree == next.degree) {
        return Err(RejectReason::Repeated);
    }

    let last_chord = lookup(last.base(), step.tonic, step.mode)
        .map_err(|e| RejectReason::LookupFailed(e.to_string()))?;
    let next_chord = lookup(next.base(), step.tonic, step.mode)
        .map_err(|e| RejectReason::LookupFailed(e.to_string()))?;
    if !last_chord.shares_tone_with(&next_chord) {
        return Err(RejectReason::NoCommonTone);
    }

    if last.is_leading_tone() && next.degree != ScaleDegree::III {
        return Err(RejectReason::LeadingToneUnresolved);
    }
    if next.is_leading_tone() && !matches!(last.degree, ScaleDegree::II | ScaleDegree::IV) {
        return Err(RejectReason::LeadingToneUnprepared);
    }

    Ok(())
}

/// Inversion constraints used by the inverted-triad strategy
pub fn check_inversions(step: &Step, max_inversions: usize) -> Result<(), RejectReason> {
    let next = step.candidate;
    if let Some(last) = step.last() {
        if next.inversion == Inversion::Second && last.inversion.is_inverted() {
            if last.inversion == Inversion::Second {
                return Err(RejectReason::ConsecutiveSecondInversions);
            }
            return Err(RejectReason::SecondInversionAfterInversion);
        }
    }
    if next.inversion.is_inverted() && step.inversions_used() + 1 > max_inversions {
        return Err(RejectReason::InversionCapExceeded);
    }
    Ok(())
}
