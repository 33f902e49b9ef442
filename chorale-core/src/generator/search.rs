//! Lazy depth-first enumeration of progressions
//!
//! The recursion of a classic backtracking search is unrolled into an explicit
//! stack of frames, one per open slot, so results can be pulled one at a time.

use super::rules::{Rejection, Step};
use super::{GeneratorConfig, ProgressionStrategy};
use crate::types::note::Note;
use crate::types::progression::Progression;
use crate::types::roman_numeral::{DegreeToken, Mode, ScaleDegree};

/// Candidates for one slot and the cursor into them
#[derive(Debug, Clone)]
struct Frame {
    candidates: Vec<DegreeToken>,
    cursor: usize,
}

/// Iterator over every valid progression of a fixed length
///
/// Progressions come out in depth-first order over the strategy's candidate
/// pool. Each one begins with `I` and ends with `V`-family then `I`.
pub struct ProgressionSearch {
    strategy: Box<dyn ProgressionStrategy>,
    tonic: Note,
    mode: Mode,
    length: usize,
    config: GeneratorConfig,
    sequence: Vec<DegreeToken>,
    stack: Vec<Frame>,
    rejections: Vec<Rejection>,
    truncated: bool,
    yielded: usize,
}

impl ProgressionSearch {
    pub(crate) fn new(
        strategy: Box<dyn ProgressionStrategy>,
        tonic: Note,
        length: usize,
        config: GeneratorConfig,
    ) -> Self {
        let mut search = ProgressionSearch {
            strategy,
            tonic,
            mode: config.mode,
            length,
            config,
            sequence: vec![DegreeToken::TONIC],
            stack: Vec::new(),
            rejections: Vec::new(),
            truncated: false,
            yielded: 0,
        };
        // Two chords cannot hold both a dominant and the closing tonic
        if length >= 3 {
            let candidates = search.slot_candidates();
            search.stack.push(Frame {
                candidates,
                cursor: 0,
            });
        }
        search
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn tonic(&self) -> Note {
        self.tonic
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The step budget ran out before the search finished
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Nothing left to explore
    pub fn is_exhausted(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Drain the rejections recorded so far (only collected when tracing)
    pub fn take_rejections(&mut self) -> Vec<Rejection> {
        std::mem::take(&mut self.rejections)
    }

    /// Candidates for the slot right after the current sequence
    fn slot_candidates(&self) -> Vec<DegreeToken> {
        let position = self.sequence.len();
        if position + 1 == self.length {
            return vec![DegreeToken::TONIC];
        }
        let pool = self.strategy.pool();
        if position + 2 == self.length {
            return pool.into_iter().filter(|t| t.is_dominant_family()).collect();
        }
        match self.sequence.last() {
            Some(last) if last.is_leading_tone() => pool
                .into_iter()
                .filter(|t| t.degree == ScaleDegree::III)
                .collect(),
            _ => pool,
        }
    }

    fn reject(&mut self, candidate: DegreeToken, reason: super::rules::RejectReason) {
        let rejection = Rejection {
            sequence: self.sequence.clone(),
            candidate,
            reason,
        };
        tracing::trace!("rejected {}", rejection);
        if self.config.trace {
            self.rejections.push(rejection);
        }
    }
}

impl Iterator for ProgressionSearch {
    type Item = Progression;

    fn next(&mut self) -> Option<Progression> {
        let mut steps = 0usize;
        loop {
            let frame = self.stack.last_mut()?;
            if frame.cursor >= frame.candidates.len() {
                self.stack.pop();
                // The root frame has no token of its own to retract
                if !self.stack.is_empty() {
                    self.sequence.pop();
                }
                continue;
            }
            let candidate = frame.candidates[frame.cursor];
            frame.cursor += 1;

            steps += 1;
            if let Some(budget) = self.config.step_budget {
                if steps > budget {
                    tracing::warn!(
                        "progression search stopped after {} steps ({} found)",
                        budget,
                        self.yielded
                    );
                    self.truncated = true;
                    self.stack.clear();
                    return None;
                }
            }

            let step = Step {
                sequence: &self.sequence,
                candidate,
                is_final_tonic: self.sequence.len() + 1 == self.length,
                tonic: self.tonic,
                mode: self.mode,
            };
            if let Err(reason) = self.strategy.check(&step, &self.config) {
                self.reject(candidate, reason);
                continue;
            }

            self.sequence.push(candidate);
            if self.sequence.len() == self.length {
                let resolved = Progression::from_tokens(&self.sequence, self.tonic, self.mode);
                self.sequence.pop();
                match resolved {
                    Ok(progression) => {
                        self.yielded += 1;
                        tracing::debug!("found {}", progression);
                        return Some(progression);
                    }
                    Err(e) => {
                        self.reject(
                            candidate,
                            super::rules::RejectReason::LookupFailed(e.to_string()),
                        );
                        continue;
                    }
                }
            }

            let candidates = self.slot_candidates();
            self.stack.push(Frame {
                candidates,
                cursor: 0,
            });
        }
    }
}
