//! Session: drives the generator and the voice-leading assigner together
//!
//! A session owns the lazy progression search, the history of voiced entries
//! and a cursor into that history. Changing the key, length, strategy or mode
//! throws all of it away and returns to [`SessionState::NotStarted`].

use crate::generator::{generate, GeneratorConfig, ProgressionSearch, Rejection, Strategy};
use crate::types::formation::Formation;
use crate::types::note::parse_tonality;
use crate::types::progression::{Progression, ProgressionSnapshot};
use crate::types::roman_numeral::Mode;
use crate::types::voicing::VoicedProgression;
use crate::voice_leading::{assign, VoicingAlgorithm, VoicingOptions};
use anyhow::{anyhow, bail, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    /// Search running, nothing pulled yet
    Generating,
    HasCurrent,
    Exhausted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::NotStarted => "not started",
            SessionState::Generating => "generating",
            SessionState::HasCurrent => "has current",
            SessionState::Exhausted => "exhausted",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub tonality: String,
    pub length: usize,
    pub strategy: Strategy,
    pub generator: GeneratorConfig,
    pub formation: Formation,
    pub voicing: VoicingOptions,
    /// Seed for regenerated voicings; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            tonality: "C".to_string(),
            length: 4,
            strategy: Strategy::Tonal,
            generator: GeneratorConfig::default(),
            formation: Formation::default(),
            voicing: VoicingOptions::default(),
            seed: None,
        }
    }
}

/// One generated progression and its current voicing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    progression: Progression,
    voiced: VoicedProgression,
}

/// Read-only export form of an [`Entry`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntrySnapshot {
    pub progression: ProgressionSnapshot,
    pub voiced: VoicedProgression,
}

impl Entry {
    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn voiced(&self) -> &VoicedProgression {
        &self.voiced
    }

    pub fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            progression: self.progression.snapshot(),
            voiced: self.voiced.clone(),
        }
    }
}

pub struct Session {
    config: SessionConfig,
    state: SessionState,
    search: Option<ProgressionSearch>,
    history: Vec<Entry>,
    cursor: Option<usize>,
    rng: ChaCha8Rng,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Session {
            config,
            state: SessionState::NotStarted,
            search: None,
            history: Vec::new(),
            cursor: None,
            rng,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &[Entry] {
        &self.history
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current(&self) -> Option<&Entry> {
        self.history.get(self.cursor?)
    }

    /// Whether the last search stopped on its step budget
    pub fn is_truncated(&self) -> bool {
        self.search.as_ref().is_some_and(|s| s.is_truncated())
    }

    /// Pruned candidates recorded since the last call (tracing only)
    pub fn take_rejections(&mut self) -> Vec<Rejection> {
        self.search
            .as_mut()
            .map(|s| s.take_rejections())
            .unwrap_or_default()
    }

    /// Begin a fresh search with the current settings
    pub fn start(&mut self) -> Result<()> {
        self.config.formation.tessituras.validate()?;
        let search = generate(
            &self.config.tonality,
            self.config.length,
            self.config.strategy,
            self.config.generator,
        )?;
        tracing::info!(
            "session started: {} {}, {} chords, {}",
            self.config.tonality,
            self.config.generator.mode,
            self.config.length,
            self.config.strategy
        );
        self.search = Some(search);
        self.history.clear();
        self.cursor = None;
        self.state = SessionState::Generating;
        Ok(())
    }

    /// Pull the next progression, voice it and make it current.
    ///
    /// `Ok(None)` means the search is exhausted; history is left as it was.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<&Entry>> {
        let search = self
            .search
            .as_mut()
            .ok_or_else(|| anyhow!("No search running. Start the session first"))?;
        if self.state == SessionState::Exhausted {
            return Ok(None);
        }

        let Some(progression) = search.next() else {
            if search.is_truncated() {
                tracing::warn!("search stopped early on its step budget");
            }
            self.state = SessionState::Exhausted;
            return Ok(None);
        };

        let voiced = assign(&progression, &self.config.formation.tessituras, &self.config.voicing)?;
        self.history.push(Entry {
            progression,
            voiced,
        });
        self.cursor = Some(self.history.len() - 1);
        self.state = SessionState::HasCurrent;
        Ok(self.current())
    }

    /// Step back one entry; `None` when already at the first
    pub fn previous(&mut self) -> Option<&Entry> {
        let cursor = self.cursor?;
        if cursor == 0 {
            return None;
        }
        self.cursor = Some(cursor - 1);
        self.current()
    }

    /// Switch formation and revoice the current entry for it
    pub fn change_formation(&mut self, formation: Formation) -> Result<Option<&Entry>> {
        formation.tessituras.validate()?;
        tracing::info!("formation changed to {}", formation.name);
        self.config.formation = formation;
        self.revoice(self.config.voicing)
    }

    /// Switch voicing algorithm and revoice the current entry with it
    pub fn set_voicing_algorithm(&mut self, algorithm: VoicingAlgorithm) -> Result<Option<&Entry>> {
        self.config.voicing.algorithm = algorithm;
        self.revoice(self.config.voicing)
    }

    /// Revoice the current entry with a fresh random tie-break
    pub fn regenerate_voice_leading(&mut self) -> Result<&Entry> {
        if self.current().is_none() {
            bail!("Nothing to revoice yet. Generate a progression first");
        }
        let seed = self.rng.gen::<u64>();
        tracing::debug!("revoicing with seed {}", seed);
        self.revoice(self.config.voicing.with_seed(seed))?
            .ok_or_else(|| anyhow!("Nothing to revoice yet"))
    }

    fn revoice(&mut self, options: VoicingOptions) -> Result<Option<&Entry>> {
        let Some(index) = self.cursor else {
            return Ok(None);
        };
        let tessituras = self.config.formation.tessituras;
        let Some(entry) = self.history.get_mut(index) else {
            return Ok(None);
        };
        entry.voiced = assign(&entry.progression, &tessituras, &options)?;
        Ok(self.current())
    }

    pub fn set_tonality(&mut self, tonality: &str) -> Result<()> {
        let tonic = parse_tonality(tonality)?;
        self.config.tonality = tonic.name().to_string();
        self.reset();
        Ok(())
    }

    pub fn set_length(&mut self, length: usize) -> Result<()> {
        if length < 2 {
            bail!("Progression length must be at least 2, got {}", length);
        }
        self.config.length = length;
        self.reset();
        Ok(())
    }

    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.config.strategy = strategy;
        self.reset();
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.config.generator.mode = mode;
        self.reset();
    }

    /// Record pruned candidates from the next search onwards
    pub fn set_trace(&mut self, trace: bool) {
        self.config.generator.trace = trace;
    }

    fn reset(&mut self) {
        self.search = None;
        self.history.clear();
        self.cursor = None;
        self.state = SessionState::NotStarted;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::formation::{Tessitura, Tessituras};

    fn session(tonality: &str, length: usize, strategy: Strategy) -> Session {
        Session::new(SessionConfig {
            tonality: tonality.to_string(),
            length,
            strategy,
            seed: Some(11),
            ..SessionConfig::default()
        })
    }

    #[test]
    fn test_state_transitions() {
        let mut s = session("C", 4, Strategy::Tonal);
        assert_eq!(s.state(), SessionState::NotStarted);
        assert!(s.next().is_err());

        s.start().unwrap();
        assert_eq!(s.state(), SessionState::Generating);

        let first = s.next().unwrap().unwrap();
        assert_eq!(first.progression().roman_labels(), vec!["I", "iii", "V", "I"]);
        assert_eq!(first.voiced().len(), 4);
        assert_eq!(s.state(), SessionState::HasCurrent);
        assert_eq!(s.cursor(), Some(0));

        assert!(s.next().unwrap().is_none());
        assert_eq!(s.state(), SessionState::Exhausted);
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.cursor(), Some(0));
        assert!(s.next().unwrap().is_none());
    }

    #[test]
    fn test_previous_reuses_history() {
        let mut s = session("C", 5, Strategy::Tonal);
        s.start().unwrap();
        let first = s.next().unwrap().unwrap().clone();
        s.next().unwrap().unwrap();
        assert_eq!(s.cursor(), Some(1));

        assert_eq!(s.previous(), Some(&first));
        assert_eq!(s.cursor(), Some(0));
        assert!(s.previous().is_none());
        assert_eq!(s.cursor(), Some(0));
    }

    #[test]
    fn test_formation_change_keeps_progression() {
        let mut s = session("G", 5, Strategy::Inverted);
        s.start().unwrap();
        let before = s.next().unwrap().unwrap().clone();

        let after = s.change_formation(Formation::guitar()).unwrap().unwrap();
        assert_eq!(after.progression().roman_labels(), before.progression().roman_labels());
        assert_eq!(after.progression().chord_symbols(), before.progression().chord_symbols());
        assert_eq!(after.voiced().len(), before.voiced().len());
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.config().formation, Formation::guitar());

        let narrow = Tessitura::new(60, 72).unwrap();
        let bad = Formation {
            name: "broken".to_string(),
            tessituras: Tessituras {
                bass: Tessitura { min: 50, max: 40, ..narrow },
                ..Tessituras::default()
            },
        };
        assert!(s.change_formation(bad).is_err());
        assert_eq!(s.config().formation, Formation::guitar());
    }

    #[test]
    fn test_regenerate_voice_leading() {
        let mut s = session("D", 5, Strategy::Tonal);
        assert!(s.regenerate_voice_leading().is_err());

        s.start().unwrap();
        let labels = s.next().unwrap().unwrap().progression().roman_labels();
        for _ in 0..5 {
            let entry = s.regenerate_voice_leading().unwrap();
            assert_eq!(entry.progression().roman_labels(), labels);
            for v in entry.voiced().voicings() {
                let p = v.pitches();
                assert!(p[0] > p[1] && p[1] > p[2] && p[2] > p[3]);
            }
        }

        let mut a = session("D", 5, Strategy::Tonal);
        let mut b = session("D", 5, Strategy::Tonal);
        for s in [&mut a, &mut b] {
            s.start().unwrap();
            s.next().unwrap();
            s.regenerate_voice_leading().unwrap();
        }
        assert_eq!(a.current(), b.current());
    }

    #[test]
    fn test_settings_invalidate_history() {
        let mut s = session("C", 4, Strategy::Tonal);
        s.start().unwrap();
        s.next().unwrap();

        s.set_tonality("F").unwrap();
        assert_eq!(s.state(), SessionState::NotStarted);
        assert!(s.history().is_empty());
        assert_eq!(s.cursor(), None);

        assert!(s.set_tonality("H").is_err());
        assert_eq!(s.config().tonality, "F");
        assert!(s.set_length(1).is_err());

        s.start().unwrap();
        s.next().unwrap();
        s.set_mode(Mode::Minor);
        assert_eq!(s.state(), SessionState::NotStarted);
        s.start().unwrap();
        let entry = s.next().unwrap().unwrap();
        assert_eq!(entry.progression().roman_labels()[0], "i");

        s.set_strategy(Strategy::Inverted);
        assert!(s.current().is_none());
    }

    #[test]
    fn test_traced_session() {
        let mut s = session("C", 4, Strategy::Tonal);
        s.set_trace(true);
        s.start().unwrap();
        s.next().unwrap();
        assert!(!s.take_rejections().is_empty());
    }

    #[test]
    fn test_step_budget_exhausts_session() {
        let mut s = Session::new(SessionConfig {
            length: 6,
            generator: GeneratorConfig {
                step_budget: Some(1),
                ..GeneratorConfig::default()
            },
            ..SessionConfig::default()
        });
        s.start().unwrap();
        assert!(s.next().unwrap().is_none());
        assert!(s.is_truncated());
        assert_eq!(s.state(), SessionState::Exhausted);
    }

    #[test]
    fn test_start_rejects_malformed_formation() {
        let mut formation = Formation::vocal_quartet();
        formation.tessituras.bass = Tessitura {
            min: 60,
            max: 40,
            ..formation.tessituras.bass
        };
        let mut s = Session::new(SessionConfig {
            length: 5,
            formation,
            ..SessionConfig::default()
        });
        assert!(s.start().is_err());
        assert_eq!(s.state(), SessionState::NotStarted);
        assert!(s.next().is_err());

        // Nothing was pulled from a search, so every progression is still there
        s.change_formation(Formation::vocal_quartet()).unwrap();
        s.start().unwrap();
        let mut labels = Vec::new();
        while let Some(entry) = s.next().unwrap() {
            labels.push(entry.progression().to_string());
        }
        assert_eq!(
            labels,
            vec!["I → IV → ii → V → I", "I → vi → ii → V → I", "I → vi → iii → V → I"]
        );
    }
}
