//! Progression generator
//!
//! Enumerates chord-degree sequences that open on the tonic, close with a
//! dominant-family chord resolving to the tonic, and obey the common-tone,
//! no-repeat and leading-tone rules. Two strategies share one search: plain
//! root-position triads, and triads with first and second inversions.

pub mod rules;
pub mod search;

pub use rules::{RejectReason, Rejection, Step};
pub use search::ProgressionSearch;

use crate::types::note::parse_tonality;
use crate::types::roman_numeral::{DegreeToken, Inversion, Mode, ScaleDegree};
use crate::types::progression::Progression;
use anyhow::{anyhow, bail, Result};
use std::fmt;
use std::str::FromStr;

/// Degrees that may fill the middle of a progression, in search order
const MIDDLE_DEGREES: [ScaleDegree; 6] = [
    ScaleDegree::II,
    ScaleDegree::III,
    ScaleDegree::IV,
    ScaleDegree::V,
    ScaleDegree::VI,
    ScaleDegree::VII,
];

/// Search settings shared by every strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub mode: Mode,
    /// Most inverted chords allowed in one progression (inverted strategy only)
    pub max_inversions: usize,
    /// Candidate evaluations allowed per `next()` call
    pub step_budget: Option<usize>,
    /// Record every pruned candidate for `take_rejections`
    pub trace: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            mode: Mode::Major,
            max_inversions: 1,
            step_budget: None,
            trace: false,
        }
    }
}

/// A way of choosing chords for a progression
pub trait ProgressionStrategy {
    fn name(&self) -> &'static str;

    /// Candidate tokens for a middle slot, in the order they are tried
    fn pool(&self) -> Vec<DegreeToken>;

    /// Validity predicate for one step
    fn check(&self, step: &Step, _config: &GeneratorConfig) -> Result<(), RejectReason> {
        rules::check_common(step)
    }

    /// Lazily enumerate every valid progression of `length` chords
    fn generate(
        &self,
        tonality: &str,
        length: usize,
        config: GeneratorConfig,
    ) -> Result<ProgressionSearch>
    where
        Self: Sized + Clone + 'static,
    {
        start_search(Box::new(self.clone()), tonality, length, config)
    }
}

/// Root-position triads only
#[derive(Debug, Clone, Copy, Default)]
pub struct TonalTriads;

impl ProgressionStrategy for TonalTriads {
    fn name(&self) -> &'static str {
        "tonal triads"
    }

    fn pool(&self) -> Vec<DegreeToken> {
        MIDDLE_DEGREES.iter().map(|&d| DegreeToken::root(d)).collect()
    }
}

/// Triads in root position, first and second inversion
#[derive(Debug, Clone, Copy, Default)]
pub struct InvertedTriads;

impl ProgressionStrategy for InvertedTriads {
    fn name(&self) -> &'static str {
        "inverted triads"
    }

    fn pool(&self) -> Vec<DegreeToken> {
        MIDDLE_DEGREES
            .iter()
            .flat_map(|&d| {
                [Inversion::Root, Inversion::First, Inversion::Second]
                    .map(|inv| DegreeToken::new(d, inv))
            })
            .collect()
    }

    fn check(&self, step: &Step, config: &GeneratorConfig) -> Result<(), RejectReason> {
        rules::check_common(step)?;
        rules::check_inversions(step, config.max_inversions)
    }
}

/// Selectable strategy, for callers that pick one at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    #[default]
    Tonal,
    Inverted,
}

impl Strategy {
    pub fn boxed(self) -> Box<dyn ProgressionStrategy> {
        match self {
            Strategy::Tonal => Box::new(TonalTriads),
            Strategy::Inverted => Box::new(InvertedTriads),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.boxed().name())
    }
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "tonal" | "triads" | "tonal-triads" | "tonal triads" => Ok(Strategy::Tonal),
            "inverted" | "inversions" | "inverted-triads" | "inverted triads" => {
                Ok(Strategy::Inverted)
            }
            _ => Err(anyhow!(
                "Unknown strategy '{}'. Use 'tonal' or 'inverted'",
                s
            )),
        }
    }
}

fn start_search(
    strategy: Box<dyn ProgressionStrategy>,
    tonality: &str,
    length: usize,
    config: GeneratorConfig,
) -> Result<ProgressionSearch> {
    if length < 2 {
        bail!("Progression length must be at least 2, got {}", length);
    }
    let tonic = parse_tonality(tonality)?;
    tracing::debug!(
        "searching {} progressions of length {} in {} {}",
        strategy.name(),
        length,
        tonic,
        config.mode
    );
    Ok(ProgressionSearch::new(strategy, tonic, length, config))
}

/// Lazily enumerate progressions with the given strategy
pub fn generate(
    tonality: &str,
    length: usize,
    strategy: Strategy,
    config: GeneratorConfig,
) -> Result<ProgressionSearch> {
    start_search(strategy.boxed(), tonality, length, config)
}

/// Eager variant of [`generate`]
pub fn generate_all(
    tonality: &str,
    length: usize,
    strategy: Strategy,
    config: GeneratorConfig,
) -> Result<Vec<Progression>> {
    Ok(generate(tonality, length, strategy, config)?.collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::note::TONALITIES;

    fn spelled(p: &Progression) -> String {
        p.tokens()
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn all(tonality: &str, length: usize, strategy: Strategy) -> Vec<String> {
        generate_all(tonality, length, strategy, GeneratorConfig::default())
            .unwrap()
            .iter()
            .map(spelled)
            .collect()
    }

    #[test]
    fn test_tonal_length_four_in_c() {
        let found = generate_all("C", 4, Strategy::Tonal, GeneratorConfig::default()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(spelled(&found[0]), "I iii V I");
        let tonic = found[0].first().unwrap();
        let names: Vec<String> = tonic.triad().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["C", "E", "G"]);
    }

    #[test]
    fn test_tonal_longer_progressions() {
        assert_eq!(
            all("C", 5, Strategy::Tonal),
            vec!["I IV ii V I", "I vi ii V I", "I vi iii V I"]
        );
        assert!(all("C", 6, Strategy::Tonal).contains(&"I IV vii° iii V I".to_string()));
        assert_eq!(all("C", 3, Strategy::Tonal), vec!["I V I"]);
    }

    #[test]
    fn test_inverted_length_four_in_c() {
        assert_eq!(
            all("C", 4, Strategy::Inverted),
            vec![
                "I iii V I",
                "I iii V/1 I",
                "I iii V/2 I",
                "I iii/1 V I",
                "I iii/2 V I",
            ]
        );

        let found = generate_all("C", 4, Strategy::Inverted, GeneratorConfig::default()).unwrap();
        let v64 = found
            .iter()
            .flat_map(|p| p.chords())
            .find(|c| c.token().to_string() == "V/2")
            .unwrap();
        assert!(v64.roman_label().ends_with("6/4"));
        assert_eq!(v64.bass_tone(), v64.fifth());
    }

    #[test]
    fn test_structural_properties() {
        for tonality in TONALITIES {
            for length in 3..=6 {
                for strategy in [Strategy::Tonal, Strategy::Inverted] {
                    let config = GeneratorConfig::default();
                    for p in generate(tonality, length, strategy, config).unwrap() {
                        let tokens = p.tokens();
                        assert_eq!(tokens.len(), length);
                        assert_eq!(p.roman_labels()[0], "I");
                        assert_eq!(tokens[0], DegreeToken::TONIC);
                        assert_eq!(tokens[length - 1], DegreeToken::TONIC);
                        assert!(tokens[length - 2].is_dominant_family());

                        let middle = &tokens[..length - 1];
                        for (i, t) in middle.iter().enumerate() {
                            assert!(
                                middle[i + 1..].iter().all(|u| u.degree != t.degree),
                                "{} repeats a degree",
                                p
                            );
                        }
                        for pair in tokens.windows(2) {
                            if pair[0].is_leading_tone() {
                                assert_eq!(pair[1].degree, ScaleDegree::III, "{}", p);
                            }
                        }
                        assert!(p.inversion_count() <= config.max_inversions);
                    }
                }
            }
        }
    }

    #[test]
    fn test_degenerate_lengths() {
        let mut search = generate("C", 2, Strategy::Tonal, GeneratorConfig::default()).unwrap();
        assert!(search.next().is_none());
        assert!(search.is_exhausted());
        assert!(!search.is_truncated());

        assert!(generate("C", 1, Strategy::Tonal, GeneratorConfig::default()).is_err());
        assert!(generate("C", 0, Strategy::Inverted, GeneratorConfig::default()).is_err());
        assert!(generate("H", 4, Strategy::Tonal, GeneratorConfig::default()).is_err());
    }

    #[test]
    fn test_rejections_are_traced() {
        let config = GeneratorConfig {
            trace: true,
            ..GeneratorConfig::default()
        };
        let mut search = generate("C", 4, Strategy::Tonal, config).unwrap();
        let found: Vec<_> = search.by_ref().collect();
        assert_eq!(found.len(), 1);

        let rejections = search.take_rejections();
        assert!(rejections.iter().any(|r| {
            r.sequence == vec![DegreeToken::TONIC, "IV".parse().unwrap()]
                && r.candidate.degree == ScaleDegree::V
                && r.reason == RejectReason::NoCommonTone
        }));
        assert!(rejections.iter().any(|r| {
            r.sequence == vec![DegreeToken::TONIC]
                && r.candidate.is_leading_tone()
                && r.reason == RejectReason::NoCommonTone
        }));
        assert!(search.take_rejections().is_empty());

        let mut quiet = generate("C", 4, Strategy::Tonal, GeneratorConfig::default()).unwrap();
        quiet.by_ref().for_each(drop);
        assert!(quiet.take_rejections().is_empty());
    }

    #[test]
    fn test_step_budget_truncates() {
        let config = GeneratorConfig {
            step_budget: Some(1),
            ..GeneratorConfig::default()
        };
        let mut search = generate("C", 6, Strategy::Inverted, config).unwrap();
        assert!(search.next().is_none());
        assert!(search.is_truncated());
        assert!(search.is_exhausted());
    }

    #[test]
    fn test_inversion_cap_is_configurable() {
        let config = GeneratorConfig {
            max_inversions: 0,
            ..GeneratorConfig::default()
        };
        let found = generate_all("C", 5, Strategy::Inverted, config).unwrap();
        assert!(!found.is_empty());
        assert!(found.iter().all(|p| p.inversion_count() == 0));

        let config = GeneratorConfig {
            max_inversions: 2,
            ..GeneratorConfig::default()
        };
        let found = generate_all("C", 5, Strategy::Inverted, config).unwrap();
        assert!(found.iter().any(|p| p.inversion_count() == 2));
    }

    #[test]
    fn test_minor_mode() {
        let config = GeneratorConfig {
            mode: Mode::Minor,
            ..GeneratorConfig::default()
        };
        let found = generate_all("A", 4, Strategy::Tonal, config).unwrap();
        assert!(!found.is_empty());
        assert_eq!(found[0].roman_labels(), vec!["i", "III", "V", "i"]);
        assert_eq!(found[0].chord_symbols(), vec!["Am", "C", "E", "Am"]);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("tonal".parse::<Strategy>().unwrap(), Strategy::Tonal);
        assert_eq!("Inverted".parse::<Strategy>().unwrap(), Strategy::Inverted);
        assert!("serial".parse::<Strategy>().is_err());
        assert_eq!(Strategy::Inverted.to_string(), "inverted triads");
    }

    #[test]
    fn test_trait_object_and_concrete_agree() {
        let direct: Vec<String> = InvertedTriads
            .generate("G", 4, GeneratorConfig::default())
            .unwrap()
            .map(|p| spelled(&p))
            .collect();
        assert_eq!(direct, all("G", 4, Strategy::Inverted));
    }
}
