//! Formation and tessitura configuration
//!
//! Pure data describing the playable range of each of the four parts. The
//! voice-leading assigners treat these purely as numeric bounds; the clef and
//! staff hints exist for rendering collaborators only.

use anyhow::{anyhow, bail, Result};
use std::fmt;

/// One of the four parts, listed top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Voice {
    Soprano,
    Alto,
    Tenor,
    Bass,
}

impl Voice {
    /// Top to bottom
    pub const ALL: [Voice; 4] = [Voice::Soprano, Voice::Alto, Voice::Tenor, Voice::Bass];

    /// The voices above the bass, top to bottom
    pub const UPPER: [Voice; 3] = [Voice::Soprano, Voice::Alto, Voice::Tenor];

    pub fn name(&self) -> &'static str {
        match self {
            Voice::Soprano => "soprano",
            Voice::Alto => "alto",
            Voice::Tenor => "tenor",
            Voice::Bass => "bass",
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Clef hint for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Clef {
    #[default]
    Treble,
    Alto,
    Bass,
}

/// Inclusive MIDI range for one part (C4 = 60)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tessitura {
    pub min: i32,
    pub max: i32,
    pub clef: Clef,
    pub staff: u8,
}

impl Tessitura {
    pub fn new(min: i32, max: i32) -> Result<Self> {
        if min > max {
            bail!("Tessitura min {} is above max {}", min, max);
        }
        Ok(Tessitura {
            min,
            max,
            clef: Clef::default(),
            staff: 1,
        })
    }

    /// Attach rendering hints
    pub fn with_staff(self, clef: Clef, staff: u8) -> Self {
        Tessitura {
            clef,
            staff,
            ..self
        }
    }

    pub fn contains(&self, pitch: i32) -> bool {
        (self.min..=self.max).contains(&pitch)
    }

    pub fn midpoint(&self) -> i32 {
        (self.min + self.max) / 2
    }

    pub fn clamp(&self, pitch: i32) -> i32 {
        pitch.clamp(self.min, self.max)
    }

    /// Every pitch of the given pitch class inside the range, ascending
    pub fn representatives(&self, pitch_class: u8) -> impl Iterator<Item = i32> {
        let first = self.min + (pitch_class as i32 - self.min).rem_euclid(12);
        (first..=self.max).step_by(12)
    }

    /// In-range pitch of this pitch class nearest to `target`; lower pitch wins ties
    pub fn nearest(&self, pitch_class: u8, target: i32) -> Option<i32> {
        self.representatives(pitch_class)
            .min_by_key(|p| ((p - target).abs(), *p))
    }
}

/// One tessitura per voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tessituras {
    pub soprano: Tessitura,
    pub alto: Tessitura,
    pub tenor: Tessitura,
    pub bass: Tessitura,
}

impl Tessituras {
    pub fn new(
        soprano: Tessitura,
        alto: Tessitura,
        tenor: Tessitura,
        bass: Tessitura,
    ) -> Result<Self> {
        let tessituras = Tessituras {
            soprano,
            alto,
            tenor,
            bass,
        };
        tessituras.validate()?;
        Ok(tessituras)
    }

    /// Structural check: every range well formed
    pub fn validate(&self) -> Result<()> {
        for voice in Voice::ALL {
            let t = self.get(voice);
            if t.min > t.max {
                bail!("Tessitura for {} has min {} above max {}", voice, t.min, t.max);
            }
        }
        Ok(())
    }

    pub fn get(&self, voice: Voice) -> &Tessitura {
        match voice {
            Voice::Soprano => &self.soprano,
            Voice::Alto => &self.alto,
            Voice::Tenor => &self.tenor,
            Voice::Bass => &self.bass,
        }
    }
}

impl Default for Tessituras {
    fn default() -> Self {
        Formation::vocal_quartet().tessituras
    }
}

/// A named ensemble profile
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Formation {
    pub name: String,
    pub tessituras: Tessituras,
}

fn range(min: i32, max: i32, clef: Clef, staff: u8) -> Tessitura {
    Tessitura {
        min,
        max,
        clef,
        staff,
    }
}

impl Formation {
    pub fn piano() -> Self {
        Formation {
            name: "Piano".to_string(),
            tessituras: Tessituras {
                soprano: range(67, 84, Clef::Treble, 1),
                alto: range(60, 79, Clef::Treble, 1),
                tenor: range(55, 72, Clef::Bass, 2),
                bass: range(36, 67, Clef::Bass, 2),
            },
        }
    }

    pub fn guitar() -> Self {
        Formation {
            name: "Guitar".to_string(),
            tessituras: Tessituras {
                soprano: range(55, 76, Clef::Treble, 1),
                alto: range(52, 72, Clef::Treble, 1),
                tenor: range(48, 67, Clef::Treble, 1),
                bass: range(40, 64, Clef::Treble, 1),
            },
        }
    }

    pub fn string_quartet() -> Self {
        Formation {
            name: "String Quartet".to_string(),
            tessituras: Tessituras {
                soprano: range(55, 88, Clef::Treble, 1),
                alto: range(55, 83, Clef::Treble, 2),
                tenor: range(48, 76, Clef::Alto, 3),
                bass: range(36, 67, Clef::Bass, 4),
            },
        }
    }

    pub fn vocal_quartet() -> Self {
        Formation {
            name: "Vocal Quartet".to_string(),
            tessituras: Tessituras {
                soprano: range(60, 79, Clef::Treble, 1),
                alto: range(55, 74, Clef::Treble, 2),
                tenor: range(48, 67, Clef::Treble, 3),
                bass: range(40, 60, Clef::Bass, 4),
            },
        }
    }

    /// All built-in formations
    pub fn builtins() -> Vec<Formation> {
        vec![
            Self::piano(),
            Self::guitar(),
            Self::string_quartet(),
            Self::vocal_quartet(),
        ]
    }

    /// Look up a built-in formation by name, ignoring case and separators
    pub fn by_name(name: &str) -> Result<Formation> {
        let wanted = normalize(name);
        Self::builtins()
            .into_iter()
            .find(|f| normalize(&f.name) == wanted)
            .ok_or_else(|| {
                let names: Vec<String> = Self::builtins().into_iter().map(|f| f.name).collect();
                anyhow!("Unknown formation '{}'. Available: {}", name, names.join(", "))
            })
    }
}

impl Default for Formation {
    fn default() -> Self {
        Self::vocal_quartet()
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
