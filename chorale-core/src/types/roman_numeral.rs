// chorale-core/src/types/roman_numeral.rs
use anyhow::{anyhow, Result};
use std::fmt;
use std::str::FromStr;

/// Diatonic scale degree of a chord root, counted from the tonic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScaleDegree {
    I,
    II,
    III,
    IV,
    V,
    VI,
    VII,
}

/// Which chord tone sits in the bass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Inversion {
    #[default]
    Root,
    First,
    Second,
}

/// Major key or harmonic minor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordQuality {
    Major,      // I, IV, V
    Minor,      // ii, iii, vi
    Diminished, // vii°
}

/// A scale degree plus inversion, written `V`, `V/1` or `V/2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DegreeToken {
    pub degree: ScaleDegree,
    pub inversion: Inversion,
}

impl ScaleDegree {
    pub const ALL: [ScaleDegree; 7] = [
        ScaleDegree::I,
        ScaleDegree::II,
        ScaleDegree::III,
        ScaleDegree::IV,
        ScaleDegree::V,
        ScaleDegree::VI,
        ScaleDegree::VII,
    ];

    /// Zero-based position in the scale
    pub fn index(self) -> usize {
        self as usize
    }

    /// Triad quality of this degree in the given mode
    pub fn quality(self, mode: Mode) -> ChordQuality {
        use ChordQuality::*;
        let table = match mode {
            Mode::Major => [Major, Minor, Minor, Major, Major, Minor, Diminished],
            // Harmonic minor with a major mediant on the lowered third
            Mode::Minor => [Minor, Diminished, Major, Minor, Major, Major, Diminished],
        };
        table[self.index()]
    }

    /// Canonical roman numeral for this degree in the given mode
    pub fn label(self, mode: Mode) -> String {
        let upper = match self {
            ScaleDegree::I => "I",
            ScaleDegree::II => "II",
            ScaleDegree::III => "III",
            ScaleDegree::IV => "IV",
            ScaleDegree::V => "V",
            ScaleDegree::VI => "VI",
            ScaleDegree::VII => "VII",
        };
        match self.quality(mode) {
            ChordQuality::Major => upper.to_string(),
            ChordQuality::Minor => upper.to_lowercase(),
            ChordQuality::Diminished => format!("{}°", upper.to_lowercase()),
        }
    }
}

impl Inversion {
    /// Figured-bass suffix appended to the roman numeral
    pub fn figure(self) -> &'static str {
        match self {
            Inversion::Root => "",
            Inversion::First => "6",
            Inversion::Second => "6/4",
        }
    }

    pub fn is_inverted(self) -> bool {
        self != Inversion::Root
    }
}

impl DegreeToken {
    pub const TONIC: DegreeToken = DegreeToken::root(ScaleDegree::I);

    pub const fn root(degree: ScaleDegree) -> Self {
        DegreeToken {
            degree,
            inversion: Inversion::Root,
        }
    }

    pub const fn new(degree: ScaleDegree, inversion: Inversion) -> Self {
        DegreeToken { degree, inversion }
    }

    /// Same degree, root position
    pub fn base(self) -> Self {
        DegreeToken::root(self.degree)
    }

    pub fn is_dominant_family(self) -> bool {
        self.degree == ScaleDegree::V
    }

    pub fn is_leading_tone(self) -> bool {
        self.degree == ScaleDegree::VII
    }
}

impl FromStr for DegreeToken {
    type Err = anyhow::Error;

    /// Accepts `vii°`, `vii*` or `viio` for the leading-tone triad and an optional `/1` or `/2`.
    ///
    /// A token names a degree only. Case and any `°`/`*`/`o` mark are ignored
    /// on every degree, so `ii°`, `III` and `i` read as ii, iii and I; the mode
    /// decides the chord quality and label when the token is resolved.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (numeral, inversion) = match s.split_once('/') {
            None => (s, Inversion::Root),
            Some((n, "1")) => (n, Inversion::First),
            Some((n, "2")) => (n, Inversion::Second),
            Some((_, other)) => return Err(anyhow!("Invalid inversion marker '/{}' in {}", other, s)),
        };

        let lowered = numeral.trim_end_matches(['°', '*']).to_lowercase();
        let cleaned = lowered.strip_suffix('o').unwrap_or(&lowered);

        let degree = match cleaned {
            "i" => ScaleDegree::I,
            "ii" => ScaleDegree::II,
            "iii" => ScaleDegree::III,
            "iv" => ScaleDegree::IV,
            "v" => ScaleDegree::V,
            "vi" => ScaleDegree::VI,
            "vii" => ScaleDegree::VII,
            _ => return Err(anyhow!("Unknown scale degree: {}", s)),
        };

        Ok(DegreeToken { degree, inversion })
    }
}

impl fmt::Display for DegreeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degree.label(Mode::Major))?;
        match self.inversion {
            Inversion::Root => Ok(()),
            Inversion::First => write!(f, "/1"),
            Inversion::Second => write!(f, "/2"),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Major => write!(f, "major"),
            Mode::Minor => write!(f, "minor"),
        }
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "major" | "maj" | "maior" => Ok(Mode::Major),
            "minor" | "min" | "harmonic minor" => Ok(Mode::Minor),
            other => Err(anyhow!("Unknown mode: {}", other)),
        }
    }
}
