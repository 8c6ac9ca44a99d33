use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    data::{AodSource, Collision, Table, Track},
    AodError,
};

/// LHC data-taking periods, which differ in event selection and in the track table used for
/// secondary-vertex daughters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPeriod {
    /// Run 2 (2015-2018) converted data.
    Run2,
    /// Run 3 (2022 onwards) data.
    Run3,
}

impl RunPeriod {
    /// Whether the collision passes the minimum-bias selection of this period
    /// (`sel7` for Run 2, `sel8` for Run 3).
    pub fn is_selected(&self, collision: &Collision) -> bool {
        match self {
            RunPeriod::Run2 => collision.sel7,
            RunPeriod::Run3 => collision.sel8,
        }
    }

    /// The track table holding V0 daughters for this period. Run 2 tracks are propagated to the
    /// primary vertex; Run 3 tracks are taken at their innermost update.
    pub fn tracks<'a>(&self, source: &'a dyn AodSource) -> &'a Table<Track> {
        match self {
            RunPeriod::Run2 => source.tracks(),
            RunPeriod::Run3 => source.tracks_iu(),
        }
    }
}

impl Display for RunPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPeriod::Run2 => write!(f, "Run 2"),
            RunPeriod::Run3 => write!(f, "Run 3"),
        }
    }
}

impl FromStr for RunPeriod {
    type Err = AodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "run2" | "run 2" | "run-2" | "2" => Ok(Self::Run2),
            "run3" | "run 3" | "run-3" | "3" => Ok(Self::Run3),
            _ => Err(AodError::ParseError {
                name: s.to_string(),
                object: "RunPeriod".to_string(),
            }),
        }
    }
}

/// Charged-particle species used as mass hypotheses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Species {
    /// Charged pion.
    Pion,
    /// Charged kaon.
    Kaon,
    /// Proton.
    Proton,
}

impl Species {
    /// The rest mass in GeV/$`c^2`$.
    pub fn mass(&self) -> f64 {
        match self {
            Species::Pion => 0.13957039,
            Species::Kaon => 0.493677,
            Species::Proton => 0.93827208816,
        }
    }
}

impl Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Species::Pion => write!(f, "pion"),
            Species::Kaon => write!(f, "kaon"),
            Species::Proton => write!(f, "proton"),
        }
    }
}

impl FromStr for Species {
    type Err = AodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pi" | "pion" => Ok(Self::Pion),
            "k" | "ka" | "kaon" => Ok(Self::Kaon),
            "p" | "pr" | "proton" => Ok(Self::Proton),
            _ => Err(AodError::ParseError {
                name: s.to_string(),
                object: "Species".to_string(),
            }),
        }
    }
}

/// Decay channels tagged in the `hfflag` bit field of two-prong heavy-flavour candidates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecayType {
    /// $`D^0 \to \pi^+ K^-`$ (and charge conjugate).
    D0ToPiK,
    /// $`J/\psi \to e^+ e^-`$.
    JpsiToEE,
    /// $`J/\psi \to \mu^+ \mu^-`$.
    JpsiToMuMu,
}

impl DecayType {
    /// The bit position of this channel in `hfflag`.
    pub fn bit(&self) -> u8 {
        match self {
            DecayType::D0ToPiK => 0,
            DecayType::JpsiToEE => 1,
            DecayType::JpsiToMuMu => 2,
        }
    }

    /// Test whether this channel's bit is set in `flags`.
    pub fn is_set(&self, flags: u8) -> bool {
        flags & (1 << self.bit()) != 0
    }

    /// The flag value with only this channel's bit set.
    pub fn flag(&self) -> u8 {
        1 << self.bit()
    }
}

impl Display for DecayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecayType::D0ToPiK => write!(f, "D0ToPiK"),
            DecayType::JpsiToEE => write!(f, "JpsiToEE"),
            DecayType::JpsiToMuMu => write!(f, "JpsiToMuMu"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_period_parsing() {
        assert_eq!("Run2".parse::<RunPeriod>().unwrap(), RunPeriod::Run2);
        assert_eq!("run 3".parse::<RunPeriod>().unwrap(), RunPeriod::Run3);
        assert!(matches!(
            "run4".parse::<RunPeriod>(),
            Err(AodError::ParseError { .. })
        ));
    }

    #[test]
    fn test_run_period_event_selection() {
        let collision = Collision {
            sel7: true,
            sel8: false,
            ..Default::default()
        };
        assert!(RunPeriod::Run2.is_selected(&collision));
        assert!(!RunPeriod::Run3.is_selected(&collision));
    }

    #[test]
    fn test_decay_flags() {
        let flags = DecayType::D0ToPiK.flag() | DecayType::JpsiToMuMu.flag();
        assert_eq!(flags, 0b101);
        assert!(DecayType::D0ToPiK.is_set(flags));
        assert!(!DecayType::JpsiToEE.is_set(flags));
        assert!(DecayType::JpsiToMuMu.is_set(flags));
    }

    #[test]
    fn test_species() {
        assert_eq!("K".parse::<Species>().unwrap(), Species::Kaon);
        assert!(Species::Proton.mass() > Species::Kaon.mass());
        assert_eq!(Species::Pion.to_string(), "pion");
    }
}
