//! Match settings and difficulty presets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

pub const MAX_WIDTH: usize = 40;
pub const MAX_HEIGHT: usize = 25;
/// Squares always left free of bombs on a custom board.
pub const MIN_FREE_SQUARES: usize = 10;

/// Board size and bomb count of one match, plus the id under which it is
/// stored. The id is not part of the JSON form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    #[serde(rename = "boardWidth")]
    pub board_width: usize,
    #[serde(rename = "boardHeight")]
    pub board_height: usize,
    #[serde(rename = "bombNumber")]
    pub bomb_count: usize,
    #[serde(skip)]
    pub session_id: u64,
}

impl GameSettings {
    /// Validated custom settings.
    pub fn new(width: usize, height: usize, bombs: usize) -> Result<Self, SettingsError> {
        let settings = Self {
            board_width: width,
            board_height: height,
            bomb_count: bombs,
            session_id: 0,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_session_id(mut self, id: u64) -> Self {
        self.session_id = id;
        self
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(1..=MAX_WIDTH).contains(&self.board_width) {
            return Err(SettingsError::Width(self.board_width));
        }
        if !(1..=MAX_HEIGHT).contains(&self.board_height) {
            return Err(SettingsError::Height(self.board_height));
        }
        let max = (self.board_width * self.board_height).saturating_sub(MIN_FREE_SQUARES);
        if !(1..=max).contains(&self.bomb_count) {
            return Err(SettingsError::Bombs {
                bombs: self.bomb_count,
                max,
            });
        }
        Ok(())
    }
}

/// Preset board sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Custom {
        width: usize,
        height: usize,
        bombs: usize,
    },
}

impl Difficulty {
    pub fn settings(self) -> Result<GameSettings, SettingsError> {
        match self {
            Self::Easy => GameSettings::new(10, 10, 10),
            Self::Medium => GameSettings::new(20, 15, 35),
            Self::Hard => GameSettings::new(30, 17, 100),
            Self::Custom {
                width,
                height,
                bombs,
            } => GameSettings::new(width, height, bombs),
        }
    }
}

impl FromStr for Difficulty {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(SettingsError::UnknownDifficulty(s.to_string())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Easy => f.write_str("easy"),
            Self::Medium => f.write_str("medium"),
            Self::Hard => f.write_str("hard"),
            Self::Custom {
                width,
                height,
                bombs,
            } => write!(f, "custom {width}x{height}, {bombs} bombs"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let easy = Difficulty::Easy.settings().unwrap();
        assert_eq!((easy.board_width, easy.board_height, easy.bomb_count), (10, 10, 10));
        let medium = Difficulty::Medium.settings().unwrap();
        assert_eq!((medium.board_width, medium.board_height, medium.bomb_count), (20, 15, 35));
        let hard = Difficulty::Hard.settings().unwrap();
        assert_eq!((hard.board_width, hard.board_height, hard.bomb_count), (30, 17, 100));
    }

    #[test]
    fn custom_bounds() {
        assert_eq!(GameSettings::new(0, 5, 1), Err(SettingsError::Width(0)));
        assert_eq!(GameSettings::new(41, 5, 1), Err(SettingsError::Width(41)));
        assert_eq!(GameSettings::new(5, 26, 1), Err(SettingsError::Height(26)));
        assert_eq!(
            GameSettings::new(5, 5, 16),
            Err(SettingsError::Bombs { bombs: 16, max: 15 })
        );
        assert_eq!(
            GameSettings::new(5, 5, 0),
            Err(SettingsError::Bombs { bombs: 0, max: 15 })
        );
        assert!(GameSettings::new(5, 5, 15).is_ok());
        assert!(GameSettings::new(40, 25, 990).is_ok());
    }

    #[test]
    fn json_field_names() {
        let settings = GameSettings::new(5, 4, 3).unwrap().with_session_id(9);
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(json, r#"{"boardWidth":5,"boardHeight":4,"bombNumber":3}"#);

        let parsed: GameSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.session_id, 0);
        assert_eq!(parsed.with_session_id(9), settings);
    }

    #[test]
    fn parses_difficulty() {
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("extreme".parse::<Difficulty>().is_err());
    }
}
