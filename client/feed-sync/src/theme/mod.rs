//! Theme preference: one enumerated selection persisted under a single key

mod palette;
mod store;

pub use palette::Palette;
pub use store::{ThemeStore, DEFAULT_THEME_KEY};

use crate::error::ThemeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThemeName {
    #[default]
    SystemDark,
    SystemLight,
    FreshMint,
    FineRoyal,
    PurpleHaze,
    HackTheSystem,
}

impl ThemeName {
    pub const ALL: [ThemeName; 6] = [
        ThemeName::SystemDark,
        ThemeName::SystemLight,
        ThemeName::FreshMint,
        ThemeName::FineRoyal,
        ThemeName::PurpleHaze,
        ThemeName::HackTheSystem,
    ];

    /// Identifier used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeName::SystemDark => "systemDark",
            ThemeName::SystemLight => "systemLight",
            ThemeName::FreshMint => "freshMint",
            ThemeName::FineRoyal => "fineRoyal",
            ThemeName::PurpleHaze => "purpleHaze",
            ThemeName::HackTheSystem => "hackTheSystem",
        }
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeName {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemeName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ThemeError::UnknownTheme(s.to_string()))
    }
}
