//! User-configured presentation settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Verbosity of the generated explanation.
///
/// Selects one of three fixed prompt templates. Unknown stored values fall
/// back to [`DetailLevel::Brief`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Aimed at a twelve-year-old.
    Simple,
    /// One or two sentences.
    #[default]
    Brief,
    /// Comprehensive, with examples and context.
    Detailed,
}

impl DetailLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Simple => "simple",
            DetailLevel::Brief => "brief",
            DetailLevel::Detailed => "detailed",
        }
    }

    /// Lenient parse used for stored settings: anything unrecognised is brief.
    pub fn from_setting(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetailLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(DetailLevel::Simple),
            "brief" => Ok(DetailLevel::Brief),
            "detailed" => Ok(DetailLevel::Detailed),
            other => Err(format!(
                "unknown detail level '{other}' (expected simple, brief or detailed)"
            )),
        }
    }
}

/// Overlay colour scheme. Stored for the page UI; the pipeline never reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn from_setting(value: Option<&str>) -> Self {
        match value {
            Some("light") => Theme::Light,
            _ => Theme::Dark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_level_parse() {
        assert_eq!("simple".parse::<DetailLevel>(), Ok(DetailLevel::Simple));
        assert_eq!("detailed".parse::<DetailLevel>(), Ok(DetailLevel::Detailed));
        assert!("verbose".parse::<DetailLevel>().is_err());
    }

    #[test]
    fn unknown_setting_defaults_to_brief() {
        assert_eq!(DetailLevel::from_setting(None), DetailLevel::Brief);
        assert_eq!(DetailLevel::from_setting(Some("nope")), DetailLevel::Brief);
        assert_eq!(
            DetailLevel::from_setting(Some("simple")),
            DetailLevel::Simple
        );
    }

    #[test]
    fn theme_defaults_to_dark() {
        assert_eq!(Theme::from_setting(None), Theme::Dark);
        assert_eq!(Theme::from_setting(Some("light")), Theme::Light);
        assert_eq!(Theme::from_setting(Some("purple")), Theme::Dark);
    }
}
