//! Month names for the locales the fare site is served in.
//!
//! Dates on the site read like `Mon. 14. Oct 2024`. Month tokens are looked
//! up in a static per-locale table instead of switching a process-wide locale,
//! so parsing is reentrant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Language of the month abbreviations in scraped dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateLocale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "de")]
    German,
}

const ENGLISH: [&[&str]; 12] = [
    &["jan", "january"],
    &["feb", "february"],
    &["mar", "march"],
    &["apr", "april"],
    &["may"],
    &["jun", "june"],
    &["jul", "july"],
    &["aug", "august"],
    &["sep", "sept", "september"],
    &["oct", "october"],
    &["nov", "november"],
    &["dec", "december"],
];

const GERMAN: [&[&str]; 12] = [
    &["jan", "januar"],
    &["feb", "februar"],
    &["mär", "mrz", "märz"],
    &["apr", "april"],
    &["mai"],
    &["jun", "juni"],
    &["jul", "juli"],
    &["aug", "august"],
    &["sep", "sept", "september"],
    &["okt", "oktober"],
    &["nov", "november"],
    &["dez", "dezember"],
];

impl DateLocale {
    fn table(self) -> &'static [&'static [&'static str]; 12] {
        match self {
            DateLocale::English => &ENGLISH,
            DateLocale::German => &GERMAN,
        }
    }

    /// Month number (1-12) of an abbreviated or full month name.
    ///
    /// Case-insensitive; a trailing period (`Okt.`) is ignored.
    pub fn month_number(self, token: &str) -> Option<u32> {
        let token = token.trim().trim_end_matches('.').to_lowercase();
        self.table()
            .iter()
            .position(|names| names.contains(&token.as_str()))
            .map(|idx| idx as u32 + 1)
    }

    pub fn code(self) -> &'static str {
        match self {
            DateLocale::English => "en",
            DateLocale::German => "de",
        }
    }
}

impl fmt::Display for DateLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DateLocale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "en_us" | "en-us" | "english" => Ok(DateLocale::English),
            "de" | "de_de" | "de-de" | "german" => Ok(DateLocale::German),
            other => Err(format!("unsupported date locale '{other}'")),
        }
    }
}
