use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A directory entry: one community chat with its join link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub short_name: String,
    pub long_name: String,
    pub semester: i64,
    pub role: String,
    pub link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub const ALL: [Theme; 2] = [Theme::Light, Theme::Dark];

    pub fn as_str(&self) -> &'static str {
        use Theme::*;
        match self {
            Light => "light",
            Dark => "dark",
        }
    }

    pub fn from_code(code: &str) -> Option<Theme> {
        Self::ALL.into_iter().find(|theme| theme.as_str() == code)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ru,
    Uk,
    Kz,
    Cz,
}

impl Language {
    pub const ALL: [Language; 5] = [Language::En, Language::Ru, Language::Uk, Language::Kz, Language::Cz];

    pub fn as_str(&self) -> &'static str {
        use Language::*;
        match self {
            En => "en",
            Ru => "ru",
            Uk => "uk",
            Kz => "kz",
            Cz => "cz",
        }
    }

    /// Exact match on one of the supported codes; region suffixes are not stripped.
    pub fn from_code(code: &str) -> Option<Language> {
        Self::ALL.into_iter().find(|language| language.as_str() == code)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-user preference record, keyed by the Telegram user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub telegram_id: i64,
    pub theme: Theme,
    pub language: Language,
    pub saved_chats: Vec<i64>,
}

impl User {
    pub fn new(telegram_id: i64) -> Self {
        Self {
            telegram_id,
            theme: Theme::default(),
            language: Language::default(),
            saved_chats: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid Telegram ID: {0:?}")]
pub struct InvalidTelegramId(pub String);

/// The external identity as it appears in a url path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelegramId(pub i64);

impl FromStr for TelegramId {
    type Err = InvalidTelegramId;

    /// Only the canonical decimal form is accepted: an optional `-` followed
    /// by ASCII digits, with no sign, padding or leading zeros.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('-').unwrap_or(s);
        let canonical = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && (digits == "0" || !digits.starts_with('0'));
        if !canonical {
            return Err(InvalidTelegramId(s.to_owned()));
        }
        s.parse().map(TelegramId).map_err(|_| InvalidTelegramId(s.to_owned()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageBody {
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeBody {
    pub theme: Theme,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedChatsBody {
    #[serde(rename = "savedChatsIds")]
    pub saved_chats_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_are_exact() {
        assert_eq!(Language::from_code("kz"), Some(Language::Kz));
        assert_eq!(Language::from_code("fr"), None);
        assert_eq!(Language::from_code("RU"), None);
        assert_eq!(Language::from_code("en-US"), None);
    }

    #[test]
    fn user_serializes_in_camel_case() {
        let user = User::new(42);
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["telegramId"], 42);
        assert_eq!(json["theme"], "light");
        assert_eq!(json["language"], "en");
        assert_eq!(json["savedChats"], serde_json::json!([]));
    }

    #[test]
    fn telegram_id_must_be_numeric() {
        assert_eq!("42".parse::<TelegramId>().unwrap(), TelegramId(42));
        assert!("".parse::<TelegramId>().is_err());
        assert!("undefined".parse::<TelegramId>().is_err());
        assert!("null".parse::<TelegramId>().is_err());
    }

    #[test]
    fn telegram_id_rejects_non_canonical_forms() {
        assert_eq!("-100".parse::<TelegramId>().unwrap(), TelegramId(-100));
        assert_eq!("0".parse::<TelegramId>().unwrap(), TelegramId(0));
        for input in ["+42", "042", " 42", "42 ", "-", "4_2", "99999999999999999999"] {
            assert!(input.parse::<TelegramId>().is_err(), "{input:?} accepted");
        }
    }

    #[test]
    fn unsupported_enum_values_fail_to_deserialize() {
        assert!(serde_json::from_str::<LanguageBody>(r#"{"language":"fr"}"#).is_err());
        assert!(serde_json::from_str::<ThemeBody>(r#"{"theme":"blue"}"#).is_err());
        let body: ThemeBody = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        assert_eq!(body.theme, Theme::Dark);
    }
}
