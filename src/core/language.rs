//! Supported phonemization languages
//!
//! Kokoro voices are split into American (`a`) and British (`b`) English. The
//! single-letter codes match the first character of a voice id (`af_bella`,
//! `bm_george`), the long forms match eSpeak-NG voice names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::PhonemizerError;

/// Language accepted by the phonemizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageCode {
    /// American English ("a" or "en-us")
    #[serde(rename = "a", alias = "en-us")]
    AmericanEnglish,
    /// British English ("b" or "en-gb")
    #[serde(rename = "b", alias = "en-gb")]
    BritishEnglish,
}

impl LanguageCode {
    /// All supported languages
    pub const ALL: [LanguageCode; 2] = [LanguageCode::AmericanEnglish, LanguageCode::BritishEnglish];

    /// eSpeak-NG voice identifier for this language
    pub fn espeak_voice(self) -> &'static str {
        match self {
            LanguageCode::AmericanEnglish => "en-us",
            LanguageCode::BritishEnglish => "en-gb",
        }
    }
}

impl FromStr for LanguageCode {
    type Err = PhonemizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" | "en-us" => Ok(LanguageCode::AmericanEnglish),
            "b" | "en-gb" => Ok(LanguageCode::BritishEnglish),
            _ => Err(PhonemizerError::UnsupportedLanguage(s.to_string())),
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.espeak_voice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_and_long_codes() {
        assert_eq!("a".parse::<LanguageCode>().unwrap(), LanguageCode::AmericanEnglish);
        assert_eq!("en-us".parse::<LanguageCode>().unwrap(), LanguageCode::AmericanEnglish);
        assert_eq!("b".parse::<LanguageCode>().unwrap(), LanguageCode::BritishEnglish);
        assert_eq!("en-gb".parse::<LanguageCode>().unwrap(), LanguageCode::BritishEnglish);
    }

    #[test]
    fn test_parse_rejects_unknown_codes() {
        for code in ["fr", "de", "EN-US", "", "invalid"] {
            match code.parse::<LanguageCode>() {
                Err(PhonemizerError::UnsupportedLanguage(got)) => assert_eq!(got, code),
                other => panic!("expected UnsupportedLanguage for {code:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_espeak_voice_mapping() {
        assert_eq!(LanguageCode::AmericanEnglish.espeak_voice(), "en-us");
        assert_eq!(LanguageCode::BritishEnglish.espeak_voice(), "en-gb");
        assert_eq!(LanguageCode::BritishEnglish.to_string(), "en-gb");
    }

    #[test]
    fn test_serde_roundtrip_uses_short_codes() {
        let json = serde_json::to_string(&LanguageCode::BritishEnglish).unwrap();
        assert_eq!(json, "\"b\"");
        let parsed: LanguageCode = serde_json::from_str("\"en-us\"").unwrap();
        assert_eq!(parsed, LanguageCode::AmericanEnglish);
    }
}
