use serde::{Deserialize, Serialize};

/// One of the two languages the assistant speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Fr,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::En => "en",
        }
    }

    pub fn all() -> Vec<Language> {
        vec![Language::Fr, Language::En]
    }

    /// Locale hint handed to speech recognition.
    pub fn locale_tag(&self) -> &'static str {
        match self {
            Language::Fr => "fr-FR",
            Language::En => "en-US",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Language::Fr => Language::En,
            Language::En => Language::Fr,
        }
    }

    /// Pick the variant of a bilingual string for this language.
    pub fn pick<'a>(&self, fr: &'a str, en: &'a str) -> &'a str {
        match self {
            Language::Fr => fr,
            Language::En => en,
        }
    }
}

const FRENCH_KEYWORDS: &[&str] = &[
    "je", "vous", "votre", "êtes", "est", "un", "une", "des", "le", "la", "les", "marché",
    "public", "comment", "pourquoi", "quand",
];

/// Best-effort guess at the language of a user prompt.
///
/// Any whole word from a small French keyword list means French; everything
/// else is English. This is not language identification, only a hint.
pub fn detect_language(text: &str) -> Language {
    let lower = text.to_lowercase();
    let is_french = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .any(|word| FRENCH_KEYWORDS.contains(&word));

    if is_french {
        Language::Fr
    } else {
        Language::En
    }
}
