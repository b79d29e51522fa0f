//! Phrase indicators and contact-form detection.
//!
//! Every category detector is a case-insensitive substring check against a
//! named phrase list. The lists are data: `Indicators::default_rules()` holds
//! the production set, tests build their own with `empty()` + `add_*`.

use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::types::CustomerContact;

/// Which phrase list a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorKind {
    Spam,
    OrderConfirmation,
    Partner,
    Insolvency,
}

const SPAM_PHRASES: &[&str] = &[
    "newsletter",
    "abmelden",
    "unsubscribe",
    "online version",
    "webinar",
    "marketing",
    "angebot",
    "rabatt",
    "promotion",
    "fachkräftemarkt",
    "lieferkette",
    "esg-compliance",
    "compliance",
    "reinigungsfirma",
    "google-profil",
    "strive",
    "podcast",
    "pinterest",
    "preisliste",
    "runtastic",
    "booste deine",
    "adobe acrobat sign",
    "outstanding payment",
    "unsigned",
    "asset management",
    "stone ridge",
    "investment",
];

const ORDER_PHRASES: &[&str] = &[
    "lieber genussentdecker",
    "ahoi und willkommen",
    "da sind wir wieder",
    "leinen los",
    "deine bestellung nr.",
    "deine gutscheine oder deine eintrittskarte",
    "flaschenpost findest",
    "vielen dank für deine bestellung",
];

const PARTNER_PHRASES: &[&str] = &[
    "partner-portal",
    "diese nachricht wurde von seite",
    "servus, bitte einfach eingeben",
    "baristakurse",
    "latteart",
];

const INSOLVENCY_PHRASES: &[&str] = &["miomente-inso.de", "insolvenzverfahren"];

/// Named phrase lists used by the category detectors. Phrases are stored lowercase.
#[derive(Debug, Clone, Default)]
pub struct Indicators {
    spam: Vec<String>,
    order_confirmation: Vec<String>,
    partner: Vec<String>,
    insolvency: Vec<String>,
}

impl Indicators {
    /// The production phrase lists.
    pub fn default_rules() -> Self {
        let owned = |phrases: &[&str]| -> Vec<String> {
            phrases.iter().map(|p| p.to_lowercase()).collect()
        };
        Self {
            spam: owned(SPAM_PHRASES),
            order_confirmation: owned(ORDER_PHRASES),
            partner: owned(PARTNER_PHRASES),
            insolvency: owned(INSOLVENCY_PHRASES),
        }
    }

    /// No phrases at all (for testing).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a phrase to one of the lists.
    pub fn add_phrase(&mut self, kind: IndicatorKind, phrase: &str) {
        let phrase = phrase.to_lowercase();
        match kind {
            IndicatorKind::Spam => self.spam.push(phrase),
            IndicatorKind::OrderConfirmation => self.order_confirmation.push(phrase),
            IndicatorKind::Partner => self.partner.push(phrase),
            IndicatorKind::Insolvency => self.insolvency.push(phrase),
        }
    }

    /// Builder form of `add_phrase`.
    pub fn with_phrase(mut self, kind: IndicatorKind, phrase: &str) -> Self {
        self.add_phrase(kind, phrase);
        self
    }

    fn phrases(&self, kind: IndicatorKind) -> &[String] {
        match kind {
            IndicatorKind::Spam => &self.spam,
            IndicatorKind::OrderConfirmation => &self.order_confirmation,
            IndicatorKind::Partner => &self.partner,
            IndicatorKind::Insolvency => &self.insolvency,
        }
    }

    /// First phrase of `kind` found in `text`, if any.
    pub fn find(&self, kind: IndicatorKind, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.phrases(kind)
            .iter()
            .find(|p| lower.contains(p.as_str()))
            .map(String::as_str)
    }

    pub fn matches(&self, kind: IndicatorKind, text: &str) -> bool {
        self.find(kind, text).is_some()
    }
}

/// Text that looks like a filled-in contact form: Name, Email, and a
/// Kommentar or Telefon field.
pub fn is_contact_form(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("name:")
        && lower.contains("email:")
        && (lower.contains("kommentar:") || lower.contains("telefon:"))
}

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)name:\s*([^\n<]+)").unwrap());

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)email:\s*([^\n<\s]+)").unwrap());

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)kommentar:\s*(.+?)(?:\n\n|\z)").unwrap());

/// Pull name, email and comment out of contact-form text. Missing fields are empty.
pub fn extract_contact(text: &str) -> CustomerContact {
    let capture = |re: &Regex| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    };
    CustomerContact {
        name: capture(&NAME_RE),
        email: capture(&EMAIL_RE),
        comment: capture(&COMMENT_RE),
    }
}
