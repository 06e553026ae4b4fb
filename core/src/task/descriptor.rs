use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
static QUANTITY_REGEX: OnceLock<Regex> = OnceLock::new();
static DESTINATION_REGEX: OnceLock<Regex> = OnceLock::new();
static DISCOUNT_LABEL_REGEX: OnceLock<Regex> = OnceLock::new();
static DISCOUNT_TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})")
            .expect("EMAIL_REGEX is valid")
    })
}

fn quantity_regex() -> &'static Regex {
    QUANTITY_REGEX.get_or_init(|| Regex::new(r"\b(\d+)\b").expect("QUANTITY_REGEX is valid"))
}

fn destination_regex() -> &'static Regex {
    DESTINATION_REGEX.get_or_init(|| {
        Regex::new(r"\b(?:to|ke)\s+([A-Z][a-z]+)\b").expect("DESTINATION_REGEX is valid")
    })
}

fn discount_label_regex() -> &'static Regex {
    DISCOUNT_LABEL_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(?:discount\s*code|kode\s*diskon)\s*[:\-]?\s*([A-Za-z0-9_-]+)")
            .expect("DISCOUNT_LABEL_REGEX is valid")
    })
}

fn discount_token_regex() -> &'static Regex {
    DISCOUNT_TOKEN_REGEX.get_or_init(|| {
        Regex::new(r"\b([A-Z]{4,}\d+)\b").expect("DISCOUNT_TOKEN_REGEX is valid")
    })
}

const KNOWN_CITIES: &[&str] = &[
    "jakarta",
    "bandung",
    "surabaya",
    "bali",
    "singapore",
    "medan",
    "semarang",
];

/// Keyword -> catalogue id. First match wins.
const PRODUCT_KEYWORDS: &[(&[&str], &str)] = &[
    (&["laptop"], "LAPTOP-001"),
    (&["mouse"], "MOUSE-002"),
    (&["keyboard"], "KEYBOARD-003"),
    (&["monitor"], "MONITOR-004"),
    (&["headset", "headphone"], "HEADSET-005"),
];

/// Keyword -> payment method. Order matters: "transfer" is a catch-all.
const PAYMENT_KEYWORDS: &[(&[&str], &str)] = &[
    (&["credit card", "kartu kredit"], "credit_card"),
    (&["debit"], "debit_card"),
    (&["gopay"], "gopay"),
    (&["ovo"], "ovo"),
    (&["bank transfer", "transfer"], "bank_transfer"),
    (&["ewallet", "e-wallet"], "ewallet"),
];

/// The originating user request plus whatever structured fields could be
/// pulled out of it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
}

impl TaskDescriptor {
    /// Best-effort extraction. Never fails; fields that cannot be found stay
    /// `None`.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let task = Self {
            quantity: extract_quantity(&text),
            product: extract_product(&text),
            destination: extract_destination(&text),
            payment_method: extract_payment_method(&text),
            email: extract_email(&text),
            discount_code: extract_discount_code(&text),
            text,
        };
        tracing::debug!(
            target: "planeval.plan",
            stage = "task.extract",
            fields = task.known_field_count()
        );
        task
    }

    pub fn known_field_count(&self) -> usize {
        [
            self.quantity.is_some(),
            self.product.is_some(),
            self.destination.is_some(),
            self.payment_method.is_some(),
            self.email.is_some(),
            self.discount_code.is_some(),
        ]
        .iter()
        .filter(|x| **x)
        .count()
    }
}

pub fn extract_email(text: &str) -> Option<String> {
    email_regex()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn extract_quantity(text: &str) -> Option<u32> {
    quantity_regex()
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn extract_product(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    PRODUCT_KEYWORDS
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|(_, id)| id.to_string())
}

pub fn extract_destination(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    if let Some(city) = KNOWN_CITIES.iter().find(|c| lower.contains(*c)) {
        return Some(capitalize(city));
    }
    destination_regex()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn extract_discount_code(text: &str) -> Option<String> {
    if let Some(m) = discount_label_regex().captures(text).and_then(|c| c.get(1)) {
        return Some(m.as_str().to_string());
    }
    discount_token_regex()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn extract_payment_method(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    PAYMENT_KEYWORDS
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|(_, method)| method.to_string())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ORDER: &str = "I want to order 2 laptops to Jakarta, use discount code WELCOME10, \
                         pay with credit card, email: john@example.com";

    #[test]
    fn extracts_every_field_from_order_request() {
        let task = TaskDescriptor::from_text(ORDER);
        assert_eq!(
            task,
            TaskDescriptor {
                text: ORDER.to_string(),
                quantity: Some(2),
                product: Some("LAPTOP-001".into()),
                destination: Some("Jakarta".into()),
                payment_method: Some("credit_card".into()),
                email: Some("john@example.com".into()),
                discount_code: Some("WELCOME10".into()),
            }
        );
        assert_eq!(task.known_field_count(), 6);
    }

    #[test]
    fn missing_fields_stay_none() {
        let task = TaskDescriptor::from_text("please help me with something");
        assert_eq!(task.known_field_count(), 0);
        assert_eq!(task.text, "please help me with something");
    }

    #[test]
    fn destination_falls_back_to_preposition() {
        assert_eq!(extract_destination("ship it to Yogyakarta"), Some("Yogyakarta".into()));
        assert_eq!(extract_destination("kirim ke Makassar"), Some("Makassar".into()));
        assert_eq!(extract_destination("send to the office"), None);
    }

    #[test]
    fn discount_code_accepts_indonesian_label_and_bare_token() {
        assert_eq!(extract_discount_code("kode diskon: HEMAT_5"), Some("HEMAT_5".into()));
        assert_eq!(extract_discount_code("apply SAVE20 please"), Some("SAVE20".into()));
        assert_eq!(extract_discount_code("no code here"), None);
    }

    #[test]
    fn payment_keywords_follow_priority() {
        assert_eq!(extract_payment_method("bayar pakai kartu kredit"), Some("credit_card".into()));
        assert_eq!(extract_payment_method("via bank transfer"), Some("bank_transfer".into()));
        assert_eq!(extract_payment_method("use my e-wallet"), Some("ewallet".into()));
        assert_eq!(extract_payment_method("cash"), None);
    }

    #[test]
    fn headphone_maps_to_headset() {
        assert_eq!(extract_product("3 headphones"), Some("HEADSET-005".into()));
    }
}
