//! Quote Extractor
//!
//! Pulls the two silver quotes out of the source page. The page is reduced to
//! its visible text, then each unit label is searched case-insensitively and
//! the nearest number after it is taken as that unit's price.
//!
//! When only one unit is quoted the other is derived through the tola/10g
//! ratio. A page with neither is an `ExtractionError`, never a zero snapshot.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use super::quote::{is_positive, QuoteSnapshot, TOLA_PER_TEN_GRAM};

/// Default label for the per-tola row on the FENEGOSIDA board
pub const DEFAULT_TOLA_LABEL: &str = "Silver per 1 Tola";

/// Default label for the per-10-gram row on the FENEGOSIDA board
pub const DEFAULT_TEN_GRAM_LABEL: &str = "Silver per 10 Grm";

/// Digits with thousands separators and an optional decimal part.
/// Must start with a digit so the "." in "Rs." is never taken as the price.
const NUMBER_PATTERN: &str = r"(\d[\d,]*(?:\.\d*)?)";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("No usable silver price found in markup")]
    NoPrice,
}

/// Labels and conversion ratio used to build an extractor
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub tola_label: String,
    pub ten_gram_label: String,
    pub tola_per_ten_gram: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            tola_label: DEFAULT_TOLA_LABEL.to_string(),
            ten_gram_label: DEFAULT_TEN_GRAM_LABEL.to_string(),
            tola_per_ten_gram: TOLA_PER_TEN_GRAM,
        }
    }
}

/// Labeled-pattern quote extractor
#[derive(Debug, Clone)]
pub struct QuoteExtractor {
    tola_pattern: Regex,
    ten_gram_pattern: Regex,
    ratio: f64,
    hidden_blocks: Vec<Regex>,
    tag: Regex,
    whitespace: Regex,
}

impl QuoteExtractor {
    /// Build an extractor from labels; fails only if a label yields an invalid pattern
    pub fn new(config: &ExtractorConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            tola_pattern: label_pattern(&config.tola_label)?,
            ten_gram_pattern: label_pattern(&config.ten_gram_label)?,
            ratio: config.tola_per_ten_gram,
            hidden_blocks: vec![
                Regex::new(r"(?is)<script\b.*?</script\s*>")?,
                Regex::new(r"(?is)<style\b.*?</style\s*>")?,
                Regex::new(r"(?is)<head\b.*?</head\s*>")?,
                Regex::new(r"(?s)<!--.*?-->")?,
            ],
            tag: Regex::new(r"(?s)<[^>]*>")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Extract both quotes, cross-filling a missing unit from the other
    pub fn extract(&self, markup: &str) -> Result<QuoteSnapshot, ExtractionError> {
        let text = self.visible_text(markup);

        let tola = find_price(&self.tola_pattern, &text);
        let ten_gram = find_price(&self.ten_gram_pattern, &text);

        tracing::debug!(tola, ten_gram, "Raw quotes from markup");

        let (per_tola, per_ten_gram) = cross_fill(tola, ten_gram, self.ratio);
        if !is_positive(per_tola) || !is_positive(per_ten_gram) {
            return Err(ExtractionError::NoPrice);
        }

        Ok(QuoteSnapshot::live(per_tola, per_ten_gram))
    }

    /// Reduce markup to whitespace-normalised visible text
    pub fn visible_text(&self, markup: &str) -> String {
        let mut text = markup.to_string();
        for block in &self.hidden_blocks {
            text = block.replace_all(&text, " ").into_owned();
        }
        let text = self.tag.replace_all(&text, " ");
        let text = decode_entities(&text);
        self.whitespace.replace_all(&text, " ").trim().to_string()
    }
}

/// Fill a missing (zero) unit from the other through `ratio` (tola per 10 g)
pub fn cross_fill(tola: f64, ten_gram: f64, ratio: f64) -> (f64, f64) {
    let tola = if is_positive(tola) { tola } else { 0.0 };
    let ten_gram = if is_positive(ten_gram) { ten_gram } else { 0.0 };

    match (tola > 0.0, ten_gram > 0.0) {
        (false, true) => (ten_gram * ratio, ten_gram),
        (true, false) => (tola, tola / ratio),
        _ => (tola, ten_gram),
    }
}

/// Parse a captured price, stripping thousands separators.
///
/// Reads the longest leading float prefix, so `"1.2.3"` is 1.2.
/// No leading number → 0.
pub fn parse_price(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();

    let int_len = cleaned.chars().take_while(char::is_ascii_digit).count();
    let frac_len = match cleaned[int_len..].strip_prefix('.') {
        Some(rest) => rest.chars().take_while(char::is_ascii_digit).count(),
        None => 0,
    };

    let number = if frac_len > 0 {
        &cleaned[..int_len + 1 + frac_len]
    } else {
        &cleaned[..int_len]
    };
    number.parse::<f64>().unwrap_or(0.0)
}

fn find_price(pattern: &Regex, text: &str) -> f64 {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| parse_price(m.as_str()))
        .unwrap_or(0.0)
}

/// "Silver per 1 Tola" → `Silver\s*per\s*1\s*Tola.*?(number)`, case-insensitive
fn label_pattern(label: &str) -> Result<Regex, regex::Error> {
    let words: Vec<String> = label.split_whitespace().map(regex::escape).collect();
    let pattern = format!(r"{}.*?{}", words.join(r"\s*"), NUMBER_PATTERN);
    RegexBuilder::new(&pattern).case_insensitive(true).build()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
