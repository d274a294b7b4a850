//! Transient extraction and classification results.
//!
//! These carry what the fact extractor and the classifier found in one
//! message (or, at finalize time, in the whole transcript). They are never
//! persisted; the session keeps only the merged facts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Address candidate produced by fact extraction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractedAddress {
    #[default]
    None,
    /// Free-text address ("Chilonzor 5 mavze 14 uy").
    FreeText { value: String },
    /// Link to a map service.
    MapLink { url: String },
    /// Native coordinates.
    Coordinates { lat: f64, lon: f64 },
}

/// Facts recovered from text by the extractor.
///
/// LLM output is not trusted blindly: phones must pass strict normalization
/// before acceptance, and the amount is a whole-unit integer, never
/// fractional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedFacts {
    pub phones: Vec<String>,
    pub amount: Option<i64>,
    #[serde(default)]
    pub address: ExtractedAddress,
    pub comment: Option<String>,
    pub is_order: bool,
    pub confidence: f64,
}

/// Role a message plays inside an order conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageRole {
    /// Order content: product names, amounts, payment terms.
    Product,
    /// Address or courier instructions.
    Comment,
    /// Unrelated chatter.
    Random,
    Unknown,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::Product => write!(f, "PRODUCT"),
            MessageRole::Comment => write!(f, "COMMENT"),
            MessageRole::Random => write!(f, "RANDOM"),
            MessageRole::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PRODUCT" => Ok(MessageRole::Product),
            "COMMENT" => Ok(MessageRole::Comment),
            "RANDOM" => Ok(MessageRole::Random),
            "UNKNOWN" => Ok(MessageRole::Unknown),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// Which classifier variant produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClassifierSource {
    Rules,
    OpenAi,
}

impl fmt::Display for ClassifierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierSource::Rules => write!(f, "RULES"),
            ClassifierSource::OpenAi => write!(f, "OPENAI"),
        }
    }
}

/// Classifier verdict for one message in context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub role: MessageRole,
    pub is_order_related: bool,
    pub has_address_keywords: bool,
    pub reason: String,
    /// Order-relatedness probability in [0, 1].
    pub probability: f64,
    pub source: ClassifierSource,
}

impl Classification {
    /// Verdict for empty or whitespace-only text.
    pub fn empty_text() -> Self {
        Self {
            role: MessageRole::Unknown,
            is_order_related: false,
            has_address_keywords: false,
            reason: "empty or whitespace-only message".to_string(),
            probability: 0.0,
            source: ClassifierSource::Rules,
        }
    }
}
