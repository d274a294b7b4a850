//! Keyword-driven classification, no model calls.
//!
//! Serves as the LLM fallback and as the only classifier when the model
//! backend is disabled. Priorities follow the observed chat patterns:
//! product/amount signals outrank address signals, which outrank greetings.

use std::sync::LazyLock;

use regex::Regex;

use zakazflow_types::error::ExtractError;
use zakazflow_types::extraction::{Classification, ClassifierSource, MessageRole};

use crate::extract::keywords::{
    self, ADDRESS_KEYWORDS, AMOUNT_KEYWORDS, GREETING_KEYWORDS, PRODUCT_KEYWORDS,
};

use super::Classifier;

/// "412 ming", "250 000", "summa 300000" style amount shapes.
static AMOUNT_SHAPES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\b\d{2,4}\s*(ming|min|мин|минг)\b").expect("amount shape"),
        Regex::new(r"\b\d{2,3}\s*000\b").expect("amount shape"),
        Regex::new(r"\bsumma\s*\d+").expect("amount shape"),
    ]
});

/// Stateless keyword classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedClassifier;

impl Classifier for RuleBasedClassifier {
    async fn classify(
        &self,
        text: &str,
        _context: &[String],
    ) -> Result<Classification, ExtractError> {
        if text.trim().is_empty() {
            return Ok(Classification::empty_text());
        }
        Ok(classify_rules(text))
    }
}

pub fn classify_rules(text: &str) -> Classification {
    let lower = text.to_lowercase();

    let has_addr = keywords::contains_any(&lower, ADDRESS_KEYWORDS);
    let has_prod = keywords::contains_any(&lower, PRODUCT_KEYWORDS);
    let has_amount = keywords::contains_any(&lower, AMOUNT_KEYWORDS)
        || AMOUNT_SHAPES.iter().any(|re| re.is_match(&lower));

    let (role, is_order_related, reason, probability) = if (has_prod || has_amount) && !has_addr {
        (
            MessageRole::Product,
            true,
            "mahsulot yoki summa so'zlari bor, manzil kalit so'zlari yo'q",
            0.85,
        )
    } else if has_addr {
        (
            MessageRole::Comment,
            true,
            "manzilga oid kalit so'zlar aniqlangan (uy, dom, mahalla, tuman)",
            0.7,
        )
    } else if keywords::contains_any(&lower, GREETING_KEYWORDS) {
        (
            MessageRole::Random,
            false,
            "salomlashish yoki umumiy chat, zakazga aloqasi yo'q",
            0.05,
        )
    } else {
        (
            MessageRole::Unknown,
            false,
            "mahsulot, summa yoki manzil bo'yicha aniq signal topilmadi",
            0.2,
        )
    };

    Classification {
        role,
        is_order_related,
        has_address_keywords: has_addr,
        reason: reason.to_string(),
        probability,
        source: ClassifierSource::Rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_text_classified_as_product() {
        let c = classify_rules("latte 2ta, cappuccino 1ta");
        assert_eq!(c.role, MessageRole::Product);
        assert!(c.is_order_related);
        assert!(!c.has_address_keywords);
    }

    #[test]
    fn test_amount_shape_without_keyword() {
        let c = classify_rules("412 ming");
        assert_eq!(c.role, MessageRole::Product);
        assert!(c.is_order_related);
    }

    #[test]
    fn test_address_outranks_product() {
        let c = classify_rules("Chilonzor 5 mavze 14 uy, latte olib keling");
        assert_eq!(c.role, MessageRole::Comment);
        assert!(c.has_address_keywords);
        assert!(c.is_order_related);
    }

    #[test]
    fn test_greeting_is_random() {
        let c = classify_rules("Salom, qalesiz?");
        assert_eq!(c.role, MessageRole::Random);
        assert!(!c.is_order_related);
    }

    #[test]
    fn test_unrecognized_is_unknown() {
        let c = classify_rules("xop mayli");
        assert_eq!(c.role, MessageRole::Unknown);
        assert!(!c.is_order_related);
    }

    #[tokio::test]
    async fn test_empty_text_verdict() {
        let c = RuleBasedClassifier.classify("   ", &[]).await.unwrap();
        assert_eq!(c.role, MessageRole::Unknown);
        assert_eq!(c.probability, 0.0);
    }
}
