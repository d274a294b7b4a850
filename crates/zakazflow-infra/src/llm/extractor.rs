//! LLM-backed fact extractor for the finalize pass.

use serde::Deserialize;
use tracing::debug;

use zakazflow_core::extract::{FactExtractor, phones};
use zakazflow_types::config::Settings;
use zakazflow_types::error::ExtractError;
use zakazflow_types::extraction::{ExtractedAddress, ExtractedFacts};

use super::{ChatBackend, context_block, extract_json_object};

const SYSTEM_PROMPT: &str = "\
Siz Telegram dostavka botining AI yordamchisiz. Sizga guruhdagi zakaz
suhbatining matni beriladi. Siz undan yakuniy strukturali natijani to'g'ri
va ishonchli chiqarishingiz kerak.

Faqat quyidagi JSON formatda javob qaytaring:
{
  \"is_order\": bool,
  \"phone_numbers\": [string],
  \"amount\": number | null,
  \"address\": { \"type\": \"none\" | \"text\" | \"map_link\", \"value\": string | null },
  \"comment\": string | null,
  \"confidence\": number
}

Qoidalar:
- \"phone_numbers\": faqat mijoz telefon raqamlari, har biri +998 bilan
  boshlovchi to'liq raqam, masalan +998901234567. Aniq bo'lmasa bo'sh qoldiring.
- \"amount\": zakaz summasi so'mda butun son. \"besh yuz ming so'm\" -> 500000.
  Aniq summa bo'lmasa null.
- \"address\": matndagi manzil. Xarita havolasi bo'lsa type \"map_link\" va
  value'ga havolani yozing; oddiy manzil bo'lsa type \"text\".
- \"comment\": kuryer uchun qisqa izoh, bo'lmasa null.
- \"confidence\": 0 dan 1 gacha real son.";

#[derive(Deserialize)]
struct AddressReply {
    #[serde(default)]
    r#type: String,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Deserialize)]
struct ExtractorReply {
    #[serde(default)]
    is_order: bool,
    #[serde(default)]
    phone_numbers: Vec<String>,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    address: Option<AddressReply>,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

pub struct OpenAiExtractor {
    backend: ChatBackend,
    context_window: usize,
}

impl OpenAiExtractor {
    pub fn new(api_key: &str, settings: &Settings) -> Self {
        Self {
            backend: ChatBackend::new(api_key, &settings.openai_model),
            context_window: settings.context_window,
        }
    }
}

impl FactExtractor for OpenAiExtractor {
    async fn extract(
        &self,
        text: &str,
        context: &[String],
    ) -> Result<Option<ExtractedFacts>, ExtractError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let user_prompt = if context.is_empty() {
            format!("Zakaz suhbati matni:\n{text}")
        } else {
            format!(
                "Kontekst xabarlar:\n{}\n\nZakaz suhbati matni:\n{text}",
                context_block(context, self.context_window),
            )
        };

        let reply = self.backend.complete(SYSTEM_PROMPT, &user_prompt).await?;
        let parsed: ExtractorReply = serde_json::from_str(extract_json_object(&reply)?)
            .map_err(|e| ExtractError::Malformed(format!("extractor reply: {e}")))?;

        if !parsed.is_order {
            return Ok(None);
        }

        // Model phones only count once they survive strict normalization.
        let mut accepted = Vec::new();
        for candidate in &parsed.phone_numbers {
            if let Some(normalized) = phones::normalize(candidate) {
                if !accepted.contains(&normalized) {
                    accepted.push(normalized);
                }
            }
        }

        let address = match parsed.address {
            Some(addr) => match (addr.r#type.as_str(), addr.value) {
                ("map_link", Some(url)) => ExtractedAddress::MapLink { url },
                ("text" | "free_text", Some(value)) if !value.trim().is_empty() => {
                    ExtractedAddress::FreeText { value }
                }
                _ => ExtractedAddress::None,
            },
            None => ExtractedAddress::None,
        };

        let facts = ExtractedFacts {
            phones: accepted,
            amount: parsed.amount.filter(|a| *a > 0),
            address,
            comment: parsed.comment.filter(|c| !c.trim().is_empty()),
            is_order: true,
            confidence: parsed.confidence.unwrap_or(0.7).clamp(0.0, 1.0),
        };
        debug!(
            phones = facts.phones.len(),
            amount = ?facts.amount,
            "llm extraction"
        );
        Ok(Some(facts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_with_all_fields() {
        let json = r#"{
            "is_order": true,
            "phone_numbers": ["+998 90 123 45 67", "12345"],
            "amount": 250000,
            "address": {"type": "text", "value": "Chilonzor 5 mavze 14 uy"},
            "comment": "eshik oldida",
            "confidence": 0.92
        }"#;
        let parsed: ExtractorReply = serde_json::from_str(json).unwrap();
        assert!(parsed.is_order);
        assert_eq!(parsed.phone_numbers.len(), 2);
        assert_eq!(parsed.amount, Some(250_000));
    }

    #[test]
    fn test_bad_model_phone_is_rejected_by_normalization() {
        assert!(phones::normalize("12345").is_none());
        assert_eq!(
            phones::normalize("+998 90 123 45 67").as_deref(),
            Some("+998901234567")
        );
    }

    #[test]
    fn test_reply_defaults_when_sparse() {
        let parsed: ExtractorReply = serde_json::from_str(r#"{"is_order": false}"#).unwrap();
        assert!(!parsed.is_order);
        assert!(parsed.phone_numbers.is_empty());
        assert!(parsed.address.is_none());
    }
}
