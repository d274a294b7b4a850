//! LLM-backed message classifier.

use serde::Deserialize;
use tracing::debug;

use zakazflow_core::classify::Classifier;
use zakazflow_types::config::Settings;
use zakazflow_types::error::ExtractError;
use zakazflow_types::extraction::{Classification, ClassifierSource, MessageRole};

use super::{ChatBackend, context_block, extract_json_object};

const SYSTEM_PROMPT: &str = "\
Siz Telegram guruhidagi xabarlarni klassifikatsiya qiladigan yordamchisiz.
Maqsad: xabar zakazga aloqador yoki yo'qligini aniqlash.

Faqat quyidagi JSON formatda javob qaytaring:
{
  \"is_order_related\": bool,
  \"role\": \"PRODUCT\" | \"COMMENT\" | \"RANDOM\" | \"UNKNOWN\",
  \"has_address_keywords\": bool,
  \"reason\": string,
  \"order_probability\": number
}

Ta'riflar:
- \"PRODUCT\": zakaz mazmuni, summa, narx, vaqt, kredit/oplata haqida ma'lumotlar.
  Masalan: \"277 000\", \"234 ming\", \"412ming\", \"Summa 412ming\", \"kredit\",
  \"oplacheno\", \"latte 2ta\", \"pizza 1 dona\" va hokazo.
- \"COMMENT\": manzil, qanday olib chiqish, eshik/kvartira/podyezd,
  \"Chilonzor 5 mavze 14 uy 43 xona\", \"eshik oldida kutib turaman\" kabi manzil/izoh.
- \"RANDOM\": zakazga aloqasi yo'q gaplar (salomlashish, chat, hazil va hokazo).
- \"UNKNOWN\": aniqlab bo'lmaydigan xabarlar.

Agar xabarda summa, narx yoki vaqt ko'rsatilgan bo'lsa (\"412ming\", \"277 000\",
\"20 minut\", \"Summa 234 ming\" kabi), ularni albatta PRODUCT deb hisoblang.
Har doim 'reason' maydonida qat'iy va aniq tushuntirish yozing.
'order_probability' 0 dan 1 gacha real son bo'lsin.";

/// Reply shape the model is instructed to produce.
#[derive(Deserialize)]
struct ClassifierReply {
    #[serde(default)]
    is_order_related: bool,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    has_address_keywords: bool,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    order_probability: Option<f64>,
}

pub struct OpenAiClassifier {
    backend: ChatBackend,
    context_window: usize,
}

impl OpenAiClassifier {
    pub fn new(api_key: &str, settings: &Settings) -> Self {
        Self {
            backend: ChatBackend::new(api_key, &settings.openai_model),
            context_window: settings.context_window,
        }
    }
}

impl Classifier for OpenAiClassifier {
    async fn classify(
        &self,
        text: &str,
        context: &[String],
    ) -> Result<Classification, ExtractError> {
        if text.trim().is_empty() {
            return Ok(Classification::empty_text());
        }

        let user_prompt = format!(
            "Kontekst xabarlar (oxirgi {} ta):\n{}\n\nTahlil qilinadigan xabar:\n{text}",
            self.context_window,
            context_block(context, self.context_window),
        );

        let reply = self.backend.complete(SYSTEM_PROMPT, &user_prompt).await?;
        let parsed: ClassifierReply = serde_json::from_str(extract_json_object(&reply)?)
            .map_err(|e| ExtractError::Malformed(format!("classifier reply: {e}")))?;

        let role = parsed
            .role
            .as_deref()
            .and_then(|r| r.parse::<MessageRole>().ok())
            .unwrap_or(MessageRole::Unknown);
        let probability = parsed.order_probability.unwrap_or(0.5).clamp(0.0, 1.0);
        debug!(%role, probability, "llm classification");

        Ok(Classification {
            role,
            is_order_related: parsed.is_order_related,
            has_address_keywords: parsed.has_address_keywords,
            reason: parsed.reason,
            probability,
            source: ClassifierSource::OpenAi,
        })
    }
}
