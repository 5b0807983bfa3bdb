//! Etymology analysis: prompt construction, the provider call and output repair.
//!
//! The provider is asked for one JSON object. What comes back is treated as untrusted: code
//! fences are stripped, missing keys become empty strings, `related_words` that is not a list
//! becomes empty and `confidence_score` is coerced into `[0, 1]`. Output that is not a JSON
//! object at all is replaced by [`fallback_record`].

use std::{sync::Arc, time::Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{error, instrument, warn};

use super::{
    TextGenerator,
    usage::{UsageEntry, estimate_cost, record_usage},
};
use crate::db::handlers::Store;

/// Confidence assigned to the placeholder record
pub const FALLBACK_CONFIDENCE: f64 = 0.1;

/// Confidence used when the provider's value is missing or not a number
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

fn default_relationship() -> String {
    "related".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedWord {
    pub word: String,
    #[serde(default = "default_relationship")]
    pub relationship: String,
    #[serde(default)]
    pub explanation: String,
}

impl RelatedWord {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            relationship: default_relationship(),
            explanation: String::new(),
        }
    }
}

/// Normalized provider output.
///
/// The first group of fields is the structured vocabulary the prompt asks for. The optional
/// Portuguese fields are the shorter vocabulary some responses use instead; they are kept so that
/// the response mapping can fall back to them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtymologyRecord {
    pub word: String,
    pub original_language: String,
    pub original_form: String,
    pub transliteration: String,
    pub prefix: String,
    pub prefix_meaning: String,
    pub root: String,
    pub root_meaning: String,
    pub suffix: String,
    pub suffix_meaning: String,
    pub etymology_explanation: String,
    pub historical_context: String,
    pub modern_usage: String,
    pub related_words: Vec<RelatedWord>,
    pub confidence_score: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub origem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raizes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morfologia: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub significado: Option<String>,
}

/// Prompt sent to the text generator for `word`
pub fn build_prompt(word: &str) -> String {
    format!(
        r#"Como especialista em etimologia e linguística histórica, forneça uma análise detalhada da palavra "{word}" em português.

Responda exatamente com um objeto JSON com as seguintes chaves:

{{
    "word": "{word}",
    "original_language": "língua de origem (ex: Grego Antigo, Latim)",
    "original_form": "forma original na língua de origem",
    "transliteration": "transliteração, se aplicável",
    "prefix": "prefixo identificado ou vazio",
    "prefix_meaning": "significado do prefixo",
    "root": "raiz principal",
    "root_meaning": "significado da raiz",
    "suffix": "sufixo identificado ou vazio",
    "suffix_meaning": "significado do sufixo",
    "etymology_explanation": "explicação completa da etimologia em 2-3 parágrafos",
    "historical_context": "contexto histórico e cultural",
    "modern_usage": "uso atual da palavra",
    "related_words": ["palavras", "relacionadas"],
    "confidence_score": 0.95
}}

Regras:
- Indique incerteza através de confidence_score (0.0 a 1.0)
- Para palavras compostas, identifique todos os elementos
- Mencione mudanças semânticas e cognatos quando relevante
- Responda APENAS com o JSON, sem texto adicional"#
    )
}

/// Remove Markdown code fence wrapping from provider output
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    }
    if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Clamp a confidence into `[0, 1]`; NaN becomes [`DEFAULT_CONFIDENCE`]
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() { DEFAULT_CONFIDENCE } else { value.clamp(0.0, 1.0) }
}

/// Coerce a provider-supplied confidence value of any JSON type into `[0, 1]`
pub fn coerce_confidence(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.map(clamp_confidence).unwrap_or(DEFAULT_CONFIDENCE)
}

fn text_field(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

fn optional_text(object: &Map<String, Value>, key: &str) -> Option<String> {
    Some(text_field(object, key)).filter(|s| !s.is_empty())
}

fn related_words(value: Option<&Value>) -> Vec<RelatedWord> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(RelatedWord::new(s.trim())),
            Value::Object(object) => {
                let word = text_field(object, "word");
                if word.is_empty() {
                    return None;
                }
                Some(RelatedWord {
                    word,
                    relationship: optional_text(object, "relationship").unwrap_or_else(default_relationship),
                    explanation: text_field(object, "explanation"),
                })
            }
            _ => None,
        })
        .collect()
}

/// Parse provider output into a record. `None` when the text is not a JSON object.
pub fn parse_record(text: &str, word: &str) -> Option<EtymologyRecord> {
    let value: Value = serde_json::from_str(strip_code_fences(text)).ok()?;
    let object = value.as_object()?;

    let mut related = related_words(object.get("related_words"));
    if related.is_empty() {
        related = related_words(object.get("relacionadas"));
    }

    let parsed_word = text_field(object, "word");

    Some(EtymologyRecord {
        word: if parsed_word.is_empty() { word.to_string() } else { parsed_word },
        original_language: text_field(object, "original_language"),
        original_form: text_field(object, "original_form"),
        transliteration: text_field(object, "transliteration"),
        prefix: text_field(object, "prefix"),
        prefix_meaning: text_field(object, "prefix_meaning"),
        root: text_field(object, "root"),
        root_meaning: text_field(object, "root_meaning"),
        suffix: text_field(object, "suffix"),
        suffix_meaning: text_field(object, "suffix_meaning"),
        etymology_explanation: text_field(object, "etymology_explanation"),
        historical_context: text_field(object, "historical_context"),
        modern_usage: text_field(object, "modern_usage"),
        related_words: related,
        confidence_score: coerce_confidence(object.get("confidence_score")),
        origem: optional_text(object, "origem"),
        raizes: optional_text(object, "raizes"),
        morfologia: optional_text(object, "morfologia"),
        significado: optional_text(object, "significado"),
    })
}

/// Deterministic placeholder used when no usable analysis is available
pub fn fallback_record(word: &str) -> EtymologyRecord {
    EtymologyRecord {
        word: word.to_string(),
        original_language: "Análise incompleta".to_string(),
        original_form: word.to_string(),
        root: word.to_string(),
        root_meaning: "Significado a ser determinado".to_string(),
        etymology_explanation: format!("Análise etimológica de \"{word}\" em processamento. Por favor, tente novamente."),
        historical_context: "Contexto histórico a ser determinado.".to_string(),
        modern_usage: "Uso moderno a ser analisado.".to_string(),
        confidence_score: FALLBACK_CONFIDENCE,
        ..EtymologyRecord::default()
    }
}

/// A completed provider call
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Parsed record, or the fallback record when `parsed` is false
    pub record: EtymologyRecord,
    pub parsed: bool,
    pub raw_text: String,
    pub tokens_used: i32,
    pub cost_usd: f64,
    pub latency_ms: i64,
    pub model: String,
}

/// The provider could not be reached or refused the request
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error}")]
pub struct AnalysisFailure {
    pub error: String,
    pub latency_ms: i64,
    pub model: String,
}

pub struct AnalysisClient {
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn Store>,
    cost_per_1k_tokens: f64,
}

impl AnalysisClient {
    pub fn new(generator: Arc<dyn TextGenerator>, store: Arc<dyn Store>, cost_per_1k_tokens: f64) -> Self {
        Self {
            generator,
            store,
            cost_per_1k_tokens,
        }
    }

    /// Run one analysis. Every call, successful or not, is recorded as API usage.
    #[instrument(skip(self))]
    pub async fn analyze(&self, word: &str) -> Result<AnalysisOutcome, AnalysisFailure> {
        let prompt = build_prompt(word);
        let model = self.generator.model_name().to_string();

        let started = Instant::now();
        let result = self.generator.generate(&prompt).await;
        let latency_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

        match result {
            Ok(generated) => {
                let cost_usd = estimate_cost(generated.tokens_used, self.cost_per_1k_tokens);
                record_usage(
                    self.store.as_ref(),
                    UsageEntry {
                        service: "gemini",
                        endpoint: "etymology_analysis",
                        request_data: json!({ "word": word, "prompt": prompt }),
                        response_data: json!({ "text": generated.text }),
                        tokens_used: generated.tokens_used,
                        cost_usd,
                        response_time_ms: latency_ms,
                        error: None,
                    },
                )
                .await;

                let (record, parsed) = match parse_record(&generated.text, word) {
                    Some(record) => (record, true),
                    None => {
                        warn!(word, "Provider output is not a JSON object, using fallback record");
                        (fallback_record(word), false)
                    }
                };

                Ok(AnalysisOutcome {
                    record,
                    parsed,
                    raw_text: generated.text,
                    tokens_used: generated.tokens_used,
                    cost_usd,
                    latency_ms,
                    model,
                })
            }
            Err(e) => {
                error!(word, error = %e, "Etymology analysis failed");
                record_usage(
                    self.store.as_ref(),
                    UsageEntry {
                        service: "gemini",
                        endpoint: "etymology_analysis",
                        request_data: json!({ "word": word }),
                        response_data: json!({}),
                        tokens_used: 0,
                        cost_usd: 0.0,
                        response_time_ms: latency_ms,
                        error: Some(e.to_string()),
                    },
                )
                .await;

                Err(AnalysisFailure {
                    error: e.to_string(),
                    latency_ms,
                    model,
                })
            }
        }
    }
}
