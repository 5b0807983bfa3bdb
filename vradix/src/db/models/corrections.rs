//! Database models for proposed analysis corrections.

use crate::types::{AnalysisId, CorrectionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Analysis fields that users may propose corrections for.
///
/// Each variant maps to exactly one column, which is what keeps dynamic updates safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CorrectableField {
    OriginalLanguage,
    OriginalForm,
    Transliteration,
    Prefix,
    PrefixMeaning,
    Root,
    RootMeaning,
    Suffix,
    SuffixMeaning,
    EtymologyExplanation,
    HistoricalContext,
    ModernUsage,
}

impl CorrectableField {
    pub const ALL: [CorrectableField; 12] = [
        CorrectableField::OriginalLanguage,
        CorrectableField::OriginalForm,
        CorrectableField::Transliteration,
        CorrectableField::Prefix,
        CorrectableField::PrefixMeaning,
        CorrectableField::Root,
        CorrectableField::RootMeaning,
        CorrectableField::Suffix,
        CorrectableField::SuffixMeaning,
        CorrectableField::EtymologyExplanation,
        CorrectableField::HistoricalContext,
        CorrectableField::ModernUsage,
    ];

    /// Column on `etymology_analyses`
    pub fn column(&self) -> &'static str {
        match self {
            CorrectableField::OriginalLanguage => "original_language",
            CorrectableField::OriginalForm => "original_form",
            CorrectableField::Transliteration => "transliteration",
            CorrectableField::Prefix => "prefix",
            CorrectableField::PrefixMeaning => "prefix_meaning",
            CorrectableField::Root => "root",
            CorrectableField::RootMeaning => "root_meaning",
            CorrectableField::Suffix => "suffix",
            CorrectableField::SuffixMeaning => "suffix_meaning",
            CorrectableField::EtymologyExplanation => "etymology_explanation",
            CorrectableField::HistoricalContext => "historical_context",
            CorrectableField::ModernUsage => "modern_usage",
        }
    }

    /// Matching column on `word_origins`, when the canonical record carries the field
    pub fn word_origin_column(&self) -> Option<&'static str> {
        match self {
            CorrectableField::OriginalLanguage => Some("language"),
            CorrectableField::EtymologyExplanation | CorrectableField::ModernUsage => None,
            other => Some(other.column()),
        }
    }
}

impl FromStr for CorrectableField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CorrectableField::ALL
            .into_iter()
            .find(|field| field.column() == s)
            .ok_or_else(|| format!("Field '{s}' cannot be corrected"))
    }
}

/// Database request for proposing a correction
#[derive(Debug, Clone)]
pub struct CorrectionCreateDBRequest {
    pub analysis_id: AnalysisId,
    pub user_id: UserId,
    pub field_name: CorrectableField,
    pub original_value: String,
    pub corrected_value: String,
    pub explanation: String,
}

/// Database response for a correction
#[derive(Debug, Clone)]
pub struct CorrectionDBResponse {
    pub id: CorrectionId,
    pub analysis_id: AnalysisId,
    pub user_id: UserId,
    pub field_name: CorrectableField,
    pub original_value: String,
    pub corrected_value: String,
    pub explanation: String,
    pub is_approved: bool,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_parse() {
        assert_eq!("root_meaning".parse::<CorrectableField>().unwrap(), CorrectableField::RootMeaning);
        assert!("password_hash".parse::<CorrectableField>().is_err());
        assert!("user_id".parse::<CorrectableField>().is_err());
    }

    #[test]
    fn test_word_origin_columns() {
        assert_eq!(CorrectableField::OriginalLanguage.word_origin_column(), Some("language"));
        assert_eq!(CorrectableField::Root.word_origin_column(), Some("root"));
        assert_eq!(CorrectableField::ModernUsage.word_origin_column(), None);
    }
}
