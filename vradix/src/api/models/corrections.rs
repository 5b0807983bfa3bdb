//! API request/response models for proposed corrections.

use crate::db::models::corrections::{CorrectableField, CorrectionDBResponse};
use crate::types::{AnalysisId, CorrectionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CorrectionCreate {
    /// Column name on the analysis, e.g. `root_meaning`
    pub field_name: Option<String>,
    pub corrected_value: Option<String>,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CorrectionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CorrectionId,
    #[schema(value_type = String, format = "uuid")]
    pub analysis_id: AnalysisId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub field_name: CorrectableField,
    pub original_value: String,
    pub corrected_value: String,
    pub explanation: String,
    pub is_approved: bool,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<CorrectionDBResponse> for CorrectionResponse {
    fn from(db: CorrectionDBResponse) -> Self {
        Self {
            id: db.id,
            analysis_id: db.analysis_id,
            user_id: db.user_id,
            field_name: db.field_name,
            original_value: db.original_value,
            corrected_value: db.corrected_value,
            explanation: db.explanation,
            is_approved: db.is_approved,
            reviewed_by: db.reviewed_by,
            reviewed_at: db.reviewed_at,
            created_at: db.created_at,
        }
    }
}
