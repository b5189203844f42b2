//! Response envelope and DTOs shared by every endpoint

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::analysis::{Analysis, AnalysisId, ParseFailure, RankedItem, StatusDistribution};
use crate::enrichment::AddressInfo;
use crate::error::AnalysisError;
use crate::orchestrator::{AnalysisResult, RankedAddress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResultType {
    Success,
    Error,
}

#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub code: &'static str,
    pub message: String,
}

/// `{"result": "SUCCESS", "data": ...}` or `{"result": "ERROR", "error": ...}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub result: ResultType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorMessage>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            result: ResultType::Success,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn empty() -> Self {
        Self {
            result: ResultType::Success,
            data: None,
            error: None,
        }
    }

    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            result: ResultType::Error,
            data: None,
            error: Some(ErrorMessage {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Handler error carrying an [`AnalysisError`] to the HTTP boundary
#[derive(Debug)]
pub struct ApiError(pub AnalysisError);

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AnalysisError::Validation(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AnalysisError::BatchRead(_) | AnalysisError::Validation(_) => StatusCode::BAD_REQUEST,
            AnalysisError::NotFound(_) => StatusCode::NOT_FOUND,
            AnalysisError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            AnalysisError::Storage(e) => {
                tracing::error!(error = %e, "Request failed with internal error");
                "An unexpected error has occurred.".to_string()
            }
            other => {
                tracing::info!(code = other.code(), error = %other, "Request rejected");
                other.to_string()
            }
        };

        (status, Json(ApiResponse::error(self.0.code(), message))).into_response()
    }
}

/// Returned by the upload endpoint
#[derive(Debug, Serialize)]
pub struct AnalysisSummary {
    pub analysis_id: AnalysisId,
    pub created_at: i64,
    pub total_requests: u64,
    pub status_distribution: StatusDistribution,
    pub parse_error_count: u64,
    pub parse_error_samples: Vec<ParseFailure>,
}

impl AnalysisSummary {
    pub fn new(id: AnalysisId, analysis: &Analysis) -> Self {
        Self {
            analysis_id: id,
            created_at: analysis.created_at(),
            total_requests: analysis.total_requests(),
            status_distribution: analysis.status_distribution(),
            parse_error_count: analysis.parse_error_count(),
            parse_error_samples: analysis.parse_error_samples().to_vec(),
        }
    }
}

/// Known metadata for an address; serialized as `null` when unknown
#[derive(Debug, Serialize)]
pub struct AddressDetail {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub org: Option<String>,
}

impl AddressDetail {
    fn from_info(info: AddressInfo) -> Option<Self> {
        if info.is_unknown() {
            return None;
        }
        Some(Self {
            country: info.country,
            region: info.region,
            city: info.city,
            org: info.organization,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct RankedAddressResponse {
    pub address: String,
    pub count: u64,
    pub percentage: f64,
    pub detail: Option<AddressDetail>,
}

impl From<RankedAddress> for RankedAddressResponse {
    fn from(ranked: RankedAddress) -> Self {
        Self {
            address: ranked.address,
            count: ranked.count,
            percentage: ranked.percentage,
            detail: AddressDetail::from_info(ranked.info),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisResultResponse {
    pub analysis_id: AnalysisId,
    pub created_at: i64,
    pub total_requests: u64,
    pub status_distribution: StatusDistribution,
    pub top_paths: Vec<RankedItem>,
    pub top_status_codes: Vec<RankedItem>,
    pub top_addresses: Vec<RankedAddressResponse>,
    pub parse_error_count: u64,
    pub parse_error_samples: Vec<ParseFailure>,
}

impl From<AnalysisResult> for AnalysisResultResponse {
    fn from(result: AnalysisResult) -> Self {
        Self {
            analysis_id: result.analysis_id,
            created_at: result.created_at,
            total_requests: result.total_requests,
            status_distribution: result.status_distribution,
            top_paths: result.top_paths,
            top_status_codes: result.top_status_codes,
            top_addresses: result.top_addresses.into_iter().map(Into::into).collect(),
            parse_error_count: result.parse_error_count,
            parse_error_samples: result.parse_error_samples,
        }
    }
}
