//! Request and response bodies for the report APIs.
//!
//! Field names are camelCase on the wire. Conversions to and from the core model types live
//! here so handlers only move values between the two.

use report_core::{Page, Report, ReportDraft, ReportPatch};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    /// Always `UP` while the process is serving.
    pub status: String,
    pub timestamp: String,
    pub environment: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApiEndpoints {
    pub reports: String,
}

/// Body of `GET /api`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApiInfoRes {
    pub name: String,
    pub version: String,
    pub endpoints: ApiEndpoints,
}

impl Default for ApiInfoRes {
    fn default() -> Self {
        Self {
            name: "Patient Portal API".into(),
            version: "1.0.0".into(),
            endpoints: ApiEndpoints {
                reports: "/v1/reports".into(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Machine-readable code such as `REPORT_NOT_FOUND`.
    pub code: String,
    pub message: String,
    pub timestamp: String,
}

/// Error envelope returned with every non-2xx response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: ErrorBody,
}

impl ErrorRes {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                timestamp: report_core::report::format_instant(chrono::Utc::now()),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportRes {
    pub id: String,
    pub patient_name: String,
    pub patient_id: String,
    /// Clinical event date (ISO-8601).
    pub date: String,
    pub summary: String,
    #[serde(rename = "type")]
    pub report_type: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Report> for ReportRes {
    fn from(report: Report) -> Self {
        Self {
            id: report.id,
            patient_name: report.patient_name,
            patient_id: report.patient_id,
            date: report.date,
            summary: report.summary,
            report_type: report.report_type,
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }
}

/// One page of a report listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportListRes {
    pub data: Vec<ReportRes>,
    /// Number of matching reports across all pages.
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

impl From<Page<Report>> for ReportListRes {
    fn from(page: Page<Report>) -> Self {
        let page = page.map(ReportRes::from);
        Self {
            data: page.data,
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages,
        }
    }
}

/// Confirmation returned by create and update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportMessageRes {
    pub message: String,
    pub data: ReportRes,
}

impl ReportMessageRes {
    pub fn created(report: Report) -> Self {
        Self {
            message: "Report created successfully".into(),
            data: report.into(),
        }
    }

    pub fn updated(report: Report) -> Self {
        Self {
            message: "Report updated successfully".into(),
            data: report.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateReportReq {
    /// Optional; a UUID is assigned when absent.
    pub id: Option<String>,
    pub patient_name: Option<String>,
    pub patient_id: Option<String>,
    pub date: Option<String>,
    pub summary: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
}

impl From<CreateReportReq> for ReportDraft {
    fn from(req: CreateReportReq) -> Self {
        ReportDraft {
            id: req.id,
            patient_name: req.patient_name,
            patient_id: req.patient_id,
            date: req.date,
            summary: req.summary,
            report_type: req.report_type,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Partial update; omitted or empty fields keep their stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateReportReq {
    pub patient_name: Option<String>,
    pub patient_id: Option<String>,
    pub date: Option<String>,
    pub summary: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
}

impl From<UpdateReportReq> for ReportPatch {
    fn from(req: UpdateReportReq) -> Self {
        ReportPatch {
            patient_name: req.patient_name,
            patient_id: req.patient_id,
            date: req.date,
            summary: req.summary,
            report_type: req.report_type,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CacheStats {
    pub keys: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfigRes {
    /// Default entry lifetime in seconds.
    pub ttl: u64,
    pub max_items: usize,
}

/// Body of `GET /api/stats/cache`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CacheStatsRes {
    pub enabled: bool,
    pub stats: CacheStats,
    pub config: CacheConfigRes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_req_accepts_type_key() {
        let req: CreateReportReq = serde_json::from_str(
            r#"{"patientName":"Jane Doe","summary":"Routine blood panel.","type":"Lab"}"#,
        )
        .expect("valid body");

        let draft = ReportDraft::from(req);
        assert_eq!(draft.patient_name.as_deref(), Some("Jane Doe"));
        assert_eq!(draft.report_type.as_deref(), Some("Lab"));
        assert_eq!(draft.created_at, None);
    }

    #[test]
    fn test_update_req_ignores_unknown_fields() {
        let req: UpdateReportReq =
            serde_json::from_str(r#"{"summary":"New summary text.","createdAt":"2000-01-01"}"#)
                .expect("valid body");

        let patch = ReportPatch::from(req);
        assert_eq!(patch.summary.as_deref(), Some("New summary text."));
        assert_eq!(patch.patient_name, None);
    }

    #[test]
    fn test_list_res_serialises_page_metadata() {
        let page = Page {
            data: Vec::<Report>::new(),
            total: 0,
            page: 1,
            limit: 10,
            total_pages: 0,
        };

        let json = serde_json::to_value(ReportListRes::from(page)).expect("serialise");
        assert_eq!(json["totalPages"], 0);
        assert_eq!(json["page"], 1);
        assert!(json["data"].as_array().is_some_and(|d| d.is_empty()));
    }

    #[test]
    fn test_error_res_shape() {
        let json = serde_json::to_value(ErrorRes::new("REPORT_NOT_FOUND", "missing"))
            .expect("serialise");
        assert_eq!(json["error"]["code"], "REPORT_NOT_FOUND");
        assert_eq!(json["error"]["message"], "missing");
        assert!(json["error"]["timestamp"].is_string());
    }

    #[test]
    fn test_api_info_defaults() {
        let info = ApiInfoRes::default();
        assert_eq!(info.name, "Patient Portal API");
        assert_eq!(info.endpoints.reports, "/v1/reports");
    }
}
