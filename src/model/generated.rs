//! Analysis payload types shared by generators and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A link backing a piece of evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceLink {
    pub name: String,
    pub url: String,
}

/// A piece of evidence cited by the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Evidence kind, e.g. "METRIC", "LOG", "TRACE".
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<EvidenceLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootCauseAnalysis {
    #[serde(default)]
    pub text: String,
    /// In `[0, 1]`.
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub probable_causes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<EvidenceItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedResource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactAssessment {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_resources: Vec<AffectedResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

/// An actionable suggestion attached to the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub title: String,
    /// Category, e.g. "AUTOMATION", "MANUAL".
    pub action_type: String,
    /// Risk level, e.g. "LOW", "HIGH".
    pub risk: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub action_data: serde_json::Map<String, serde_json::Value>,
}

/// What a generator produces. Identity and lifecycle live on
/// [`AnalysisReport`](super::AnalysisReport); the orchestrator copies this
/// payload into the stored report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedReport {
    #[serde(default)]
    pub event_summary: String,
    #[serde(default)]
    pub root_cause_analysis: RootCauseAnalysis,
    #[serde(default)]
    pub impact_assessment: ImpactAssessment,
    #[serde(default)]
    pub recommended_actions: Vec<RecommendedAction>,
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_llm_response: Option<serde_json::Value>,
}
