//! The analysis report record and its lifecycle mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    EvidenceItem, GeneratedReport, ImpactAssessment, RecommendedAction, ReportId, ReportStatus,
    RootCauseAnalysis,
};
use crate::error::{Error, Result};

/// One event-analysis job and its current lifecycle state.
///
/// Payload fields are only populated on `SUCCESS`, `error_message` only on
/// `FAILED`, and `completed_at` is set exactly when the status is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub report_id: ReportId,
    pub event_id: String,
    pub status: ReportStatus,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause_analysis: Option<RootCauseAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_assessment: Option<ImpactAssessment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommended_actions: Vec<RecommendedAction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<EvidenceItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_llm_response: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl AnalysisReport {
    /// A fresh `PENDING` record with a newly generated report id.
    pub fn pending(event_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            report_id: ReportId::new(),
            event_id: event_id.into(),
            status: ReportStatus::Pending,
            event_summary: String::new(),
            root_cause_analysis: None,
            impact_assessment: None,
            recommended_actions: Vec::new(),
            evidence: Vec::new(),
            raw_llm_response: None,
            error_message: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Whether any success payload field is populated.
    pub fn has_payload(&self) -> bool {
        !self.event_summary.is_empty()
            || self.root_cause_analysis.is_some()
            || self.impact_assessment.is_some()
            || !self.recommended_actions.is_empty()
            || !self.evidence.is_empty()
            || self.raw_llm_response.is_some()
    }

    /// `PENDING -> RUNNING`. Clears any stale failure message.
    pub fn mark_running(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(ReportStatus::Running)?;
        self.error_message = None;
        self.updated_at = now;
        Ok(())
    }

    /// `RUNNING -> SUCCESS`, copying the generated payload into the record.
    pub fn complete_with(&mut self, generated: GeneratedReport, now: DateTime<Utc>) -> Result<()> {
        self.transition(ReportStatus::Success)?;

        let GeneratedReport {
            event_summary,
            mut root_cause_analysis,
            impact_assessment,
            recommended_actions,
            evidence,
            raw_llm_response,
        } = generated;
        root_cause_analysis.confidence_score = clamp_confidence(root_cause_analysis.confidence_score);

        self.event_summary = event_summary;
        self.root_cause_analysis = Some(root_cause_analysis);
        self.impact_assessment = Some(impact_assessment);
        self.recommended_actions = recommended_actions;
        self.evidence = evidence;
        self.raw_llm_response = raw_llm_response;
        self.error_message = None;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// `RUNNING -> FAILED`, recording the failure message.
    pub fn fail_with(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> Result<()> {
        self.transition(ReportStatus::Failed)?;

        let message = message.into();
        self.error_message = Some(if message.is_empty() {
            "report generation failed".to_string()
        } else {
            message
        });
        self.event_summary.clear();
        self.root_cause_analysis = None;
        self.impact_assessment = None;
        self.recommended_actions.clear();
        self.evidence.clear();
        self.raw_llm_response = None;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    fn transition(&mut self, to: ReportStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

fn clamp_confidence(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
