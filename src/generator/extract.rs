//! Turning free-form text-generation responses into a [`GeneratedReport`].

use serde_json::Value;

use crate::model::{GeneratedReport, ImpactAssessment, RecommendedAction, RootCauseAnalysis};

/// Pull the generated text out of the response shapes common across
/// completion, chat, responses and Gemini-style APIs.
pub(crate) fn extract_text(body: &Value) -> Option<String> {
    let non_empty = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let first_part = |parts: Option<&Value>| {
        parts
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find_map(|part| non_empty(part.get("text")))
    };

    for choice in body.get("choices").and_then(Value::as_array).into_iter().flatten() {
        let message = choice.get("message");
        let found = non_empty(choice.get("text"))
            .or_else(|| non_empty(message.and_then(|m| m.get("content"))))
            .or_else(|| first_part(message.and_then(|m| m.get("parts"))))
            .or_else(|| first_part(choice.get("content")));
        if found.is_some() {
            return found;
        }
    }

    if let Some(text) = non_empty(body.get("output_text")) {
        return Some(text);
    }

    for item in body.get("output").and_then(Value::as_array).into_iter().flatten() {
        if let Some(text) = first_part(item.get("content")) {
            return Some(text);
        }
    }

    body.get("candidates")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find_map(|candidate| first_part(candidate.get("content").and_then(|c| c.get("parts"))))
}

/// `(input, output)` token counts if the response reports them.
pub(crate) fn token_usage(body: &Value) -> Option<(u64, u64)> {
    let usage = body.get("usage")?;
    let input = usage
        .get("prompt_tokens")
        .or_else(|| usage.get("input_tokens"))
        .and_then(Value::as_u64)?;
    let output = usage
        .get("completion_tokens")
        .or_else(|| usage.get("output_tokens"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    Some((input, output))
}

/// Blank-line separated paragraphs, trimmed. Text without blank lines is a
/// single paragraph.
pub(crate) fn split_paragraphs(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build a report from generated text: a JSON object in the report shape is
/// taken as-is, otherwise paragraphs map onto summary, root cause and
/// impact, and bullet lists become recommended actions.
pub(crate) fn build_report(event_id: &str, text: &str, raw: Value) -> GeneratedReport {
    let mut report = parse_structured(text).unwrap_or_else(|| from_prose(text));
    if report.event_summary.is_empty() {
        report.event_summary = format!("Analysis report for event {event_id}");
    }
    report.raw_llm_response = Some(raw);
    report
}

fn parse_structured(text: &str) -> Option<GeneratedReport> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);

    let value: Value = serde_json::from_str(unfenced.trim()).ok()?;
    let obj = value.as_object()?;
    if !obj.contains_key("event_summary") && !obj.contains_key("root_cause_analysis") {
        return None;
    }
    serde_json::from_value(value).ok()
}

fn from_prose(text: &str) -> GeneratedReport {
    let mut prose = Vec::new();
    let mut actions = Vec::new();

    for paragraph in split_paragraphs(text) {
        match bullet_items(&paragraph) {
            Some(items) => actions.extend(items.into_iter().map(|title| RecommendedAction {
                title,
                action_type: "MANUAL".into(),
                risk: "UNKNOWN".into(),
                summary: None,
                action_data: Default::default(),
            })),
            None => prose.push(paragraph),
        }
    }

    let mut prose = prose.into_iter();
    let summary = prose.next().unwrap_or_default();
    let root_cause = prose.next().unwrap_or_else(|| summary.clone());
    let impact = prose.collect::<Vec<_>>().join("\n\n");

    GeneratedReport {
        event_summary: summary,
        root_cause_analysis: RootCauseAnalysis {
            text: root_cause,
            ..Default::default()
        },
        impact_assessment: ImpactAssessment {
            text: impact,
            ..Default::default()
        },
        recommended_actions: actions,
        ..Default::default()
    }
}

/// Items of a paragraph made only of `-`, `*` or `1.` style list lines.
fn bullet_items(paragraph: &str) -> Option<Vec<String>> {
    paragraph
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| {
            if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
                return Some(rest.trim().to_string());
            }
            let digits = line.chars().take_while(char::is_ascii_digit).count();
            if digits > 0 {
                if let Some(rest) = line[digits..].strip_prefix(". ") {
                    return Some(rest.trim().to_string());
                }
            }
            None
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_from_known_shapes() {
        let cases = [
            json!({"choices": [{"text": "  completion  "}]}),
            json!({"choices": [{"message": {"content": "chat"}}]}),
            json!({"choices": [{"message": {"parts": [{"text": ""}, {"text": "parts"}]}}]}),
            json!({"choices": [{"content": [{"text": "content list"}]}]}),
            json!({"output_text": "responses"}),
            json!({"output": [{"content": [{"text": "output list"}]}]}),
            json!({"candidates": [{"content": {"parts": [{"text": "gemini"}]}}]}),
        ];
        let expected = [
            "completion",
            "chat",
            "parts",
            "content list",
            "responses",
            "output list",
            "gemini",
        ];
        for (body, want) in cases.iter().zip(expected) {
            assert_eq!(extract_text(body).as_deref(), Some(want), "{body}");
        }
        assert_eq!(extract_text(&json!({"choices": []})), None);
    }

    #[test]
    fn reads_token_usage() {
        let openai = json!({"usage": {"prompt_tokens": 12, "completion_tokens": 30}});
        assert_eq!(token_usage(&openai), Some((12, 30)));
        let anthropic = json!({"usage": {"input_tokens": 7, "output_tokens": 9}});
        assert_eq!(token_usage(&anthropic), Some((7, 9)));
        assert_eq!(token_usage(&json!({})), None);
    }

    #[test]
    fn prose_maps_onto_sections() {
        let text = "Checkout errors spiked.\r\n\r\nThe payments pool ran dry.\n\nAbout 4% of orders failed.\n\n- Raise pool size\n- Add saturation alert";
        let report = build_report("evt-9", text, json!({"id": "resp-1"}));

        assert_eq!(report.event_summary, "Checkout errors spiked.");
        assert_eq!(report.root_cause_analysis.text, "The payments pool ran dry.");
        assert_eq!(report.impact_assessment.text, "About 4% of orders failed.");
        let titles: Vec<_> = report
            .recommended_actions
            .iter()
            .map(|a| a.title.as_str())
            .collect();
        assert_eq!(titles, ["Raise pool size", "Add saturation alert"]);
        assert_eq!(report.raw_llm_response, Some(json!({"id": "resp-1"})));
    }

    #[test]
    fn single_paragraph_fills_summary_and_root_cause() {
        let report = build_report("evt-1", "disk full on db-2", Value::Null);
        assert_eq!(report.event_summary, "disk full on db-2");
        assert_eq!(report.root_cause_analysis.text, "disk full on db-2");
    }

    #[test]
    fn structured_json_is_taken_verbatim() {
        let text = r#"```json
{"root_cause_analysis": {"text": "bad deploy", "confidence_score": 0.8},
 "recommended_actions": [{"title": "Roll back", "action_type": "AUTOMATION", "risk": "LOW"}]}
```"#;
        let report = build_report("evt-3", text, Value::Null);
        assert_eq!(report.root_cause_analysis.text, "bad deploy");
        assert_eq!(report.root_cause_analysis.confidence_score, 0.8);
        assert_eq!(report.recommended_actions[0].action_type, "AUTOMATION");
        assert_eq!(report.event_summary, "Analysis report for event evt-3");
    }

    #[test]
    fn numbered_lists_are_actions() {
        assert_eq!(
            bullet_items("1. restart\n2. verify"),
            Some(vec!["restart".to_string(), "verify".to_string()])
        );
        assert_eq!(bullet_items("1. restart\nthen wait"), None);
    }
}
