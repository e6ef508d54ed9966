//! Script analysis: the classification prompt and reply parsing.

use crate::descriptor::scalar_text;
use crate::error::GenerationError;
use crate::labels::LabelVocabulary;
use serde_yaml::{Mapping, Value};

/// Reply fields copied onto the authored descriptor, in record order.
pub const ANALYSIS_FIELDS: [&str; 4] = ["description", "objective", "input", "output"];
const DIAGRAM_PROMPT_REPLY_FIELD: &str = "diagram_prompt";
const LABELS_FIELD: &str = "labels";

/// Parsed analysis reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptAnalysis {
    /// Text fields present in the reply, in `ANALYSIS_FIELDS` order.
    pub fields: Vec<(String, String)>,
    pub diagram_prompt: Option<String>,
    /// Proposed labels as returned, before vocabulary filtering.
    pub proposed_labels: Vec<Value>,
}

pub fn analysis_prompt(language: &str, script: &str, vocabulary: &LabelVocabulary) -> String {
    format!(
        "Analyze this {language} script and provide the following details in a concise way:

1. A one-sentence description of what the script does
2. A one-sentence objective/purpose
3. A one-sentence description of input parameters
4. A one-sentence description of output parameters
5. Select between 1 to 5 most relevant labels from this list. Only use labels from this list and include the # symbol:
{labels}
6. A one-sentence prompt describing a diagram of the script's flow

Script content:
{script}

Important: Choose between 1 to 5 labels that are most relevant to the script's purpose. Only use labels from the provided list.

Format your response as raw YAML without any markdown formatting. Start with --- and use proper YAML formatting. Quote each label. Example format:

---
description: A description here
objective: An objective here
input: Input description here
output: Output description here
labels:
  - '#label1'
  - '#label2'
diagram_prompt: A diagram prompt here

Your response:",
        language = language,
        labels = vocabulary.labels().join("\n"),
        script = script,
    )
}

/// Parse a reply: skip chatter up to the first `---` line, stop at the next
/// document marker, drop code fences, and read the rest as a YAML mapping.
pub fn parse_analysis(reply: &str) -> Result<ScriptAnalysis, GenerationError> {
    let lines: Vec<&str> = reply.lines().collect();
    let body_lines = match lines.iter().position(|line| line.trim() == "---") {
        Some(opener) => &lines[opener + 1..],
        None => &lines[..],
    };
    let body: String = body_lines
        .iter()
        .take_while(|line| !is_document_marker(line))
        .filter(|line| !line.trim_start().starts_with("```"))
        .map(|line| quote_bare_label(line))
        .collect::<Vec<_>>()
        .join("\n");

    let document: Value = serde_yaml::from_str(body.trim()).map_err(|e| {
        GenerationError::UnusableResponse(format!("analysis reply is not valid YAML: {}", e))
    })?;
    let Value::Mapping(map) = document else {
        return Err(GenerationError::UnusableResponse(
            "analysis reply is not a YAML mapping".to_string(),
        ));
    };

    Ok(ScriptAnalysis {
        fields: ANALYSIS_FIELDS
            .iter()
            .filter_map(|key| text_field(&map, key).map(|v| (key.to_string(), v)))
            .collect(),
        diagram_prompt: text_field(&map, DIAGRAM_PROMPT_REPLY_FIELD),
        proposed_labels: match map.get(LABELS_FIELD) {
            Some(Value::Sequence(items)) => items.clone(),
            Some(single @ Value::String(_)) => vec![single.clone()],
            _ => Vec::new(),
        },
    })
}

fn text_field(map: &Mapping, key: &str) -> Option<String> {
    map.get(key)
        .and_then(scalar_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn is_document_marker(line: &str) -> bool {
    matches!(line.trim(), "---" | "...")
}

/// `- #tag` reads as an empty item in YAML; quote it so the label survives.
fn quote_bare_label(line: &str) -> String {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix("- #") {
        let token = rest.split_whitespace().next().unwrap_or_default();
        if !token.is_empty() {
            let indent = &line[..line.len() - trimmed.len()];
            return format!("{}- '#{}'", indent, token.replace('\'', "''"));
        }
    }
    line.to_string()
}
