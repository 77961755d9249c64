//! Model-output parsing. Never fails: unparseable output is salvaged.

use crate::model::item::{ContrastSet, TokenizedSentence};
use crate::pipeline::generator::GeneratedBatch;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Extract JSON from a response that may be wrapped in a markdown code block
pub fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(rest) = trimmed.strip_prefix("```json") {
        if let Some(end) = rest.find("```") {
            return rest[..end].trim();
        }
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(start) = rest.find('\n') {
            if let Some(end) = rest[start + 1..].find("```") {
                return rest[start + 1..start + 1 + end].trim();
            }
        }
    }

    // Outermost object or array
    let object = trimmed.find('{').zip(trimmed.rfind('}'));
    let array = trimmed.find('[').zip(trimmed.rfind(']'));
    match (object, array) {
        (Some((os, oe)), Some((as_, _))) if os < as_ && os < oe => &trimmed[os..=oe],
        (_, Some((s, e))) if s < e => &trimmed[s..=e],
        (Some((s, e)), _) if s < e => &trimmed[s..=e],
        _ => trimmed,
    }
}

fn quoted_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#""([^"]+)""#).ok()).as_ref()
}

fn numbering_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+[.)]\s*").ok()).as_ref()
}

/// Trim, drop a leading `1.` / `2)` and surrounding quotes
pub fn normalize_sentence(raw: &str) -> String {
    let trimmed = raw.trim();
    let unnumbered = match numbering_pattern() {
        Some(pattern) => pattern.replace(trimmed, ""),
        None => trimmed.into(),
    };
    unnumbered
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | '‘' | '’'))
        .trim()
        .to_string()
}

fn sentence_of(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => {
            if let Some(Value::Array(tokens)) = map.get("tokens") {
                let words: Vec<&str> = tokens.iter().filter_map(Value::as_str).collect();
                return (!words.is_empty()).then(|| words.join(" "));
            }
            ["sentence", "text"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(str::to_string)
        }
        _ => None,
    }
}

fn sentences_from_json(value: &Value) -> Vec<String> {
    let items = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("items").or_else(|| map.get("sentences")) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };
    items.iter().filter_map(sentence_of).collect()
}

/// Tokens may be strings or numbers; anything else is dropped
fn tokenized(value: Option<&Value>) -> Option<TokenizedSentence> {
    let tokens: Vec<String> = value?
        .get("tokens")?
        .as_array()?
        .iter()
        .filter_map(|token| match token {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect();
    if tokens.is_empty() {
        return None;
    }
    let text = normalize_sentence(&tokens.join(" "));
    Some(TokenizedSentence { text, tokens })
}

fn field<'v>(set: &'v Value, snake: &str, camel: &str) -> Option<&'v Value> {
    set.get(snake).or_else(|| set.get(camel))
}

/// `{"sets": [{target_word, contrast_word, target_sentence, contrast_sentence}]}`
/// where each sentence is `{"tokens": [...]}`. Keys may also be camelCase.
/// Every well-formed sentence becomes a candidate; a set needs both.
fn contrast_batch(sets: &[Value]) -> GeneratedBatch {
    let mut batch = GeneratedBatch::default();
    for set in sets {
        let target = tokenized(field(set, "target_sentence", "targetSentence"));
        let contrast = tokenized(field(set, "contrast_sentence", "contrastSentence"));
        batch.sentences.extend(target.iter().chain(contrast.iter()).map(|s| s.text.clone()));

        if let (Some(target_sentence), Some(contrast_sentence)) = (target, contrast) {
            let word = |snake: &str, camel: &str| {
                field(set, snake, camel)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            batch.contrast_sets.push(ContrastSet {
                target_word: word("target_word", "targetWord"),
                contrast_word: word("contrast_word", "contrastWord"),
                target_sentence,
                contrast_sentence,
            });
        }
    }
    batch
}

fn batch_from_json(value: &Value) -> GeneratedBatch {
    match value.get("sets") {
        Some(Value::Array(sets)) => contrast_batch(sets),
        _ => sentences_from_json(value).into(),
    }
}

/// Candidate sentences from raw model output.
///
/// Accepts `{"items": [{tokens|sentence|text}]}`, `{"sentences": [...]}` and
/// bare arrays. Anything that is not JSON falls back to every quoted substring.
pub fn parse_candidates(raw: &str) -> Vec<String> {
    parse_batch(raw).sentences
}

/// Like [`parse_candidates`], also reading contrast `{"sets": [...]}` output
pub fn parse_batch(raw: &str) -> GeneratedBatch {
    let json = extract_json(raw);
    let batch = match serde_json::from_str::<Value>(json) {
        Ok(value) => {
            let found = batch_from_json(&value);
            debug!(
                count = found.sentences.len(),
                contrast_sets = found.contrast_sets.len(),
                "Parsed model output"
            );
            found
        }
        Err(e) => {
            let salvaged: Vec<String> = quoted_pattern()
                .map(|pattern| {
                    pattern
                        .captures_iter(raw)
                        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
                        .collect()
                })
                .unwrap_or_default();
            warn!(
                error = %e,
                salvaged = salvaged.len(),
                "Model output is not valid JSON, salvaging quoted text"
            );
            salvaged.into()
        }
    };

    GeneratedBatch {
        sentences: batch
            .sentences
            .iter()
            .map(|s| normalize_sentence(s))
            .filter(|s| !s.is_empty())
            .collect(),
        contrast_sets: batch.contrast_sets,
    }
}
