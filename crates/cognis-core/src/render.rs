//! A constrained, Go-template-style substitution engine.
//!
//! Supports `{{.Field}}` variable references and pipelines
//! `{{.Field | helper "arg"}}`. Only a fixed helper set is recognized:
//! lower, upper, trim, split, join, toJSON, default, first, last, len,
//! indent, wrap, codeBlock, bullet, numbered. A reference to anything
//! else is a compile-time error, not a render-time one — `compile`
//! walks every action before any rendering happens.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;

pub type Variables = BTreeMap<String, Value>;

const KNOWN_HELPERS: &[&str] = &[
    "lower", "upper", "trim", "split", "join", "toJSON", "default", "first", "last", "len",
    "indent", "wrap", "codeBlock", "bullet", "numbered",
];

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Action(Action),
}

#[derive(Debug, Clone)]
struct Action {
    var: String,
    pipeline: Vec<HelperCall>,
}

#[derive(Debug, Clone)]
struct HelperCall {
    name: String,
    args: Vec<String>,
}

/// A template whose syntax and helper references have already been
/// validated. Rendering a `CompiledTemplate` cannot fail on syntax or
/// unknown-helper grounds — only at evaluation time, e.g. a missing
/// variable.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    segments: Vec<Segment>,
}

/// Parse and validate `body`, checking every helper reference against the
/// fixed helper set. This is the template-syntax and unknown-helper
/// safety valve.
pub fn compile(body: &str) -> Result<CompiledTemplate> {
    let mut segments = Vec::new();
    let mut rest = body;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            segments.push(Segment::Literal(rest[..start].to_string()));
        }
        let after_open = &rest[start + 2..];
        let end = after_open
            .find("}}")
            .ok_or_else(|| Error::TemplateSyntax("unterminated {{ action".to_string()))?;
        let raw_action = after_open[..end].trim();
        segments.push(Segment::Action(parse_action(raw_action)?));
        rest = &after_open[end + 2..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }

    Ok(CompiledTemplate { segments })
}

fn parse_action(raw: &str) -> Result<Action> {
    if raw.is_empty() {
        return Err(Error::TemplateSyntax("empty {{}} action".to_string()));
    }

    let mut parts = raw.split('|').map(str::trim);
    let var_part = parts.next().unwrap();
    if !var_part.starts_with('.') {
        return Err(Error::TemplateSyntax(format!(
            "expected a variable reference starting with '.', found `{var_part}`"
        )));
    }
    let var = var_part[1..].to_string();
    if var.is_empty() {
        return Err(Error::TemplateSyntax("empty variable reference".to_string()));
    }

    let mut pipeline = Vec::new();
    for stage in parts {
        let tokens = tokenize_stage(stage)?;
        let (name, args) = tokens
            .split_first()
            .ok_or_else(|| Error::TemplateSyntax("empty pipeline stage".to_string()))?;
        if !KNOWN_HELPERS.contains(&name.as_str()) {
            return Err(Error::UnknownHelper(name.clone()));
        }
        pipeline.push(HelperCall {
            name: name.clone(),
            args: args.to_vec(),
        });
    }

    Ok(Action { var, pipeline })
}

fn tokenize_stage(stage: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = stage.chars().peekable();
    let mut current = String::new();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                tokens.push(current.clone());
                current.clear();
                in_quotes = false;
            }
            '"' => in_quotes = true,
            ' ' if !in_quotes => {
                if !current.is_empty() {
                    tokens.push(current.clone());
                    current.clear();
                }
            }
            _ => current.push(c),
        }
    }
    if in_quotes {
        return Err(Error::TemplateSyntax("unterminated quoted argument".to_string()));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

impl CompiledTemplate {
    /// Substitute every action against `vars`, running each pipeline in
    /// order. A missing variable resolves to `Value::Null`.
    pub fn render(&self, vars: &Variables) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Action(action) => {
                    let mut value = vars.get(&action.var).cloned().unwrap_or(Value::Null);
                    for call in &action.pipeline {
                        value = apply_helper(&call.name, &call.args, value);
                    }
                    out.push_str(&value_to_display(&value));
                }
            }
        }
        out
    }
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn apply_helper(name: &str, args: &[String], input: Value) -> Value {
    match name {
        "lower" => Value::String(value_to_display(&input).to_lowercase()),
        "upper" => Value::String(value_to_display(&input).to_uppercase()),
        "trim" => Value::String(value_to_display(&input).trim().to_string()),
        "split" => {
            let sep = args.first().map(String::as_str).unwrap_or(",");
            let parts: Vec<Value> = value_to_display(&input)
                .split(sep)
                .map(|p| Value::String(p.to_string()))
                .collect();
            Value::Array(parts)
        }
        "join" => {
            let sep = args.first().map(String::as_str).unwrap_or(", ");
            match input {
                Value::Array(items) => {
                    let joined = items
                        .iter()
                        .map(value_to_display)
                        .collect::<Vec<_>>()
                        .join(sep);
                    Value::String(joined)
                }
                other => other,
            }
        }
        "toJSON" => Value::String(serde_json::to_string(&input).unwrap_or_default()),
        "default" => {
            let is_empty = matches!(&input, Value::Null)
                || matches!(&input, Value::String(s) if s.is_empty());
            if is_empty {
                Value::String(args.first().cloned().unwrap_or_default())
            } else {
                input
            }
        }
        "first" => match input {
            Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
            other => other,
        },
        "last" => match input {
            Value::Array(items) => items.into_iter().next_back().unwrap_or(Value::Null),
            other => other,
        },
        "len" => {
            let n = match &input {
                Value::Array(items) => items.len(),
                Value::String(s) => s.chars().count(),
                Value::Object(map) => map.len(),
                _ => 0,
            };
            Value::Number(n.into())
        }
        "indent" => {
            let width: usize = args.first().and_then(|a| a.parse().ok()).unwrap_or(2);
            let pad = " ".repeat(width);
            let indented = value_to_display(&input)
                .lines()
                .map(|line| format!("{pad}{line}"))
                .collect::<Vec<_>>()
                .join("\n");
            Value::String(indented)
        }
        "wrap" => {
            let width: usize = args.first().and_then(|a| a.parse().ok()).unwrap_or(80);
            Value::String(wrap_text(&value_to_display(&input), width))
        }
        "codeBlock" => {
            let lang = args.first().map(String::as_str).unwrap_or("");
            Value::String(format!("```{lang}\n{}\n```", value_to_display(&input)))
        }
        "bullet" => match input {
            Value::Array(items) => Value::String(
                items
                    .iter()
                    .map(|item| format!("- {}", value_to_display(item)))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            other => Value::String(format!("- {}", value_to_display(&other))),
        },
        "numbered" => match input {
            Value::Array(items) => Value::String(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| format!("{}. {}", i + 1, value_to_display(item)))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            other => Value::String(format!("1. {}", value_to_display(&other))),
        },
        _ => input,
    }
}

fn wrap_text(text: &str, width: usize) -> String {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if !current.is_empty() && current.len() + 1 + word.len() > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines.join("\n")
}
