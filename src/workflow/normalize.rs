//! Reading workflow responses.
//!
//! Workflow payloads are untrusted and loosely shaped: a JSON array of
//! `{output}` objects, a single object, or a bare string. The string may
//! itself carry a JSON instruction, either inside a fenced code block or
//! embedded in prose. [`normalize`] never fails; whatever cannot be read
//! degrades to a plain reply.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Shown when a response yields no usable text.
pub const NO_RESPONSE: &str = "No response received.";

const BALANCE_ACTION: &str = "check_balance";

static CODE_FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"```[a-zA-Z]*\s*([\s\S]*?)\s*```").ok());

/// Actions the dispatcher knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Report the connected wallet's balance.
    CheckBalance,
    /// Start collecting a recipient and amount.
    Transfer,
}

/// Map a free-form action name to a known action.
///
/// `check_balance` must match exactly; anything mentioning "send" or
/// "transfer" in any casing is a transfer.
pub fn classify_action(action: &str) -> Option<ActionKind> {
    if action == BALANCE_ACTION {
        return Some(ActionKind::CheckBalance);
    }
    let lowered = action.to_lowercase();
    if lowered.contains("send") || lowered.contains("transfer") {
        Some(ActionKind::Transfer)
    } else {
        None
    }
}

/// A recognized directive extracted from one workflow response.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionInstruction {
    kind: ActionKind,
    action: String,
    fields: Map<String, Value>,
}

impl ActionInstruction {
    /// Build from a JSON object carrying an `action` field. Returns `None`
    /// for an empty or unrecognized action.
    pub fn from_object(object: &Map<String, Value>) -> Option<Self> {
        let action = object.get("action").map(action_text).unwrap_or_default();
        let kind = classify_action(&action)?;
        let fields = object
            .iter()
            .filter(|(key, _)| key.as_str() != "action")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Some(Self {
            kind,
            action,
            fields,
        })
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// The action name exactly as the workflow sent it.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Every field other than `action`.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Outcome of reading a workflow response.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedResponse {
    /// Text to show. Never empty.
    Reply { text: String },
    /// A recognized instruction plus whatever reply text accompanied it
    /// (possibly empty).
    Instruction {
        instruction: ActionInstruction,
        reply: String,
    },
}

impl NormalizedResponse {
    /// Text to display when the response is treated as a plain reply.
    pub fn reply_text(&self) -> &str {
        match self {
            Self::Reply { text } => text,
            Self::Instruction { reply, .. } if !reply.is_empty() => reply,
            Self::Instruction { .. } => NO_RESPONSE,
        }
    }

    pub fn instruction(&self) -> Option<&ActionInstruction> {
        match self {
            Self::Reply { .. } => None,
            Self::Instruction { instruction, .. } => Some(instruction),
        }
    }
}

/// Normalize a raw workflow response body.
pub fn normalize(raw_body: &str, content_type: &str) -> NormalizedResponse {
    let Some(payload) = parse_body(raw_body, content_type) else {
        return NormalizedResponse::Reply {
            text: NO_RESPONSE.to_string(),
        };
    };

    let reply = extract_reply(&payload);
    let candidate = match &payload {
        Value::Object(object) if object.contains_key("action") => Some(object.clone()),
        _ => match try_parse_embedded(&reply) {
            Some(Value::Object(object)) if object.contains_key("action") => Some(object),
            _ => None,
        },
    };

    match candidate.as_ref().and_then(ActionInstruction::from_object) {
        Some(instruction) => NormalizedResponse::Instruction { instruction, reply },
        None => {
            if candidate.is_some() {
                tracing::debug!("workflow instruction has no recognized action");
            }
            let text = if reply.is_empty() {
                NO_RESPONSE.to_string()
            } else {
                reply
            };
            NormalizedResponse::Reply { text }
        }
    }
}

/// Decode the body. JSON is only attempted when the content type says so;
/// anything else (or a failed parse) becomes a string value. A blank body is
/// `None`.
fn parse_body(raw_body: &str, content_type: &str) -> Option<Value> {
    if raw_body.trim().is_empty() {
        return None;
    }
    if content_type.contains("application/json") {
        match serde_json::from_str(raw_body) {
            Ok(value) => return Some(value),
            Err(e) => tracing::debug!("workflow body declared JSON but did not parse: {}", e),
        }
    }
    Some(Value::String(raw_body.to_string()))
}

/// Reply text: `output` of the first array element or of the object, or a
/// bare string verbatim.
fn extract_reply(payload: &Value) -> String {
    match payload {
        Value::Array(items) => items
            .first()
            .and_then(|first| first.as_object())
            .and_then(|first| first.get("output"))
            .map(output_text)
            .unwrap_or_default(),
        Value::Object(object) => object.get("output").map(output_text).unwrap_or_default(),
        Value::String(text) => text.clone(),
        _ => String::new(),
    }
}

fn output_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Loose string form of an `action` value. Falsy values are empty.
fn action_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(true) => "true".to_string(),
        Value::Number(n) if n.as_f64() != Some(0.0) => n.to_string(),
        _ => String::new(),
    }
}

/// Body of the first fenced code block, or the trimmed text when there is none.
pub(crate) fn strip_code_fences(text: &str) -> &str {
    CODE_FENCE
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|body| body.as_str().trim())
        .filter(|body| !body.is_empty())
        .unwrap_or_else(|| text.trim())
}

/// Text that might parse as JSON: the whole stripped text if it parses,
/// else the span from the first `{` to the last `}`.
pub(crate) fn extract_json_candidate(text: &str) -> Option<&str> {
    let stripped = strip_code_fences(text);
    if serde_json::from_str::<Value>(stripped).is_ok() {
        return Some(stripped);
    }
    let start = stripped.find('{')?;
    let end = stripped.rfind('}')?;
    if end > start {
        Some(stripped[start..=end].trim())
    } else {
        None
    }
}

fn try_parse_embedded(text: &str) -> Option<Value> {
    let candidate = extract_json_candidate(text)?;
    serde_json::from_str(candidate).ok()
}
