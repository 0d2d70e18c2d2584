use serde::Deserialize;
use serde_json::Value;

/// Response from agent-browser --json commands
#[derive(Debug, Deserialize)]
pub(super) struct AgentBrowserResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
}

/// A `name=value` cookie exported from the forum session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
}

/// agent-browser commands used by a visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserCommand {
    /// Open a new tab and focus it
    TabNew,
    /// Close the focused tab
    TabClose,
    /// Navigate the focused tab
    Open { url: String },
    /// Evaluate JavaScript in the focused tab
    Eval { script: String },
    /// Current URL of the focused tab
    GetUrl,
    /// Number of elements matching a selector
    Count { selector: String },
    /// Click the first element matching a selector
    Click { selector: String },
    /// Set a cookie on the current origin
    SetCookie { name: String, value: String },
}

impl BrowserCommand {
    pub(super) fn args(&self) -> Vec<String> {
        match self {
            Self::TabNew => vec!["tab".to_string(), "new".to_string()],
            Self::TabClose => vec!["tab".to_string(), "close".to_string()],
            Self::Open { url } => vec!["open".to_string(), url.clone()],
            Self::Eval { script } => vec!["eval".to_string(), script.clone()],
            Self::GetUrl => vec!["get".to_string(), "url".to_string()],
            Self::Count { selector } => {
                vec!["get".to_string(), "count".to_string(), selector.clone()]
            }
            Self::Click { selector } => vec!["click".to_string(), selector.clone()],
            Self::SetCookie { name, value } => vec![
                "cookies".to_string(),
                "set".to_string(),
                name.clone(),
                value.clone(),
            ],
        }
    }
}

/// Pulls `key` out of a JSON payload, or takes the payload itself when it is
/// already a scalar.
pub(super) fn data_field(data: Option<Value>, key: &str) -> Option<Value> {
    match data {
        Some(Value::Object(mut map)) => map
            .remove(key)
            .or_else(|| map.remove("result"))
            .or_else(|| map.remove("output")),
        Some(Value::Null) | None => None,
        Some(other) => Some(other),
    }
}
