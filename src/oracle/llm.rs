//! Language-model oracle over an OpenAI-compatible chat completions API.
//!
//! The model is offered a single function (`validate_keys` for primary
//! keys, `foreign_keys` for foreign keys) whose `keys` argument carries the
//! guesses. The schema goes into the prompt as CSV.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{columns_csv, decode_candidates, CandidateOracle, OracleError, OracleResult};
use crate::config::OracleSettings;
use crate::keys::{ColumnRef, KeyCandidate};

const SYSTEM_PROMPT: &str = "You are an AI assistant specializing in database schema analysis.";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Oracle backed by a hosted chat model.
pub struct LlmOracle {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl std::fmt::Debug for LlmOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmOracle")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl LlmOracle {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 2048,
            timeout: Duration::from_secs(120),
        }
    }

    /// Build from settings, reading the key from the configured variable.
    pub fn from_settings(settings: &OracleSettings) -> OracleResult<Self> {
        let api_key = match &settings.api_key {
            Some(key) if !key.trim().is_empty() => key.clone(),
            _ => std::env::var(&settings.api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| OracleError::MissingApiKey(settings.api_key_env.clone()))?,
        };

        Ok(Self::new(api_key)
            .with_base_url(&settings.base_url)
            .with_model(&settings.model)
            .with_max_tokens(settings.max_tokens)
            .with_timeout(Duration::from_secs(settings.timeout_secs)))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send one prompt offering `function` and return the decoded call
    /// arguments. `None` means the model gave nothing usable.
    async fn call_function(&self, prompt: String, function: Value) -> OracleResult<Option<Value>> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
            "functions": [function],
            "function_call": "auto",
            "max_tokens": self.max_tokens,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "oracle response is not JSON");
                return Ok(None);
            }
        };

        if let Some(message) = payload.pointer("/error/message").and_then(Value::as_str) {
            return Err(OracleError::Api(message.to_string()));
        }

        Ok(extract_arguments(&payload))
    }
}

/// Pull the function-call arguments out of a chat completion.
///
/// Accepts the legacy `function_call`, the newer `tool_calls`, and as a
/// last resort a JSON object written into the message content.
fn extract_arguments(payload: &Value) -> Option<Value> {
    let message = payload.pointer("/choices/0/message")?;

    let raw = message
        .pointer("/function_call/arguments")
        .or_else(|| message.pointer("/tool_calls/0/function/arguments"))
        .or_else(|| message.get("content"))
        .and_then(Value::as_str)?;

    match serde_json::from_str(raw) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(error = %e, "oracle arguments are not valid JSON");
            None
        }
    }
}

fn key_item_schema(foreign: bool) -> Value {
    let mut properties = json!({
        "table_name": {"type": "string", "description": "Name of the table."},
        "column_name": {"type": "string", "description": "Name of the column to validate."},
        "key_type": {"type": "string", "enum": ["primary", "foreign"], "description": "Type of key."},
    });
    if foreign {
        properties["referenced_table"] = json!({
            "type": "string",
            "description": "Name of the table containing the referenced primary key (for foreign keys).",
        });
        properties["referenced_column"] = json!({
            "type": "string",
            "description": "Name of the column containing the referenced primary key (for foreign keys).",
        });
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": ["table_name", "column_name", "key_type"],
    })
}

fn function_schema(name: &str, description: &str, foreign: bool) -> Value {
    json!({
        "name": name,
        "description": description,
        "parameters": {
            "type": "object",
            "properties": {
                "keys": {"type": "array", "items": key_item_schema(foreign)},
            },
            "required": ["keys"],
        },
    })
}

fn csv_or_empty(columns: &[ColumnRef]) -> String {
    columns_csv(columns).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to render schema CSV");
        String::new()
    })
}

fn primary_keys_csv(known: &[KeyCandidate]) -> String {
    let mut out = String::from("table_name,column_name,key_type\n");
    for pk in known.iter().filter(|c| c.is_primary()) {
        out.push_str(&format!("{},{},{}\n", pk.table, pk.column, pk.key_type));
    }
    out
}

#[async_trait]
impl CandidateOracle for LlmOracle {
    async fn propose_primary_keys(&self, columns: &[ColumnRef]) -> OracleResult<Vec<KeyCandidate>> {
        let prompt = format!(
            "Identify all potential primary keys in the following database schema. \
             Provide the results in JSON format.\n\n{}\n\n",
            csv_or_empty(columns)
        );
        let function = function_schema(
            "validate_keys",
            "Validate if any of the given keys exist in the database schema.",
            false,
        );

        let Some(arguments) = self.call_function(prompt, function).await? else {
            tracing::warn!("oracle returned no primary key proposals");
            return Ok(Vec::new());
        };
        Ok(decode_candidates(&arguments, None)
            .into_iter()
            .filter(KeyCandidate::is_primary)
            .collect())
    }

    async fn propose_foreign_keys(
        &self,
        table: &str,
        columns: &[String],
        known_primary_keys: &[KeyCandidate],
    ) -> OracleResult<Vec<KeyCandidate>> {
        let refs: Vec<ColumnRef> = columns.iter().map(|c| ColumnRef::new(table, c.as_str())).collect();
        let prompt = format!(
            "Identify all potential foreign keys in the following database table:\n{}\n\n\
             Use the list of tables with primary keys below as a reference:\n{}\n\n\
             Provide the results in JSON format.\n\n",
            csv_or_empty(&refs),
            primary_keys_csv(known_primary_keys)
        );
        let function = function_schema(
            "foreign_keys",
            "Validate if the given keys exist in the database schema.",
            true,
        );

        let Some(arguments) = self.call_function(prompt, function).await? else {
            tracing::warn!(table, "oracle returned no foreign key proposals");
            return Ok(Vec::new());
        };
        Ok(decode_candidates(&arguments, Some(table))
            .into_iter()
            .filter(KeyCandidate::is_foreign)
            .collect())
    }
}
