//! Format codecs translating structured values to and from artifact bytes.
//!
//! Codecs are injected into storage backends rather than baked into them,
//! so one backend type serves every format and new formats slot in without
//! touching path or version handling.

use bytes::Bytes;
use serde_json::Value;

/// Load/save options forwarded to the codec, e.g. `{"pretty": true}`.
pub type FormatArgs = serde_json::Map<String, Value>;

/// A codec between in-memory [`Value`]s and stored bytes.
pub trait DataFormat: Send + Sync {
    /// Codec name as used in catalog configuration and `describe()`.
    fn name(&self) -> &'static str;

    fn encode(&self, data: &Value, args: &FormatArgs) -> Result<Bytes, FormatError>;

    fn decode(&self, bytes: Bytes, args: &FormatArgs) -> Result<Value, FormatError>;
}

/// JSON artifacts.
///
/// Save args: `pretty` (bool, default false) selects indented output.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormat;

impl DataFormat for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, data: &Value, args: &FormatArgs) -> Result<Bytes, FormatError> {
        let pretty = args.get("pretty").and_then(Value::as_bool).unwrap_or(false);
        let bytes = if pretty {
            serde_json::to_vec_pretty(data).map_err(FormatError::Json)?
        } else {
            serde_json::to_vec(data).map_err(FormatError::Json)?
        };
        Ok(Bytes::from(bytes))
    }

    fn decode(&self, bytes: Bytes, _args: &FormatArgs) -> Result<Value, FormatError> {
        serde_json::from_slice(&bytes).map_err(FormatError::Json)
    }
}

/// Plain UTF-8 text artifacts. Values must be JSON strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextFormat;

impl DataFormat for TextFormat {
    fn name(&self) -> &'static str {
        "text"
    }

    fn encode(&self, data: &Value, _args: &FormatArgs) -> Result<Bytes, FormatError> {
        match data {
            Value::String(text) => Ok(Bytes::copy_from_slice(text.as_bytes())),
            other => Err(FormatError::NotText {
                value_type: json_type_name(other),
            }),
        }
    }

    fn decode(&self, bytes: Bytes, _args: &FormatArgs) -> Result<Value, FormatError> {
        let text = String::from_utf8(bytes.to_vec()).map_err(FormatError::NotUtf8)?;
        Ok(Value::String(text))
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Errors raised by format codecs.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("JSON error: {0}")]
    Json(#[source] serde_json::Error),

    #[error("text format requires a string value, got {value_type}")]
    NotText { value_type: &'static str },

    #[error("artifact is not valid UTF-8 text")]
    NotUtf8(#[source] std::string::FromUtf8Error),
}
