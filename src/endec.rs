//! Encoders/decoders between bytes and schema values

use serde_json::Value;

use crate::config::OutputFormat;
use crate::error::{LineageError, Result};

/// Converts between a byte representation and values
pub trait Endec: Send + Sync {
    /// Label used in errors and logs, typically the input's origin
    fn name(&self) -> &str;

    fn decode(&self, input: &[u8]) -> Result<Value>;

    fn encode(&self, value: &Value) -> Result<Vec<u8>>;
}

/// JSON endec
#[derive(Debug, Clone)]
pub struct JsonEndec {
    name: String,
    format: OutputFormat,
}

impl JsonEndec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: OutputFormat::default(),
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn pretty(self) -> Self {
        self.with_format(OutputFormat::Pretty)
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

impl Endec for JsonEndec {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, input: &[u8]) -> Result<Value> {
        serde_json::from_slice(input).map_err(|e| LineageError::Decode {
            endec: self.name.clone(),
            reason: e.to_string(),
        })
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let encoded = match self.format {
            OutputFormat::Pretty => serde_json::to_vec_pretty(value),
            OutputFormat::Compact => serde_json::to_vec(value),
        };
        encoded.map_err(|e| LineageError::Encode {
            endec: self.name.clone(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_and_encode() {
        let endec = JsonEndec::new("test");
        let value = endec.decode(br#"{"before": "x", "unchanged": "y"}"#).unwrap();
        assert_eq!(value, json!({"before": "x", "unchanged": "y"}));
        assert_eq!(endec.encode(&value).unwrap(), br#"{"before":"x","unchanged":"y"}"#.to_vec());
    }

    #[test]
    fn test_decode_error_names_endec() {
        let err = JsonEndec::new("payload.json").decode(b"{not json").unwrap_err();
        match err {
            LineageError::Decode { endec, .. } => assert_eq!(endec, "payload.json"),
            other => panic!("Expected Decode, got {:?}", other),
        }
    }

    #[test]
    fn test_pretty_output() {
        let endec = JsonEndec::new("test").pretty();
        assert_eq!(endec.format(), OutputFormat::Pretty);
        let out = endec.encode(&json!({"a": 1})).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\n  \"a\": 1\n}");
    }
}
