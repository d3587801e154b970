use serde_json::Value;

use super::marshaller::{MarshalError, Marshaller};

/// JSON wire format via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMarshaller;

impl JsonMarshaller {
    pub fn new() -> Self {
        JsonMarshaller
    }
}

impl Marshaller for JsonMarshaller {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, MarshalError> {
        serde_json::to_vec(value).map_err(MarshalError::encode)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, MarshalError> {
        serde_json::from_slice(bytes).map_err(|err| MarshalError::decode("JSON value", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_compact_json() {
        let bytes = JsonMarshaller.encode(&json!({ "msg": "Hello" })).unwrap();
        assert_eq!(bytes, br#"{"msg":"Hello"}"#);
    }

    #[test]
    fn decodes_json_bytes() {
        let value = JsonMarshaller.decode(br#"{"msg":"Hello"}"#).unwrap();
        assert_eq!(value["msg"], "Hello");
    }

    #[test]
    fn rejects_non_json() {
        let err = JsonMarshaller.decode(b"not json").unwrap_err();
        assert!(matches!(err, MarshalError::Decode { target: "JSON value", .. }));
    }
}
