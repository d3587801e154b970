//! Type identity used in place of runtime reflection.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::binder::HandlerError;
use crate::marshal::MarshalError;

/// Identifies a Rust type: a component, a trait object, or a payload.
///
/// Equality and hashing use the `TypeId` only; the name is kept for logs.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, as reported by `std::any::type_name`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name (`OrderController` rather than
    /// `my_app::orders::OrderController`).
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(idx) => &self.name[idx + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A decoded, type-erased message body on its way to a handler.
pub struct Payload(Box<dyn Any + Send>);

impl Payload {
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Payload(Box::new(value))
    }

    /// Take the concrete value out of the payload.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        self.0.downcast::<T>().map(|boxed| *boxed).map_err(Payload)
    }

    /// Unwrap an optional payload into the handler's parameter type.
    ///
    /// Used by generated invokers; a missing or mistyped payload is a
    /// handler error rather than a panic.
    pub fn require<T: 'static>(payload: Option<Payload>) -> Result<T, HandlerError> {
        let expected = std::any::type_name::<T>();
        match payload {
            Some(payload) => payload
                .downcast::<T>()
                .map_err(|_| HandlerError::PayloadMismatch { expected }),
            None => Err(HandlerError::MissingPayload { expected }),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Payload(..)")
    }
}

type DecodeFn = fn(Value) -> Result<Payload, MarshalError>;

/// The declared type of a consumer's body parameter.
///
/// Carries a decoder monomorphised for that type, so the binder can turn
/// the marshaller's structured value into the exact parameter type without
/// knowing it statically.
#[derive(Clone, Copy)]
pub struct PayloadType {
    key: TypeKey,
    decode: DecodeFn,
}

impl PayloadType {
    pub fn of<T: DeserializeOwned + Send + 'static>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            decode: decode_as::<T>,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.key.name()
    }

    /// Convert a structured value into this payload type.
    pub fn decode(&self, value: Value) -> Result<Payload, MarshalError> {
        (self.decode)(value)
    }
}

fn decode_as<T: DeserializeOwned + Send + 'static>(value: Value) -> Result<Payload, MarshalError> {
    serde_json::from_value::<T>(value)
        .map(Payload::new)
        .map_err(|err| MarshalError::decode(std::any::type_name::<T>(), err))
}

impl PartialEq for PayloadType {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PayloadType {}

impl fmt::Debug for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PayloadType({})", self.key.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Greeting {
        msg: String,
    }

    mod nested {
        pub struct Widget;
    }

    #[test]
    fn keys_compare_by_type() {
        assert_eq!(TypeKey::of::<Greeting>(), TypeKey::of::<Greeting>());
        assert_ne!(TypeKey::of::<Greeting>(), TypeKey::of::<String>());
    }

    #[test]
    fn short_name_strips_module_path() {
        assert_eq!(TypeKey::of::<nested::Widget>().short_name(), "Widget");
        assert_eq!(TypeKey::of::<u32>().short_name(), "u32");
    }

    #[test]
    fn payload_type_decodes_into_declared_type() {
        let ty = PayloadType::of::<Greeting>();
        let payload = ty.decode(json!({ "msg": "Hello" })).unwrap();
        let greeting: Greeting = Payload::require(Some(payload)).unwrap();
        assert_eq!(greeting.msg, "Hello");
    }

    #[test]
    fn payload_type_rejects_shape_mismatch() {
        let ty = PayloadType::of::<Greeting>();
        let err = ty.decode(json!({ "wrong": 1 })).unwrap_err();
        assert!(matches!(err, MarshalError::Decode { .. }));
    }

    #[test]
    fn require_reports_missing_and_mismatched_payloads() {
        let missing = Payload::require::<Greeting>(None).unwrap_err();
        assert!(matches!(missing, HandlerError::MissingPayload { .. }));

        let mismatched = Payload::require::<Greeting>(Some(Payload::new(7u8))).unwrap_err();
        assert!(matches!(mismatched, HandlerError::PayloadMismatch { .. }));
    }
}
