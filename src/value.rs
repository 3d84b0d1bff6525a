use serde::{Deserialize, Serialize};
use serde_json::{Deserializer, Map};

/// A JSON object, as accepted by [`Value::Structured`]
pub type Object = Map<String, serde_json::Value>;

/// The value stored under a key.
///
/// Only two shapes are ever produced by the server: an uninterpreted text payload or a
/// JSON object. Both serialize directly to JSON, a `Raw` value as a bare JSON string and
/// a `Structured` value as the object itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// text stored exactly as it was received
    Raw(String),
    /// a decoded JSON object, members may be arbitrarily nested JSON
    Structured(Object),
}

impl Value {
    /// Decides how a request body is represented in the store.
    ///
    /// The body is read as a stream of JSON values and only the first one is considered.
    /// If it is a JSON object the value is `Structured`. Anything else (an empty body,
    /// malformed JSON, or well-formed JSON that is not an object) is kept as `Raw` text.
    /// Falling back to `Raw` is a normal outcome, not an error.
    pub fn from_body(body: &[u8]) -> Value {
        let mut stream = Deserializer::from_slice(body).into_iter::<Object>();
        match stream.next() {
            Some(Ok(object)) => Value::Structured(object),
            _ => Value::Raw(String::from_utf8_lossy(body).into_owned()),
        }
    }

    /// returns `true` if this value holds a decoded JSON object
    pub fn is_structured(&self) -> bool {
        matches!(self, Value::Structured(_))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Raw(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Raw(text.to_owned())
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Structured(object)
    }
}
