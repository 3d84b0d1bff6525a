use axum::http::Method;
use percent_encoding::percent_decode_str;

use crate::router::ApiError;
use crate::Value;

/// These are the store operations a single inbound request can map to
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// list every key in the store
    ListKeys,
    /// get a value from the store
    Get {
        /// the key to search for
        key: String,
    },
    /// set a key/value in the store
    Set {
        /// the key to set
        key: String,
        /// the value to set, already run through [`Value::from_body`]
        value: Value,
    },
    /// remove a key/value from the store
    Delete {
        /// the key to remove
        key: String,
    },
}

impl Request {
    /// Decodes a request's verb, path and (fully buffered) body into a store operation.
    ///
    /// `GET` reads, `PUT` writes and `DELETE` deletes. The key is the percent-decoded `path`
    /// with its leading `/` removed; an empty key lists all keys for `GET` and is rejected
    /// for the others.
    pub fn decode(method: &Method, path: &str, body: &[u8]) -> Result<Request, ApiError> {
        if !matches!(*method, Method::GET | Method::PUT | Method::DELETE) {
            return Err(ApiError::MethodNotAllowed);
        }
        let key = key_from_path(path)?;
        match *method {
            Method::GET if key.is_empty() => Ok(Request::ListKeys),
            Method::GET => Ok(Request::Get { key }),
            Method::PUT | Method::DELETE if key.is_empty() => Err(ApiError::NoKey),
            Method::PUT => Ok(Request::Set {
                key,
                value: Value::from_body(body),
            }),
            Method::DELETE => Ok(Request::Delete { key }),
            _ => Err(ApiError::MethodNotAllowed),
        }
    }
}

/// percent-decodes a request path and strips exactly one leading `/` from it
fn key_from_path(path: &str) -> Result<String, ApiError> {
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| ApiError::InvalidKey)?;
    let key = decoded.strip_prefix('/').unwrap_or(&decoded[..]);
    Ok(key.to_owned())
}
