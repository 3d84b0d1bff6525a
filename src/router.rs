use axum::http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::command::Request;
use crate::{KvsEngine, KvsError};

/// The ways a request can fail. The `Display` text is exactly what the client sees.
///
/// Store failures carry no detail: which operation failed and for which key is written to
/// the log where the failure happens, never into the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ApiError {
    /// `PUT` or `DELETE` on `/`
    #[error("error - no key provided")]
    NoKey,
    /// the percent-decoded path is not valid UTF-8
    #[error("error - key is not valid utf-8")]
    InvalidKey,
    /// read or delete of an absent key
    #[error("not found")]
    NotFound,
    /// any verb other than `GET`, `PUT` or `DELETE`
    #[error("method not allowed")]
    MethodNotAllowed,
    /// listing the keys failed
    #[error("error - getting all keys")]
    ListKeys,
    /// reading a key failed, including the existence check of a delete
    #[error("error - getting key")]
    GetKey,
    /// storing a raw text body failed
    #[error("error - putting kv pair")]
    PutRaw,
    /// storing a JSON object body failed
    #[error("error - putting json kv pair")]
    PutJson,
    /// removing a key failed
    #[error("error - deleting key")]
    DeleteKey,
    /// the stored value could not be serialized
    #[error("error - encoding response")]
    Encoding,
}

impl ApiError {
    /// the status code this error is answered with
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoKey | ApiError::InvalidKey => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::ListKeys
            | ApiError::GetKey
            | ApiError::PutRaw
            | ApiError::PutJson
            | ApiError::DeleteKey
            | ApiError::Encoding => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Body {
    Empty,
    Json(String),
    Text(String),
}

/// The response to one request: a status and an optional JSON or plain-text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    status: StatusCode,
    body: Body,
}

impl Reply {
    /// `200` with no body
    pub fn ok() -> Reply {
        Reply {
            status: StatusCode::OK,
            body: Body::Empty,
        }
    }

    /// `200` with the newline-terminated JSON encoding of `value`
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Reply, ApiError> {
        let mut encoded = serde_json::to_string(value).map_err(|e| {
            error!(error = %e, "error - encoding response");
            ApiError::Encoding
        })?;
        encoded.push('\n');
        Ok(Reply {
            status: StatusCode::OK,
            body: Body::Json(encoded),
        })
    }

    /// the status code of this reply
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// the body of this reply, empty if there is none
    pub fn body(&self) -> &str {
        match &self.body {
            Body::Empty => "",
            Body::Json(text) | Body::Text(text) => text.as_str(),
        }
    }
}

impl From<ApiError> for Reply {
    fn from(err: ApiError) -> Self {
        let body = match err {
            ApiError::NotFound => Body::Empty,
            _ => Body::Text(format!("{}\n", err)),
        };
        Reply {
            status: err.status(),
            body,
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.body {
            Body::Empty => self.status.into_response(),
            Body::Json(text) => {
                (self.status, [(CONTENT_TYPE, "application/json")], text).into_response()
            }
            Body::Text(text) => (
                self.status,
                [
                    (CONTENT_TYPE, "text/plain; charset=utf-8"),
                    (X_CONTENT_TYPE_OPTIONS, "nosniff"),
                ],
                text,
            )
                .into_response(),
        }
    }
}

/// Translates one inbound request into exactly one store call (two for a delete) and the
/// store's answer back into a [`Reply`].
///
/// The router holds the engine for its whole lifetime and only ever talks to it through
/// [`KvsEngine`].
#[derive(Debug, Clone)]
pub struct RequestRouter<E: KvsEngine> {
    engine: E,
}

impl<E: KvsEngine> RequestRouter<E> {
    /// Create a new `RequestRouter` over the given engine
    pub fn new(engine: E) -> Self {
        RequestRouter { engine }
    }

    /// the engine this router dispatches to
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Handles a request whose body has already been read in full.
    pub fn handle(&self, method: &Method, path: &str, body: &[u8]) -> Reply {
        Request::decode(method, path, body)
            .and_then(|req| self.execute(req))
            .unwrap_or_else(Reply::from)
    }

    /// Runs a decoded [`Request`] against the engine.
    pub fn execute(&self, req: Request) -> Result<Reply, ApiError> {
        match req {
            Request::ListKeys => {
                debug!("list keys");
                let keys = self
                    .engine
                    .list_keys()
                    .map_err(|e| store_failure(ApiError::ListKeys, "", e))?;
                Reply::json(&keys)
            }
            Request::Get { key } => {
                debug!(%key, "get");
                match self.engine.get(&key) {
                    Ok(Some(value)) => Reply::json(&value),
                    Ok(None) => Err(ApiError::NotFound),
                    Err(e) => Err(store_failure(ApiError::GetKey, &key, e)),
                }
            }
            Request::Set { key, value } => {
                let failure = if value.is_structured() {
                    ApiError::PutJson
                } else {
                    ApiError::PutRaw
                };
                debug!(%key, structured = value.is_structured(), "set");
                self.engine
                    .set(key.clone(), value)
                    .map_err(|e| store_failure(failure, &key, e))?;
                Ok(Reply::ok())
            }
            Request::Delete { key } => {
                debug!(%key, "delete");
                // a delete of an absent key answers 404, so existence is checked first
                match self.engine.get(&key) {
                    Ok(Some(_)) => {}
                    Ok(None) => return Err(ApiError::NotFound),
                    Err(e) => return Err(store_failure(ApiError::GetKey, &key, e)),
                }
                self.engine
                    .delete(&key)
                    .map_err(|e| store_failure(ApiError::DeleteKey, &key, e))?;
                Ok(Reply::ok())
            }
        }
    }
}

fn store_failure(failure: ApiError, key: &str, err: KvsError) -> ApiError {
    error!(%key, error = %err, "{}", failure);
    failure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Calls {
        list_keys: usize,
        get: usize,
        set: usize,
        delete: usize,
        get_key: Option<String>,
        set_key: Option<String>,
        set_value: Option<Value>,
        delete_key: Option<String>,
    }

    /// An engine that records every call. `get` finds every key except `not-found`.
    #[derive(Debug, Clone, Default)]
    struct MockEngine {
        calls: Arc<Mutex<Calls>>,
        empty: bool,
        fail: bool,
        fail_delete: bool,
    }

    impl MockEngine {
        fn failing() -> Self {
            MockEngine {
                fail: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> std::sync::MutexGuard<'_, Calls> {
            self.calls.lock().unwrap()
        }
    }

    impl KvsEngine for MockEngine {
        fn list_keys(&self) -> crate::Result<Vec<String>> {
            self.calls().list_keys += 1;
            if self.fail {
                return Err(KvsError::Uninitialized);
            }
            if self.empty {
                return Ok(vec![]);
            }
            Ok(vec!["hello".to_owned(), "world".to_owned()])
        }

        fn get(&self, key: &str) -> crate::Result<Option<Value>> {
            let mut calls = self.calls();
            calls.get += 1;
            calls.get_key = Some(key.to_owned());
            if self.fail {
                return Err(KvsError::Uninitialized);
            }
            if key == "not-found" {
                return Ok(None);
            }
            Ok(Some(Value::from("hello")))
        }

        fn set(&self, key: String, value: Value) -> crate::Result<()> {
            let mut calls = self.calls();
            calls.set += 1;
            calls.set_key = Some(key);
            calls.set_value = Some(value);
            if self.fail {
                return Err(KvsError::Uninitialized);
            }
            Ok(())
        }

        fn delete(&self, key: &str) -> crate::Result<()> {
            let mut calls = self.calls();
            calls.delete += 1;
            calls.delete_key = Some(key.to_owned());
            if self.fail || self.fail_delete {
                return Err(KvsError::LockPoisoned);
            }
            Ok(())
        }
    }

    fn route(engine: &MockEngine, method: Method, path: &str, body: &[u8]) -> Reply {
        RequestRouter::new(engine.clone()).handle(&method, path, body)
    }

    #[test]
    fn get_calls_engine_with_key() {
        let engine = MockEngine::default();
        let reply = route(&engine, Method::GET, "/test", b"");
        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.body(), "\"hello\"\n");
        let calls = engine.calls();
        assert_eq!(calls.get, 1);
        assert_eq!(calls.list_keys, 0);
        assert_eq!(calls.get_key.as_deref(), Some("test"));
    }

    #[test]
    fn get_missing_key_is_404_with_empty_body() {
        let engine = MockEngine::default();
        let reply = route(&engine, Method::GET, "/not-found", b"");
        assert_eq!(reply.status(), StatusCode::NOT_FOUND);
        assert_eq!(reply.body(), "");
    }

    #[test]
    fn get_root_lists_all_keys() {
        let engine = MockEngine::default();
        let reply = route(&engine, Method::GET, "/", b"");
        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.body(), "[\"hello\",\"world\"]\n");
        assert_eq!(engine.calls().list_keys, 1);
        assert_eq!(engine.calls().get, 0);
    }

    #[test]
    fn empty_store_lists_empty_array() {
        let engine = MockEngine {
            empty: true,
            ..Default::default()
        };
        let reply = route(&engine, Method::GET, "/", b"");
        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.body(), "[]\n");
    }

    #[test]
    fn list_keys_failure_is_500() {
        let engine = MockEngine::failing();
        let reply = route(&engine, Method::GET, "/", b"");
        assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body(), "error - getting all keys\n");
    }

    #[test]
    fn get_failure_is_500() {
        let engine = MockEngine::failing();
        let reply = route(&engine, Method::GET, "/test", b"");
        assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body(), "error - getting key\n");
        assert_eq!(engine.calls().get_key.as_deref(), Some("test"));
    }

    #[test]
    fn put_stores_raw_text() {
        let engine = MockEngine::default();
        let reply = route(&engine, Method::PUT, "/test", b"hello");
        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.body(), "");
        let calls = engine.calls();
        assert_eq!(calls.set, 1);
        assert_eq!(calls.set_key.as_deref(), Some("test"));
        assert_eq!(calls.set_value, Some(Value::from("hello")));
    }

    #[test]
    fn put_stores_json_object() {
        let engine = MockEngine::default();
        let reply = route(&engine, Method::PUT, "/test", br#"{"key": "value"}"#);
        assert_eq!(reply.status(), StatusCode::OK);
        let expected = json!({"key": "value"}).as_object().cloned().unwrap();
        assert_eq!(engine.calls().set_value, Some(Value::Structured(expected)));
    }

    #[test]
    fn put_without_key_is_400() {
        let engine = MockEngine::default();
        let reply = route(&engine, Method::PUT, "/", b"hello");
        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
        assert_eq!(reply.body(), "error - no key provided\n");
        assert_eq!(engine.calls().set, 0);
    }

    #[test]
    fn put_raw_failure_names_raw_path() {
        let engine = MockEngine::failing();
        let reply = route(&engine, Method::PUT, "/test", b"hello");
        assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body(), "error - putting kv pair\n");
        assert_eq!(engine.calls().set, 1);
    }

    #[test]
    fn put_json_failure_names_json_path() {
        let engine = MockEngine::failing();
        let reply = route(&engine, Method::PUT, "/test", br#"{"key": "value"}"#);
        assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body(), "error - putting json kv pair\n");
    }

    #[test]
    fn delete_existing_key() {
        let engine = MockEngine::default();
        let reply = route(&engine, Method::DELETE, "/test", b"");
        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.body(), "");
        let calls = engine.calls();
        assert_eq!(calls.get, 1);
        assert_eq!(calls.delete, 1);
        assert_eq!(calls.delete_key.as_deref(), Some("test"));
    }

    #[test]
    fn delete_missing_key_is_404_without_deleting() {
        let engine = MockEngine::default();
        let reply = route(&engine, Method::DELETE, "/not-found", b"");
        assert_eq!(reply.status(), StatusCode::NOT_FOUND);
        assert_eq!(reply.body(), "");
        assert_eq!(engine.calls().get, 1);
        assert_eq!(engine.calls().delete, 0);
    }

    #[test]
    fn delete_without_key_is_400() {
        let engine = MockEngine::default();
        let reply = route(&engine, Method::DELETE, "/", b"");
        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
        assert_eq!(reply.body(), "error - no key provided\n");
        assert_eq!(engine.calls().get, 0);
    }

    #[test]
    fn delete_existence_check_failure_is_500() {
        let engine = MockEngine::failing();
        let reply = route(&engine, Method::DELETE, "/test", b"");
        assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body(), "error - getting key\n");
        assert_eq!(engine.calls().delete, 0);
    }

    #[test]
    fn delete_failure_is_500() {
        let engine = MockEngine {
            fail_delete: true,
            ..Default::default()
        };
        let reply = route(&engine, Method::DELETE, "/test", b"");
        assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body(), "error - deleting key\n");
        assert_eq!(engine.calls().delete, 1);
    }

    #[test]
    fn encoded_key_is_stored_decoded() {
        let router = RequestRouter::new(crate::KvStore::new());
        let reply = router.handle(&Method::PUT, "/a%20b", b"hello");
        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(router.handle(&Method::GET, "/", b"").body(), "[\"a b\"]\n");
        assert_eq!(router.handle(&Method::GET, "/a b", b"").body(), "\"hello\"\n");
        assert_eq!(router.handle(&Method::GET, "/a%20b", b"").body(), "\"hello\"\n");
    }

    #[test]
    fn key_that_is_not_utf8_is_400() {
        let engine = MockEngine::default();
        let reply = route(&engine, Method::PUT, "/%FF", b"hello");
        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
        assert_eq!(reply.body(), "error - key is not valid utf-8\n");
        assert_eq!(engine.calls().set, 0);
    }

    #[test]
    fn other_methods_are_405() {
        let engine = MockEngine::default();
        let reply = route(&engine, Method::POST, "/test", b"hello");
        assert_eq!(reply.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(reply.body(), "method not allowed\n");
        let calls = engine.calls();
        assert_eq!(calls.get + calls.set + calls.delete + calls.list_keys, 0);
    }

    #[test]
    fn end_to_end_against_real_store() {
        let router = RequestRouter::new(crate::KvStore::new());
        assert_eq!(router.handle(&Method::GET, "/", b"").body(), "[]\n");
        assert_eq!(router.handle(&Method::PUT, "/test", b"hello").status(), StatusCode::OK);
        let reply = router.handle(&Method::GET, "/test", b"");
        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.body(), "\"hello\"\n");
        assert_eq!(router.handle(&Method::DELETE, "/test", b"").status(), StatusCode::OK);
        assert_eq!(router.handle(&Method::GET, "/test", b"").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn uninitialized_store_is_500() {
        let router = RequestRouter::new(crate::KvStore::uninitialized());
        let reply = router.handle(&Method::GET, "/test", b"");
        assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body(), "error - getting key\n");
    }
}
