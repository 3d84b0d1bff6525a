use std::net::SocketAddr;

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::value::Object;
use crate::{KvsError, Result, Value};

/// `KvsClient` contains the functionality for communication with a [`KvsServer`](crate::KvsServer)
#[derive(Debug, Clone)]
pub struct KvsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl KvsClient {
    /// creates a client for the server listening on the given `addr`
    pub fn new(addr: SocketAddr) -> Result<Self> {
        let base_url = Url::parse(&format!("http://{}/", addr))
            .map_err(|e| KvsError::Parsing(format!("could not build a URL for {}: {}", addr, e)))?;
        Ok(KvsClient {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    /// the URL of `key`, with the key percent-encoded as a single path segment
    fn url(&self, key: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| KvsError::Parsing(format!("{} cannot hold a key", self.base_url)))?
            .pop_if_empty()
            .push(key);
        Ok(url)
    }

    /// lists every key currently held by the server, in no particular order
    pub async fn list_keys(&self) -> Result<Vec<String>> {
        let resp = self.http.get(self.base_url.clone()).send().await?;
        let resp = expect_ok(resp).await?;
        decode_json(resp).await
    }

    /// gets the value of the specified `key` from the server
    /// ## Returns
    /// `Ok<Some<Value>>` if the value was found for the key.
    /// `Ok<None>` if there is no value associated with the key
    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        let resp = self.http.get(self.url(key)?).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = expect_ok(resp).await?;
        Ok(Some(decode_json(resp).await?))
    }

    /// stores `text` under `key`. The server keeps it as raw text unless it happens to be
    /// a JSON object
    pub async fn set_raw(&self, key: &str, text: impl Into<String>) -> Result<()> {
        let resp = self.http.put(self.url(key)?).body(text.into()).send().await?;
        expect_ok(resp).await?;
        Ok(())
    }

    /// stores a JSON object under `key`
    pub async fn set_json(&self, key: &str, object: &Object) -> Result<()> {
        let body = serde_json::to_vec(object)?;
        let resp = self.http.put(self.url(key)?).body(body).send().await?;
        expect_ok(resp).await?;
        Ok(())
    }

    /// removes a key and its associated value from the store
    /// # Returns
    /// `Ok(true)` if the key was removed, `Ok(false)` if it did not exist
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let resp = self.http.delete(self.url(key)?).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        expect_ok(resp).await?;
        Ok(true)
    }
}

async fn expect_ok(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(KvsError::UnexpectedStatus {
        status: status.as_u16(),
        body: body.trim_end().to_owned(),
    })
}

/// reads the whole body and decodes it, a malformed body surfaces as [`KvsError::Serde`]
async fn decode_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
