#![deny(missing_docs)]
//! A networked, in-memory key-value store (kvs) that maps [`String`] keys to [`Value`]s.
//!
//! This crate provides the [`KvStore`] engine, the [`RequestRouter`] that maps HTTP requests
//! onto it, and a [`KvsServer`] / [`KvsClient`] pair. The [`kvs-server`] and [`kvs-client`]
//! executables are thin command line wrappers around them.
//!
//! ## Supported Operations
//! | Verb     | Path     | Behavior                                                     |
//! |----------|----------|--------------------------------------------------------------|
//! | `GET`    | `/`      | list all keys as a JSON array of strings                     |
//! | `GET`    | `/{key}` | fetch the value at key as JSON, `404` if absent              |
//! | `PUT`    | `/{key}` | store the body, as a JSON object if it is one, else raw text |
//! | `DELETE` | `/{key}` | remove the key, `404` if absent                              |
//!
//! Any other verb is answered with `405`. A `PUT` or `DELETE` without a key is a `400`, and
//! store failures are a `500`. Error bodies are a single line of plain text.
//!
//! ## Values
//! A [`Value`] is either `Raw` text or a `Structured` JSON object. When a `PUT` body decodes
//! as a JSON object it is stored structured; anything else, including JSON that is a bare
//! string, number, array or `null`, is stored as raw text. Reads return the JSON encoding of
//! the stored value, so raw text comes back as a JSON string.
//!
//! ## KvStore
//! [`KvStore`] is the implementor of the [`KvsEngine`] trait. A single reader/writer lock
//! guards the whole map: reads run alongside each other, writes are exclusive. Nothing is
//! persisted, the store lives as long as the process.
//!
//! ## Client / Server
//! [`KvsServer`] hosts the router on axum/tokio. On Ctrl-C or SIGTERM it stops accepting
//! connections and gives in-flight requests a bounded grace period to complete.
//!
//! [`kvs-server`]: ../kvs_server/index.html
//! [`kvs-client`]: ../kvs_client/index.html

pub use client::KvsClient;
pub use command::Request;
pub use config::ServerConfig;
pub use engine::{KvStore, KvsEngine};
pub use error::{KvsError, Result};
pub use router::{ApiError, Reply, RequestRouter};
pub use server::{shutdown_signal, KvsServer};
pub use value::{Object, Value};

mod client;
mod command;
pub mod config;
mod engine;
mod error;
mod router;
mod server;
mod value;
