//! Wire message: a JSON payload and a flat set of string headers.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// A message as it travels over a channel.
///
/// Immutable once handed to a [`Publisher`](crate::messaging::Publisher); builders
/// consume and return `self`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    payload: Vec<u8>,
    headers: BTreeMap<String, String>,
}

impl Message {
    /// Wrap raw payload bytes.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            headers: BTreeMap::new(),
        }
    }

    /// Serialize `payload` as JSON.
    pub fn encode<T: Serialize>(payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::to_vec(payload)?))
    }

    /// Deserialize the JSON payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    /// Add or replace a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}
