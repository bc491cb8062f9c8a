//! Adapter configuration records.

use serde::{Deserialize, Serialize};

/// Untyped parameter bag used by JSON-described adapters.
pub type JsonParams = serde_json::Map<String, serde_json::Value>;

/// Configuration bound to an adapter by `configure`.
///
/// `id` and `name` identify the adapter instance; `params` carries the
/// adapter-specific settings and is flattened next to them on the wire, so a
/// date adapter's config reads `{"id": .., "name": .., "targetDate": ..}`.
///
/// A config is a value: adapters take ownership on `configure` and never hand
/// it back or mutate it. Replacing it means calling `configure` again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig<P = JsonParams> {
    /// Stable identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Adapter-specific parameters
    #[serde(flatten)]
    pub params: P,
}

impl<P> AdapterConfig<P> {
    pub fn new(id: impl Into<String>, name: impl Into<String>, params: P) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            params,
        }
    }

    /// Swap the parameters, keeping the identity.
    pub fn map_params<Q>(self, f: impl FnOnce(P) -> Q) -> AdapterConfig<Q> {
        AdapterConfig {
            id: self.id,
            name: self.name,
            params: f(self.params),
        }
    }
}

impl AdapterConfig<JsonParams> {
    /// Config with an empty parameter bag.
    pub fn bare(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, JsonParams::new())
    }

    /// Builder-style parameter insertion.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}
