//! JSON adapter trees for `veracity eval`.
//!
//! A spec file describes one node. Leaves name their kind and carry their
//! parameters inline; chains nest two nodes and may bind metadata from the
//! source result into the target's parameters:
//!
//! ```json
//! {
//!   "kind": "chain",
//!   "id": "is-birthday",
//!   "source": {"kind": "html", "id": "profile", "url": "https://..", "regex": "dob: (\\S+)"},
//!   "target": {"kind": "date", "id": "today", "targetDate": "1970-01-01", "recurringYearly": true},
//!   "bind": [{"from": "matchedValue", "into": "targetDate"}]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use veracity_adapters::{LeafEnv, LeafKind};
use veracity_core::{
    AdapterConfig, AdapterResult, ChainParams, ChainedAdapter, DynAdapter, JsonParams, Prebound,
    TransformError,
};

/// One node of an adapter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeSpec {
    Date(LeafSpec),
    Range(LeafSpec),
    Html(LeafSpec),
    Select(LeafSpec),
    Chain(ChainSpec),
}

/// A leaf adapter and its parameter bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub params: JsonParams,
}

/// Two nested nodes combined with a short-circuiting AND.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub source: Box<NodeSpec>,
    pub target: Box<NodeSpec>,
    /// Source metadata copied into the target's parameters before each target evaluation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bind: Vec<Bind>,
}

/// Copy `metadata[from]` of the source result into `params[into]` of the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bind {
    pub from: String,
    pub into: String,
}

impl NodeSpec {
    pub fn id(&self) -> &str {
        match self {
            NodeSpec::Date(leaf)
            | NodeSpec::Range(leaf)
            | NodeSpec::Html(leaf)
            | NodeSpec::Select(leaf) => &leaf.id,
            NodeSpec::Chain(chain) => &chain.id,
        }
    }
}

/// Read and parse a spec file.
pub fn load(path: &Path) -> Result<NodeSpec> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read spec file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse spec file {}", path.display()))
}

/// An unconfigured adapter together with the config that binds it.
pub struct Built {
    pub adapter: Arc<DynAdapter>,
    pub config: AdapterConfig,
}

/// Turns node specs into adapter trees.
pub struct TreeBuilder {
    env: LeafEnv,
}

impl TreeBuilder {
    pub fn new(env: LeafEnv) -> Self {
        Self { env }
    }

    pub fn build(&self, node: &NodeSpec) -> Built {
        match node {
            NodeSpec::Date(leaf) => self.build_leaf(LeafKind::Date, leaf),
            NodeSpec::Range(leaf) => self.build_leaf(LeafKind::Range, leaf),
            NodeSpec::Html(leaf) => self.build_leaf(LeafKind::Html, leaf),
            NodeSpec::Select(leaf) => self.build_leaf(LeafKind::Select, leaf),
            NodeSpec::Chain(chain) => self.build_chain(chain),
        }
    }

    fn build_leaf(&self, kind: LeafKind, leaf: &LeafSpec) -> Built {
        debug!(kind = %kind, id = %leaf.id, "Building leaf adapter");
        let name = leaf.name.clone().unwrap_or_else(|| leaf.id.clone());
        Built {
            adapter: self.env.build(kind),
            config: AdapterConfig::new(leaf.id.clone(), name, leaf.params.clone()),
        }
    }

    // A chain becomes a Prebound engine so it can sit in a DynAdapter slot.
    fn build_chain(&self, chain: &ChainSpec) -> Built {
        debug!(id = %chain.id, "Building chain adapter");
        let source = self.build(&chain.source);
        let target = self.build(&chain.target);

        let mut params = ChainParams::new(
            source.adapter,
            source.config,
            target.adapter,
            target.config.clone(),
        );
        if !chain.bind.is_empty() {
            let binds = chain.bind.clone();
            let base = target.config;
            params = params.with_transform(move |result| apply_binds(&base, &binds, result));
        }

        let name = chain.name.clone().unwrap_or_else(|| chain.id.clone());
        let frozen = AdapterConfig::new(chain.id.clone(), name.clone(), params);
        let engine: Arc<ChainedAdapter<DynAdapter, DynAdapter>> = Arc::new(ChainedAdapter::new());
        Built {
            adapter: Arc::new(Prebound::new(engine, frozen)),
            config: AdapterConfig::bare(chain.id.clone(), name),
        }
    }
}

/// Target config for the next evaluation: the initial config with every
/// bound metadata value written over its parameters.
fn apply_binds(
    base: &AdapterConfig,
    binds: &[Bind],
    source: &AdapterResult,
) -> std::result::Result<AdapterConfig, TransformError> {
    let mut next = base.clone();
    for bind in binds {
        let value = source.get(&bind.from).ok_or_else(|| {
            TransformError::new(format!("source result has no '{}' to bind", bind.from))
        })?;
        next.params.insert(bind.into.clone(), value.clone());
    }
    Ok(next)
}
