use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use remcall_host::{ActionDispatcher, BatchRunner, HostConfig};
use remcall_kernel::Node;
use remcall_store::MemStore;
use remcall_types::PrincipalKey;
use serde_json::json;

use crate::output::print_json;

const DEFAULT_ROOT_KEY: PrincipalKey = PrincipalKey::from_bytes([0; 32]);

#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON array of stored objects to seed the node with
    #[arg(long)]
    pub store: PathBuf,

    /// JSON array of message envelopes
    #[arg(long)]
    pub messages: PathBuf,

    /// Hex principal for envelopes that do not name one (defaults to the root key)
    #[arg(long)]
    pub principal: Option<PrincipalKey>,

    /// Hex key allowed to read every object on the node
    #[arg(long, env = "REMCALL_ROOT_KEY", default_value_t = DEFAULT_ROOT_KEY)]
    pub root_key: PrincipalKey,

    /// Node name
    #[arg(long, default_value = "local")]
    pub name: String,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub fn cmd_run(args: &RunArgs) -> Result<()> {
    let fixture = fs::read_to_string(&args.store)
        .with_context(|| format!("read store from {}", args.store.display()))?;
    let store = MemStore::from_json(&fixture)
        .with_context(|| format!("load store from {}", args.store.display()))?;
    let envelopes = super::load_envelopes(&args.messages)?;

    let config = HostConfig::from_env();
    let node = Node::builder(args.name.clone(), args.root_key)
        .with_store(Arc::new(store.clone()))
        .with_config(config.kernel.clone())
        .build();
    tracing::info!(
        node = %node.id(),
        objects = store.len(),
        messages = envelopes.len(),
        "running batch"
    );

    let principal = args.principal.unwrap_or(args.root_key);
    let mut runner = BatchRunner::new(ActionDispatcher::new(node, config), principal);
    let report = runner.run(envelopes);

    let warnings = report
        .entries
        .iter()
        .filter_map(|entry| entry.error.as_ref().map(|err| format!("{}: {err}", entry.msg_id)))
        .collect::<Vec<_>>();
    if !warnings.is_empty() {
        tracing::warn!(failed = warnings.len(), "some messages failed");
    }

    let data = json!({
        "entries": serde_json::to_value(&report.entries)?,
        "store": serde_json::to_value(store.snapshot()?)?,
    });
    print_json(data, warnings, args.pretty)
}
