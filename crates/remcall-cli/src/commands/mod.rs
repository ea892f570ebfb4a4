pub mod encode;
pub mod run;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use remcall_host::Envelope;

pub(crate) fn load_envelopes(path: &Path) -> Result<Vec<Envelope>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read messages from {}", path.display()))?;
    Envelope::load_json(&text).with_context(|| format!("decode messages in {}", path.display()))
}
