use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// JSON array of message envelopes
    #[arg(long)]
    pub messages: PathBuf,
}

/// One `<msg_id> <cbor hex>` line per message.
pub fn cmd_encode(args: &EncodeArgs) -> Result<()> {
    let envelopes = super::load_envelopes(&args.messages)?;
    for envelope in &envelopes {
        let bytes = envelope.message.to_wire()?;
        println!("{} {}", envelope.message.msg_id(), hex::encode(bytes));
    }
    Ok(())
}
