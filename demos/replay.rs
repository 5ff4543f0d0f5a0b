//! Replay a command script through a live renderer session.
//!
//! ```text
//! cargo run --example replay -- <script.pml> [options.toml]
//! ```
//!
//! Each non-blank, non-comment line of the script is one renderer command.
//! Lines are sent in batches separated by blank lines, so the log shows one
//! acknowledgment per paragraph. Set `RUST_LOG=debug` to watch the channel,
//! or `RUST_LOG=molrelay::renderer=info` for just the renderer's output.

use std::path::{Path, PathBuf};

use molrelay::command::Command;
use molrelay::options::RelayOptions;
use molrelay::{Delivery, Relay, RelayError};

fn paragraphs(script: &str) -> Result<Vec<Vec<Command>>, RelayError> {
    let mut batches = vec![Vec::new()];
    for line in script.lines().map(str::trim) {
        if line.is_empty() {
            if batches.last().is_some_and(|b| !b.is_empty()) {
                batches.push(Vec::new());
            }
        } else if !line.starts_with('#') {
            if let Some(batch) = batches.last_mut() {
                batch.push(Command::new(line)?);
            }
        }
    }
    batches.retain(|b| !b.is_empty());
    Ok(batches)
}

fn run(script: &Path, options: Option<PathBuf>) -> Result<(), RelayError> {
    let options = match options {
        Some(path) => RelayOptions::load(&path)?,
        None => RelayOptions::default(),
    };
    let batches = paragraphs(&std::fs::read_to_string(script)?)?;
    let mut relay = Relay::start(&options)?;

    for (i, batch) in batches.into_iter().enumerate() {
        let count = batch.len();
        match relay.send_raw(batch)?.delivery {
            Delivery::Acknowledged { seq } => {
                log::info!("paragraph {i}: {count} commands, batch {seq}");
            }
            Delivery::Nothing => {}
            Delivery::Dropped => {
                log::warn!("paragraph {i}: no renderer, {count} commands dropped");
            }
        }
    }

    relay.shutdown();
    Ok(())
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(script) = args.next() else {
        log::error!("Usage: replay <script.pml> [options.toml]");
        std::process::exit(1);
    };

    if let Err(e) = run(Path::new(&script), args.next().map(PathBuf::from)) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
