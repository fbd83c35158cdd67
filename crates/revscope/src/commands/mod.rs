//! Command handlers for the revscope CLI.

pub mod config;
pub mod parse;
pub mod tree;

pub use config::*;
pub use parse::*;
pub use tree::*;

use std::path::Path;

use anyhow::Context;
use tokio::io::AsyncReadExt;

/// Read a whole input file, or stdin when the path is `-`.
pub async fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut content = String::new();
        tokio::io::stdin()
            .read_to_string(&mut content)
            .await
            .context("Failed to read stdin")?;
        return Ok(content);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}
