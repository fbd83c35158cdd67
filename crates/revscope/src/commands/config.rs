//! `revscope config`.

use std::path::PathBuf;

use revscope_core::HistoryConfig;

/// Print configuration sources and the effective settings.
pub fn show_config(config: &HistoryConfig, sources: &[PathBuf]) -> anyhow::Result<()> {
    println!("Configuration sources:");
    if sources.is_empty() {
        println!("  (none)");
    } else {
        for source in sources {
            println!("  {}", source.display());
        }
    }
    println!();

    println!("Effective configuration:");
    let effective = serde_json::json!({
        "tree_view": config.tree_view(),
        "refresh_on_load": config.refresh_on_load(),
        "log_level": config.log_level().as_str(),
    });
    println!("{}", serde_json::to_string_pretty(&effective)?);

    Ok(())
}
