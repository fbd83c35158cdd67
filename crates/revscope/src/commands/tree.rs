//! `revscope tree`.

use std::fmt::Write as _;
use std::path::Path;

use revscope_diff::FileTreeNode;

use super::read_input;

/// Build a tree from a path list and print it.
pub async fn tree(paths: &Path, json: bool) -> anyhow::Result<()> {
    let content = read_input(paths).await?;
    let tree = revscope_diff::build(content.lines().map(str::trim));
    tracing::debug!(files = tree.file_count(), "Built file tree");

    if json {
        println!("{}", serde_json::to_string_pretty(&tree.rows())?);
    } else {
        print!("{}", render_tree(&tree));
    }
    Ok(())
}

/// Render a tree as indented lines; directories end with `/`.
pub fn render_tree(tree: &FileTreeNode) -> String {
    let mut out = String::new();
    for row in tree.rows() {
        let suffix = if row.is_file { "" } else { "/" };
        let _ = writeln!(out, "{}{}{}", "  ".repeat(row.depth), row.name, suffix);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tree() {
        let tree = revscope_diff::build(["src/main.rs", "Cargo.toml", "src/bin/tool.rs"]);
        assert_eq!(
            render_tree(&tree),
            "src/\n  bin/\n    tool.rs\n  main.rs\nCargo.toml\n"
        );
    }
}
