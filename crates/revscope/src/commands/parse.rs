//! `revscope parse`.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use revscope_diff::{DiffHunk, DiffLineKind, DiffSummary, FileStat};
use serde::Serialize;

use super::read_input;

#[derive(Serialize)]
struct ParseOutput<'a> {
    hunks: &'a [DiffHunk],
    summary: DiffSummary,
}

/// Parse a diff file and print its hunks.
pub async fn parse(diff: &Path, stats: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let raw = read_input(diff).await?;
    let stats: Vec<FileStat> = match stats {
        Some(path) => {
            let content = read_input(path).await?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid stats file {}", path.display()))?
        }
        None => Vec::new(),
    };

    let hunks = revscope_diff::parse(&raw, &stats);
    let summary = DiffSummary::from_hunks(&hunks);
    tracing::debug!(files = summary.files, "Parsed diff");

    if json {
        let output = ParseOutput {
            hunks: &hunks,
            summary,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", render_hunks(&hunks, &summary));
    }
    Ok(())
}

/// Render hunks as annotated text with old/new line number gutters.
pub fn render_hunks(hunks: &[DiffHunk], summary: &DiffSummary) -> String {
    if summary.is_empty() {
        return "no changes\n".to_string();
    }

    let mut out = String::new();
    for hunk in hunks {
        let _ = writeln!(out, "{}  +{} -{}", hunk.file, hunk.additions, hunk.deletions);
        for line in &hunk.lines {
            if line.kind == DiffLineKind::Header {
                let _ = writeln!(out, "  {}", line.text);
                continue;
            }
            let _ = writeln!(
                out,
                "{:>5} {:>5} {}{}",
                gutter(line.old_line_number),
                gutter(line.new_line_number),
                line.prefix(),
                line.text
            );
        }
    }
    let _ = writeln!(
        out,
        "{} file(s) changed, {} insertion(s)(+), {} deletion(s)(-)",
        summary.files, summary.additions, summary.deletions
    );
    out
}

fn gutter(number: Option<u32>) -> String {
    number.map(|n| n.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_empty_diff() {
        assert_eq!(render_hunks(&[], &DiffSummary::default()), "no changes\n");
    }

    #[test]
    fn test_render_hunks() {
        let raw = "diff --git a/x.ts b/x.ts\n@@ -1,2 +1,3 @@\n foo\n-bar\n+baz\n+qux\n";
        let hunks = revscope_diff::parse(raw, &[FileStat::new("x.ts", 2, 1)]);
        let summary = DiffSummary::from_hunks(&hunks);
        let text = render_hunks(&hunks, &summary);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "x.ts  +2 -1");
        assert_eq!(lines[1], "  @@ -1,2 +1,3 @@");
        assert_eq!(lines[2], "    1     1  foo");
        assert_eq!(lines[3], "    2       -bar");
        assert_eq!(lines[4], "          2 +baz");
        assert!(lines[6].starts_with("1 file(s) changed, 2 insertion(s)"));
    }
}
