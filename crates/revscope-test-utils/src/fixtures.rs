//! Test fixtures: version lists and sample diffs.

use revscope_core::VersionEntry;
use revscope_diff::FileStat;

/// A two-file diff: `x.ts` gains two lines and loses one, `docs/readme.md`
/// gains one.
pub const SAMPLE_DIFF: &str = "\
diff --git a/x.ts b/x.ts
index 1111111..2222222 100644
--- a/x.ts
+++ b/x.ts
@@ -1,2 +1,3 @@
 foo
-bar
+baz
+qux
diff --git a/docs/readme.md b/docs/readme.md
--- a/docs/readme.md
+++ b/docs/readme.md
@@ -3 +3,2 @@
 intro
+more
";

/// Per-file stats matching [`SAMPLE_DIFF`].
pub fn sample_stats() -> Vec<FileStat> {
    vec![
        FileStat::new("x.ts", 2, 1),
        FileStat::new("docs/readme.md", 1, 0),
    ]
}

/// A version list, newest first, with the last entry flagged initial.
pub fn versions(shas: &[&str]) -> Vec<VersionEntry> {
    let count = shas.len();
    shas.iter()
        .enumerate()
        .map(|(idx, sha)| {
            let mut entry = VersionEntry::new(*sha, format!("version {sha}"));
            entry.author = "tester".to_string();
            entry.timestamp = 1_700_000_000 - idx as i64 * 60;
            entry.is_initial = idx + 1 == count;
            entry
        })
        .collect()
}
