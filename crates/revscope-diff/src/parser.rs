//! Unified diff parser.
//!
//! Turns the concatenated `diff --git` output returned by the versioning
//! backend into one [`DiffHunk`] per file, in source order. Parsing never
//! fails: anything that is not understood is skipped, so one corrupt section
//! cannot stop the rest of the diff from rendering.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::types::{DiffHunk, DiffLine, FileStat};

/// Line that opens a new file section.
const FILE_MARKER: &str = "diff --git ";

/// Lines that only carry metadata about a file section.
///
/// These are recognised between the file marker and the first `@@` marker.
/// Once a hunk is open, `--- x` is an ordinary deletion.
const METADATA_PREFIXES: &[&str] = &[
    "index ",
    "--- ",
    "+++ ",
    "old mode ",
    "new mode ",
    "new file mode ",
    "deleted file mode ",
    "similarity index ",
    "dissimilarity index ",
    "rename from ",
    "rename to ",
    "copy from ",
    "copy to ",
    "Binary files ",
];

/// The numbers in an `@@ -a,b +c,d @@` marker.
///
/// Omitted lengths default to 1. Unparsable numbers become 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkRange {
    pub old_start: u32,
    pub old_len: u32,
    pub new_start: u32,
    pub new_len: u32,
}

/// Parse a hunk range marker. Always succeeds.
pub fn parse_range_header(line: &str) -> HunkRange {
    let body = line.trim_start_matches('@');
    let body = body.split("@@").next().unwrap_or_default();

    let mut old = None;
    let mut new = None;
    for token in body.split_whitespace() {
        if let Some(range) = token.strip_prefix('-') {
            old.get_or_insert_with(|| parse_range(range));
        } else if let Some(range) = token.strip_prefix('+') {
            new.get_or_insert_with(|| parse_range(range));
        }
    }

    let (old_start, old_len) = old.unwrap_or((0, 0));
    let (new_start, new_len) = new.unwrap_or((0, 0));
    HunkRange {
        old_start,
        old_len,
        new_start,
        new_len,
    }
}

fn parse_range(range: &str) -> (u32, u32) {
    let mut parts = range.splitn(2, ',');
    let start = parts
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();
    let len = match parts.next() {
        Some(len) => len.parse().unwrap_or_default(),
        None => 1,
    };
    (start, len)
}

/// Parse a raw unified diff into per-file hunks.
///
/// `stats` supplies the per-file counts copied onto each hunk; files missing
/// from `stats` get 0/0.
pub fn parse(raw: &str, stats: &[FileStat]) -> Vec<DiffHunk> {
    let lookup = StatLookup::new(stats);
    let mut hunks = Vec::new();
    let mut current: Option<Section> = None;

    for line in raw.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(rest) = line.strip_prefix(FILE_MARKER) {
            if let Some(section) = current.take() {
                hunks.push(section.finish());
            }
            let (old_path, new_path) = marker_paths(rest);
            let (additions, deletions) = lookup.find(&old_path, new_path.as_deref());
            current = Some(Section::open(old_path, additions, deletions));
            continue;
        }

        match current.as_mut() {
            Some(section) => section.feed(line),
            None => trace!(line, "skipping line outside any file section"),
        }
    }

    if let Some(section) = current.take() {
        hunks.push(section.finish());
    }

    hunks
}

/// Per-path stats keyed for lookup. The first entry for a path wins.
struct StatLookup<'a> {
    by_path: HashMap<&'a str, (u32, u32)>,
}

impl<'a> StatLookup<'a> {
    fn new(stats: &'a [FileStat]) -> Self {
        let mut by_path = HashMap::with_capacity(stats.len());
        for stat in stats {
            by_path
                .entry(stat.path.as_str())
                .or_insert((stat.additions, stat.deletions));
        }
        Self { by_path }
    }

    /// Look up by old path, then by new path (renames are often keyed by the
    /// destination).
    fn find(&self, old_path: &str, new_path: Option<&str>) -> (u32, u32) {
        self.by_path
            .get(old_path)
            .or_else(|| new_path.and_then(|p| self.by_path.get(p)))
            .copied()
            .unwrap_or_default()
    }
}

/// Extract the paths from the text after `diff --git `.
///
/// With the usual `a/` and `b/` prefixes the split point is ambiguous when a
/// path contains ` b/`, so a split that yields identical paths is preferred.
fn marker_paths(rest: &str) -> (String, Option<String>) {
    let rest = rest.trim();

    let Some(after_a) = rest
        .strip_prefix("a/")
        .or_else(|| rest.strip_prefix("\"a/"))
    else {
        // `diff.noprefix` style output.
        let mut parts = rest.split_whitespace();
        let old = parts.next().unwrap_or_default().to_owned();
        return (old, parts.next().map(str::to_owned));
    };

    let splits: Vec<(&str, &str)> = after_a
        .match_indices(" b/")
        .chain(after_a.match_indices(" \"b/"))
        .map(|(idx, sep)| (&after_a[..idx], &after_a[idx + sep.len()..]))
        .collect();

    let chosen = splits
        .iter()
        .find(|(old, new)| unquote(old) == unquote(new))
        .or_else(|| splits.first());

    match chosen {
        Some((old, new)) => (unquote(old).to_owned(), Some(unquote(new).to_owned())),
        None => (unquote(after_a).to_owned(), None),
    }
}

fn unquote(path: &str) -> &str {
    path.trim_end_matches('"')
}

/// Accumulator for the file section being parsed.
struct Section {
    hunk: DiffHunk,
    in_hunk: bool,
    old_line: u32,
    new_line: u32,
}

impl Section {
    fn open(file: String, additions: u32, deletions: u32) -> Self {
        Self {
            hunk: DiffHunk::new(file, additions, deletions),
            in_hunk: false,
            old_line: 0,
            new_line: 0,
        }
    }

    fn feed(&mut self, line: &str) {
        if line.starts_with("@@") {
            let range = parse_range_header(line);
            self.old_line = range.old_start;
            self.new_line = range.new_start;
            self.in_hunk = true;
            self.hunk.lines.push(DiffLine::header(line));
            return;
        }

        if !self.in_hunk {
            if !METADATA_PREFIXES.iter().any(|p| line.starts_with(p)) {
                trace!(file = %self.hunk.file, line, "skipping unrecognised header line");
            }
            return;
        }

        let mut chars = line.chars();
        match chars.next() {
            Some('+') => {
                let new = self.take_new();
                self.hunk.lines.push(DiffLine::addition(chars.as_str(), new));
            }
            Some('-') => {
                let old = self.take_old();
                self.hunk.lines.push(DiffLine::deletion(chars.as_str(), old));
            }
            // Blank context lines often lose their leading space in transit.
            Some(' ') | None => {
                let old = self.take_old();
                let new = self.take_new();
                self.hunk
                    .lines
                    .push(DiffLine::context(chars.as_str(), old, new));
            }
            // `\ No newline at end of file` and anything unexpected.
            Some(_) => trace!(file = %self.hunk.file, line, "skipping inert hunk line"),
        }
    }

    fn take_old(&mut self) -> u32 {
        let n = self.old_line;
        self.old_line = self.old_line.saturating_add(1);
        n
    }

    fn take_new(&mut self) -> u32 {
        let n = self.new_line;
        self.new_line = self.new_line.saturating_add(1);
        n
    }

    fn finish(self) -> DiffHunk {
        self.hunk
    }
}
