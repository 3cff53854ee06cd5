use std::collections::HashSet;
use std::path::Path;

use ffindex_cache::{HotMap, KeyedStore};

/// `NFILES = Σ(eᵢ−sᵢ)/DUR`, the count of underlying frame files a
/// coalesced interval list represents.
fn nfiles(intervals: &[ffindex_core::Interval], duration: u64) -> u64 {
    if duration == 0 {
        return 0;
    }
    intervals.iter().map(|iv| iv.len()).sum::<u64>() / duration
}

fn braces(intervals: &[ffindex_core::Interval]) -> String {
    let mut parts = Vec::with_capacity(intervals.len() * 2);
    for iv in intervals {
        parts.push(iv.start.to_string());
        parts.push(iv.end.to_string());
    }
    format!("{{{}}}", parts.join(" "))
}

/// One line per `(directory, SFDE)`, sorted lexicographically, trailing
/// newline after the last line — empty index emits the empty string.
pub fn render_ldas(store: &dyn KeyedStore, hot: &HotMap, extensions: &HashSet<String>) -> String {
    render_lines(store, hot, extensions, |dir, sfde, mtime, files, ivs| {
        format!(
            "{dir},{},{},1,{} {mtime} {files} {}",
            sfde.site,
            sfde.frametype,
            sfde.duration,
            braces(ivs)
        )
    })
}

/// Same as `ldas` but the key field preserves the extension:
/// `DIR,SITE,FT,x,DUR,EXT`.
pub fn render_pmdc(store: &dyn KeyedStore, hot: &HotMap, extensions: &HashSet<String>) -> String {
    render_lines(store, hot, extensions, |dir, sfde, mtime, files, ivs| {
        format!(
            "{dir},{},{},x,{},{} {mtime} {files} {}",
            sfde.site,
            sfde.frametype,
            sfde.duration,
            sfde.extension,
            braces(ivs)
        )
    })
}

fn render_lines(
    store: &dyn KeyedStore,
    hot: &HotMap,
    extensions: &HashSet<String>,
    format_line: impl Fn(&str, &ffindex_core::Sfde, i64, u64, &[ffindex_core::Interval]) -> String,
) -> String {
    let mut lines = Vec::new();

    for (dir, fragment) in store.iter() {
        let mtime = hot.get(Path::new(dir)).copied().unwrap_or(0);
        for (sfde, intervals) in fragment {
            if !extensions.contains(&sfde.extension) {
                continue;
            }
            let files = nfiles(intervals, sfde.duration);
            lines.push(format_line(dir, sfde, mtime, files, intervals));
        }
    }

    lines.sort();
    if lines.is_empty() {
        String::new()
    } else {
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}
