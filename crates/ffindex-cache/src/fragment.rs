use std::collections::HashMap;

use ffindex_core::{segments, FrameName, Interval, Sfde};

/// One directory's contribution to the index: `Sfde -> coalesced interval list`.
pub type Fragment = HashMap<Sfde, Vec<Interval>>;

/// Insert a parsed frame file's interval into the fragment under its Sfde.
pub fn insert_frame(fragment: &mut Fragment, frame: &FrameName) {
    let entry = fragment.entry(frame.sfde()).or_default();
    segments::insert(entry, frame.interval());
}
