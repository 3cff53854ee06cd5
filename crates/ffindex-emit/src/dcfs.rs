use std::collections::{HashMap, HashSet};

use ffindex_cache::KeyedStore;
use ffindex_core::Interval;

/// Three self-describing `bincode` records, in order: `ext -> {frametype}`,
/// `(ext, frametype) -> {site}`, `(ext, frametype, site) -> [(dir, dur,
/// intervals)]`. Each record is length-prefixed (`u64` little-
/// endian byte count) so a peer can read them back independently without
/// parsing the whole file up front.
pub fn render_dcfs(store: &dyn KeyedStore, extensions: &HashSet<String>) -> Vec<u8> {
    let mut by_ext: HashMap<String, HashSet<String>> = HashMap::new();
    let mut by_ext_ft: HashMap<(String, String), HashSet<String>> = HashMap::new();
    let mut by_ext_ft_site: HashMap<(String, String, String), Vec<(String, u64, Vec<Interval>)>> =
        HashMap::new();

    for (dir, fragment) in store.iter() {
        for (sfde, intervals) in fragment {
            if !extensions.contains(&sfde.extension) {
                continue;
            }

            by_ext
                .entry(sfde.extension.clone())
                .or_default()
                .insert(sfde.frametype.clone());
            by_ext_ft
                .entry((sfde.extension.clone(), sfde.frametype.clone()))
                .or_default()
                .insert(sfde.site.clone());
            by_ext_ft_site
                .entry((
                    sfde.extension.clone(),
                    sfde.frametype.clone(),
                    sfde.site.clone(),
                ))
                .or_default()
                .push((dir.to_string(), sfde.duration, intervals.clone()));
        }
    }

    let mut out = Vec::new();
    append_record(&mut out, &by_ext);
    append_record(&mut out, &by_ext_ft);
    append_record(&mut out, &by_ext_ft_site);
    out
}

fn append_record<T: serde::Serialize>(out: &mut Vec<u8>, record: &T) {
    let bytes = bincode::serialize(record).expect("in-memory dcfs record always encodes");
    out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(&bytes);
}

/// Read one length-prefixed record back out of a `dcfs` byte stream,
/// returning the record and the remaining bytes.
pub fn read_record<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> anyhow::Result<(T, &[u8])> {
    anyhow::ensure!(bytes.len() >= 8, "truncated dcfs record length prefix");
    let (len_bytes, rest) = bytes.split_at(8);
    let len = u64::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
    anyhow::ensure!(rest.len() >= len, "truncated dcfs record body");
    let (body, rest) = rest.split_at(len);
    let record = bincode::deserialize(body)?;
    Ok((record, rest))
}
