pub mod dcfs;
pub mod output;
pub mod text;

pub use output::write_output;

use std::collections::HashSet;

use ffindex_cache::{HotMap, KeyedStore};
use ffindex_core::Protocol;

/// Render `store` (filtered to `extensions`) in `protocol`, ready to hand
/// to [`write_output`].
pub fn render(
    protocol: Protocol,
    store: &dyn KeyedStore,
    hot: &HotMap,
    extensions: &HashSet<String>,
) -> Vec<u8> {
    match protocol {
        Protocol::Ldas => text::render_ldas(store, hot, extensions).into_bytes(),
        Protocol::Pmdc => text::render_pmdc(store, hot, extensions).into_bytes(),
        Protocol::Dcfs => dcfs::render_dcfs(store, extensions),
    }
}
