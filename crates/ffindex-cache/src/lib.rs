pub mod atomic;
pub mod fragment;
pub mod lock;
pub mod namespace;
pub mod store;

pub use fragment::{insert_frame, Fragment};
pub use lock::LockGuard;
pub use namespace::{Header, HotMap, Namespace};
pub use store::{FileIndexStore, KeyedStore, MemoryIndexStore};
