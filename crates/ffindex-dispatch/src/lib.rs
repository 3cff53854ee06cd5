pub mod driver;
pub mod payload;
pub mod run_guard;
pub mod worker;

pub use driver::{run_multi_root, run_single_root, DispatchOutcome};
pub use payload::IpcPayload;
pub use run_guard::{create_scratch_dir, RunGuard};
