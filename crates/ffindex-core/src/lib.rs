pub mod cli;
pub mod error;
pub mod frame;
pub mod segments;

pub use cli::{parse_args, Args, Protocol};
pub use error::{ExitReason, FfindexError, FfindexResult};
pub use frame::{parse_frame_name, FrameName, Interval, Sfde};
pub use segments::insert;
