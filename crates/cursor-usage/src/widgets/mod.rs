//! TUI widget modules

pub mod header;
pub mod popup;
pub mod predictions;
pub mod progress_bars;
pub mod shortcuts;
pub mod statistics;
pub mod time_range;

pub use header::*;
pub use popup::*;
pub use predictions::*;
pub use progress_bars::*;
pub use shortcuts::*;
pub use statistics::*;
pub use time_range::*;
