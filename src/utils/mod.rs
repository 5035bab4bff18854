pub mod constants;
pub mod dates;
pub mod progress;

pub use constants::*;
pub use dates::{parse_date, parse_date_or_none};
pub use progress::ProgressReporter;
