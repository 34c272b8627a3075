#![forbid(unsafe_code)]

pub mod duration;
pub mod error;
pub mod natural;

pub use duration::{days, parse_duration};
pub use error::ExitCode;
pub use natural::{natural_cmp, natural_less};

pub const CRATE_NAME: &str = "gridfold-core";
