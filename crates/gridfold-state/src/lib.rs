#![forbid(unsafe_code)]

mod codec;
mod result;
mod state;

pub use codec::{marshal, unmarshal, validate, CodecError};
pub use result::{coalesce, result_iter, ResultIter};
pub use state::{AlertInfo, Column, Grid, Metric, Row, TestResult, Timestamp};

pub const CRATE_NAME: &str = "gridfold-state";
