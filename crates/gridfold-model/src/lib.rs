#![forbid(unsafe_code)]

mod config;
mod group;

pub use config::{Config, ValidationError};
pub use group::{AlertPolicy, NameTemplate, TestGroup, TESTS_NAME_PART};

pub const CRATE_NAME: &str = "gridfold-model";
