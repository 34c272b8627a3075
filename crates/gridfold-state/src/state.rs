// SPDX-License-Identifier: Apache-2.0

//! The grid wire schema.
//!
//! Messages are declared with prost derives rather than generated from a
//! `.proto` file; tags and the result-code assignments are fixed and must
//! not change, since the dashboard decodes the same schema.

/// The newest-first time × test matrix produced per group.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Grid {
    #[prost(message, repeated, tag = "1")]
    pub columns: Vec<Column>,
    #[prost(message, repeated, tag = "2")]
    pub rows: Vec<Row>,
}

/// One build's worth of data: the column header.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Column {
    /// Build identifier, typically the build's base name under the prefix.
    #[prost(string, tag = "1")]
    pub build: String,
    /// Start time in fractional epoch seconds.
    #[prost(double, tag = "2")]
    pub started: f64,
    /// Ordered metadata values aligned with the group's name template.
    #[prost(string, repeated, tag = "3")]
    pub extra: Vec<String>,
    /// Free-form hint, e.g. the commit under test.
    #[prost(string, tag = "4")]
    pub hint: String,
}

/// One test across time.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Row {
    #[prost(string, tag = "1")]
    pub name: String,
    /// Equal to `name` unless deduplication forced uniqueness.
    #[prost(string, tag = "2")]
    pub id: String,
    /// Run-length-encoded result codes: `[code, length, code, length, ...]`.
    #[prost(int32, repeated, tag = "3")]
    pub results: Vec<i32>,
    #[prost(string, repeated, tag = "4")]
    pub cell_ids: Vec<String>,
    #[prost(string, repeated, tag = "5")]
    pub messages: Vec<String>,
    #[prost(string, repeated, tag = "6")]
    pub icons: Vec<String>,
    /// Sorted list of metric names present in this row.
    #[prost(string, repeated, tag = "7")]
    pub metric: Vec<String>,
    /// Sparse series parallel to `metric`.
    #[prost(message, repeated, tag = "8")]
    pub metrics: Vec<Metric>,
    #[prost(message, optional, tag = "9")]
    pub alert_info: Option<AlertInfo>,
}

/// Sparse metric series.
///
/// `indices` alternates `(start, run length)` pairs over occupied column
/// positions; the run lengths sum to `values.len()`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Metric {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(int32, repeated, tag = "2")]
    pub indices: Vec<i32>,
    #[prost(double, repeated, tag = "3")]
    pub values: Vec<f64>,
}

/// Outage descriptor attached to an alerting row.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AlertInfo {
    #[prost(int32, tag = "1")]
    pub fail_count: i32,
    #[prost(string, tag = "2")]
    pub fail_build_id: String,
    #[prost(message, optional, tag = "3")]
    pub fail_time: Option<Timestamp>,
    #[prost(string, tag = "4")]
    pub fail_test_id: String,
    #[prost(string, tag = "5")]
    pub failure_message: String,
    #[prost(string, tag = "6")]
    pub pass_build_id: String,
    #[prost(message, optional, tag = "7")]
    pub pass_time: Option<Timestamp>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Timestamp {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

/// Result codes carried in `Row.results`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TestResult {
    NoResult = 0,
    Pass = 1,
    PassWithErrors = 2,
    PassWithSkips = 3,
    Running = 4,
    CategorizedAbort = 5,
    Unknown = 6,
    Cancel = 7,
    Blocked = 8,
    TimedOut = 9,
    CategorizedFail = 10,
    BuildFail = 11,
    Fail = 12,
    Flaky = 13,
}
