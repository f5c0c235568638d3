//! HTTP middleware layers.

pub mod rate_limit;
