//! HTTP job dispatcher
//!
//! Accepts job operations over a single HTTP endpoint and records one-off and
//! recurring jobs, plus their pause flags, in a hash/set job store for a
//! separate executor to run.

#![allow(missing_docs)]

pub mod api;
pub mod app;
pub mod boot;
pub mod cli;
pub mod commands;
pub mod config;
pub mod database;
pub mod environment;
pub mod jobs;
pub mod router;
pub mod setup_tracing;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod tests;
