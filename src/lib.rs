//! Work breakdown structure planning.
//!
//! Features come in (from an AI backend or by hand), the
//! [`engine::HourAllocationEngine`] turns them into fixed-ratio hour
//! breakdowns and a flat, dependency-linked task list, and the exporters
//! render that list for spreadsheets and project tools.

pub mod ai;
pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod export;
pub mod mcp;
pub mod models;
pub mod session;
