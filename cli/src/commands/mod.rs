//! CLI Commands

pub mod compile;
pub mod config;
