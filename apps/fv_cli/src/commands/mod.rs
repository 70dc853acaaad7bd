// apps/fv_cli/src/commands/mod.rs

//! 子命令

pub mod config;
pub mod export;
