//! Catsync CLI - command-line configuration for the `catsync` binary.

pub mod config;

pub use config::{Command, Config, EntityArg, SyncArgs, version_info};
