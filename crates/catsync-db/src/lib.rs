//! Catsync DB - Identifier source backed by the MySQL catalog database
//!
//! This crate reads the identifiers of the categories and parts that should be
//! synchronized. It never writes to the database.
//!
//! # Overview
//!
//! The main components are:
//! - [`DbSettings`] and [`connect`] - connection settings and pool setup
//! - [`IdentifierRepository`] - implements `IdentifierSource` for the pipeline

mod repository;

pub use repository::{DEFAULT_MYSQL_PORT, DbSettings, IdentifierRepository, connect};
