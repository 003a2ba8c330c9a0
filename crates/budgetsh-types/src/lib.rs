//! Foundation types for budgetsh.
//!
//! This crate holds the types shared by every budgetsh crate: the error
//! enum (parse, registry, handler and I/O failures) and the local shell
//! configuration.

pub mod config;
pub mod error;
