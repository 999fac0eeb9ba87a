//! Core types and traits for the sazonal star-schema loader.
//!
//! This crate is free of database dependencies. Backends implement
//! [`session::ConnectionProvider`] and [`session::Session`]; the
//! [`pipeline::Pipeline`] drives them.

pub mod catalog;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod mapping;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod session;

pub use error::{Error, Result};
