//! hostedge Shared Types and Utilities
//!
//! This crate contains the tenant, session and error types shared between the
//! edge router and the internal hosting endpoints, plus the database queries
//! backing them.

pub mod db;
pub mod error;
pub mod types;

pub use db::*;
pub use error::*;
pub use types::*;
