//! # LexDB Testkit
//!
//! Test utilities for LexDB.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - A sample `Person` / `Address` schema with typed entities
//! - Property-based test generators using proptest
//! - A model-checking harness for index consistency
//! - Known-answer vectors for the key encoding
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lexdb_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_database() {
//!     with_temp_db(person_schema(), |db| {
//!         let people = db.collection::<Person>().unwrap();
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod schemas;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::schemas::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use schemas::*;
pub use vectors::*;
