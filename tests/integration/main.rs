//! Integration tests for typed-pipeline.
//!
//! End-to-end runs over fixture files and temporary files:
//!
//! ```bash
//! cargo test -p integration-tests
//! ```

mod common;
mod file_pipeline_test;
mod readable_test;
