//! End-to-end tests of the `sql-assistant` binary.

pub mod headless_test;
