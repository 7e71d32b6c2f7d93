//! Library-level integration tests.

pub mod execution_test;
pub mod generation_test;
pub mod scenario_test;
pub mod schema_test;
pub mod service_test;
pub mod session_test;
