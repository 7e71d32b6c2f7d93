//! Query execution, its outcome, and how results are displayed.

pub mod executor;
pub mod review;
pub mod types;
pub mod view;

pub use executor::ExecutionController;
pub use review::{DraftReview, ReviewController, EXPLANATION_FAILED_FALLBACK};
pub use types::{display_value, ExecutionOutcome, ResultSet, Row, EXECUTION_FAILED_FALLBACK};
pub use view::{summary_label, truncation_note, ResultView, EXECUTION_LIMIT, PREVIEW_ROWS};
