//! C6: the validation pipeline. Runs over each extraction batch (C7) and
//! over snapshots (C12).

pub mod cross_source;
pub mod diagnostics;
pub mod geoid;
pub mod geometry_checks;
pub mod registry;
pub mod report;

pub use cross_source::{reconcile, CrossSourceDiscrepancy};
pub use diagnostics::{classify_mismatch, MismatchCause};
pub use geoid::check_geoid;
pub use geometry_checks::check_geometry;
pub use registry::{check_count, CountMismatch, ExpectedCountRegistry, Severity};
pub use report::ValidationReport;
