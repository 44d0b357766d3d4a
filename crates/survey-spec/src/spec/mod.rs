pub mod catalog;
pub mod step;

pub use catalog::{CatalogError, CatalogSpec, SectionSpec};
pub use step::{Constraint, OptionSpec, StepId, StepSpec, StepType};
