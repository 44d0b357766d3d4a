#![allow(missing_docs)]

pub mod answers;
pub mod expr;
pub mod predicate;
pub mod progress;
pub mod spec;
pub mod template;
pub mod validate;

pub use answers::AnswerSet;
pub use expr::Expr;
pub use predicate::{ConditionFn, PredicateTable, ValidatorFn};
pub use progress::{ProgressPosition, current_section, progress_position, progress_steps};
pub use spec::{
    CatalogError, CatalogSpec, Constraint, OptionSpec, SectionSpec, StepId, StepSpec, StepType,
};
pub use template::{TemplateEngine, TemplateError, register_default_helpers};
pub use validate::{
    CONSENT_MESSAGE, CatalogIssue, CatalogReport, CompiledConstraint, DEFAULT_VALIDATION_MESSAGE,
    StepCheck, check_catalog, validate_step,
};
