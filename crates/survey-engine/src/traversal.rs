use survey_spec::{AnswerSet, CatalogSpec, PredicateTable};

/// Navigation direction; only affects which way scans go and how the
/// renderer animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }

    fn offset(self, index: usize) -> Option<usize> {
        match self {
            Direction::Forward => index.checked_add(1),
            Direction::Backward => index.checked_sub(1),
        }
    }
}

/// Next resting position strictly past `position` in `direction`.
///
/// Section markers and steps whose condition is false for `answers` are
/// skipped. Returns `None` when the scan runs off either end of the catalog.
pub fn find_next(
    catalog: &CatalogSpec,
    predicates: &PredicateTable,
    answers: &AnswerSet,
    position: usize,
    direction: Direction,
) -> Option<usize> {
    scan(catalog, predicates, answers, position, direction, false)
}

/// Like [`find_next`], but stops on the first section marker crossed so the
/// navigator can pass through it.
pub(crate) fn find_stop(
    catalog: &CatalogSpec,
    predicates: &PredicateTable,
    answers: &AnswerSet,
    position: usize,
    direction: Direction,
) -> Option<usize> {
    scan(catalog, predicates, answers, position, direction, true)
}

fn scan(
    catalog: &CatalogSpec,
    predicates: &PredicateTable,
    answers: &AnswerSet,
    position: usize,
    direction: Direction,
    stop_on_markers: bool,
) -> Option<usize> {
    let mut index = direction.offset(position)?;
    while let Some(step) = catalog.step(index) {
        if step.is_section_marker() {
            if stop_on_markers {
                return Some(index);
            }
        } else if predicates.condition_holds(&step.id, answers) {
            return Some(index);
        }
        index = direction.offset(index)?;
    }
    None
}
