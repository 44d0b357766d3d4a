use crate::spec::catalog::CatalogSpec;
use crate::spec::step::StepSpec;

/// Progress-bar counters for the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressPosition {
    /// 1-based slot of the current step, 0 when the step has no slot.
    pub current: usize,
    pub total: usize,
    pub visible: bool,
}

/// Steps that occupy a slot on the progress bar.
///
/// Conditional steps are counted even when they end up skipped.
pub fn progress_steps(catalog: &CatalogSpec) -> Vec<&StepSpec> {
    catalog
        .steps
        .iter()
        .filter(|step| step.kind.counts_toward_progress())
        .collect()
}

pub fn progress_position(catalog: &CatalogSpec, position: usize) -> ProgressPosition {
    let steps = progress_steps(catalog);
    let total = steps.len();
    let Some(step) = catalog.step(position) else {
        return ProgressPosition {
            current: 0,
            total,
            visible: false,
        };
    };

    let current = if step.section.is_none() || step.kind.is_chrome_free() {
        0
    } else {
        steps
            .iter()
            .position(|candidate| candidate.id == step.id)
            .map_or(0, |index| index + 1)
    };

    ProgressPosition {
        current,
        total,
        visible: position > 0 && !step.kind.is_chrome_free(),
    }
}

/// Section the position belongs to, found by walking back to the nearest
/// marker or sectioned step.
pub fn current_section(catalog: &CatalogSpec, position: usize) -> Option<&str> {
    let step = catalog.step(position)?;
    if step.kind.is_chrome_free() && !step.is_section_marker() {
        return None;
    }
    catalog.steps[..=position]
        .iter()
        .rev()
        .find(|candidate| candidate.is_section_marker() || candidate.section.is_some())
        .and_then(|candidate| candidate.section.as_deref())
}
