use std::time::Duration;

/// Delays used for the navigator's scheduled transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub section_header: Duration,
    pub loading: Duration,
    pub auto_advance: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        crate::config::EngineConfig::default().timings()
    }
}

impl Timings {
    /// All delays zero; useful for non-interactive runs.
    pub fn immediate() -> Self {
        Self {
            section_header: Duration::ZERO,
            loading: Duration::ZERO,
            auto_advance: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// First-visit section header is on screen; skip the marker when it fires.
    SectionHeader,
    /// Loading step pacing; jump to the results step when it fires.
    Loading,
    /// Info step or auto-advancing choice; advance when it fires.
    AutoAdvance,
}

impl TimerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerKind::SectionHeader => "section_header",
            TimerKind::Loading => "loading",
            TimerKind::AutoAdvance => "auto_advance",
        }
    }
}

/// A scheduled callback handed to the host.
///
/// Only the most recently scheduled timer of the current generation is live;
/// firing anything else is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub id: u64,
    pub kind: TimerKind,
    pub generation: u64,
    pub delay: Duration,
}

/// Waits out the delay of a timer on the tokio clock.
pub async fn elapse(timer: &Timer) {
    if !timer.delay.is_zero() {
        tokio::time::sleep(timer.delay).await;
    }
}

/// Waits out and fires pending timers until the navigator schedules no more.
///
/// Returns how many timers fired.
pub async fn run_pending(navigator: &mut crate::navigator::Navigator) -> usize {
    let mut fired = 0;
    while let Some(timer) = navigator.pending_timer() {
        elapse(&timer).await;
        if !navigator.fire(timer) {
            break;
        }
        fired += 1;
    }
    fired
}
