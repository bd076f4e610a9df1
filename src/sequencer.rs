use std::sync::atomic::{AtomicU64, Ordering};


/// Hands out tickets for successive rolls so that a rolling animation can
/// tell whether its ticks still belong to the newest roll.
///
/// Starting a roll with [`RollSequencer::begin()`] supersedes every ticket
/// issued before it. A driver checks [`RollSequencer::is_current()`] before
/// applying a tick and drops the tick otherwise.
///
/// # Examples
/// ```
/// use dice_formula::RollSequencer;
///
/// let sequencer = RollSequencer::new();
/// let first = sequencer.begin();
/// assert!(sequencer.is_current(first));
///
/// let second = sequencer.begin();
/// assert!(!sequencer.is_current(first));
/// assert!(sequencer.is_current(second));
/// ```
#[derive(Debug, Default)]
pub struct RollSequencer {
    generation: AtomicU64
}

/// Proof that a roll was started, see [`RollSequencer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RollTicket {
    generation: u64
}

impl RollTicket {
    /// Generation this ticket was issued for, starting at 1.
    pub const fn generation(self) -> u64 {
        self.generation
    }
}

impl RollSequencer {
    /// A sequencer that has issued no ticket yet.
    pub const fn new() -> Self {
        Self { generation: AtomicU64::new(0) }
    }

    /// Starts a new roll, superseding all outstanding tickets.
    pub fn begin(&self) -> RollTicket {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(generation, "roll started");
        RollTicket { generation }
    }

    /// Supersedes all outstanding tickets without starting a roll.
    pub fn cancel(&self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(generation, "rolls cancelled");
    }

    /// Whether `ticket` belongs to the newest roll.
    pub fn is_current(&self, ticket: RollTicket) -> bool {
        self.generation.load(Ordering::Acquire) == ticket.generation
    }
}


/// Where `value` sits between 0 and `max_total`, clamped to `[0, 1]`.
///
/// Returns 0 when `max_total` is not positive, as for the empty formula.
///
/// # Examples
/// ```
/// use dice_formula::progress;
///
/// assert_eq!(progress(3, 12), 0.25);
/// assert_eq!(progress(-4, 12), 0.0);
/// assert_eq!(progress(20, 12), 1.0);
/// assert_eq!(progress(0, 0), 0.0);
/// ```
pub fn progress(value: i32, max_total: i32) -> f32 {
    if max_total <= 0 {
        return 0.0;
    }

    (value as f32 / max_total as f32).clamp(0.0, 1.0)
}
