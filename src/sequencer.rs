//! Peel Pass Sequencing State Machine
//!
//! Pure bookkeeping for the per-frame peeling loop: which buffer set reads,
//! which writes, which clears are due, and whether the lifecycle hooks were
//! called in a legal order. No GPU types live here — the controller asks this
//! type for a [`PassPlan`] and then issues the corresponding commands.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──begin_draw_loop──▶ Idle ──begin_pass──▶ InPass
//!                                     ▲                      │
//!                                     └──────end_pass────────┘
//! ```
//!
//! `end_draw_loop` is legal only in `Idle` after at least one completed pass.
//! Out-of-order calls are programmer errors: fatal in debug builds, logged
//! no-ops in release (the caller receives `None`/`false` and must skip the
//! corresponding GPU work).

/// Identifies one of the two ping-pong buffer sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetId {
    /// The first buffer set.
    A,
    /// The second buffer set.
    B,
}

impl SetId {
    /// The other set.
    #[inline]
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Array index of this set.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

/// What the controller must do to start one peeling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassPlan {
    /// Set holding last pass's results (or the initial full range on pass 0).
    pub read: SetId,
    /// Set receiving this pass's output. Always cleared before drawing.
    pub write: SetId,
    /// `true` on pass 0 only: the read set must additionally be cleared to
    /// the full unresolved depth range. Later passes must leave the read set
    /// alone — it carries the accumulated front color and the narrowed depth
    /// interval from the previous pass.
    pub clear_read: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Uninitialized,
    Idle,
    InPass,
}

/// The peel pass sequencer.
#[derive(Debug)]
pub struct PassSequencer {
    state: LoopState,
    /// Set that will read on the *next* pass swap.
    read: SetId,
    /// Index expected by the next `begin_pass` call.
    next_pass: u32,
    /// Passes completed in the current draw loop.
    completed: u32,
}

impl Default for PassSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl PassSequencer {
    /// Creates a sequencer in the `Uninitialized` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: LoopState::Uninitialized,
            // First swap makes A the reader, matching the buffer labels.
            read: SetId::B,
            next_pass: 0,
            completed: 0,
        }
    }

    /// Returns `true` until the first `begin_draw_loop` completes.
    #[inline]
    #[must_use]
    pub fn is_uninitialized(&self) -> bool {
        self.state == LoopState::Uninitialized
    }

    /// Returns `true` between `begin_pass` and `end_pass`.
    #[inline]
    #[must_use]
    pub fn in_pass(&self) -> bool {
        self.state == LoopState::InPass
    }

    /// Current read set. Meaningful only between `begin_pass` and the next
    /// swap.
    #[inline]
    #[must_use]
    pub fn read_set(&self) -> SetId {
        self.read
    }

    /// Current write set.
    #[inline]
    #[must_use]
    pub fn write_set(&self) -> SetId {
        self.read.other()
    }

    /// Starts a frame's peeling loop. Idempotent with respect to
    /// initialization; resets per-loop pass bookkeeping.
    ///
    /// A pass left open by an aborted previous frame is discarded here —
    /// its write buffers were cleared but never blended, which is safe to
    /// throw away and never safe to treat as resolved.
    pub fn begin_draw_loop(&mut self) -> bool {
        if self.state == LoopState::InPass {
            log::warn!("begin_draw_loop: discarding a pass left open by an aborted frame");
        }
        self.state = LoopState::Idle;
        self.next_pass = 0;
        self.completed = 0;
        true
    }

    /// Swaps buffer roles and plans pass `pass_index`.
    ///
    /// Passes must be begun in order from 0 within each draw loop, and a
    /// pass must be ended before the next begins. Violations return `None`.
    pub fn begin_pass(&mut self, pass_index: u32) -> Option<PassPlan> {
        if self.state != LoopState::Idle {
            debug_assert!(
                false,
                "begin_pass({pass_index}) called in invalid state {:?}",
                self.state
            );
            log::error!(
                "begin_pass({pass_index}) called in invalid state {:?}; ignoring",
                self.state
            );
            return None;
        }
        if pass_index != self.next_pass {
            debug_assert!(
                false,
                "begin_pass({pass_index}) out of order, expected {}",
                self.next_pass
            );
            log::error!(
                "begin_pass({pass_index}) out of order (expected {}); ignoring",
                self.next_pass
            );
            return None;
        }

        self.read = self.read.other();
        self.state = LoopState::InPass;

        Some(PassPlan {
            read: self.read,
            write: self.write_set(),
            clear_read: pass_index == 0,
        })
    }

    /// Closes the current pass. Returns `false` if no pass is open.
    pub fn end_pass(&mut self) -> bool {
        if self.state != LoopState::InPass {
            debug_assert!(false, "end_pass without a matching begin_pass");
            log::error!("end_pass without a matching begin_pass; ignoring");
            return false;
        }
        self.state = LoopState::Idle;
        self.next_pass += 1;
        self.completed += 1;
        true
    }

    /// Closes the draw loop. Returns `false` when no pass ran (nothing to
    /// composite) or a pass is still open.
    pub fn end_draw_loop(&mut self) -> bool {
        if self.state != LoopState::Idle || self.completed == 0 {
            debug_assert!(
                false,
                "end_draw_loop in invalid state {:?} ({} passes completed)",
                self.state,
                self.completed
            );
            log::error!(
                "end_draw_loop in invalid state {:?} ({} passes completed); ignoring",
                self.state,
                self.completed
            );
            return false;
        }
        self.next_pass = 0;
        self.completed = 0;
        true
    }
}
