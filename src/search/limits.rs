//! Budget tracking and cooperative interruption.
//!
//! The engine runs to completion on one thread; the only suspension points
//! are the checks at the top of each main-loop iteration. The tracker owns
//! those checks: node and transposition caps, the wall-clock deadline, the
//! caller's cancellation flag, and the periodic progress callback. A
//! callback answering `false` is treated exactly like the cancel flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Counters reported in every outcome and to the progress callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes_expanded: u64,
    pub nodes_generated: u64,
    pub dead_square_pruned: u64,
    pub freeze_pruned: u64,
    pub corral_pruned: u64,
    pub bipartite_pruned: u64,
    pub duplicates_pruned: u64,
    pub advisor_claims: u64,
    pub feature_cells: u64,
    pub wall_ms: u64,
}

/// Which cap ended the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitReason {
    Nodes,
    Time,
    Memory,
}

/// Progress sink. The default implementation observes nothing and never
/// stops the search.
pub trait ProgressLike {
    /// Called every progress interval; return `false` to stop the search.
    fn report(&mut self, stats: &SearchStats) -> bool {
        let _ = stats;
        true
    }
}

/// The no-op progress sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressLike for NoProgress {}

/// How an interrupted main loop ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interrupt {
    Limit(LimitReason),
    Cancelled,
}

pub(crate) struct Tracker<'a> {
    started: Instant,
    deadline: Option<Instant>,
    max_nodes: u64,
    max_tt_entries: usize,
    cancel: Option<&'a AtomicBool>,
    progress_interval: u64,
    next_report: u64,
    pub stats: SearchStats,
}

impl<'a> Tracker<'a> {
    pub fn new(
        max_nodes: u64,
        max_millis: u64,
        max_tt_entries: usize,
        progress_interval: u64,
        cancel: Option<&'a AtomicBool>,
    ) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: started.checked_add(Duration::from_millis(max_millis)),
            max_nodes,
            max_tt_entries,
            cancel,
            progress_interval,
            next_report: progress_interval,
            stats: SearchStats::default(),
        }
    }

    #[inline]
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Top-of-loop check. `tt_entries` is the current transposition-table
    /// population (the dominant allocation).
    pub fn poll<P: ProgressLike>(
        &mut self,
        tt_entries: usize,
        progress: &mut P,
    ) -> Option<Interrupt> {
        if let Some(flag) = self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Some(Interrupt::Cancelled);
            }
        }
        if self.stats.nodes_generated >= self.max_nodes {
            return Some(Interrupt::Limit(LimitReason::Nodes));
        }
        if tt_entries >= self.max_tt_entries {
            return Some(Interrupt::Limit(LimitReason::Memory));
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Some(Interrupt::Limit(LimitReason::Time));
            }
        }
        if self.stats.nodes_expanded >= self.next_report {
            self.next_report = self.stats.nodes_expanded + self.progress_interval;
            self.stats.wall_ms = self.elapsed_ms();
            if !progress.report(&self.stats) {
                return Some(Interrupt::Cancelled);
            }
        }
        None
    }

    /// Final stamp before the stats leave the engine.
    pub fn finish(&mut self, feature_cells: usize) -> SearchStats {
        self.stats.feature_cells = feature_cells as u64;
        self.stats.wall_ms = self.elapsed_ms();
        self.stats
    }
}
