//! Statistics & dump: counters the driver reports after a run, plus a
//! diagnostic dump sink.

use serde::Serialize;
use std::fmt;

/// Counters accumulated across one `thread_through_all_blocks` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub jumps_threaded: u64,
    pub duplicates_created: u64,
    pub paths_cancelled_size_opt: u64,
    pub paths_trimmed_multi_loop: u64,
    pub paths_cancelled_multi_loop: u64,
    pub paths_cancelled_joiner_phi: u64,
    pub paths_cancelled_noloop_guard: u64,
    pub paths_cancelled_multi_entry: u64,
    pub loop_headers_threaded: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_jump_threaded(&mut self) {
        self.jumps_threaded += 1;
    }

    pub fn record_duplicate(&mut self) {
        self.duplicates_created += 1;
    }

    pub fn any_threaded(&self) -> bool {
        self.jumps_threaded > 0
    }

    /// Emit a one-line summary the way a compiler pass reports its stats
    /// to its event sink.
    pub fn dump(&self) {
        tracing::debug!(
            jumps_threaded = self.jumps_threaded,
            duplicates_created = self.duplicates_created,
            paths_cancelled_size_opt = self.paths_cancelled_size_opt,
            paths_trimmed_multi_loop = self.paths_trimmed_multi_loop,
            paths_cancelled_multi_loop = self.paths_cancelled_multi_loop,
            paths_cancelled_joiner_phi = self.paths_cancelled_joiner_phi,
            paths_cancelled_noloop_guard = self.paths_cancelled_noloop_guard,
            paths_cancelled_multi_entry = self.paths_cancelled_multi_entry,
            loop_headers_threaded = self.loop_headers_threaded,
            "jump threading stats"
        );
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Jumps threaded: {}; duplicates created: {}; cancelled (size-opt): {}; \
             trimmed (multi-loop): {}; cancelled (multi-loop): {}; cancelled (joiner phi): {}; \
             cancelled (noloop guard): {}; cancelled (multi-entry): {}; loop headers threaded: {}",
            self.jumps_threaded,
            self.duplicates_created,
            self.paths_cancelled_size_opt,
            self.paths_trimmed_multi_loop,
            self.paths_cancelled_multi_loop,
            self.paths_cancelled_joiner_phi,
            self.paths_cancelled_noloop_guard,
            self.paths_cancelled_multi_entry,
            self.loop_headers_threaded,
        )
    }
}
