/// GL error tracking for the glow backend
///
/// Each `GlowGpu` owns one tracker. Every failed glGetError poll is counted,
/// and identical messages are grouped so a per-frame error only reports its
/// first occurrence.

use colored::*;
use rustc_hash::FxHashMap;

/// Distinct messages kept for grouping before the table starts over
pub const MAX_GROUPED_MESSAGES: usize = 256;

/// Snapshot of the GL error counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlErrorStats {
    /// Failed polls
    pub errors: u32,
    /// Distinct messages among them
    pub distinct: u32,
}

/// Error counters and message grouping of one context
#[derive(Debug, Default)]
pub struct ErrorTracker {
    stats: GlErrorStats,
    /// Occurrences per distinct message
    messages: FxHashMap<String, u32>,
}

impl ErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one error; returns how often this exact message has been seen.
    ///
    /// A full table is cleared before a new message is added, so a message
    /// seen again after that reports as new.
    pub fn track(&mut self, message: &str) -> u32 {
        self.stats.errors = self.stats.errors.saturating_add(1);
        if !self.messages.contains_key(message) && self.messages.len() >= MAX_GROUPED_MESSAGES {
            self.messages.clear();
        }
        let count = self.messages.entry(message.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            self.stats.distinct = self.stats.distinct.saturating_add(1);
        }
        *count
    }

    pub fn stats(&self) -> GlErrorStats {
        self.stats
    }

    /// Messages currently grouped
    pub fn grouped(&self) -> usize {
        self.messages.len()
    }

    /// Clear counters and grouped messages
    pub fn reset(&mut self) {
        self.stats = GlErrorStats::default();
        self.messages.clear();
    }
}

/// Print GL error statistics to stdout
pub fn print_error_stats_report(stats: GlErrorStats) {
    println!("{}", "=== GL error statistics ===".bold());
    if stats.errors == 0 {
        println!("  {}", "no GL errors".green());
    } else {
        println!("  {} {}", "errors:".red().bold(), stats.errors);
        println!("  {} {}", "distinct:".yellow(), stats.distinct);
    }
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
