//! Simple profiling utility for measuring system performance.
//!
//! The engine records how long each system's `update` and `draw` hooks take when
//! built with the `profile` feature:
//! ```bash
//! cargo test --release --features profile
//! ```

use std::collections::HashMap;
use std::fmt::Write;
use std::time::{Duration, Instant};

/// Collects timing data for named sections and provides aggregated
/// statistics.
#[derive(Debug, Default)]
pub struct Profiler {
    /// Accumulated time per section
    sections: HashMap<&'static str, SectionStats>,
    /// Total ticks profiled
    tick_count: u64,
}

/// Statistics for a profiled section
#[derive(Debug, Default, Clone)]
pub struct SectionStats {
    pub total_time: Duration,
    pub call_count: u64,
    pub min_time: Option<Duration>,
    pub max_time: Option<Duration>,
}

impl SectionStats {
    pub fn avg_time(&self) -> Duration {
        if self.call_count == 0 {
            Duration::ZERO
        } else {
            self.total_time / self.call_count as u32
        }
    }
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one measured run of a section.
    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        let stats = self.sections.entry(name).or_default();
        stats.total_time += elapsed;
        stats.call_count += 1;
        stats.min_time = Some(stats.min_time.map_or(elapsed, |m| m.min(elapsed)));
        stats.max_time = Some(stats.max_time.map_or(elapsed, |m| m.max(elapsed)));
    }

    /// Time a section using a closure.
    pub fn time_section<F, R>(&mut self, name: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.record(name, start.elapsed());
        result
    }

    /// Increment the tick counter.
    pub fn tick(&mut self) {
        self.tick_count += 1;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn get_section(&self, name: &str) -> Option<&SectionStats> {
        self.sections.get(name)
    }

    /// Table of all sections, slowest first.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Profiler Summary ({} ticks) ===", self.tick_count);

        let mut sections: Vec<_> = self.sections.iter().collect();
        sections.sort_by(|a, b| b.1.total_time.cmp(&a.1.total_time));

        let total: Duration = sections.iter().map(|(_, s)| s.total_time).sum();

        let _ = writeln!(
            out,
            "{:<40} {:>10} {:>10} {:>10} {:>10} {:>8}",
            "Section", "Total", "Avg", "Min", "Max", "% Time"
        );
        let _ = writeln!(out, "{}", "-".repeat(93));

        for (name, stats) in &sections {
            let pct = if total.as_nanos() > 0 {
                (stats.total_time.as_nanos() as f64 / total.as_nanos() as f64) * 100.0
            } else {
                0.0
            };

            let _ = writeln!(
                out,
                "{:<40} {:>10.2?} {:>10.2?} {:>10.2?} {:>10.2?} {:>7.1}%",
                name,
                stats.total_time,
                stats.avg_time(),
                stats.min_time.unwrap_or(Duration::ZERO),
                stats.max_time.unwrap_or(Duration::ZERO),
                pct
            );
        }

        let _ = writeln!(out, "{}", "-".repeat(93));
        let _ = writeln!(out, "{:<40} {:>10.2?}", "TOTAL", total);
        out
    }

    /// Reset all profiling data.
    pub fn reset(&mut self) {
        self.sections.clear();
        self.tick_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_aggregates() {
        let mut profiler = Profiler::new();
        profiler.record("physics", Duration::from_millis(4));
        profiler.record("physics", Duration::from_millis(2));
        profiler.tick();

        let stats = profiler.get_section("physics").unwrap();
        assert_eq!(stats.call_count, 2);
        assert_eq!(stats.total_time, Duration::from_millis(6));
        assert_eq!(stats.min_time, Some(Duration::from_millis(2)));
        assert_eq!(stats.max_time, Some(Duration::from_millis(4)));
        assert_eq!(stats.avg_time(), Duration::from_millis(3));
        assert_eq!(profiler.tick_count(), 1);
    }

    #[test]
    fn test_time_section_and_summary() {
        let mut profiler = Profiler::new();
        let value = profiler.time_section("render", || 7);
        assert_eq!(value, 7);
        assert!(profiler.summary().contains("render"));

        profiler.reset();
        assert!(profiler.get_section("render").is_none());
    }
}
