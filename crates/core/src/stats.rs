//! Run statistics collection and reporting.
//!
//! This module tracks what a run did, for the CLI's `--stats` report and for suite
//! diagnostics. It provides:
//! 1. **Execution:** Steps, cycles and shim traps taken.
//! 2. **Console I/O:** Bytes read from the input script, bytes written, failed writes.
//! 3. **Call mix:** How often each emulated routine was entered.

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Counters accumulated over one run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Steps taken (instructions executed plus shim traps).
    pub steps: u64,
    /// CPU cycles consumed.
    pub cycles: u64,
    /// Shim traps serviced.
    pub traps: u64,
    /// Bytes consumed from the input script.
    pub bytes_read: u64,
    /// Bytes accepted by the console.
    pub bytes_written: u64,
    /// Write calls rejected by failure injection.
    pub write_failures: u64,
    /// Entries per emulated routine, keyed by routine name.
    pub calls: BTreeMap<&'static str, u64>,
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"io"`, `"calls"`. Pass an empty slice to
/// [`RunStats::render_sections`] to render all of them.
pub const STATS_SECTIONS: &[&str] = &["summary", "io", "calls"];

impl RunStats {
    /// Counts one entry into `routine`.
    pub fn record_call(&mut self, routine: &'static str) {
        self.traps += 1;
        *self.calls.entry(routine).or_insert(0) += 1;
    }

    /// Number of times `routine` was entered.
    pub fn calls_to(&self, routine: &str) -> u64 {
        self.calls.get(routine).copied().unwrap_or(0)
    }

    /// Renders only the requested sections.
    ///
    /// # Arguments
    ///
    /// * `sections` - Names from [`STATS_SECTIONS`], or empty for all.
    pub fn render_sections(&self, sections: &[String]) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let mut out = String::new();
        let rule = "----------------------------------------------------------";

        if want("summary") {
            let cpi = if self.steps == 0 {
                0.0
            } else {
                self.cycles as f64 / self.steps as f64
            };
            let _ = writeln!(out, "run.steps                {}", self.steps);
            let _ = writeln!(out, "run.cycles               {}", self.cycles);
            let _ = writeln!(out, "run.cycles_per_step      {cpi:.4}");
            let _ = writeln!(out, "run.traps                {}", self.traps);
            let _ = writeln!(out, "{rule}");
        }
        if want("io") {
            let _ = writeln!(out, "io.bytes_read            {}", self.bytes_read);
            let _ = writeln!(out, "io.bytes_written         {}", self.bytes_written);
            let _ = writeln!(out, "io.write_failures        {}", self.write_failures);
            let _ = writeln!(out, "{rule}");
        }
        if want("calls") {
            for (name, count) in &self.calls {
                let _ = writeln!(out, "  call.{name:<18} {count}");
            }
            let _ = writeln!(out, "{rule}");
        }
        out
    }

    /// Renders every section.
    pub fn summary(&self) -> String {
        self.render_sections(&[])
    }
}
