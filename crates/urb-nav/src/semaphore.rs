//! Phase-locked traffic-signal types.
//!
//! # Design
//!
//! Entries describe signal *types*, not signal instances: many graph nodes may
//! reference the same type index and blink in unison.  All types share one
//! monotonic second counter, so `is_green` needs no per-signal state:
//!
//! ```text
//! green ⇔ (clock_secs + phase) mod total < green_secs
//! ```
//!
//! Index 0 is reserved for "no signal" and must never be queried.

use std::io::BufRead;
use std::path::Path;

use crate::{NavError, NavResult};

/// Number of signal-type slots, including the reserved index 0.
pub const MAX_SEMAPHORES: usize = 256;

#[derive(Copy, Clone)]
struct SemEntry {
    secs_total: u8,
    secs_green: u8,
    secs_phase: u8,
}

/// Unconfigured types read as always-green so unsignalled graph references
/// degrade harmlessly.
const DEFAULT_ENTRY: SemEntry = SemEntry {
    secs_total: 30,
    secs_green: 30,
    secs_phase: 0,
};

/// The process-wide signal phase table and its shared clock.
pub struct SemaphoreTable {
    entries:   [SemEntry; MAX_SEMAPHORES],
    clock_secs: u32,
    /// Sub-second residual carried into the next tick.
    residual:  f32,
}

impl Default for SemaphoreTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SemaphoreTable {
    pub fn new() -> Self {
        Self {
            entries:    [DEFAULT_ENTRY; MAX_SEMAPHORES],
            clock_secs: 0,
            residual:   0.0,
        }
    }

    /// Set the times of one signal type.
    ///
    /// `idx` must be in `[1, MAX_SEMAPHORES)` and the triple must satisfy
    /// `1 ≤ green ≤ total`.
    pub fn configure(&mut self, idx: usize, total: u8, green: u8, phase: u8) -> NavResult<()> {
        if idx == 0 || idx >= MAX_SEMAPHORES {
            return Err(NavError::SemaphoreIndex { idx: idx as i64, max: MAX_SEMAPHORES });
        }
        if green < 1 || total < 1 || green > total {
            return Err(NavError::SemaphoreTimes {
                idx,
                total: total as i64,
                green: green as i64,
            });
        }
        self.entries[idx] = SemEntry {
            secs_total: total,
            secs_green: green,
            secs_phase: phase,
        };
        Ok(())
    }

    /// Parse a whitespace-delimited signal file: one `idx total green phase`
    /// quadruple per line.
    ///
    /// Lines that do not match the pattern (comments, blanks) are logged and
    /// skipped; out-of-range indices or impossible triples reject the file.
    pub fn load_reader<R: BufRead>(&mut self, reader: R) -> NavResult<()> {
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let fields: Vec<i64> = line
                .split_whitespace()
                .map_while(|tok| tok.parse::<i64>().ok())
                .take(4)
                .collect();
            if fields.len() != 4 {
                if !line.trim().is_empty() {
                    log::warn!("semaphore file line {}: skipping {line:?}", line_no + 1);
                }
                continue;
            }
            let [idx, total, green, phase] = fields[..] else { unreachable!() };

            if idx < 1 || idx >= MAX_SEMAPHORES as i64 {
                return Err(NavError::SemaphoreIndex { idx, max: MAX_SEMAPHORES });
            }
            if green < 1 || total < 1 || green > total || total > u8::MAX as i64 {
                return Err(NavError::SemaphoreTimes { idx: idx as usize, total, green });
            }
            self.entries[idx as usize] = SemEntry {
                secs_total: total as u8,
                secs_green: green as u8,
                secs_phase: (phase.rem_euclid(256)) as u8,
            };
        }
        Ok(())
    }

    pub fn load_path(&mut self, path: &Path) -> NavResult<()> {
        let file = std::fs::File::open(path)?;
        self.load_reader(std::io::BufReader::new(file))
    }

    /// Advance the shared clock.  Whole seconds are promoted into
    /// `clock_secs`; the fraction is carried over.  Never goes backward;
    /// the counter wraps at `u32::MAX`.
    pub fn tick(&mut self, dt: f32) {
        let t = self.residual + dt.max(0.0);
        let whole = t as u32;
        self.residual = t - whole as f32;
        self.clock_secs = self.clock_secs.wrapping_add(whole);
    }

    /// Whether signal type `idx` currently shows green.
    #[inline]
    pub fn is_green(&self, idx: u8) -> bool {
        debug_assert!(idx != 0, "semaphore index 0 is reserved");
        let entry = &self.entries[idx as usize];
        ((self.clock_secs.wrapping_add(entry.secs_phase as u32)) % entry.secs_total as u32)
            < entry.secs_green as u32
    }

    /// Whole seconds elapsed on the shared clock.
    #[inline]
    pub fn clock_secs(&self) -> u32 {
        self.clock_secs
    }

    /// Reset clock and all entries to the always-green default.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
