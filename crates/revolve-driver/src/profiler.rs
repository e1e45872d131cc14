use revolve_model::ActionKind;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Coarse phase an instrumented call belongs to, per §4.4's closing note
/// ("All operator/storage calls are wrapped by the Profiler under
/// `(section, action)` keys").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Forward,
    Reverse,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilerEntry {
    pub section: Section,
    pub action: ActionKind,
    pub calls: u64,
    pub total: Duration,
}

/// Per-`(section, action)` timing accumulator. Keyed on a `BTreeMap` rather
/// than a hash map so `summary()` is deterministic without a separate sort.
#[derive(Debug, Default)]
pub struct Profiler {
    timings: BTreeMap<(Section, ActionKindKey), (u64, Duration)>,
}

/// `ActionKind` has no total order of its own; this gives the profiler's
/// map one without imposing it on the public enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ActionKindKey(u8);

fn key_of(kind: ActionKind) -> ActionKindKey {
    ActionKindKey(match kind {
        ActionKind::Advance => 0,
        ActionKind::TakeShot => 1,
        ActionKind::Restore => 2,
        ActionKind::LastForward => 3,
        ActionKind::Reverse => 4,
        ActionKind::ReverseStart => 5,
        ActionKind::Discard => 6,
        ActionKind::Terminate => 7,
    })
}

fn kind_of(key: ActionKindKey) -> ActionKind {
    match key.0 {
        0 => ActionKind::Advance,
        1 => ActionKind::TakeShot,
        2 => ActionKind::Restore,
        3 => ActionKind::LastForward,
        4 => ActionKind::Reverse,
        5 => ActionKind::ReverseStart,
        6 => ActionKind::Discard,
        _ => ActionKind::Terminate,
    }
}

impl Profiler {
    pub fn new() -> Self {
        Profiler::default()
    }

    pub fn record(&mut self, section: Section, action: ActionKind, elapsed: Duration) {
        let entry = self.timings.entry((section, key_of(action))).or_default();
        entry.0 += 1;
        entry.1 += elapsed;
    }

    /// Runs `f`, timing it under `(section, action)`, and returns its result.
    pub fn time<T>(&mut self, section: Section, action: ActionKind, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(section, action, start.elapsed());
        out
    }

    pub fn summary(&self) -> Vec<ProfilerEntry> {
        self.timings
            .iter()
            .map(|(&(section, key), &(calls, total))| ProfilerEntry {
                section,
                action: kind_of(key),
                calls,
                total,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_calls_and_duration_per_key() {
        let mut p = Profiler::new();
        p.record(Section::Forward, ActionKind::Advance, Duration::from_millis(1));
        p.record(Section::Forward, ActionKind::Advance, Duration::from_millis(2));
        p.record(Section::Storage, ActionKind::TakeShot, Duration::from_micros(5));
        let summary = p.summary();
        assert_eq!(summary.len(), 2);
        let advance = summary
            .iter()
            .find(|e| e.action == ActionKind::Advance)
            .unwrap();
        assert_eq!(advance.calls, 2);
        assert_eq!(advance.total, Duration::from_millis(3));
    }

    #[test]
    fn time_returns_the_closures_value() {
        let mut p = Profiler::new();
        let value = p.time(Section::Reverse, ActionKind::Reverse, || 2 + 2);
        assert_eq!(value, 4);
    }
}
