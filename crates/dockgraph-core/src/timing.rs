//! Opt-in phase timing.
//!
//! Enabled with `--timing` or `DOCKGRAPH_TIMING=1`. Each [`timed`] call
//! records one sample under a static phase name; [`collect_report`] drains
//! the samples of the current thread into per-phase percentiles.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

static ENABLED: AtomicBool = AtomicBool::new(false);

thread_local! {
    static SAMPLES: RefCell<BTreeMap<&'static str, Vec<Duration>>> =
        const { RefCell::new(BTreeMap::new()) };
}

/// Percentiles for one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseTiming {
    pub name: &'static str,
    pub count: usize,
    #[serde(rename = "p50_us", serialize_with = "as_micros")]
    pub p50: Duration,
    #[serde(rename = "p95_us", serialize_with = "as_micros")]
    pub p95: Duration,
    #[serde(rename = "p99_us", serialize_with = "as_micros")]
    pub p99: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimingReport {
    pub phases: Vec<PhaseTiming>,
}

/// True when `DOCKGRAPH_TIMING` is `1`, `true`, `yes` or `on`.
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var("DOCKGRAPH_TIMING").is_ok_and(|v| is_truthy(&v))
}

pub fn set_timing_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
    if !enabled {
        clear_timings();
    }
}

#[must_use]
pub fn is_timing_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn clear_timings() {
    SAMPLES.with(|s| s.borrow_mut().clear());
}

/// Run `f`, recording its wall time under `name` when timing is enabled.
pub fn timed<R>(name: &'static str, f: impl FnOnce() -> R) -> R {
    if !is_timing_enabled() {
        return f();
    }
    let started = Instant::now();
    let out = f();
    record(name, started.elapsed());
    out
}

/// Drain this thread's samples into a report ordered by phase name.
#[must_use]
pub fn collect_report() -> TimingReport {
    let samples = SAMPLES.with(|s| std::mem::take(&mut *s.borrow_mut()));
    let phases = samples
        .into_iter()
        .map(|(name, mut values)| {
            values.sort_unstable();
            PhaseTiming {
                name,
                count: values.len(),
                p50: percentile(&values, 50),
                p95: percentile(&values, 95),
                p99: percentile(&values, 99),
            }
        })
        .collect();
    TimingReport { phases }
}

impl TimingReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Fixed-width table for stderr.
    #[must_use]
    pub fn display_table(&self) -> String {
        if self.phases.is_empty() {
            return "No timing samples recorded.".to_string();
        }
        let mut out =
            String::from("phase                        count      p50      p95      p99\n");
        out.push_str(&"-".repeat(62));
        out.push('\n');
        for phase in &self.phases {
            let _ = writeln!(
                out,
                "{:<28} {:>6} {:>8} {:>8} {:>8}",
                phase.name,
                phase.count,
                format_duration(phase.p50),
                format_duration(phase.p95),
                format_duration(phase.p99),
            );
        }
        out
    }
}

fn record(name: &'static str, elapsed: Duration) {
    SAMPLES.with(|s| s.borrow_mut().entry(name).or_default().push(elapsed));
}

/// Nearest-rank percentile over an ascending slice.
fn percentile(sorted: &[Duration], pct: usize) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let rank = (pct.min(100) * sorted.len()).div_ceil(100);
    sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
}

fn format_duration(d: Duration) -> String {
    let micros = d.as_micros();
    match micros {
        1_000_000.. => format!("{}.{:03}s", micros / 1_000_000, (micros % 1_000_000) / 1_000),
        1_000.. => format!("{}.{:03}ms", micros / 1_000, micros % 1_000),
        _ => format!("{micros}µs"),
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn as_micros<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u128(d.as_micros())
}

fn is_truthy(value: &str) -> bool {
    ["1", "true", "yes", "on"]
        .iter()
        .any(|t| value.trim().eq_ignore_ascii_case(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    static TEST_GUARD: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn timed_does_not_record_when_disabled() {
        let _guard = TEST_GUARD.lock().expect("test guard lock");
        set_timing_enabled(false);

        assert_eq!(timed("disabled", || 7_u8), 7);
        assert!(collect_report().is_empty());
    }

    #[test]
    fn timed_records_when_enabled() {
        let _guard = TEST_GUARD.lock().expect("test guard lock");
        set_timing_enabled(true);
        clear_timings();

        assert_eq!(timed("graph.build", || 42_u8), 42);
        let report = collect_report();
        assert_eq!(report.phases.len(), 1);
        assert_eq!(report.phases[0].name, "graph.build");
        assert_eq!(report.phases[0].count, 1);

        set_timing_enabled(false);
    }

    #[test]
    fn percentiles_use_nearest_rank() {
        let _guard = TEST_GUARD.lock().expect("test guard lock");
        clear_timings();

        record("betweenness", Duration::from_micros(3_000));
        record("betweenness", Duration::from_micros(1_000));
        record("betweenness", Duration::from_micros(2_000));
        record("degree", Duration::from_micros(5));

        let report = collect_report();
        let names: Vec<&str> = report.phases.iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["betweenness", "degree"]);

        let b = &report.phases[0];
        assert_eq!(b.count, 3);
        assert_eq!(b.p50, Duration::from_micros(2_000));
        assert_eq!(b.p95, Duration::from_micros(3_000));
        assert_eq!(b.p99, Duration::from_micros(3_000));
    }

    #[test]
    fn table_and_json_shapes() {
        let _guard = TEST_GUARD.lock().expect("test guard lock");
        clear_timings();
        record("load", Duration::from_micros(1_500));

        let report = collect_report();
        let table = report.display_table();
        assert!(table.contains("phase"));
        assert!(table.contains("1.500ms"));

        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["phases"][0]["name"], "load");
        assert_eq!(json["phases"][0]["p50_us"], 1_500);
    }

    #[test]
    fn truthy_parser_is_case_insensitive() {
        assert!(is_truthy("TrUe"));
        assert!(is_truthy("1"));
        assert!(is_truthy("YES"));
        assert!(is_truthy(" on "));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("false"));
    }
}
