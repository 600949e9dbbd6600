use std::{
    collections::HashMap,
    fmt::Write,
    time::{Duration, Instant},
};

use crate::{environment::LiquidEnvironment, floating_type_mod::FT};

#[derive(Clone)]
pub(crate) struct Counter<T> {
    values: Vec<T>,
    last_start: Instant,
}

impl<T> Counter<T> {
    fn new() -> Self {
        Counter::<T> {
            last_start: Instant::now(),
            values: Vec::new(),
        }
    }

    fn add_value(&mut self, v: T) {
        self.values.push(v);
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }
}

impl Counter<FT> {
    pub(crate) fn avg(&self) -> FT {
        self.values.iter().cloned().sum::<FT>() / self.values.len() as FT
    }

    pub(crate) fn min(&self) -> FT {
        self.values.iter().cloned().fold(FT::MAX, FT::min)
    }

    pub(crate) fn max(&self) -> FT {
        self.values.iter().cloned().fold(FT::MIN, FT::max)
    }
}

impl Counter<Duration> {
    fn begin(&mut self) {
        self.last_start = Instant::now();
    }

    fn end(&mut self) {
        self.values.push(Instant::now() - self.last_start);
    }

    pub(crate) fn avg(&self) -> Duration {
        self.sum() / self.values.len().max(1) as u32
    }

    pub(crate) fn sum(&self) -> Duration {
        self.values.iter().cloned().sum::<Duration>()
    }
}

/// Min/max/avg of scalar samples per key.
#[derive(Clone)]
pub(crate) struct ValueCounters {
    pub(crate) counters: HashMap<String, Counter<FT>>,
    enabled: bool,
}

impl ValueCounters {
    pub(crate) fn new(enabled: bool) -> ValueCounters {
        ValueCounters {
            counters: HashMap::default(),
            enabled,
        }
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn add_value(&mut self, id: &str, v: FT) {
        if self.enabled {
            self.counters
                .entry(id.to_string())
                .or_insert_with(Counter::<FT>::new)
                .add_value(v);
        }
    }
}

/// Wall clock durations per key.
#[derive(Clone)]
pub(crate) struct PerformanceCounters {
    pub(crate) counters: HashMap<String, Counter<Duration>>,
    enabled: bool,
}

impl PerformanceCounters {
    pub(crate) fn new(enabled: bool) -> PerformanceCounters {
        PerformanceCounters {
            counters: HashMap::default(),
            enabled,
        }
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn begin(&mut self, id: &str) {
        if self.enabled {
            self.counters
                .entry(id.to_string())
                .or_insert_with(Counter::<Duration>::new)
                .begin();
        }
    }

    pub(crate) fn end(&mut self, id: &str) {
        if self.enabled {
            if let Some(counter) = self.counters.get_mut(id) {
                counter.end();
            }
        }
    }
}

/// Human readable report of all counters of the environment, keys sorted.
pub fn write_statistics(environment: &LiquidEnvironment) -> String {
    let mut s = String::new();
    let pcounters = environment.performance_counters();
    let vcounters = environment.value_counters();

    let simulation_time = pcounters
        .counters
        .get("simulation-step")
        .map(|c| c.sum())
        .unwrap_or_default();

    writeln!(s, "simulated-time: {}", environment.time()).unwrap();
    writeln!(s, "steps: {}", environment.step_number()).unwrap();
    writeln!(s, "simulation-time: {}ms", simulation_time.as_secs_f64() * 1000.).unwrap();
    writeln!(s).unwrap();

    let mut v = pcounters.counters.iter().collect::<Vec<_>>();
    v.sort_by(|x, y| x.0.cmp(y.0));
    for (label, pcounter) in v {
        writeln!(s, "{}: avg:{}ms", label, pcounter.avg().as_secs_f64() * 1000.).unwrap();
    }
    writeln!(s).unwrap();

    let mut v = vcounters.counters.iter().filter(|(_, c)| c.len() > 0).collect::<Vec<_>>();
    v.sort_by(|x, y| x.0.cmp(y.0));
    for (label, vcounter) in v {
        writeln!(
            s,
            "{}: min:{} max:{} avg:{}",
            label,
            vcounter.min(),
            vcounter.max(),
            vcounter.avg()
        )
        .unwrap();
    }

    s
}

#[cfg(test)]
mod tests {
    use super::{PerformanceCounters, ValueCounters};

    #[test]
    fn value_counters_aggregate() {
        let mut counters = ValueCounters::new(true);
        for v in [3., 1., 2.] {
            counters.add_value("pressure-iterations", v);
        }
        let counter = &counters.counters["pressure-iterations"];
        assert_eq!(counter.min(), 1.);
        assert_eq!(counter.max(), 3.);
        assert_eq!(counter.avg(), 2.);
    }

    #[test]
    fn disabled_counters_stay_empty() {
        let mut counters = ValueCounters::new(false);
        counters.add_value("time-step", 0.1);
        assert!(counters.counters.is_empty());

        let mut pcounters = PerformanceCounters::new(false);
        pcounters.begin("simulation-step");
        pcounters.end("simulation-step");
        assert!(pcounters.counters.is_empty());
    }

    #[test]
    fn performance_counters_collect_durations() {
        let mut pcounters = PerformanceCounters::new(true);
        for _ in 0..3 {
            pcounters.begin("simulation-step");
            pcounters.end("simulation-step");
        }
        assert_eq!(pcounters.counters["simulation-step"].len(), 3);
        // unmatched end is ignored
        pcounters.end("advection");
        assert!(!pcounters.counters.contains_key("advection"));
    }
}
