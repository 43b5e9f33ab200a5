use std::panic;
use std::thread;
use std::time::{Duration, Instant};
use log::{debug, info, warn};
use serde::Serialize;
use crate::cache::{Cache, CacheTrait};
use crate::config::{CacheConfig, ConfigError, SweepConfig};
use crate::result::ResultRecord;
use crate::trace::{Access, Operation};

/// A configuration the sweep couldn't build a cache for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedConfiguration {
    pub config: CacheConfig,
    pub reason: String,
}

/// Everything a sweep produced, in enumeration order
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    pub records: Vec<ResultRecord>,
    pub skipped: Vec<SkippedConfiguration>,
    /// Lines never filled by the trace, one entry per record
    #[serde(skip)]
    pub uninitialised_lines: Vec<usize>,
    #[serde(skip)]
    pub simulation_time: Duration,
}

enum Outcome {
    Simulated { record: ResultRecord, uninitialised_lines: usize },
    Skipped(SkippedConfiguration),
}

/// Replays one trace against every configuration of a `SweepConfig`
///
/// Each configuration gets its own cold cache, so results never depend on the order
/// configurations are run in
#[derive(Debug, Default, Clone)]
pub struct Sweep {
    config: SweepConfig,
}

impl Sweep {
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    /// The configurations this sweep will run, in order
    pub fn configurations(&self) -> impl Iterator<Item = CacheConfig> + '_ {
        self.config.configurations()
    }

    /// Runs every configuration sequentially
    pub fn run(&self, trace: &[Operation]) -> SweepReport {
        let start = Instant::now();
        let outcomes = self.configurations().map(|config| simulate_configuration(config, trace)).collect();
        Self::into_report(outcomes, start.elapsed())
    }

    /// Runs configurations on up to `jobs` threads
    ///
    /// Configurations are split into contiguous chunks and reassembled in order, so the report is
    /// identical to the one `run` produces
    ///
    /// # Arguments
    ///
    /// * `trace`: The operations to replay, shared read-only by every thread
    /// * `jobs`: The maximum number of threads. 0 and 1 both run sequentially
    ///
    /// returns: SweepReport
    pub fn run_parallel(&self, trace: &[Operation], jobs: usize) -> SweepReport {
        if jobs <= 1 {
            return self.run(trace);
        }
        let start = Instant::now();
        let configs: Vec<CacheConfig> = self.configurations().collect();
        let chunk_size = ((configs.len() + jobs - 1) / jobs).max(1);
        let outcomes: Vec<Outcome> = thread::scope(|scope| {
            let handles: Vec<_> = configs
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || chunk.iter().map(|&config| simulate_configuration(config, trace)).collect::<Vec<_>>())
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
                .collect()
        });
        Self::into_report(outcomes, start.elapsed())
    }

    fn into_report(outcomes: Vec<Outcome>, simulation_time: Duration) -> SweepReport {
        let mut report = SweepReport {
            simulation_time,
            ..SweepReport::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Simulated { record, uninitialised_lines } => {
                    report.records.push(record);
                    report.uninitialised_lines.push(uninitialised_lines);
                }
                Outcome::Skipped(skipped) => report.skipped.push(skipped),
            }
        }
        info!("Simulated {} configurations, skipped {}", report.records.len(), report.skipped.len());
        report
    }
}

fn simulate_configuration(config: CacheConfig, trace: &[Operation]) -> Outcome {
    match run_configuration(config, trace) {
        Ok(cache) => {
            let record = ResultRecord::from(&cache);
            debug!("{record}");
            Outcome::Simulated {
                record,
                uninitialised_lines: cache.get_uninitialised_line_count(),
            }
        }
        Err(e) => {
            warn!("Skipping invalid configuration: {config} - {e}");
            Outcome::Skipped(SkippedConfiguration { config, reason: e.to_string() })
        }
    }
}

/// Builds a cold cache for one configuration and replays the whole trace against it
pub fn run_configuration(config: CacheConfig, trace: &[Operation]) -> Result<Cache, ConfigError> {
    let mut cache = Cache::new(config)?;
    replay(&mut cache, trace);
    Ok(cache)
}

/// Applies each operation to the cache in order
pub fn replay<C: CacheTrait>(cache: &mut C, trace: &[Operation]) {
    for op in trace {
        match op.access {
            Access::Read => cache.read(op.address),
            Access::Write => cache.write(op.address),
        };
    }
}
