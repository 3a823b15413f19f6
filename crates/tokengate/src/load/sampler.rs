//! Periodic host load sampling

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use sysinfo::System;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One host load observation, both fractions in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSample {
    pub cpu: f64,
    pub mem: f64,
}

/// Cell the sampler publishes into and admissions read from.
///
/// The fractions are stored as raw `f64` bits in word-sized atomics, so
/// readers never coordinate with the sampler; they accept values at most
/// one sampling period stale.
#[derive(Debug)]
pub struct LoadCell {
    cpu_bits: AtomicU64,
    mem_bits: AtomicU64,
}

impl Default for LoadCell {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadCell {
    /// Starts at `(0.0, 0.0)`, which scales to the default multiplier.
    pub fn new() -> Self {
        Self {
            cpu_bits: AtomicU64::new(0f64.to_bits()),
            mem_bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub fn publish(&self, sample: LoadSample) {
        self.cpu_bits.store(sample.cpu.to_bits(), Ordering::Relaxed);
        self.mem_bits.store(sample.mem.to_bits(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LoadSample {
        LoadSample {
            cpu: f64::from_bits(self.cpu_bits.load(Ordering::Relaxed)),
            mem: f64::from_bits(self.mem_bits.load(Ordering::Relaxed)),
        }
    }
}

/// Long-lived task sampling host-wide CPU and memory utilization at a
/// fixed cadence.
///
/// A failed sample is logged and skipped; the previously published pair
/// stays in effect until the next tick.
#[derive(Debug)]
pub struct LoadSampler {
    cell: Arc<LoadCell>,
    period: Duration,
    shutdown: CancellationToken,
}

impl LoadSampler {
    pub fn new(cell: Arc<LoadCell>, period: Duration) -> Self {
        Self {
            cell,
            period,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the sampling loop when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Spawn the sampling loop onto the runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut system = System::new();
            // CPU deltas need a baseline refresh before the first read
            system.refresh_cpu_usage();

            let mut ticker = tokio::time::interval(self.period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        debug!("load sampler stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        match sample_host(&mut system) {
                            Ok(sample) => {
                                debug!(cpu = sample.cpu, mem = sample.mem, "published load sample");
                                self.cell.publish(sample);
                            }
                            Err(e) => warn!("host load sample failed: {e}"),
                        }
                    }
                }
            }
        })
    }
}

fn sample_host(system: &mut System) -> std::result::Result<LoadSample, String> {
    system.refresh_cpu_usage();
    system.refresh_memory();

    let cpu = (f64::from(system.global_cpu_usage()) / 100.0).clamp(0.0, 1.0);
    let total = system.total_memory();
    if total == 0 {
        return Err("total memory reported as zero".to_string());
    }
    let mem = (system.used_memory() as f64 / total as f64).clamp(0.0, 1.0);

    Ok(LoadSample { cpu, mem })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_round_trips_published_samples() {
        let cell = LoadCell::new();
        assert_eq!(cell.snapshot(), LoadSample { cpu: 0.0, mem: 0.0 });

        cell.publish(LoadSample { cpu: 0.96, mem: 0.10 });
        let sample = cell.snapshot();
        assert_eq!(sample.cpu, 0.96);
        assert_eq!(sample.mem, 0.10);
    }

    #[tokio::test]
    async fn sampler_publishes_and_stops() {
        let cell = Arc::new(LoadCell::new());
        let sampler = LoadSampler::new(cell.clone(), Duration::from_millis(10));
        let shutdown = sampler.shutdown_token();
        let handle = sampler.spawn();

        // interval fires immediately, then every 10ms
        tokio::time::sleep(Duration::from_millis(50)).await;
        let sample = cell.snapshot();
        assert!(sample.mem > 0.0, "memory fraction should be published");
        assert!((0.0..=1.0).contains(&sample.cpu));
        assert!((0.0..=1.0).contains(&sample.mem));

        shutdown.cancel();
        handle.await.unwrap();
    }
}
