use std::time::{Duration, Instant};

/// 批次作業的進度回報（取代互動式 progress bar，全部走 tracing）
#[derive(Debug)]
pub struct SweepProgress {
    job: String,
    total: u64,
    advanced: u64,
    failed: u64,
    started_at: Instant,
}

impl SweepProgress {
    pub fn start(job: &str, total: u64) -> Self {
        tracing::info!("🔍 {}: found {} items", job, total);
        Self {
            job: job.to_string(),
            total,
            advanced: 0,
            failed: 0,
            started_at: Instant::now(),
        }
    }

    pub fn success(&self, item: &str, message: &str) {
        tracing::info!("✅ {}: {} {}", self.job, item, message);
    }

    pub fn error(&mut self, item: &str, error: &dyn std::fmt::Display) {
        self.failed += 1;
        tracing::error!("❌ {}: updating {} failed: {}", self.job, item, error);
    }

    pub fn advance(&mut self) {
        self.advanced += 1;
        tracing::debug!("{}: {}/{}", self.job, self.advanced, self.total);
    }

    pub fn finish(&self) -> Duration {
        let elapsed = self.started_at.elapsed();
        tracing::info!(
            "🏁 {}: processed {} items ({} failed) in {:?}",
            self.job,
            self.advanced,
            self.failed,
            elapsed
        );
        elapsed
    }

    pub fn advanced(&self) -> u64 {
        self.advanced
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }
}

#[cfg(feature = "cli")]
pub use system::SystemMonitor;

#[cfg(feature = "cli")]
mod system {
    use std::time::Instant;
    use sysinfo::{Pid, RefreshKind, System};

    /// Process CPU / memory snapshot, enabled with `--monitor`.
    pub struct SystemMonitor {
        system: System,
        pid: Option<Pid>,
        start_time: Instant,
        peak_memory_mb: u64,
        enabled: bool,
    }

    impl SystemMonitor {
        pub fn new(enabled: bool) -> Self {
            let mut system = System::new_with_specifics(RefreshKind::everything());
            system.refresh_all();

            Self {
                system,
                pid: sysinfo::get_current_pid().ok(),
                start_time: Instant::now(),
                peak_memory_mb: 0,
                enabled,
            }
        }

        pub fn log_stats(&mut self, phase: &str) {
            if !self.enabled {
                return;
            }
            let Some(pid) = self.pid else {
                return;
            };
            self.system.refresh_all();
            let Some(process) = self.system.process(pid) else {
                return;
            };

            let memory_mb = process.memory() / 1024 / 1024;
            let cpu = process.cpu_usage();
            self.peak_memory_mb = self.peak_memory_mb.max(memory_mb);

            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Time: {:?}",
                phase,
                cpu,
                memory_mb,
                self.peak_memory_mb,
                self.start_time.elapsed()
            );
        }

        pub fn is_enabled(&self) -> bool {
            self.enabled
        }
    }
}
