//! The resource monitor (§4.5 step 4): a background task polling this
//! process's resident memory and CPU time at `resource_check_interval_ms`,
//! tracking peak memory and flagging an OOM condition once `max_memory_mb`
//! is crossed.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use helm_protocol::sandbox::SandboxMetrics;
use sysinfo::Pid;
use sysinfo::ProcessRefreshKind;
use sysinfo::RefreshKind;
use sysinfo::System;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Polls process memory/CPU on an interval and exposes a live snapshot plus
/// an OOM flag the supervisor's race can observe without awaiting it.
pub struct ResourceMonitor {
    task: tokio::task::JoinHandle<()>,
    metrics: Arc<Mutex<SandboxMetrics>>,
    oom: Arc<AtomicBool>,
}

impl ResourceMonitor {
    /// Spawn the polling task. If the current process id can't be resolved,
    /// the monitor degrades to a no-op rather than failing the run: resource
    /// caps are best-effort, not a prerequisite for automation to proceed.
    pub fn spawn(max_memory_mb: u64, interval: Duration) -> Self {
        let metrics = Arc::new(Mutex::new(SandboxMetrics::default()));
        let oom = Arc::new(AtomicBool::new(false));

        let Some(pid) = sysinfo::get_current_pid().ok() else {
            tracing::warn!("could not resolve current pid, resource monitor disabled");
            return Self {
                task: tokio::spawn(async {}),
                metrics,
                oom,
            };
        };

        let metrics_task = metrics.clone();
        let oom_task = oom.clone();
        let task = tokio::spawn(async move {
            run_poll_loop(pid, max_memory_mb, interval, metrics_task, oom_task).await;
        });

        Self { task, metrics, oom }
    }

    pub fn metrics_snapshot(&self) -> SandboxMetrics {
        self.metrics.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    pub fn is_oom(&self) -> bool {
        self.oom.load(Ordering::SeqCst)
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

async fn run_poll_loop(
    pid: Pid,
    max_memory_mb: u64,
    interval: Duration,
    metrics: Arc<Mutex<SandboxMetrics>>,
    oom: Arc<AtomicBool>,
) {
    let refresh = RefreshKind::nothing().with_processes(ProcessRefreshKind::everything());
    let mut system = System::new_with_specifics(refresh);
    let interval_ms = interval.as_millis() as i64;

    loop {
        tokio::time::sleep(interval).await;
        system.refresh_processes_specifics(sysinfo::ProcessesToUpdate::Some(&[pid]), true, ProcessRefreshKind::everything());

        let Some(process) = system.process(pid) else {
            continue;
        };
        let memory_mb = process.memory() as f64 / BYTES_PER_MB;
        let cpu_ms = (process.cpu_usage() as f64 / 100.0 * interval_ms as f64) as i64;

        if let Ok(mut guard) = metrics.lock() {
            guard.observe_memory_mb(memory_mb);
            guard.cpu_time_ms += cpu_ms;
        }

        if memory_mb >= max_memory_mb as f64 {
            oom.store(true, Ordering::SeqCst);
        }
    }
}
