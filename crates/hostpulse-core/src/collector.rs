//! OS metrics collaborator.
//!
//! Every host backend implements the [`MetricsCollector`] trait. The default
//! backend, [`SysinfoCollector`], reads counters through `sysinfo` and works
//! without elevated privileges; processes it cannot inspect are reported as
//! per-entry errors rather than failing the scan.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use sysinfo::{
    MINIMUM_CPU_UPDATE_INTERVAL, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate,
    System, UpdateKind,
};

use crate::process::{ProcessReadError, ProcessReading};
use crate::units::percent_of;

/// Physical memory counters in bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualMemory {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub available: u64,
    /// `(total - available) / total`, as a percent.
    pub percent: f64,
}

impl VirtualMemory {
    /// Build from byte counters, deriving the percent from `available`.
    pub fn from_bytes(total: u64, used: u64, free: u64, available: u64) -> Self {
        Self {
            total,
            used,
            free,
            available,
            percent: percent_of(total.saturating_sub(available), total),
        }
    }
}

/// Swap counters in bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapMemory {
    pub total: u64,
    pub used: u64,
    pub percent: f64,
}

impl SwapMemory {
    pub fn from_bytes(total: u64, used: u64) -> Self {
        Self {
            total,
            used,
            percent: percent_of(used, total),
        }
    }
}

/// Everything one sampling cycle reads from the host.
#[derive(Debug, Clone)]
pub struct HostReadings {
    pub cpu_percent: f64,
    pub memory: VirtualMemory,
    pub swap: SwapMemory,
    pub processes: Vec<Result<ProcessReading, ProcessReadError>>,
}

/// The collector as a whole could not produce readings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectorError {
    #[error("metrics collector unavailable: {0}")]
    Unavailable(String),
}

/// Source of host counters and the process table.
///
/// The server calls collectors from tokio's blocking pool, concurrently.
/// Calls must not serialize behind each other's CPU windows.
pub trait MetricsCollector: Send + Sync {
    /// Global CPU usage over a blocking measurement `window`, in `0..=100`.
    fn cpu_percent(&self, window: Duration) -> Result<f64, CollectorError>;

    /// Physical memory counters.
    fn virtual_memory(&self) -> Result<VirtualMemory, CollectorError>;

    /// Swap counters.
    fn swap_memory(&self) -> Result<SwapMemory, CollectorError>;

    /// One entry per OS process. Entries may individually fail.
    fn list_processes(&self) -> Vec<Result<ProcessReading, ProcessReadError>>;

    /// One full cycle. Backends that measure per-process CPU should measure
    /// it over the same `window` as the global figure.
    fn sample(&self, window: Duration) -> Result<HostReadings, CollectorError> {
        let cpu_percent = self.cpu_percent(window)?;
        Ok(HostReadings {
            cpu_percent,
            memory: self.virtual_memory()?,
            swap: self.swap_memory()?,
            processes: self.list_processes(),
        })
    }

    /// Human-readable backend name.
    fn name(&self) -> &'static str;
}

/// [`MetricsCollector`] backed by `sysinfo`.
///
/// Holds no state: every call builds its own [`System`] and drops it
/// afterwards, so concurrent requests sample independently.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysinfoCollector;

impl SysinfoCollector {
    pub fn new() -> Self {
        Self
    }

    fn process_refresh_kind() -> ProcessRefreshKind {
        ProcessRefreshKind::nothing()
            .with_memory()
            .with_cpu()
            .with_exe(UpdateKind::OnlyIfNotSet)
    }

    fn refresh_processes(sys: &mut System) {
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            Self::process_refresh_kind(),
        );
    }

    /// A fresh [`System`] whose CPU figures (and optionally per-process CPU)
    /// cover `window`.
    fn measured(window: Duration, with_processes: bool) -> System {
        let window = window.max(MINIMUM_CPU_UPDATE_INTERVAL);
        let mut sys = System::new();

        sys.refresh_cpu_usage();
        if with_processes {
            Self::refresh_processes(&mut sys);
        }
        std::thread::sleep(window);
        sys.refresh_cpu_usage();
        if with_processes {
            Self::refresh_processes(&mut sys);
        }
        sys
    }
}

fn global_cpu(sys: &System) -> Result<f64, CollectorError> {
    if sys.cpus().is_empty() {
        return Err(CollectorError::Unavailable("no CPUs reported".to_string()));
    }
    Ok(f64::from(sys.global_cpu_usage()).clamp(0.0, 100.0))
}

fn memory_of(sys: &System) -> Result<VirtualMemory, CollectorError> {
    let total = sys.total_memory();
    if total == 0 {
        return Err(CollectorError::Unavailable(
            "memory counters unreadable".to_string(),
        ));
    }
    Ok(VirtualMemory::from_bytes(
        total,
        sys.used_memory(),
        sys.free_memory(),
        sys.available_memory(),
    ))
}

fn processes_of(sys: &System, cpu_measured: bool) -> Vec<Result<ProcessReading, ProcessReadError>> {
    sys.processes()
        .values()
        .map(|p| read_process(p, cpu_measured))
        .collect()
}

impl MetricsCollector for SysinfoCollector {
    fn cpu_percent(&self, window: Duration) -> Result<f64, CollectorError> {
        let sys = Self::measured(window, false);
        let usage = global_cpu(&sys)?;
        debug!("[collector] cpu {usage:.1}% over {window:?}");
        Ok(usage)
    }

    fn virtual_memory(&self) -> Result<VirtualMemory, CollectorError> {
        let mut sys = System::new();
        sys.refresh_memory();
        memory_of(&sys)
    }

    fn swap_memory(&self) -> Result<SwapMemory, CollectorError> {
        let mut sys = System::new();
        sys.refresh_memory();
        Ok(SwapMemory::from_bytes(sys.total_swap(), sys.used_swap()))
    }

    /// Single pass without a CPU window; entries carry no CPU figure.
    fn list_processes(&self) -> Vec<Result<ProcessReading, ProcessReadError>> {
        let mut sys = System::new();
        Self::refresh_processes(&mut sys);
        processes_of(&sys, false)
    }

    fn sample(&self, window: Duration) -> Result<HostReadings, CollectorError> {
        let mut sys = Self::measured(window, true);
        sys.refresh_memory();

        let cpu_percent = global_cpu(&sys)?;
        let memory = memory_of(&sys)?;
        let swap = SwapMemory::from_bytes(sys.total_swap(), sys.used_swap());
        let processes = processes_of(&sys, true);
        debug!(
            "[collector] cpu {cpu_percent:.1}% over {window:?}, {} processes",
            processes.len()
        );
        Ok(HostReadings {
            cpu_percent,
            memory,
            swap,
            processes,
        })
    }

    fn name(&self) -> &'static str {
        "sysinfo"
    }
}

fn read_process(process: &Process, cpu_measured: bool) -> Result<ProcessReading, ProcessReadError> {
    classify_entry(
        process.pid().as_u32(),
        process.status(),
        process.name().to_string_lossy().into_owned(),
        process.exe().map(Path::to_path_buf),
        process.memory(),
        cpu_measured.then(|| f64::from(process.cpu_usage())),
    )
}

/// Turn one process-table entry into a reading or an expected failure.
///
/// Zombie and dead entries are gone. An entry with no name, no executable and
/// no resident memory could not be inspected.
fn classify_entry(
    pid: u32,
    status: ProcessStatus,
    name: String,
    exe: Option<PathBuf>,
    resident_bytes: u64,
    cpu_percent: Option<f64>,
) -> Result<ProcessReading, ProcessReadError> {
    if matches!(status, ProcessStatus::Zombie | ProcessStatus::Dead) {
        return Err(ProcessReadError::Gone(pid));
    }
    if name.is_empty() && exe.is_none() && resident_bytes == 0 {
        return Err(ProcessReadError::AccessDenied(pid));
    }
    Ok(ProcessReading {
        pid,
        name,
        exe,
        resident_bytes,
        cpu_percent,
    })
}
