//! Host telemetry probe backed by Linux procfs.
//!
//! CPU percent is derived from two `/proc/stat` readings: busy jiffies over
//! total jiffies since the previous call (since boot on the first call).
//! Memory used is `MemTotal - MemAvailable` from `/proc/meminfo`.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use modelwatch_core::error::{ModelWatchError, Result};

/// OS telemetry collaborator consumed by the sampler and `/health`.
pub trait SystemProbe: Send + Sync {
    fn current_cpu_percent(&self) -> Result<f64>;
    fn current_memory_used_bytes(&self) -> Result<u64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CpuTimes {
    busy: u64,
    total: u64,
}

#[derive(Debug)]
pub struct ProcProbe {
    root: PathBuf,
    last_cpu: Mutex<Option<CpuTimes>>,
}

impl Default for ProcProbe {
    fn default() -> Self {
        Self::with_root("/proc")
    }
}

impl ProcProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from an alternate procfs root (containers, tests).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            last_cpu: Mutex::new(None),
        }
    }

    fn read(&self, file: &str) -> Result<String> {
        let path = self.root.join(file);
        fs::read_to_string(&path)
            .map_err(|e| ModelWatchError::Sampling(format!("read {} failed: {e}", path.display())))
    }
}

impl SystemProbe for ProcProbe {
    fn current_cpu_percent(&self) -> Result<f64> {
        let now = parse_cpu_times(&self.read("stat")?)?;
        let mut last = self.last_cpu.lock().unwrap_or_else(PoisonError::into_inner);
        let prev = last.replace(now).unwrap_or(CpuTimes { busy: 0, total: 0 });

        let total = now.total.saturating_sub(prev.total);
        if total == 0 {
            return Ok(0.0);
        }
        let busy = now.busy.saturating_sub(prev.busy);
        Ok((busy as f64 * 100.0 / total as f64).clamp(0.0, 100.0))
    }

    fn current_memory_used_bytes(&self) -> Result<u64> {
        parse_mem_used(&self.read("meminfo")?)
    }
}

/// Aggregate `cpu` line: user nice system idle iowait irq softirq steal ...
fn parse_cpu_times(stat: &str) -> Result<CpuTimes> {
    let line = stat
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or_else(|| ModelWatchError::Sampling("no aggregate cpu line in stat".into()))?;

    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .take(8)
        .map(|f| {
            f.parse::<u64>()
                .map_err(|e| ModelWatchError::Sampling(format!("bad cpu field {f:?}: {e}")))
        })
        .collect::<Result<_>>()?;
    if fields.len() < 4 {
        return Err(ModelWatchError::Sampling("truncated cpu line".into()));
    }

    let total: u64 = fields.iter().sum();
    // idle + iowait
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Ok(CpuTimes {
        busy: total.saturating_sub(idle),
        total,
    })
}

fn parse_mem_used(meminfo: &str) -> Result<u64> {
    let field = |name: &str| -> Result<u64> {
        let line = meminfo
            .lines()
            .find(|l| l.starts_with(name))
            .ok_or_else(|| ModelWatchError::Sampling(format!("{name} missing from meminfo")))?;
        let kb = line
            .trim_start_matches(name)
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| ModelWatchError::Sampling(format!("bad {name} line: {line:?}")))?;
        Ok(kb * 1024)
    };
    let total = field("MemTotal:")?;
    let available = field("MemAvailable:")?;
    Ok(total.saturating_sub(available))
}
