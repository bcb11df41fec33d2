pub mod system;

#[cfg(test)]
pub(crate) mod fake;

use crate::stats::{
    CpuTimesStat, DiskUsageStat, HostInfoStat, MemoryStat, NetIfStat, NetIoStat, PartitionStat,
    SwapStat,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Window over which CPU utilization is sampled.
pub const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{query}: not reported by this platform")]
    Unavailable { query: &'static str },
    #[error("disk_usage: no such mount point {0}")]
    NoSuchMountPoint(String),
    #[error("net_if: no such interface {0}")]
    NoSuchInterface(String),
    #[error("{query}: {source}")]
    Io {
        query: &'static str,
        source: std::io::Error,
    },
    #[error("{query}: malformed data: {detail}")]
    Parse { query: &'static str, detail: String },
}

/// Source of host readings. Every query may fail with a platform error.
pub trait MetricsProvider {
    fn cpu_count_physical(&self) -> Result<usize, ProviderError>;
    fn cpu_count_logical(&self) -> Result<usize, ProviderError>;
    /// Blocks for `window` and returns aggregate utilization across all cores.
    fn cpu_percent(&mut self, window: Duration) -> Result<f64, ProviderError>;
    fn cpu_times(&self) -> Result<Vec<CpuTimesStat>, ProviderError>;
    fn virtual_memory(&self) -> Result<MemoryStat, ProviderError>;
    fn swap_memory(&self) -> Result<SwapStat, ProviderError>;
    fn disk_partitions(&self) -> Result<Vec<PartitionStat>, ProviderError>;
    fn disk_usage(&self, mountpoint: &str) -> Result<DiskUsageStat, ProviderError>;
    fn net_io_counters(&self) -> Result<Vec<NetIoStat>, ProviderError>;
    fn net_interfaces(&self) -> Result<Vec<String>, ProviderError>;
    fn net_if_addrs(&self, name: &str) -> Result<Vec<String>, ProviderError>;
    fn net_if_stats(&self, name: &str) -> Result<NetIfStat, ProviderError>;
    fn host_info(&self) -> Result<HostInfoStat, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSnapshot {
    pub cpu_count: usize,
    pub cpu_count_logical: usize,
    pub cpu_percent: f64,
    pub cpu_times: Vec<CpuTimesStat>,
    pub memory: MemoryStat,
    pub swap: SwapStat,
    pub disk_partitions: Vec<PartitionStat>,
    pub disk_usage: BTreeMap<String, DiskUsageStat>,
    pub net_io_counters: Vec<NetIoStat>,
    pub net_if_addrs: BTreeMap<String, Vec<String>>,
    pub net_if_stats: Vec<NetIfStat>,
    pub host_info: HostInfoStat,
}

/// Runs every query once, in order, and stops at the first failure.
pub fn collect<P: MetricsProvider>(provider: &mut P) -> Result<SystemSnapshot, ProviderError> {
    let started = Instant::now();

    let cpu_count = provider.cpu_count_physical()?;
    let cpu_count_logical = provider.cpu_count_logical()?;
    let cpu_percent = provider.cpu_percent(CPU_SAMPLE_WINDOW)?;
    let cpu_times = provider.cpu_times()?;
    debug!(cpu_count, cpu_count_logical, cpu_percent, "cpu collected");

    let memory = provider.virtual_memory()?;
    let swap = provider.swap_memory()?;
    debug!(memory_total = memory.total, swap_total = swap.total, "memory collected");

    let disk_partitions = provider.disk_partitions()?;
    let mut disk_usage = BTreeMap::new();
    for partition in &disk_partitions {
        let usage = provider.disk_usage(&partition.mountpoint)?;
        disk_usage.insert(partition.mountpoint.clone(), usage);
    }
    debug!(partitions = disk_partitions.len(), "disks collected");

    let net_io_counters = provider.net_io_counters()?;
    let interfaces = provider.net_interfaces()?;
    let mut net_if_addrs = BTreeMap::new();
    let mut net_if_stats = Vec::with_capacity(interfaces.len());
    for iface in &interfaces {
        net_if_addrs.insert(iface.clone(), provider.net_if_addrs(iface)?);
        net_if_stats.push(provider.net_if_stats(iface)?);
    }
    debug!(interfaces = interfaces.len(), "network collected");

    let host_info = provider.host_info()?;

    info!(
        hostname = %host_info.hostname,
        uptime = %humantime::format_duration(Duration::from_secs(host_info.uptime)),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "snapshot collected"
    );

    Ok(SystemSnapshot {
        cpu_count,
        cpu_count_logical,
        cpu_percent,
        cpu_times,
        memory,
        swap,
        disk_partitions,
        disk_usage,
        net_io_counters,
        net_if_addrs,
        net_if_stats,
        host_info,
    })
}
