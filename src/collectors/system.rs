use crate::collectors::{MetricsProvider, ProviderError};
use crate::stats::{
    percent_of, CpuTimesStat, DiskUsageStat, HostInfoStat, MemoryStat, NetIfStat, NetIoStat,
    PartitionStat, SwapStat,
};
#[cfg(target_os = "linux")]
use std::fs;
use std::time::Duration;
use sysinfo::{Disk, Disks, Networks, System};
use tracing::debug;

/// `/proc/stat` reports times in USER_HZ, which the kernel fixes at 100.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
const USER_HZ: f64 = 100.0;

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
const IFF_UP: u32 = 0x1;
/// Never present in sysfs `flags`; derived from `operstate` the way
/// `dev_get_flags` does.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
const IFF_RUNNING: u32 = 0x40;

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
const IFF_FLAGS: &[(u32, &str)] = &[
    (IFF_UP, "up"),
    (0x2, "broadcast"),
    (0x8, "loopback"),
    (0x10, "pointtopoint"),
    (IFF_RUNNING, "running"),
    (0x1000, "multicast"),
];

/// Reads the host through `sysinfo`, filling gaps from procfs/sysfs on Linux.
pub struct SysinfoProvider {
    system: System,
    disks: Disks,
    networks: Networks,
}

impl SysinfoProvider {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        system.refresh_memory();
        Self {
            system,
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
        }
    }

    fn find_disk(&self, mountpoint: &str) -> Option<&Disk> {
        self.disks
            .list()
            .iter()
            .find(|d| d.mount_point().to_string_lossy() == mountpoint)
    }
}

impl MetricsProvider for SysinfoProvider {
    fn cpu_count_physical(&self) -> Result<usize, ProviderError> {
        self.system
            .physical_core_count()
            .ok_or(ProviderError::Unavailable {
                query: "cpu_count_physical",
            })
    }

    fn cpu_count_logical(&self) -> Result<usize, ProviderError> {
        match self.system.cpus().len() {
            0 => Err(ProviderError::Unavailable {
                query: "cpu_count_logical",
            }),
            n => Ok(n),
        }
    }

    fn cpu_percent(&mut self, window: Duration) -> Result<f64, ProviderError> {
        self.system.refresh_cpu_usage();
        std::thread::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        self.system.refresh_cpu_usage();
        Ok(self.system.global_cpu_usage() as f64)
    }

    fn cpu_times(&self) -> Result<Vec<CpuTimesStat>, ProviderError> {
        read_cpu_times()
    }

    fn virtual_memory(&self) -> Result<MemoryStat, ProviderError> {
        let total = self.system.total_memory();
        if total == 0 {
            return Err(ProviderError::Unavailable {
                query: "virtual_memory",
            });
        }
        let used = self.system.used_memory();
        Ok(MemoryStat {
            total,
            available: self.system.available_memory(),
            used,
            free: self.system.free_memory(),
            used_percent: percent_of(used, total),
        })
    }

    fn swap_memory(&self) -> Result<SwapStat, ProviderError> {
        let total = self.system.total_swap();
        let used = self.system.used_swap();
        Ok(SwapStat {
            total,
            used,
            free: self.system.free_swap(),
            used_percent: percent_of(used, total),
        })
    }

    fn disk_partitions(&self) -> Result<Vec<PartitionStat>, ProviderError> {
        Ok(self
            .disks
            .list()
            .iter()
            .map(|d| PartitionStat {
                device: d.name().to_string_lossy().to_string(),
                mountpoint: d.mount_point().to_string_lossy().to_string(),
                fstype: d.file_system().to_string_lossy().to_string(),
                kind: format!("{:?}", d.kind()),
                removable: d.is_removable(),
            })
            .collect())
    }

    fn disk_usage(&self, mountpoint: &str) -> Result<DiskUsageStat, ProviderError> {
        let disk = self
            .find_disk(mountpoint)
            .ok_or_else(|| ProviderError::NoSuchMountPoint(mountpoint.to_string()))?;
        let total = disk.total_space();
        let free = disk.available_space();
        let used = total.saturating_sub(free);
        debug!(mountpoint, total, used, "disk usage");
        Ok(DiskUsageStat {
            path: mountpoint.to_string(),
            fstype: disk.file_system().to_string_lossy().to_string(),
            total,
            free,
            used,
            used_percent: percent_of(used, total),
        })
    }

    fn net_io_counters(&self) -> Result<Vec<NetIoStat>, ProviderError> {
        let mut out: Vec<NetIoStat> = self
            .networks
            .list()
            .iter()
            .map(|(iface, data)| NetIoStat {
                name: iface.to_string(),
                bytes_sent: data.total_transmitted(),
                bytes_recv: data.total_received(),
                packets_sent: data.total_packets_transmitted(),
                packets_recv: data.total_packets_received(),
                errin: data.total_errors_on_received(),
                errout: data.total_errors_on_transmitted(),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    fn net_interfaces(&self) -> Result<Vec<String>, ProviderError> {
        let mut names: Vec<String> = self.networks.list().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn net_if_addrs(&self, name: &str) -> Result<Vec<String>, ProviderError> {
        let data = self
            .networks
            .list()
            .get(name)
            .ok_or_else(|| ProviderError::NoSuchInterface(name.to_string()))?;
        Ok(data
            .ip_networks()
            .iter()
            .map(|ip| format!("{}/{}", ip.addr, ip.prefix))
            .collect())
    }

    fn net_if_stats(&self, name: &str) -> Result<NetIfStat, ProviderError> {
        let data = self
            .networks
            .list()
            .get(name)
            .ok_or_else(|| ProviderError::NoSuchInterface(name.to_string()))?;
        Ok(NetIfStat {
            name: name.to_string(),
            mtu: data.mtu(),
            flags: read_if_flags(name)?,
            hardware_addr: data.mac_address().to_string(),
        })
    }

    fn host_info(&self) -> Result<HostInfoStat, ProviderError> {
        let hostname =
            System::host_name().ok_or(ProviderError::Unavailable { query: "host_info" })?;
        Ok(HostInfoStat {
            hostname,
            os: std::env::consts::OS.to_string(),
            platform: System::name().unwrap_or_default(),
            platform_version: System::os_version().unwrap_or_default(),
            kernel_version: System::kernel_version().unwrap_or_default(),
            kernel_arch: std::env::consts::ARCH.to_string(),
            uptime: System::uptime(),
            boot_time: System::boot_time(),
        })
    }
}

#[cfg(target_os = "linux")]
fn read_cpu_times() -> Result<Vec<CpuTimesStat>, ProviderError> {
    let raw = fs::read_to_string("/proc/stat").map_err(|source| ProviderError::Io {
        query: "cpu_times",
        source,
    })?;
    parse_proc_stat(&raw).map(|total| vec![total])
}

/// No per-state counters outside procfs; the key stays, the list is empty.
#[cfg(not(target_os = "linux"))]
fn read_cpu_times() -> Result<Vec<CpuTimesStat>, ProviderError> {
    debug!("cpu_times not available on this platform");
    Ok(Vec::new())
}

#[cfg(target_os = "linux")]
fn read_if_flags(name: &str) -> Result<Vec<String>, ProviderError> {
    let read = |attr: &str| {
        fs::read_to_string(format!("/sys/class/net/{name}/{attr}")).map_err(|source| {
            ProviderError::Io {
                query: "net_if_stats",
                source,
            }
        })
    };
    parse_if_flags(&read("flags")?, &read("operstate")?)
}

#[cfg(not(target_os = "linux"))]
fn read_if_flags(_name: &str) -> Result<Vec<String>, ProviderError> {
    Ok(Vec::new())
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_proc_stat(raw: &str) -> Result<CpuTimesStat, ProviderError> {
    let malformed = |detail: &str| ProviderError::Parse {
        query: "cpu_times",
        detail: detail.to_string(),
    };
    let rest = raw
        .lines()
        .find_map(|line| line.strip_prefix("cpu "))
        .ok_or_else(|| malformed("missing aggregate cpu line"))?;
    let ticks: Vec<f64> = rest
        .split_whitespace()
        .map(|s| s.parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|err| malformed(&err.to_string()))?;
    if ticks.len() < 4 {
        return Err(malformed("fewer than four cpu columns"));
    }
    let secs = |i: usize| ticks.get(i).copied().unwrap_or(0.0) / USER_HZ;

    Ok(CpuTimesStat {
        cpu: "cpu-total".to_string(),
        user: secs(0),
        nice: secs(1),
        system: secs(2),
        idle: secs(3),
        iowait: secs(4),
        irq: secs(5),
        softirq: secs(6),
        steal: secs(7),
        guest: secs(8),
        guest_nice: secs(9),
    })
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_if_flags(raw: &str, operstate: &str) -> Result<Vec<String>, ProviderError> {
    let trimmed = raw.trim();
    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let mut bits = u32::from_str_radix(hex, 16).map_err(|err| ProviderError::Parse {
        query: "net_if_stats",
        detail: format!("flags {trimmed:?}: {err}"),
    })?;
    if bits & IFF_UP != 0 && matches!(operstate.trim(), "up" | "unknown") {
        bits |= IFF_RUNNING;
    }
    Ok(IFF_FLAGS
        .iter()
        .filter(|(bit, _)| bits & bit != 0)
        .map(|(_, name)| name.to_string())
        .collect())
}
