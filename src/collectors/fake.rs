use super::{MetricsProvider, ProviderError};
use crate::stats::{
    percent_of, CpuTimesStat, DiskUsageStat, HostInfoStat, MemoryStat, NetIfStat, NetIoStat,
    PartitionStat, SwapStat,
};
use std::cell::RefCell;
use std::time::Duration;

const GIB: u64 = 1024 * 1024 * 1024;

/// Provider with fixed readings and injectable failures.
pub struct FakeProvider {
    cpu_percent: f64,
    uptime: u64,
    fail_on: Option<&'static str>,
    fail_mount: Option<String>,
    fail_iface: Option<String>,
    cpu_times: bool,
    window: Option<Duration>,
    calls: RefCell<Vec<&'static str>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            cpu_percent: 12.5,
            uptime: 3600,
            fail_on: None,
            fail_mount: None,
            fail_iface: None,
            cpu_times: true,
            window: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_cpu_percent(mut self, value: f64) -> Self {
        self.cpu_percent = value;
        self
    }

    pub fn with_uptime(mut self, secs: u64) -> Self {
        self.uptime = secs;
        self
    }

    pub fn fail_on(mut self, query: &'static str) -> Self {
        self.fail_on = Some(query);
        self
    }

    pub fn fail_disk_usage_at(mut self, mountpoint: &str) -> Self {
        self.fail_mount = Some(mountpoint.to_string());
        self
    }

    pub fn fail_interface_at(mut self, name: &str) -> Self {
        self.fail_iface = Some(name.to_string());
        self
    }

    pub fn without_cpu_times(mut self) -> Self {
        self.cpu_times = false;
        self
    }

    pub fn was_called(&self, query: &str) -> bool {
        self.calls.borrow().iter().any(|c| *c == query)
    }

    pub fn sampled_window(&self) -> Option<Duration> {
        self.window
    }

    fn enter(&self, query: &'static str) -> Result<(), ProviderError> {
        self.calls.borrow_mut().push(query);
        if self.fail_on == Some(query) {
            return Err(ProviderError::Unavailable { query });
        }
        Ok(())
    }
}

impl MetricsProvider for FakeProvider {
    fn cpu_count_physical(&self) -> Result<usize, ProviderError> {
        self.enter("cpu_count_physical")?;
        Ok(4)
    }

    fn cpu_count_logical(&self) -> Result<usize, ProviderError> {
        self.enter("cpu_count_logical")?;
        Ok(8)
    }

    fn cpu_percent(&mut self, window: Duration) -> Result<f64, ProviderError> {
        self.enter("cpu_percent")?;
        self.window = Some(window);
        Ok(self.cpu_percent)
    }

    fn cpu_times(&self) -> Result<Vec<CpuTimesStat>, ProviderError> {
        self.enter("cpu_times")?;
        if !self.cpu_times {
            return Ok(Vec::new());
        }
        Ok(vec![CpuTimesStat {
            cpu: "cpu-total".to_string(),
            user: 100.0,
            system: 50.0,
            idle: 1000.0,
            nice: 1.0,
            iowait: 2.0,
            irq: 0.5,
            softirq: 0.25,
            steal: 0.0,
            guest: 0.0,
            guest_nice: 0.0,
        }])
    }

    fn virtual_memory(&self) -> Result<MemoryStat, ProviderError> {
        self.enter("virtual_memory")?;
        let total = 16 * GIB;
        let used = 4 * GIB;
        Ok(MemoryStat {
            total,
            available: 12 * GIB,
            used,
            free: 10 * GIB,
            used_percent: percent_of(used, total),
        })
    }

    fn swap_memory(&self) -> Result<SwapStat, ProviderError> {
        self.enter("swap_memory")?;
        Ok(SwapStat {
            total: 2 * GIB,
            used: 0,
            free: 2 * GIB,
            used_percent: 0.0,
        })
    }

    fn disk_partitions(&self) -> Result<Vec<PartitionStat>, ProviderError> {
        self.enter("disk_partitions")?;
        Ok(["/", "/home", "/boot"]
            .iter()
            .enumerate()
            .map(|(i, mount)| PartitionStat {
                device: format!("/dev/sda{}", i + 1),
                mountpoint: mount.to_string(),
                fstype: "ext4".to_string(),
                kind: "SSD".to_string(),
                removable: false,
            })
            .collect())
    }

    fn disk_usage(&self, mountpoint: &str) -> Result<DiskUsageStat, ProviderError> {
        self.enter("disk_usage")?;
        if self.fail_mount.as_deref() == Some(mountpoint) {
            return Err(ProviderError::NoSuchMountPoint(mountpoint.to_string()));
        }
        let total = 100 * GIB;
        let used = 25 * GIB;
        Ok(DiskUsageStat {
            path: mountpoint.to_string(),
            fstype: "ext4".to_string(),
            total,
            free: total - used,
            used,
            used_percent: percent_of(used, total),
        })
    }

    fn net_io_counters(&self) -> Result<Vec<NetIoStat>, ProviderError> {
        self.enter("net_io_counters")?;
        Ok(vec![NetIoStat {
            name: "eth0".to_string(),
            bytes_sent: 1_000,
            bytes_recv: 2_000,
            packets_sent: 10,
            packets_recv: 20,
            errin: 0,
            errout: 0,
        }])
    }

    fn net_interfaces(&self) -> Result<Vec<String>, ProviderError> {
        self.enter("net_interfaces")?;
        Ok(vec!["lo".to_string(), "eth0".to_string()])
    }

    fn net_if_addrs(&self, name: &str) -> Result<Vec<String>, ProviderError> {
        self.enter("net_if_addrs")?;
        if self.fail_iface.as_deref() == Some(name) {
            return Err(ProviderError::NoSuchInterface(name.to_string()));
        }
        match name {
            "lo" => Ok(vec!["127.0.0.1/8".to_string()]),
            "eth0" => Ok(vec!["192.168.1.10/24".to_string()]),
            other => Err(ProviderError::NoSuchInterface(other.to_string())),
        }
    }

    fn net_if_stats(&self, name: &str) -> Result<NetIfStat, ProviderError> {
        self.enter("net_if_stats")?;
        Ok(NetIfStat {
            name: name.to_string(),
            mtu: 1500,
            flags: vec!["up".to_string()],
            hardware_addr: "00:11:22:33:44:55".to_string(),
        })
    }

    fn host_info(&self) -> Result<HostInfoStat, ProviderError> {
        self.enter("host_info")?;
        Ok(HostInfoStat {
            hostname: "testhost".to_string(),
            os: "linux".to_string(),
            platform: "Debian GNU/Linux".to_string(),
            platform_version: "12".to_string(),
            kernel_version: "6.1.0".to_string(),
            kernel_arch: "x86_64".to_string(),
            uptime: self.uptime,
            boot_time: 1_700_000_000,
        })
    }
}
