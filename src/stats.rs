use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuTimesStat {
    pub cpu: String,
    pub user: f64,
    pub system: f64,
    pub idle: f64,
    pub nice: f64,
    pub iowait: f64,
    pub irq: f64,
    pub softirq: f64,
    pub steal: f64,
    pub guest: f64,
    pub guest_nice: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStat {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub free: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapStat {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionStat {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
    pub kind: String,
    pub removable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskUsageStat {
    pub path: String,
    pub fstype: String,
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetIoStat {
    pub name: String,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub errin: u64,
    pub errout: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetIfStat {
    pub name: String,
    pub mtu: u64,
    pub flags: Vec<String>,
    pub hardware_addr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostInfoStat {
    pub hostname: String,
    pub os: String,
    pub platform: String,
    pub platform_version: String,
    pub kernel_version: String,
    pub kernel_arch: String,
    pub uptime: u64,
    pub boot_time: u64,
}

/// Share of `used` in `total` as a percentage, `0.0` for an empty total.
pub fn percent_of(used: u64, total: u64) -> f64 {
    if total > 0 {
        (used as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}
