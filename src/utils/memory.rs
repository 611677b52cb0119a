use std::fs;

use tracing::{debug, warn};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemoryStatus {
    Sufficient { available_gb: f64 },
    Low { available_gb: f64 },
    /// The platform gave no usable figure.
    Unknown,
}

/// Pre-run threshold in GiB: one GiB per ten thousand digits, never below `floor_gb`.
pub fn threshold_for(digits: usize, floor_gb: f64) -> f64 {
    floor_gb.max(digits as f64 / 10_000.0)
}

pub fn available_bytes() -> Option<u64> {
    meminfo_available().or_else(sysinfo_available)
}

pub fn check_memory(threshold_gb: f64) -> MemoryStatus {
    match available_bytes() {
        Some(bytes) => classify(bytes, threshold_gb),
        None => MemoryStatus::Unknown,
    }
}

/// Logs a warning when available memory drops under `threshold_gb`.
pub fn warn_if_low(threshold_gb: f64) -> MemoryStatus {
    let status = check_memory(threshold_gb);
    match status {
        MemoryStatus::Low { available_gb } => {
            warn!(available_gb, threshold_gb, "available memory is running low");
        }
        MemoryStatus::Sufficient { available_gb } => debug!(available_gb, "memory check passed"),
        MemoryStatus::Unknown => debug!("available memory unknown on this platform"),
    }
    status
}

fn classify(bytes: u64, threshold_gb: f64) -> MemoryStatus {
    let available_gb = bytes as f64 / GIB;
    if available_gb < threshold_gb {
        MemoryStatus::Low { available_gb }
    } else {
        MemoryStatus::Sufficient { available_gb }
    }
}

/// `MemAvailable` from /proc/meminfo, in bytes.
fn meminfo_available() -> Option<u64> {
    let text = fs::read_to_string("/proc/meminfo").ok()?;
    parse_meminfo_available(&text)
}

fn parse_meminfo_available(text: &str) -> Option<u64> {
    text.lines()
        .find_map(|line| line.strip_prefix("MemAvailable:"))
        .and_then(|rest| rest.trim().trim_end_matches("kB").trim().parse::<u64>().ok())
        .map(|kb| kb * 1024)
}

#[cfg(target_os = "linux")]
fn sysinfo_available() -> Option<u64> {
    let mut info: libc::sysinfo = unsafe { std::mem::zeroed() };
    // SAFETY: sysinfo only writes into the struct we hand it
    let rc = unsafe { libc::sysinfo(&mut info) };
    if rc != 0 {
        return None;
    }
    let unit = u64::from(info.mem_unit).max(1);
    Some((info.freeram as u64 + info.bufferram as u64) * unit)
}

#[cfg(not(target_os = "linux"))]
fn sysinfo_available() -> Option<u64> {
    None
}
