//! Total/free memory figures from the sysinfo(2) syscall.

use std::io;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Memory totals in native pages, plus the page-to-byte multiplier the
/// kernel reports alongside them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total_pages: u64,
    pub free_pages: u64,
    pub unit_bytes: u64,
}

impl MemoryInfo {
    /// Query the kernel for current memory figures.
    pub fn probe() -> io::Result<Self> {
        let mut raw: libc::sysinfo = unsafe { std::mem::zeroed() };
        // SAFETY: sysinfo only writes into the struct it is handed.
        if unsafe { libc::sysinfo(&mut raw) } != 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            total_pages: raw.totalram as u64,
            free_pages: raw.freeram as u64,
            unit_bytes: u64::from(raw.mem_unit),
        })
    }

    pub fn total_mb(&self) -> u64 {
        pages_to_mb(self.total_pages, self.unit_bytes)
    }

    pub fn free_mb(&self) -> u64 {
        pages_to_mb(self.free_pages, self.unit_bytes)
    }
}

/// Whole megabytes covered by `pages` units of `unit_bytes`, truncating.
fn pages_to_mb(pages: u64, unit_bytes: u64) -> u64 {
    pages * unit_bytes / BYTES_PER_MB
}
