//! # Register windows
//!
//! A [`RegisterWindow`] is a fixed-size block of 32-bit peripheral registers addressed by byte
//! offset. The GPIO controller only ever talks to its registers through this trait, which keeps
//! the bit manipulation independent of the way the registers were obtained.
//!
//! [`MemoryMap`] is the implementation used on real hardware. It maps a physical address range
//! into the process with `mmap(2)`.
use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::ptr::{self, NonNull};

// Peripheral addresses above 2 GiB need a 64-bit file offset on 32-bit targets
#[cfg(all(target_os = "linux", target_env = "gnu"))]
use libc::{mmap64 as mmap, off64_t as off_t};
#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
use libc::{mmap, off_t};

/// Indexed 32-bit access into a block of peripheral registers
///
/// Offsets are byte offsets from the start of the window. Implementations must reject offsets
/// which are not word aligned or which lie outside of the window.
pub trait RegisterWindow {
    /// Size of the window in bytes
    fn len(&self) -> usize;

    /// Volatile read of the word at `offset`
    fn read(&self, offset: usize) -> u32;

    /// Volatile write of `value` to the word at `offset`
    fn write(&self, offset: usize, value: u32);

    /// Read-modify-write of a single word
    ///
    /// This is not atomic. Two threads modifying the same word race with each other.
    #[inline]
    fn modify<F: FnOnce(u32) -> u32>(&self, offset: usize, f: F)
    where
        Self: Sized,
    {
        let value = self.read(offset);
        self.write(offset, f(value));
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Panics if `offset` can not address a whole word inside a window of `len` bytes
#[inline]
pub fn check_offset(len: usize, offset: usize) {
    assert!(offset % 4 == 0, "register offset {offset:#x} is not word aligned");
    assert!(
        offset.checked_add(4).map_or(false, |end| end <= len),
        "register offset {offset:#x} outside of {len:#x} byte window"
    );
}

/// Size of a memory page of the running system
pub fn page_size() -> usize {
    // Safety: sysconf has no preconditions
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 {
        4096
    } else {
        size as usize
    }
}

/// Character device providing access to the peripheral registers
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MemDevice {
    /// `/dev/mem`, the whole physical address space. Requires root.
    #[default]
    Mem,
    /// `/dev/gpiomem`, only the GPIO block starting at offset 0. Usually accessible to the
    /// `gpio` group.
    GpioMem,
}

impl MemDevice {
    pub fn path(&self) -> &'static str {
        match self {
            MemDevice::Mem => "/dev/mem",
            MemDevice::GpioMem => "/dev/gpiomem",
        }
    }
}

/// Physical register block mapped into the process
///
/// The mapping is released when this struct is dropped.
#[derive(Debug)]
pub struct MemoryMap {
    base: NonNull<u32>,
    len: usize,
}

// The mapping is plain shared memory. Synchronizing accesses to the same register is the job
// of the caller, just like for the registers themselves.
unsafe impl Send for MemoryMap {}
unsafe impl Sync for MemoryMap {}

fn invalid_mapping(len: usize, offset: u64) -> Error {
    Error::MapFailure(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("invalid mapping of {len:#x} bytes at {offset:#x}"),
    ))
}

/// `offset` as `mmap` file offset, rejecting values the platform can not represent
fn file_offset(offset: u64) -> Option<off_t> {
    off_t::try_from(offset).ok()
}

impl MemoryMap {
    /// Map `len` bytes of `device` starting at `offset`
    ///
    /// `offset` must be page aligned and `len` should be a multiple of the page size.
    pub fn open(device: MemDevice, offset: u64, len: usize) -> Result<Self> {
        if len == 0 || offset % page_size() as u64 != 0 {
            return Err(invalid_mapping(len, offset));
        }
        let file_offset = file_offset(offset).ok_or_else(|| invalid_mapping(len, offset))?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(device.path())
            .map_err(Error::MapFailure)?;
        log::debug!(
            "mapping {:#x} bytes at {:#x} of {}",
            len,
            offset,
            device.path()
        );
        // Safety: We request a fresh shared mapping, no existing memory is affected. The file
        // descriptor may be closed afterwards, the mapping stays valid.
        let mapped = unsafe {
            mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                file_offset,
            )
        };
        MemoryMap::from_mapping(mapped, len)
    }

    /// Map `len` bytes of zero initialized process memory
    ///
    /// The window behaves like plain memory, none of the side effects of the GPIO registers
    /// happen. Useful to run code built on the global controller without hardware.
    pub fn anonymous(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(invalid_mapping(len, 0));
        }
        // Safety: A fresh private mapping, no existing memory is affected
        let mapped = unsafe {
            mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        MemoryMap::from_mapping(mapped, len)
    }

    fn from_mapping(mapped: *mut libc::c_void, len: usize) -> Result<Self> {
        if mapped == libc::MAP_FAILED {
            return Err(Error::MapFailure(io::Error::last_os_error()));
        }
        let base = NonNull::new(mapped as *mut u32)
            .ok_or_else(|| Error::MapFailure(io::Error::from(io::ErrorKind::AddrNotAvailable)))?;
        Ok(MemoryMap { base, len })
    }
}

impl RegisterWindow for MemoryMap {
    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn read(&self, offset: usize) -> u32 {
        check_offset(self.len, offset);
        // Safety: The offset was checked against the size of the mapping
        unsafe { ptr::read_volatile(self.base.as_ptr().add(offset / 4)) }
    }

    #[inline]
    fn write(&self, offset: usize, value: u32) {
        check_offset(self.len, offset);
        // Safety: The offset was checked against the size of the mapping
        unsafe { ptr::write_volatile(self.base.as_ptr().add(offset / 4), value) }
    }
}

impl Drop for MemoryMap {
    fn drop(&mut self) {
        // Safety: base and len describe exactly the mapping created in `open`
        let ret = unsafe { libc::munmap(self.base.as_ptr() as *mut libc::c_void, self.len) };
        if ret != 0 {
            log::warn!("munmap failed: {}", io::Error::last_os_error());
        }
    }
}
