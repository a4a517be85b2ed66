//! # SoC detection
//!
//! The physical address of the peripheral block depends on the SoC. The detector looks at the
//! device tree first and falls back to the `Hardware` line of `/proc/cpuinfo`, which older
//! kernels report for all Raspberry Pi models.
use crate::error::{Error, Result};
use std::fs;

const DEVICE_TREE_COMPATIBLE: &str = "/proc/device-tree/compatible";
const CPUINFO: &str = "/proc/cpuinfo";

/// Supported SoCs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoC {
    /// Raspberry Pi 1, Zero
    Bcm2835,
    /// Raspberry Pi 2
    Bcm2836,
    /// Raspberry Pi 3, Zero 2
    Bcm2837,
    /// Raspberry Pi 4, 400
    Bcm2711,
}

impl SoC {
    /// Physical address of the peripheral block as seen by the ARM core
    pub const fn peripheral_base(&self) -> u64 {
        match self {
            SoC::Bcm2835 => 0x2000_0000,
            SoC::Bcm2836 | SoC::Bcm2837 => 0x3F00_0000,
            SoC::Bcm2711 => 0xFE00_0000,
        }
    }

    /// Match a device tree `compatible` entry or a `/proc/cpuinfo` hardware name
    pub fn from_name(name: &str) -> Option<SoC> {
        let name = name.trim().to_ascii_lowercase();
        let name = name.strip_prefix("brcm,").unwrap_or(&name);
        match name {
            "bcm2835" | "bcm2708" => Some(SoC::Bcm2835),
            "bcm2836" | "bcm2709" => Some(SoC::Bcm2836),
            "bcm2837" | "bcm2710" => Some(SoC::Bcm2837),
            "bcm2711" => Some(SoC::Bcm2711),
            _ => None,
        }
    }
}

/// Identifies the SoC the process runs on
pub trait HardwareDetector {
    fn detect(&self) -> Result<SoC>;
}

/// Detector reading the kernel's view of the board from procfs
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcDetector;

impl HardwareDetector for ProcDetector {
    fn detect(&self) -> Result<SoC> {
        match fs::read(DEVICE_TREE_COMPATIBLE) {
            Ok(raw) => {
                if let Some(soc) = parse_compatible(&raw) {
                    log::debug!("detected {:?} from device tree", soc);
                    return Ok(soc);
                }
            }
            Err(e) => log::warn!("reading {} failed: {}", DEVICE_TREE_COMPATIBLE, e),
        }
        let cpuinfo = fs::read_to_string(CPUINFO)
            .map_err(|e| Error::UnsupportedHardware(format!("reading {CPUINFO} failed: {e}")))?;
        let soc = parse_cpuinfo(&cpuinfo)?;
        log::debug!("detected {:?} from {}", soc, CPUINFO);
        Ok(soc)
    }
}

/// The device tree property is a list of NUL terminated strings, most specific entry first
pub fn parse_compatible(raw: &[u8]) -> Option<SoC> {
    raw.split(|&b| b == 0)
        .filter_map(|entry| core::str::from_utf8(entry).ok())
        .find_map(SoC::from_name)
}

pub fn parse_cpuinfo(cpuinfo: &str) -> Result<SoC> {
    let hardware = cpuinfo
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim() == "Hardware")
        .map(|(_, value)| value.trim())
        .ok_or_else(|| Error::UnsupportedHardware("no hardware entry in cpuinfo".into()))?;
    SoC::from_name(hardware).ok_or_else(|| Error::UnsupportedHardware(hardware.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatible_list_picks_soc_entry() {
        let raw = b"raspberrypi,4-model-b\0brcm,bcm2711\0";
        assert_eq!(parse_compatible(raw), Some(SoC::Bcm2711));
        let raw = b"raspberrypi,model-zero-w\0brcm,bcm2835\0";
        assert_eq!(parse_compatible(raw), Some(SoC::Bcm2835));
        assert_eq!(parse_compatible(b"qemu,virt\0"), None);
    }

    #[test]
    fn cpuinfo_hardware_line() {
        let cpuinfo = "processor\t: 0\nmodel name\t: ARMv7 Processor rev 4 (v7l)\n\
                       Hardware\t: BCM2709\nRevision\t: a02082\n";
        assert_eq!(parse_cpuinfo(cpuinfo).unwrap(), SoC::Bcm2836);
        let cpuinfo = "Hardware\t: BCM2835\n";
        assert_eq!(parse_cpuinfo(cpuinfo).unwrap(), SoC::Bcm2835);
    }

    #[test]
    fn unknown_hardware_is_unsupported() {
        let err = parse_cpuinfo("Hardware\t: Allwinner sun8i\n").unwrap_err();
        assert!(matches!(err, Error::UnsupportedHardware(name) if name == "Allwinner sun8i"));
        assert!(matches!(
            parse_cpuinfo("processor\t: 0\n"),
            Err(Error::UnsupportedHardware(_))
        ));
    }

    #[test]
    fn peripheral_bases() {
        assert_eq!(SoC::Bcm2835.peripheral_base(), 0x2000_0000);
        assert_eq!(SoC::Bcm2837.peripheral_base(), 0x3F00_0000);
        assert_eq!(SoC::Bcm2711.peripheral_base(), 0xFE00_0000);
    }
}
