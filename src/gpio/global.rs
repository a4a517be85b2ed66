//! # Process-wide GPIO controller
//!
//! The register block is mapped at most once per process. [`initialize`] detects the SoC, maps
//! the GPIO registers and stores the resulting controller. Subsequent calls return the stored
//! controller without touching the hardware again.
//!
//! If detection or mapping fails nothing is stored, so [`controller`] and all
//! [`DynPin`](super::DynPin) operations keep failing with [`Error::NotInitialized`] and a later
//! call to [`initialize`] may be retried.
use super::pins::Gpio;
use super::reg::GPIO_OFFSET;
use crate::error::{Error, Result};
use crate::hardware::{HardwareDetector, ProcDetector, SoC};
use crate::memory::{page_size, MemDevice, MemoryMap, RegisterWindow};
use core::sync::atomic::{AtomicBool, Ordering};
use embedded_hal::blocking::delay::DelayUs;
use once_cell::sync::OnceCell;

static GPIO: OnceCell<Gpio<MemoryMap>> = OnceCell::new();

/// Auto-clear setting requested before the controller existed. Once the controller is created
/// its own flag is the only one that counts.
static SUPPRESS_EVENT_CLEAR: AtomicBool = AtomicBool::new(false);

/// Map the GPIO registers through `/dev/mem`. Requires root.
pub fn initialize() -> Result<&'static Gpio<MemoryMap>> {
    initialize_with(MemDevice::Mem)
}

/// Map the GPIO registers through the given device
pub fn initialize_with(device: MemDevice) -> Result<&'static Gpio<MemoryMap>> {
    initialize_from(&ProcDetector, |soc| map_gpio(device, soc))
}

/// Create the process-wide controller from a custom detector and mapping
///
/// Neither `detector` nor `map` run if the controller already exists. In that case the existing
/// controller is returned unchanged.
pub fn initialize_from<F>(
    detector: &impl HardwareDetector,
    map: F,
) -> Result<&'static Gpio<MemoryMap>>
where
    F: FnOnce(SoC) -> Result<MemoryMap>,
{
    init_once(&GPIO, &SUPPRESS_EVENT_CLEAR, detector, map)
}

/// Returns the process-wide controller or [`Error::NotInitialized`]
pub fn controller() -> Result<&'static Gpio<MemoryMap>> {
    GPIO.get().ok_or(Error::NotInitialized("controller"))
}

pub fn is_initialized() -> bool {
    GPIO.get().is_some()
}

/// Process-wide switch for [`DynPin::event`](super::DynPin::event). Can be changed at any time,
/// also before initialization.
pub fn set_suppress_event_clear(suppress: bool) {
    SUPPRESS_EVENT_CLEAR.store(suppress, Ordering::Relaxed);
    if let Some(gpio) = GPIO.get() {
        gpio.set_suppress_event_clear(suppress);
    }
}

/// Current auto-clear setting of the process-wide controller, or the requested one if it does
/// not exist yet
pub fn suppress_event_clear() -> bool {
    match GPIO.get() {
        Some(gpio) => gpio.suppress_event_clear(),
        None => SUPPRESS_EVENT_CLEAR.load(Ordering::Relaxed),
    }
}

/// Map the GPIO block of `soc`. `/dev/gpiomem` exposes the GPIO block at offset 0.
pub fn map_gpio(device: MemDevice, soc: SoC) -> Result<MemoryMap> {
    let offset = match device {
        MemDevice::Mem => soc.peripheral_base() + GPIO_OFFSET,
        MemDevice::GpioMem => 0,
    };
    MemoryMap::open(device, offset, page_size())
}

/// Fill `cell` exactly once. The detector and the mapping only run if `cell` is empty, and
/// `cell` stays empty if either fails. `suppress` is applied to the new controller only.
pub(crate) fn init_once<'c, W, D, F>(
    cell: &'c OnceCell<Gpio<W, D>>,
    suppress: &AtomicBool,
    detector: &impl HardwareDetector,
    map: F,
) -> Result<&'c Gpio<W, D>>
where
    W: RegisterWindow,
    D: DelayUs<u32> + Clone + Default,
    F: FnOnce(SoC) -> Result<W>,
{
    cell.get_or_try_init(|| {
        let soc = detector.detect()?;
        if soc == SoC::Bcm2711 {
            log::warn!("{:?} uses different pull registers, set_pull has no effect", soc);
        }
        let gpio = Gpio::with_delay(map(soc)?, D::default())?;
        gpio.set_suppress_event_clear(suppress.load(Ordering::Relaxed));
        log::info!("GPIO registers of {:?} mapped", soc);
        Ok(gpio)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::StdDelay;
    use core::cell::Cell;
    use std::io;
    use std::sync::Mutex;

    struct FakeDetector {
        result: Option<SoC>,
        calls: Cell<u32>,
    }

    impl FakeDetector {
        fn new(result: Option<SoC>) -> Self {
            FakeDetector {
                result,
                calls: Cell::new(0),
            }
        }
    }

    impl HardwareDetector for FakeDetector {
        fn detect(&self) -> Result<SoC> {
            self.calls.set(self.calls.get() + 1);
            self.result
                .ok_or_else(|| Error::UnsupportedHardware("test board".into()))
        }
    }

    #[derive(Debug, Default)]
    struct Words(Mutex<Vec<u32>>);

    impl RegisterWindow for Words {
        fn len(&self) -> usize {
            self.0.lock().unwrap().len() * 4
        }

        fn read(&self, offset: usize) -> u32 {
            self.0.lock().unwrap()[offset / 4]
        }

        fn write(&self, offset: usize, value: u32) {
            self.0.lock().unwrap()[offset / 4] = value;
        }
    }

    static NOT_SUPPRESSED: AtomicBool = AtomicBool::new(false);

    fn words() -> Result<Words> {
        Ok(Words(Mutex::new(vec![0; 0x100 / 4])))
    }

    #[test]
    fn init_runs_detection_and_mapping_once() {
        let cell = OnceCell::<Gpio<Words, StdDelay>>::new();
        let detector = FakeDetector::new(Some(SoC::Bcm2837));
        let maps = Cell::new(0);
        let first = init_once(&cell, &NOT_SUPPRESSED, &detector, |_| {
            maps.set(maps.get() + 1);
            words()
        })
        .unwrap() as *const _;
        let second = init_once(&cell, &NOT_SUPPRESSED, &detector, |_| {
            maps.set(maps.get() + 1);
            words()
        })
        .unwrap() as *const _;
        assert_eq!(first, second);
        assert_eq!(detector.calls.get(), 1);
        assert_eq!(maps.get(), 1);
    }

    #[test]
    fn unsupported_hardware_leaves_cell_empty() {
        let cell = OnceCell::<Gpio<Words, StdDelay>>::new();
        let detector = FakeDetector::new(None);
        let mapped = Cell::new(false);
        let err = init_once(&cell, &NOT_SUPPRESSED, &detector, |_| {
            mapped.set(true);
            words()
        })
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedHardware(_)));
        assert!(!mapped.get());
        assert!(cell.get().is_none());
    }

    #[test]
    fn map_failure_leaves_cell_empty_and_allows_retry() {
        let cell = OnceCell::<Gpio<Words, StdDelay>>::new();
        let detector = FakeDetector::new(Some(SoC::Bcm2835));
        let err = init_once(&cell, &NOT_SUPPRESSED, &detector, |_| {
            Err(Error::MapFailure(io::Error::from(
                io::ErrorKind::PermissionDenied,
            )))
        })
        .unwrap_err();
        assert!(matches!(err, Error::MapFailure(_)));
        assert!(cell.get().is_none());

        init_once(&cell, &NOT_SUPPRESSED, &detector, |_| words()).unwrap();
        assert!(cell.get().is_some());
        assert_eq!(detector.calls.get(), 2);
    }

    #[test]
    fn mapping_receives_detected_soc() {
        let cell = OnceCell::<Gpio<Words, StdDelay>>::new();
        let detector = FakeDetector::new(Some(SoC::Bcm2711));
        init_once(&cell, &NOT_SUPPRESSED, &detector, |soc| {
            assert_eq!(soc, SoC::Bcm2711);
            words()
        })
        .unwrap();
    }

    #[test]
    fn short_window_leaves_cell_empty() {
        let cell = OnceCell::<Gpio<Words, StdDelay>>::new();
        let detector = FakeDetector::new(Some(SoC::Bcm2837));
        let err = init_once(&cell, &NOT_SUPPRESSED, &detector, |_| {
            Ok(Words(Mutex::new(vec![0; 0x40 / 4])))
        })
        .unwrap_err();
        assert!(matches!(err, Error::MapFailure(e) if e.kind() == io::ErrorKind::InvalidInput));
        assert!(cell.get().is_none());
    }

    #[test]
    fn requested_suppression_only_applies_to_new_controller() {
        let cell = OnceCell::<Gpio<Words, StdDelay>>::new();
        let detector = FakeDetector::new(Some(SoC::Bcm2837));
        let requested = AtomicBool::new(true);
        let gpio = init_once(&cell, &requested, &detector, |_| words()).unwrap();
        assert!(gpio.suppress_event_clear());

        gpio.set_suppress_event_clear(false);
        let again = init_once(&cell, &requested, &detector, |_| words()).unwrap();
        assert!(!again.suppress_event_clear());

        requested.store(false, Ordering::Relaxed);
        again.set_suppress_event_clear(true);
        let again = init_once(&cell, &requested, &detector, |_| words()).unwrap();
        assert!(again.suppress_event_clear());
    }
}
