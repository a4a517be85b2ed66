//! Poll for button presses using the falling edge detector
//!
//! Connect a push button between GPIO27 (header pin 13) and ground. The internal pull-up keeps
//! the pin high while the button is released. Uses the process-wide controller, so the pin is
//! created before the registers are mapped.
use bcm283x_hal::{
    delay::StdDelay,
    gpio::{self, DynPin, Mode, PullMode},
    memory::MemDevice,
    prelude::*,
};

fn main() -> bcm283x_hal::Result<()> {
    env_logger::init();
    let button = DynPin::new(27)?;
    // Keep the flag latched until the press was handled
    gpio::set_suppress_event_clear(true);
    gpio::initialize_with(MemDevice::GpioMem)?;

    button.set_mode(Mode::Input)?;
    button.set_pull(PullMode::Up)?;
    button.clear_event()?;
    button.set_falling_edge_detect(true)?;

    let mut delay = StdDelay::new();
    let mut presses = 0;
    while presses < 5 {
        if button.event()? {
            presses += 1;
            log::info!("{} pressed ({}/5)", button, presses);
            // Debounce
            delay.delay_ms(50_u16);
            button.clear_event()?;
        }
        delay.delay_ms(10_u16);
    }
    button.set_falling_edge_detect(false)?;
    button.set_pull(PullMode::Off)?;
    Ok(())
}
