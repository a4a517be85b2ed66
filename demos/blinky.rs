//! Simple blinky example
//!
//! Toggles GPIO17 (header pin 11) a few times. Connect an LED with a series resistor between
//! the pin and ground. Runs without root if the user can access `/dev/gpiomem`.
use bcm283x_hal::{
    delay::StdDelay,
    gpio::{Gpio, Mode, PinState},
    memory::{page_size, MemDevice, MemoryMap},
    prelude::*,
};

fn main() -> bcm283x_hal::Result<()> {
    env_logger::init();
    let gpio = Gpio::new(MemoryMap::open(MemDevice::GpioMem, 0, page_size())?)?;
    let mut led = gpio.pin(17)?;
    let mut delay = StdDelay::new();

    let previous = led.mode();
    led.set_mode(Mode::Output);
    for _ in 0..10 {
        led.set_high().ok();
        delay.delay_ms(200_u16);
        led.set_low().ok();
        delay.delay_ms(200_u16);
    }
    led.set_level(PinState::Low);
    led.set_mode(previous);
    Ok(())
}
