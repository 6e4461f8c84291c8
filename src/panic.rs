// This library is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This library is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this library.  If not, see <http://www.gnu.org/licenses/>.

//! Panic handler that reports the location over serial.
//!
//! Based on https://github.com/Rahix/avr-hal/blob/main/examples/arduino-uno/src/bin/uno-panic.rs

use nixieclock::config::SERIAL_BAUD;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    avr_device::interrupt::disable();

    // SAFETY: we never return, so nothing else uses the peripherals again.
    let dp = unsafe { arduino_hal::Peripherals::steal() };

    // Release the RTC and blank the tubes before reporting.
    dp.TWI
        .twcr
        .write(|w| w.twint().set_bit().twsto().set_bit().twen().set_bit());
    let pins = arduino_hal::pins!(dp);
    let _anodes = (
        pins.d9.into_output_high(),
        pins.d10.into_output_high(),
        pins.d11.into_output_high(),
        pins.d3.into_output_high(),
    );

    let mut serial = arduino_hal::default_serial!(dp, pins, SERIAL_BAUD);
    ufmt::uwriteln!(&mut serial, "panic\r").ok();
    if let Some(loc) = info.location() {
        ufmt::uwriteln!(
            &mut serial,
            " at {}:{}:{}\r",
            loc.file(),
            loc.line(),
            loc.column(),
        )
        .ok();
    }
    loop {}
}
