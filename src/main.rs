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

//! Nixie clock firmware for an ATmega328P (Arduino Nano pinout).

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

#[cfg(feature = "panic-serial")]
mod panic;
#[cfg(not(feature = "panic-serial"))]
use panic_halt as _;

mod timer;
mod tubes;
mod twi;

use arduino_hal::prelude::*;
use nixieclock::config::{KEY_SAMPLES, SERIAL_BAUD};
use nixieclock::scheduler::RefreshReport;
use nixieclock::{controls, keys, Bus, Buttons, DisplayBuffer, InterruptControl, Time, TimeKeeper};

use crate::timer::{CLOCK, SCHEDULER};
use crate::tubes::Tubes;
use crate::twi::AvrTwi;

/// The global interrupt flag. The foreground loop runs with it cleared.
struct GlobalInterrupts;

impl InterruptControl for GlobalInterrupts {
    fn enable(&mut self) {
        // SAFETY: every piece of shared state sits behind a critical section.
        unsafe { avr_device::interrupt::enable() };
    }

    fn disable(&mut self) {
        avr_device::interrupt::disable();
    }
}

#[arduino_hal::entry]
fn main() -> ! {
    let dp = arduino_hal::Peripherals::take().unwrap();
    let pins = arduino_hal::pins!(dp);
    let mut serial = arduino_hal::default_serial!(dp, pins, SERIAL_BAUD);
    ufmt::uwriteln!(&mut serial, "nixieclock\r").unwrap_infallible();

    // Anodes on D9, D10, D11, D3 (PB1, PB2, PB3, PD3); decoder on D5, D6,
    // D7, D8 (PD5, PD6, PD7, PB0).
    let tubes = Tubes::new(
        [
            pins.d9.into_output_high().downgrade(),
            pins.d10.into_output_high().downgrade(),
            pins.d11.into_output_high().downgrade(),
            pins.d3.into_output_high().downgrade(),
        ],
        [
            pins.d5.into_output().downgrade(),
            pins.d6.into_output().downgrade(),
            pins.d7.into_output().downgrade(),
            pins.d8.into_output().downgrade(),
        ],
    );
    critical_section::with(|cs| tubes::install(cs, tubes));

    let mut adc = arduino_hal::Adc::new(dp.ADC, Default::default());
    let key_pin = pins.a1.into_analog_input(&mut adc);
    let mut read_key = || {
        let mut sum = 0u16;
        for _ in 0..KEY_SAMPLES {
            sum += adc.read_blocking(&key_pin);
        }
        keys::decode(sum / KEY_SAMPLES)
    };

    let mut keeper = TimeKeeper::new(Bus::new(AvrTwi::new(dp.TWI)));
    if let Err(e) = keeper.init() {
        ufmt::uwriteln!(&mut serial, "rtc init failed: {}\r", e).unwrap_infallible();
    }

    let boot_read = || {
        arduino_hal::delay_ms(10);
        read_key()
    };
    match controls::boot_hour_mode(boot_read, &mut keeper) {
        Ok(true) => {
            ufmt::uwriteln!(&mut serial, "hour mode {}\r", keeper.time().hour_mode())
                .unwrap_infallible();
        }
        Ok(false) => {}
        Err(e) => {
            ufmt::uwriteln!(&mut serial, "hour mode toggle failed: {}\r", e).unwrap_infallible();
        }
    }

    if let Err(e) = keeper.refresh() {
        ufmt::uwriteln!(&mut serial, "rtc read failed: {}\r", e).unwrap_infallible();
    }
    ufmt::uwriteln!(&mut serial, "time {}\r", keeper.time()).unwrap_infallible();
    critical_section::with(|cs| {
        SCHEDULER.show(cs, DisplayBuffer::showing(&keeper.time()));
        CLOCK.borrow(cs).replace(Some(keeper));
    });

    timer::init(dp.TC0, dp.TC1);

    let mut buttons = Buttons::new();
    let mut interrupts = GlobalInterrupts;
    let mut shown = Time::DEFAULT;
    loop {
        buttons.update(read_key());

        let (result, time, report) = critical_section::with(|cs| {
            let mut clock = CLOCK.borrow(cs).borrow_mut();
            let (result, time) = match clock.as_mut() {
                Some(keeper) => (controls::dispatch(&mut buttons, keeper), keeper.time()),
                None => (Ok(()), shown),
            };
            SCHEDULER.show(cs, DisplayBuffer::showing(&time));
            (result, time, SCHEDULER.take_refresh_report(cs))
        });

        if let Err(e) = result {
            ufmt::uwriteln!(&mut serial, "adjust failed: {}\r", e).unwrap_infallible();
        }
        if let Some(RefreshReport {
            failures,
            last_error,
        }) = report
        {
            ufmt::uwriteln!(&mut serial, "rtc read failed {}x: {}\r", failures, last_error)
                .unwrap_infallible();
        }
        if time.minutes() != shown.minutes() || time.hours() != shown.hours() {
            ufmt::uwriteln!(&mut serial, "time {}\r", time).unwrap_infallible();
            shown = time;
        }

        SCHEDULER.wait_for_tick(&mut interrupts);
    }
}
