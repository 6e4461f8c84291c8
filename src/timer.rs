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

//! Tick sources for the scheduler.
//!
//! TC0 raises the fast tick that paces the foreground loop and multiplexes
//! the tubes, TC1 raises the slow tick that re-reads the RTC.
//!
//! Based on https://blog.rahix.de/005-avr-hal-millis/
use core::cell::RefCell;

use critical_section::Mutex;
use nixieclock::config::{
    FAST_TICK_COUNTS, FAST_TICK_PRESCALER, SLOW_TICK_COUNTS, SLOW_TICK_PRESCALER,
};
use nixieclock::{Scheduler, TimeKeeper};

use crate::tubes;
use crate::twi::AvrTwi;

// Possible fast tick values at 16 MHz:
//
// ╔═══════════╦══════════════╦═══════════════════╗
// ║ PRESCALER ║ TIMER_COUNTS ║ Overflow Interval ║
// ╠═══════════╬══════════════╬═══════════════════╣
// ║        64 ║          250 ║              1 ms ║
// ║       256 ║          125 ║              2 ms ║
// ║       256 ║          250 ║              4 ms ║
// ║      1024 ║          125 ║              8 ms ║
// ║      1024 ║          250 ║             16 ms ║
// ╚═══════════╩══════════════╩═══════════════════╝
//
// The slow tick runs TC1 at 1024 with 15625 counts for 1 s.

pub static SCHEDULER: Scheduler = Scheduler::new();

/// The RTC, shared between the foreground loop and the slow tick.
pub static CLOCK: Mutex<RefCell<Option<TimeKeeper<AvrTwi>>>> = Mutex::new(RefCell::new(None));

/// Timer/Counter 0 Compare Match A: fast tick.
#[avr_device::interrupt(atmega328p)]
fn TIMER0_COMPA() {
    critical_section::with(|cs| {
        let frame = SCHEDULER.fast_tick(cs);
        tubes::show(cs, frame);
    })
}

/// Timer/Counter 1 Compare Match A: slow tick.
#[avr_device::interrupt(atmega328p)]
fn TIMER1_COMPA() {
    critical_section::with(|cs| {
        if let Some(keeper) = CLOCK.borrow(cs).borrow_mut().as_mut() {
            SCHEDULER.slow_tick(cs, keeper);
        }
    })
}

/// Start both tick sources. Nothing fires until interrupts are enabled.
pub fn init(tc0: arduino_hal::pac::TC0, tc1: arduino_hal::pac::TC1) {
    // Clear Timer on Compare mode, counting to OCR0A.
    tc0.tccr0a.write(|w| w.wgm0().ctc());
    tc0.ocr0a.write(|w| w.bits((FAST_TICK_COUNTS - 1) as u8));
    tc0.tccr0b.write(|w| match FAST_TICK_PRESCALER {
        8 => w.cs0().prescale_8(),
        64 => w.cs0().prescale_64(),
        256 => w.cs0().prescale_256(),
        1024 => w.cs0().prescale_1024(),
        _ => w.cs0().direct(),
    });
    tc0.timsk0.write(|w| w.ocie0a().set_bit());

    // CTC on OCR1A is WGM1 = 0b0100, split over both control registers.
    tc1.tccr1a.write(|w| w.wgm1().bits(0b00));
    tc1.tccr1b.write(|w| {
        let w = w.wgm1().bits(0b01);
        match SLOW_TICK_PRESCALER {
            8 => w.cs1().prescale_8(),
            64 => w.cs1().prescale_64(),
            256 => w.cs1().prescale_256(),
            1024 => w.cs1().prescale_1024(),
            _ => w.cs1().direct(),
        }
    });
    tc1.ocr1a.write(|w| w.bits((SLOW_TICK_COUNTS - 1) as u16));
    tc1.timsk1.write(|w| w.ocie1a().set_bit());
}
