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

//! Compile-time configuration.
//!
//! Board: ATmega328P clocked from a 16 MHz ceramic resonator.

/// CPU clock in Hz.
pub const F_CPU: u32 = 16_000_000;

/// Two-wire bus clock in Hz.
pub const F_SCL: u32 = 100_000;

/// TWI bit rate register value for `F_SCL` with a prescaler of 1.
///
/// SCL = F_CPU / (16 + 2 * TWBR)
pub const TWBR: u8 = ((F_CPU / F_SCL - 16) / 2) as u8;

/// Number of ready-flag polls before a bus step is abandoned (about 2 ms at
/// 100 kHz).
pub const READY_POLL_LIMIT: u16 = 2000;

// Fast tick: 16 MHz / 64 / 250 = 1 kHz
pub const FAST_TICK_PRESCALER: u32 = 64;
pub const FAST_TICK_COUNTS: u32 = 250;

// Slow tick: 16 MHz / 1024 / 15625 = 1 Hz
pub const SLOW_TICK_PRESCALER: u32 = 1024;
pub const SLOW_TICK_COUNTS: u32 = 15625;

/// Fast tick rate in Hz.
pub const FAST_TICK_HZ: u32 = F_CPU / FAST_TICK_PRESCALER / FAST_TICK_COUNTS;

/// Serial diagnostics baud rate.
pub const SERIAL_BAUD: u32 = 57600;

// Button timings, counted in fast ticks (ms).

/// Consecutive matching samples before a press is accepted.
pub const BTN_DETECT_TICKS: u16 = 7;
/// Unmatched samples after a release before the button unlocks.
pub const BTN_LOCK_TICKS: u16 = 30;
/// Hold time before `delay1` is raised.
pub const BTN_DELAY1_TICKS: u16 = 300;
/// Period of the `delay2` repeat pulse once `delay1` is set.
pub const BTN_DELAY2_TICKS: u16 = 65;
/// Hold time before `delay3` latches.
pub const BTN_DELAY3_TICKS: u16 = 2000;

// Resistor ladder bands on the 10-bit converter. Each value is the lowest
// sample belonging to the band.

/// At or above this the line is pulled to the reference: no key.
pub const KEY_NONE_FLOOR: u16 = 0x3C1;
pub const KEY4_FLOOR: u16 = 0x2F6;
pub const KEY3_FLOOR: u16 = 0x19A;
pub const KEY2_FLOOR: u16 = 0x090;

/// Conversions averaged into one key sample.
pub const KEY_SAMPLES: u16 = 3;
