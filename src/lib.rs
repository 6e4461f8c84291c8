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

//! Core of a four tube Nixie clock driven by an ATmega328P with a DS1307
//! real time clock.
//!
//! Everything in this crate is hardware independent and runs on the host:
//! the TWI master state machine, the DS1307 time keeper, the resistor ladder
//! key decoder, the button debouncer and the tube multiplexer. The AVR
//! binary supplies the register level pieces through the [`bus::Twi`] and
//! [`scheduler::InterruptControl`] traits.

#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod button;
pub mod config;
pub mod controls;
pub mod display;
pub mod ds1307;
pub mod keys;
pub mod scheduler;
pub mod time;

#[cfg(test)]
mod sim;

pub use bus::{Bus, BusErrorKind, BusResult, Twi};
pub use button::{Buttons, Debouncer, Phase};
pub use display::{DisplayBuffer, Frame, Multiplexer, Tube};
pub use ds1307::TimeKeeper;
pub use keys::ButtonId;
pub use scheduler::{InterruptControl, Scheduler};
pub use time::{Adjust, HourMode, Time};
