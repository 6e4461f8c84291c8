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

//! DS1307 RTC interface

use crate::bus::{Bus, BusResult, Direction, Twi};
use crate::time::{Adjust, Time};

/// 7-bit bus address of the DS1307.
pub const RTC_ADDRESS: u8 = 0x68;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Seconds = 0x00,
    Minutes = 0x01,
    Hours = 0x02,
    Control = 0x07,
}

// Clock halt bit in the seconds register
const HALT: u8 = 1 << 7;

// Square wave output disabled, OUT pin low
const CONTROL_DEFAULT: u8 = 0x00;

/// Keeps the in-memory [`Time`] in step with the RTC chip.
pub struct TimeKeeper<T> {
    bus: Bus<T>,
    time: Time,
}

impl<T: Twi> TimeKeeper<T> {
    pub const fn new(bus: Bus<T>) -> Self {
        Self {
            bus,
            time: Time::DEFAULT,
        }
    }

    /// Last time read from or written to the chip.
    pub fn time(&self) -> Time {
        self.time
    }

    pub fn bus(&self) -> &Bus<T> {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus<T> {
        &mut self.bus
    }

    pub fn release(self) -> Bus<T> {
        self.bus
    }

    /// Reset the in-memory time, clear the control register and start the
    /// oscillator. If the chip does not hold a valid time (first power up),
    /// the default time is written to it.
    pub fn init(&mut self) -> BusResult {
        self.time = Time::DEFAULT;
        self.write_register(Register::Control, CONTROL_DEFAULT)?;
        self.set_halt(false)?;
        if Time::from_registers(self.read_time_registers()?).is_none() {
            self.write_time(Time::DEFAULT)?;
        }
        Ok(())
    }

    /// Read seconds, minutes and hours in one burst.
    ///
    /// The in-memory time only changes if the whole read succeeded and the
    /// registers hold a valid time.
    pub fn refresh(&mut self) -> BusResult {
        if let Some(time) = Time::from_registers(self.read_time_registers()?) {
            self.time = time;
        }
        Ok(())
    }

    pub fn adjust_minutes(&mut self, adjust: Adjust) -> BusResult {
        self.halted(|keeper| {
            let time = keeper.time.with_minutes_stepped(adjust);
            keeper.write_register(Register::Minutes, time.minutes_register())?;
            keeper.time = time;
            Ok(())
        })
    }

    pub fn adjust_hours(&mut self, adjust: Adjust) -> BusResult {
        self.halted(|keeper| {
            let time = keeper.time.with_hours_stepped(adjust);
            keeper.write_register(Register::Hours, time.hours_register())?;
            keeper.time = time;
            Ok(())
        })
    }

    /// Switch the chip between 12 and 24 hour mode, keeping the time of day.
    pub fn toggle_hour_mode(&mut self) -> BusResult {
        self.halted(|keeper| {
            keeper.refresh()?;
            let time = keeper
                .time
                .with_hour_mode(keeper.time.hour_mode().toggled());
            keeper.write_register(Register::Hours, time.hours_register())?;
            keeper.time = time;
            Ok(())
        })
    }

    /// Run `f` with the chip's clock halted.
    ///
    /// The clock is restarted on every exit path. The first error wins.
    fn halted<R>(&mut self, f: impl FnOnce(&mut Self) -> BusResult<R>) -> BusResult<R> {
        let result = self.set_halt(true).and_then(|()| f(self));
        let restart = self.set_halt(false);
        let value = result?;
        restart?;
        Ok(value)
    }

    /// Read-modify-write of the halt bit, preserving the seconds.
    fn set_halt(&mut self, halt: bool) -> BusResult {
        let mut seconds = [0u8];
        self.read_registers(Register::Seconds, &mut seconds)?;
        let seconds = if halt {
            seconds[0] | HALT
        } else {
            seconds[0] & !HALT
        };
        self.write_register(Register::Seconds, seconds)
    }

    fn read_time_registers(&mut self) -> BusResult<[u8; 3]> {
        let mut regs = [0u8; 3];
        self.read_registers(Register::Seconds, &mut regs)?;
        Ok(regs)
    }

    fn write_time(&mut self, time: Time) -> BusResult {
        self.bus.begin(RTC_ADDRESS, Direction::Write)?;
        self.bus.write_byte(Register::Seconds as u8)?;
        self.bus.write_byte(time.seconds_register())?;
        self.bus.write_byte(time.minutes_register())?;
        self.bus.write_byte(time.hours_register())?;
        self.bus.end();
        self.time = time;
        Ok(())
    }

    fn write_register(&mut self, register: Register, value: u8) -> BusResult {
        self.bus.begin(RTC_ADDRESS, Direction::Write)?;
        self.bus.write_byte(register as u8)?;
        self.bus.write_byte(value)?;
        self.bus.end();
        Ok(())
    }

    /// Point the chip at `first`, then read `buf.len()` consecutive registers
    /// after a repeated start. The last byte is NACKed.
    fn read_registers(&mut self, first: Register, buf: &mut [u8]) -> BusResult {
        self.bus.begin(RTC_ADDRESS, Direction::Write)?;
        self.bus.write_byte(first as u8)?;
        self.bus.begin(RTC_ADDRESS, Direction::Read)?;
        let n = buf.len();
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.bus.read_byte(i + 1 == n)?;
        }
        self.bus.end();
        Ok(())
    }
}
