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

//! Tick scheduling shared between the timer interrupts and the foreground
//! loop.
//!
//! The foreground loop runs with interrupts disabled and only opens them in
//! [`Scheduler::wait_for_tick`]. The fast tick sets the loop-ready flag and
//! advances the tube multiplexer; the slow tick refreshes the time from the
//! RTC. Everything the two contexts share lives here, behind
//! `critical_section::Mutex`.

use core::cell::Cell;

use critical_section::{CriticalSection, Mutex};

use crate::bus::{BusErrorKind, Twi};
use crate::display::{DisplayBuffer, Frame, Multiplexer};
use crate::ds1307::TimeKeeper;

/// Global interrupt enable, as seen by the foreground loop.
pub trait InterruptControl {
    fn enable(&mut self);
    fn disable(&mut self);
}

/// Failed slow-tick refreshes since the last report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub failures: u16,
    pub last_error: BusErrorKind,
}

pub struct Scheduler {
    loop_ready: Mutex<Cell<bool>>,
    display: Mutex<Cell<DisplayBuffer>>,
    mux: Mutex<Cell<Multiplexer>>,
    refresh_failures: Mutex<Cell<Option<RefreshReport>>>,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            loop_ready: Mutex::new(Cell::new(false)),
            display: Mutex::new(Cell::new(DisplayBuffer::new())),
            mux: Mutex::new(Cell::new(Multiplexer::new())),
            refresh_failures: Mutex::new(Cell::new(None)),
        }
    }

    /// Fast tick handler: release the foreground loop and select the next
    /// tube.
    pub fn fast_tick(&self, cs: CriticalSection<'_>) -> Frame {
        self.loop_ready.borrow(cs).set(true);
        let mux = self.mux.borrow(cs);
        let mut next = mux.get();
        let frame = next.tick(&self.display.borrow(cs).get());
        mux.set(next);
        frame
    }

    /// Slow tick handler: re-read the time from the RTC.
    pub fn slow_tick<T: Twi>(&self, cs: CriticalSection<'_>, keeper: &mut TimeKeeper<T>) {
        if let Err(error) = keeper.refresh() {
            let report = self.refresh_failures.borrow(cs);
            let failures = report.get().map_or(0, |r| r.failures);
            report.set(Some(RefreshReport {
                failures: failures.saturating_add(1),
                last_error: error,
            }));
        }
    }

    /// Open interrupts until the next fast tick, then close them again.
    ///
    /// This is the only place the tick handlers can run. The flag is cleared
    /// as soon as it is seen, so exactly one loop iteration runs per tick.
    pub fn wait_for_tick(&self, interrupts: &mut impl InterruptControl) {
        interrupts.enable();
        while !critical_section::with(|cs| self.loop_ready.borrow(cs).replace(false)) {
            core::hint::spin_loop();
        }
        interrupts.disable();
    }

    /// Replace what the multiplexer shows from the next tick on.
    pub fn show(&self, cs: CriticalSection<'_>, buffer: DisplayBuffer) {
        self.display.borrow(cs).set(buffer);
    }

    pub fn display(&self, cs: CriticalSection<'_>) -> DisplayBuffer {
        self.display.borrow(cs).get()
    }

    /// Take the pending refresh failure report, if any.
    pub fn take_refresh_report(&self, cs: CriticalSection<'_>) -> Option<RefreshReport> {
        self.refresh_failures.borrow(cs).take()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
