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

//! Tube anode and cathode pins.

use core::cell::RefCell;

use arduino_hal::port::{mode, Pin};
use critical_section::{CriticalSection, Mutex};
use nixieclock::display::{cathode_code, Frame};

type Output = Pin<mode::Output>;

pub struct Tubes {
    /// Indexed by `Tube::index`, driven low to light the tube.
    anodes: [Output; 4],
    /// Decoder inputs, bit 0 first.
    cathodes: [Output; 4],
}

static TUBES: Mutex<RefCell<Option<Tubes>>> = Mutex::new(RefCell::new(None));

impl Tubes {
    pub fn new(anodes: [Output; 4], cathodes: [Output; 4]) -> Self {
        let mut tubes = Self { anodes, cathodes };
        tubes.all_off();
        tubes
    }

    fn all_off(&mut self) {
        for anode in self.anodes.iter_mut() {
            anode.set_high();
        }
    }

    fn show(&mut self, frame: Frame) {
        self.all_off();
        let code = cathode_code(frame.glyph);
        for (bit, cathode) in self.cathodes.iter_mut().enumerate() {
            if code & (1 << bit) != 0 {
                cathode.set_high();
            } else {
                cathode.set_low();
            }
        }
        self.anodes[frame.tube.index()].set_low();
    }
}

/// Hand the pins over to the fast tick.
pub fn install(cs: CriticalSection<'_>, tubes: Tubes) {
    TUBES.borrow(cs).replace(Some(tubes));
}

/// Light the tube selected by the multiplexer.
pub fn show(cs: CriticalSection<'_>, frame: Frame) {
    if let Some(tubes) = TUBES.borrow(cs).borrow_mut().as_mut() {
        tubes.show(frame);
    }
}
