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

//! Display buffer and tube multiplexer.
//!
//! Only one tube is lit at a time. On every fast tick the multiplexer moves
//! to the next tube and picks the glyph the buffer holds for it.

use crate::time::Time;

/// A decimal digit, 0 to 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Digit(u8);

impl Digit {
    pub const fn new(value: u8) -> Option<Self> {
        if value <= 9 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Least significant decimal digit of `value`.
    pub const fn low(value: u8) -> Self {
        Self(value % 10)
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

/// What a tube shows: a digit, or nothing when `None`.
pub type Glyph = Option<Digit>;

/// Tube positions. D is the leftmost tube, A the rightmost.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tube {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
}

impl Tube {
    pub const ALL: [Tube; 4] = [Tube::A, Tube::B, Tube::C, Tube::D];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn next(self) -> Self {
        match self {
            Tube::A => Tube::B,
            Tube::B => Tube::C,
            Tube::C => Tube::D,
            Tube::D => Tube::A,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayBuffer {
    glyphs: [Glyph; 4],
    on: bool,
}

impl DisplayBuffer {
    /// All tubes showing zero, display on.
    pub const fn new() -> Self {
        Self {
            glyphs: [Some(Digit(0)); 4],
            on: true,
        }
    }

    /// Hours on the left pair, minutes on the right pair.
    pub const fn showing(time: &Time) -> Self {
        let (h, m) = (time.hour_digits(), time.minute_digits());
        Self {
            glyphs: [
                Some(Digit::low(m.units)),
                Some(Digit::low(m.tens)),
                Some(Digit::low(h.units)),
                Some(Digit::low(h.tens)),
            ],
            on: true,
        }
    }

    pub fn set(&mut self, tube: Tube, glyph: Glyph) {
        self.glyphs[tube.index()] = glyph;
    }

    pub const fn glyph(&self, tube: Tube) -> Glyph {
        self.glyphs[tube.index()]
    }

    pub fn set_on(&mut self, on: bool) {
        self.on = on;
    }

    pub const fn is_on(&self) -> bool {
        self.on
    }
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// The tube to light for one fast tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub tube: Tube,
    pub glyph: Glyph,
}

/// Cathode decoder input that blanks the tube.
pub const CATHODE_BLANK: u8 = 0b1111;

/// Four bit code for the cathode decoder.
///
/// The decoder outputs are wired in reverse, so digit `n` is selected by
/// `(10 - n) % 10`.
pub const fn cathode_code(glyph: Glyph) -> u8 {
    match glyph {
        Some(digit) => (10 - digit.value()) % 10,
        None => CATHODE_BLANK,
    }
}

// Brightness steps; 0 would be fully off and is never produced.
const FADE_LEVELS: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multiplexer {
    tube: Tube,
    fade: u8,
}

impl Multiplexer {
    pub const fn new() -> Self {
        Self {
            tube: Tube::D,
            fade: FADE_LEVELS,
        }
    }

    /// Select the next tube and the glyph it should show.
    pub fn tick(&mut self, buffer: &DisplayBuffer) -> Frame {
        self.tube = self.tube.next();
        self.fade = if self.fade >= FADE_LEVELS { 1 } else { self.fade + 1 };
        let glyph = if buffer.is_on() {
            buffer.glyph(self.tube)
        } else {
            None
        };
        Frame {
            tube: self.tube,
            glyph,
        }
    }

    pub const fn tube(&self) -> Tube {
        self.tube
    }

    /// Current brightness step, 1 to 5.
    pub const fn fade_level(&self) -> u8 {
        self.fade
    }
}

impl Default for Multiplexer {
    fn default() -> Self {
        Self::new()
    }
}
