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

//! Front panel key ladder.
//!
//! The four buttons share one analog pin through a resistor ladder; each
//! button pulls the line into its own voltage band. With no button pressed
//! the line sits at the reference.

use crate::config::{KEY2_FLOOR, KEY3_FLOOR, KEY4_FLOOR, KEY_NONE_FLOOR};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
}

impl ButtonId {
    pub const ALL: [ButtonId; 4] = [ButtonId::One, ButtonId::Two, ButtonId::Three, ButtonId::Four];

    /// Button number printed on the panel, 1 to 4.
    pub const fn number(self) -> u8 {
        self as u8
    }

    pub const fn index(self) -> usize {
        self as usize - 1
    }

    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(ButtonId::One),
            2 => Some(ButtonId::Two),
            3 => Some(ButtonId::Three),
            4 => Some(ButtonId::Four),
            _ => None,
        }
    }
}

impl ufmt::uDisplay for ButtonId {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        ufmt::uwrite!(f, "btn{}", self.number())
    }
}

/// Map a 10-bit converter sample to the pressed button, if any.
pub const fn decode(sample: u16) -> Option<ButtonId> {
    match sample {
        s if s >= KEY_NONE_FLOOR => None,
        s if s >= KEY4_FLOOR => Some(ButtonId::Four),
        s if s >= KEY3_FLOOR => Some(ButtonId::Three),
        s if s >= KEY2_FLOOR => Some(ButtonId::Two),
        _ => Some(ButtonId::One),
    }
}
