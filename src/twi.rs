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

//! TWI peripheral registers behind the `Twi` trait.

use core::convert::Infallible;

use arduino_hal::pac::TWI;
use nixieclock::bus::{Command, Twi};
use nixieclock::config::TWBR;

pub struct AvrTwi {
    twi: TWI,
}

impl AvrTwi {
    /// Prescaler 1 and a 100 kHz clock. SDA and SCL are pulled up on the RTC
    /// board.
    pub fn new(twi: TWI) -> Self {
        twi.twsr.write(|w| unsafe { w.bits(0) });
        twi.twbr.write(|w| unsafe { w.bits(TWBR) });
        Self { twi }
    }
}

impl Twi for AvrTwi {
    fn command(&mut self, command: Command) {
        // TWINT is cleared by writing a one, which starts the next step.
        self.twi.twcr.write(|w| {
            let w = w.twint().set_bit().twen().set_bit();
            match command {
                Command::Start => w.twsta().set_bit(),
                Command::Stop => w.twsto().set_bit(),
                Command::ReadAck => w.twea().set_bit(),
                Command::Send | Command::ReadNack => w,
            }
        });
    }

    fn poll(&mut self) -> nb::Result<(), Infallible> {
        if self.twi.twcr.read().twint().bit_is_set() {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn status(&mut self) -> u8 {
        self.twi.twsr.read().bits()
    }

    fn write_data(&mut self, byte: u8) {
        self.twi.twdr.write(|w| unsafe { w.bits(byte) });
    }

    fn read_data(&mut self) -> u8 {
        self.twi.twdr.read().bits()
    }
}
