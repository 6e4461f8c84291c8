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

//! Master side of the two-wire serial bus.
//!
//! Every exchange is composed as `begin -> (write_byte | read_byte)* -> end`.
//! A failing step has already released the bus when it returns, and the
//! caller starts over from `begin` on its next attempt; partial transactions
//! are never resumed.

use core::convert::Infallible;
use core::fmt;

use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};

use crate::config::READY_POLL_LIMIT;

/// Why a bus step was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusErrorKind {
    /// The start condition was not acknowledged by the hardware.
    StartFailed,
    /// No device answered the address header.
    AddressNacked,
    /// A data byte was not acknowledged, or a received byte had the wrong
    /// acknowledge status.
    DataNacked,
    /// The hardware never became ready.
    Timeout,
}

pub type BusResult<T = ()> = Result<T, BusErrorKind>;

impl BusErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            BusErrorKind::StartFailed => "start failed",
            BusErrorKind::AddressNacked => "address nacked",
            BusErrorKind::DataNacked => "data nacked",
            BusErrorKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for BusErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ufmt::uDisplay for BusErrorKind {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(self.as_str())
    }
}

impl i2c::Error for BusErrorKind {
    fn kind(&self) -> ErrorKind {
        match self {
            BusErrorKind::StartFailed => ErrorKind::Bus,
            BusErrorKind::AddressNacked => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            BusErrorKind::DataNacked => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            BusErrorKind::Timeout => ErrorKind::Other,
        }
    }
}

/// Control actions the bus hardware can be asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Send a start, or a repeated start inside a transaction.
    Start,
    /// Send a stop and leave the bus idle.
    Stop,
    /// Clock out the data register.
    Send,
    /// Receive a byte and answer with ACK, asking for more.
    ReadAck,
    /// Receive a byte and answer with NACK, ending the read.
    ReadNack,
}

/// Decoded master-mode status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Start,
    RepeatedStart,
    AddressWriteAck,
    AddressWriteNack,
    DataSentAck,
    DataSentNack,
    ArbitrationLost,
    AddressReadAck,
    AddressReadNack,
    DataReceivedAck,
    DataReceivedNack,
    Other(u8),
}

impl Status {
    /// Decode a raw status register value. The prescaler bits are ignored.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0xF8 {
            0x08 => Status::Start,
            0x10 => Status::RepeatedStart,
            0x18 => Status::AddressWriteAck,
            0x20 => Status::AddressWriteNack,
            0x28 => Status::DataSentAck,
            0x30 => Status::DataSentNack,
            0x38 => Status::ArbitrationLost,
            0x40 => Status::AddressReadAck,
            0x48 => Status::AddressReadNack,
            0x50 => Status::DataReceivedAck,
            0x58 => Status::DataReceivedNack,
            other => Status::Other(other),
        }
    }

    pub const fn bits(self) -> u8 {
        match self {
            Status::Start => 0x08,
            Status::RepeatedStart => 0x10,
            Status::AddressWriteAck => 0x18,
            Status::AddressWriteNack => 0x20,
            Status::DataSentAck => 0x28,
            Status::DataSentNack => 0x30,
            Status::ArbitrationLost => 0x38,
            Status::AddressReadAck => 0x40,
            Status::AddressReadNack => 0x48,
            Status::DataReceivedAck => 0x50,
            Status::DataReceivedNack => 0x58,
            Status::Other(bits) => bits,
        }
    }
}

/// Data direction carried in the R/W bit of the address header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Write,
    Read,
}

/// Address header: 7-bit device address followed by the R/W bit.
pub const fn header(address: u8, direction: Direction) -> u8 {
    let rw = match direction {
        Direction::Write => 0,
        Direction::Read => 1,
    };
    (address << 1) | rw
}

/// Register level access to the two-wire hardware.
pub trait Twi {
    /// Start the given action. Completion is signalled through `poll`.
    fn command(&mut self, command: Command);

    /// `Ok` once the last action has completed.
    fn poll(&mut self) -> nb::Result<(), Infallible>;

    /// Raw status register.
    fn status(&mut self) -> u8;

    fn write_data(&mut self, byte: u8);

    fn read_data(&mut self) -> u8;
}

/// Transaction engine over a [`Twi`] port.
pub struct Bus<T> {
    twi: T,
}

impl<T: Twi> Bus<T> {
    pub const fn new(twi: T) -> Self {
        Self { twi }
    }

    pub fn twi(&self) -> &T {
        &self.twi
    }

    pub fn twi_mut(&mut self) -> &mut T {
        &mut self.twi
    }

    pub fn release(self) -> T {
        self.twi
    }

    /// Send a start (or repeated start) followed by the address header, and
    /// wait for the device to acknowledge.
    pub fn begin(&mut self, address: u8, direction: Direction) -> BusResult {
        self.twi.command(Command::Start);
        match self.wait()? {
            Status::Start | Status::RepeatedStart => {}
            _ => return self.abort(BusErrorKind::StartFailed),
        }

        self.twi.write_data(header(address, direction));
        self.twi.command(Command::Send);
        match (direction, self.wait()?) {
            (Direction::Write, Status::AddressWriteAck) => Ok(()),
            (Direction::Read, Status::AddressReadAck) => Ok(()),
            _ => self.abort(BusErrorKind::AddressNacked),
        }
    }

    pub fn write_byte(&mut self, byte: u8) -> BusResult {
        self.twi.write_data(byte);
        self.twi.command(Command::Send);
        match self.wait()? {
            Status::DataSentAck => Ok(()),
            _ => self.abort(BusErrorKind::DataNacked),
        }
    }

    /// Receive one byte. `last` answers with NACK so the device releases the
    /// bus after this byte.
    pub fn read_byte(&mut self, last: bool) -> BusResult<u8> {
        let (command, expected) = if last {
            (Command::ReadNack, Status::DataReceivedNack)
        } else {
            (Command::ReadAck, Status::DataReceivedAck)
        };
        self.twi.command(command);
        if self.wait()? != expected {
            return self.abort(BusErrorKind::DataNacked);
        }
        Ok(self.twi.read_data())
    }

    /// Send a stop. Safe at any point, including after an error.
    pub fn end(&mut self) {
        self.twi.command(Command::Stop);
    }

    fn abort<R>(&mut self, kind: BusErrorKind) -> BusResult<R> {
        self.end();
        Err(kind)
    }

    fn wait(&mut self) -> BusResult<Status> {
        for _ in 0..READY_POLL_LIMIT {
            match self.twi.poll() {
                Ok(()) => return Ok(Status::from_bits(self.twi.status())),
                Err(nb::Error::WouldBlock) => continue,
                Err(nb::Error::Other(never)) => match never {},
            }
        }
        self.abort(BusErrorKind::Timeout)
    }

    fn run(&mut self, address: u8, operations: &mut [Operation<'_>]) -> BusResult {
        let mut open: Option<Direction> = None;
        for i in 0..operations.len() {
            let read_follows = matches!(operations.get(i + 1), Some(Operation::Read(_)));
            match &mut operations[i] {
                Operation::Write(bytes) => {
                    if open != Some(Direction::Write) {
                        self.begin(address, Direction::Write)?;
                        open = Some(Direction::Write);
                    }
                    for &byte in bytes.iter() {
                        self.write_byte(byte)?;
                    }
                }
                Operation::Read(buffer) => {
                    if open != Some(Direction::Read) {
                        self.begin(address, Direction::Read)?;
                        open = Some(Direction::Read);
                    }
                    let n = buffer.len();
                    for (j, byte) in buffer.iter_mut().enumerate() {
                        *byte = self.read_byte(j + 1 == n && !read_follows)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl<T: Twi> i2c::ErrorType for Bus<T> {
    type Error = BusErrorKind;
}

impl<T: Twi> i2c::I2c for Bus<T> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations.is_empty() {
            return Ok(());
        }
        // A failed step has already stopped the bus.
        self.run(address, operations)?;
        self.end();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ds1307::RTC_ADDRESS;
    use crate::sim::Ds1307Sim;
    use embedded_hal::i2c::{Error as _, I2c};

    fn bus() -> Bus<Ds1307Sim> {
        Bus::new(Ds1307Sim::new())
    }

    #[test]
    fn status_decoding_ignores_prescaler_bits() {
        assert_eq!(Status::from_bits(0x08 | 0x03), Status::Start);
        assert_eq!(Status::from_bits(0x58), Status::DataReceivedNack);
        assert_eq!(Status::from_bits(0xF8), Status::Other(0xF8));
        assert_eq!(Status::AddressReadAck.bits(), 0x40);
    }

    #[test]
    fn address_header() {
        assert_eq!(header(0x68, Direction::Write), 0xD0);
        assert_eq!(header(0x68, Direction::Read), 0xD1);
    }

    #[test]
    fn write_then_burst_read() {
        let mut bus = bus();
        bus.twi_mut().registers[..3].copy_from_slice(&[0x45, 0x30, 0x12]);

        bus.begin(RTC_ADDRESS, Direction::Write).unwrap();
        bus.write_byte(0x00).unwrap();
        bus.begin(RTC_ADDRESS, Direction::Read).unwrap();
        assert_eq!(bus.read_byte(false), Ok(0x45));
        assert_eq!(bus.read_byte(false), Ok(0x30));
        assert_eq!(bus.read_byte(true), Ok(0x12));
        bus.end();

        assert!(bus.twi().is_idle());
        assert_eq!(bus.twi().stops, 1);
    }

    #[test]
    fn unknown_device_is_nacked_and_released() {
        let mut bus = bus();
        assert_eq!(
            bus.begin(0x50, Direction::Write),
            Err(BusErrorKind::AddressNacked)
        );
        assert!(bus.twi().is_idle());
    }

    #[test]
    fn failed_start() {
        let mut bus = bus();
        bus.twi_mut().fail_start = true;
        assert_eq!(
            bus.begin(RTC_ADDRESS, Direction::Write),
            Err(BusErrorKind::StartFailed)
        );
        assert!(bus.twi().is_idle());
    }

    #[test]
    fn nacked_data_stops_the_bus() {
        let mut bus = bus();
        bus.twi_mut().nack_register = Some(0x01);
        bus.begin(RTC_ADDRESS, Direction::Write).unwrap();
        bus.write_byte(0x01).unwrap();
        assert_eq!(bus.write_byte(0x42), Err(BusErrorKind::DataNacked));
        assert!(bus.twi().is_idle());
        assert_eq!(bus.twi().registers[1], 0);
    }

    #[test]
    fn stalled_read_times_out() {
        let mut bus = bus();
        bus.twi_mut().stall_reads_after = Some(0);
        bus.begin(RTC_ADDRESS, Direction::Read).unwrap();
        assert_eq!(bus.read_byte(true), Err(BusErrorKind::Timeout));
        assert!(bus.twi().is_idle());
    }

    #[test]
    fn stalled_start_times_out() {
        let mut bus = bus();
        bus.twi_mut().stall_on = Some(Command::Start);
        assert_eq!(
            bus.begin(RTC_ADDRESS, Direction::Write),
            Err(BusErrorKind::Timeout)
        );
        assert!(bus.twi().is_idle());
        assert_eq!(bus.twi().stops, 1);
    }

    #[test]
    fn stalled_address_times_out() {
        let mut bus = bus();
        bus.twi_mut().stall_on = Some(Command::Send);
        assert_eq!(
            bus.begin(RTC_ADDRESS, Direction::Write),
            Err(BusErrorKind::Timeout)
        );
        assert!(bus.twi().is_idle());
    }

    #[test]
    fn stalled_write_times_out() {
        let mut bus = bus();
        bus.begin(RTC_ADDRESS, Direction::Write).unwrap();
        bus.twi_mut().stall_on = Some(Command::Send);
        assert_eq!(bus.write_byte(0x01), Err(BusErrorKind::Timeout));
        assert!(bus.twi().is_idle());
        assert!(bus.twi().writes.is_empty());

        // The next transaction starts from scratch once the line recovers.
        bus.twi_mut().stall_on = None;
        bus.begin(RTC_ADDRESS, Direction::Write).unwrap();
        bus.write_byte(0x01).unwrap();
        bus.write_byte(0x30).unwrap();
        bus.end();
        assert_eq!(bus.twi().registers[1], 0x30);
    }

    #[test]
    fn empty_transaction_leaves_the_bus_alone() {
        let mut bus = bus();
        assert_eq!(bus.transaction(RTC_ADDRESS, &mut []), Ok(()));
        assert_eq!(bus.twi().stops, 0);
        assert!(bus.twi().is_idle());
    }

    #[test]
    fn read_with_wrong_acknowledge_is_rejected() {
        let mut bus = bus();
        bus.twi_mut().swap_read_acks = true;
        bus.begin(RTC_ADDRESS, Direction::Read).unwrap();
        assert_eq!(bus.read_byte(false), Err(BusErrorKind::DataNacked));
        assert!(bus.twi().is_idle());
    }

    #[test]
    fn embedded_hal_write_read() {
        let mut bus = bus();
        bus.write(RTC_ADDRESS, &[0x08, 0xAB, 0xCD]).unwrap();
        let mut buf = [0u8; 2];
        bus.write_read(RTC_ADDRESS, &[0x08], &mut buf).unwrap();
        assert_eq!(buf, [0xAB, 0xCD]);
        assert!(bus.twi().is_idle());
    }

    #[test]
    fn embedded_hal_error_kinds() {
        let mut bus = bus();
        let err = bus.write(0x21, &[0]).unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        );
        assert_eq!(BusErrorKind::Timeout.kind(), ErrorKind::Other);
    }
}
