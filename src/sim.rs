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

//! Simulated DS1307 behind a [`Twi`] port, with fault injection.

use core::convert::Infallible;

use crate::bus::{Command, Status, Twi};
use crate::ds1307::RTC_ADDRESS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Started,
    Writing { pointer_set: bool },
    Reading,
}

pub struct Ds1307Sim {
    pub registers: [u8; 64],
    /// Every completed register write, in order.
    pub writes: Vec<(u8, u8)>,
    pub stops: usize,

    /// Start conditions report a bus error.
    pub fail_start: bool,
    /// NACK data bytes aimed at this register.
    pub nack_register: Option<u8>,
    /// Stop answering after this many bytes have been read in one
    /// transaction.
    pub stall_reads_after: Option<usize>,
    /// Never report completion of this command.
    pub stall_on: Option<Command>,
    /// Report ACK as NACK and the other way round on reads.
    pub swap_read_acks: bool,

    pointer: u8,
    phase: Phase,
    status: Status,
    data: u8,
    bytes_read: usize,
    stalled: bool,
}

impl Ds1307Sim {
    pub fn new() -> Self {
        Self {
            registers: [0; 64],
            writes: Vec::new(),
            stops: 0,
            fail_start: false,
            nack_register: None,
            stall_reads_after: None,
            stall_on: None,
            swap_read_acks: false,
            pointer: 0,
            phase: Phase::Idle,
            status: Status::Other(0xF8),
            data: 0,
            bytes_read: 0,
            stalled: false,
        }
    }

    /// Chip holding the given seconds, minutes and hours registers.
    pub fn with_time(seconds: u8, minutes: u8, hours: u8) -> Self {
        let mut sim = Self::new();
        sim.registers[0] = seconds;
        sim.registers[1] = minutes;
        sim.registers[2] = hours;
        sim
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    pub fn halted(&self) -> bool {
        self.registers[0] & 0x80 != 0
    }

    fn send(&mut self) -> Status {
        match self.phase {
            Phase::Started => {
                let read = self.data & 1 == 1;
                if self.data >> 1 != RTC_ADDRESS {
                    return if read {
                        Status::AddressReadNack
                    } else {
                        Status::AddressWriteNack
                    };
                }
                if read {
                    self.phase = Phase::Reading;
                    Status::AddressReadAck
                } else {
                    self.phase = Phase::Writing { pointer_set: false };
                    Status::AddressWriteAck
                }
            }
            Phase::Writing { pointer_set: false } => {
                self.pointer = self.data & 0x3F;
                self.phase = Phase::Writing { pointer_set: true };
                Status::DataSentAck
            }
            Phase::Writing { pointer_set: true } => {
                if self.nack_register == Some(self.pointer) {
                    return Status::DataSentNack;
                }
                self.registers[usize::from(self.pointer)] = self.data;
                self.writes.push((self.pointer, self.data));
                self.pointer = (self.pointer + 1) & 0x3F;
                Status::DataSentAck
            }
            Phase::Idle | Phase::Reading => Status::Other(0x00),
        }
    }

    fn receive(&mut self, ack: bool) -> Status {
        if self.phase != Phase::Reading {
            return Status::Other(0x00);
        }
        if self.stall_reads_after.is_some_and(|n| self.bytes_read >= n) {
            self.stalled = true;
            return self.status;
        }
        self.data = self.registers[usize::from(self.pointer)];
        self.pointer = (self.pointer + 1) & 0x3F;
        self.bytes_read += 1;
        if ack != self.swap_read_acks {
            Status::DataReceivedAck
        } else {
            Status::DataReceivedNack
        }
    }
}

impl Twi for Ds1307Sim {
    fn command(&mut self, command: Command) {
        if command != Command::Stop && self.stall_on == Some(command) {
            self.stalled = true;
            return;
        }
        self.status = match command {
            Command::Start if self.fail_start => Status::Other(0x00),
            Command::Start => {
                let status = if self.phase == Phase::Idle {
                    Status::Start
                } else {
                    Status::RepeatedStart
                };
                self.phase = Phase::Started;
                status
            }
            Command::Stop => {
                self.phase = Phase::Idle;
                self.stalled = false;
                self.bytes_read = 0;
                self.stops += 1;
                Status::Other(0xF8)
            }
            Command::Send => self.send(),
            Command::ReadAck => self.receive(true),
            Command::ReadNack => self.receive(false),
        };
    }

    fn poll(&mut self) -> nb::Result<(), Infallible> {
        if self.stalled {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }

    fn status(&mut self) -> u8 {
        self.status.bits()
    }

    fn write_data(&mut self, byte: u8) {
        self.data = byte;
    }

    fn read_data(&mut self) -> u8 {
        self.data
    }
}
