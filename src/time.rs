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

//! Wall-clock time as kept by the RTC chip.
//!
//! Fields are stored in binary; the BCD digit pairs shown on the tubes and
//! written to the chip are always derived from them.

/// 12 or 24 hour presentation, as selected by bit 6 of the hours register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourMode {
    H12,
    H24,
}

impl HourMode {
    pub const fn toggled(self) -> Self {
        match self {
            HourMode::H12 => HourMode::H24,
            HourMode::H24 => HourMode::H12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Am,
    Pm,
}

impl DayPeriod {
    pub const fn toggled(self) -> Self {
        match self {
            DayPeriod::Am => DayPeriod::Pm,
            DayPeriod::Pm => DayPeriod::Am,
        }
    }

    const fn of_24h(hours: u8) -> Self {
        if hours >= 12 {
            DayPeriod::Pm
        } else {
            DayPeriod::Am
        }
    }
}

/// Direction of a manual adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjust {
    Up,
    Down,
}

/// Decimal tens and units of a two digit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Digits {
    pub tens: u8,
    pub units: u8,
}

impl Digits {
    pub const fn of(value: u8) -> Self {
        Self {
            tens: value / 10,
            units: value % 10,
        }
    }

    pub const fn value(self) -> u8 {
        self.tens * 10 + self.units
    }

    /// Packed BCD: tens in the high nibble.
    pub const fn bcd(self) -> u8 {
        (self.tens << 4) | self.units
    }
}

// Hours register bits
const HOURS_12H: u8 = 1 << 6;
const HOURS_PM: u8 = 1 << 5;

// Clock halt bit in the seconds register
const SECONDS_HALT: u8 = 1 << 7;

const fn decode_bcd(reg: u8, tens_mask: u8) -> u8 {
    ((reg >> 4) & tens_mask) * 10 + (reg & 0x0F)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    seconds: u8,
    minutes: u8,
    hours: u8,
    hour_mode: HourMode,
    day_period: DayPeriod,
}

impl Time {
    /// Boot time before the chip has been read: 12:00:00 AM, 12 hour mode.
    pub const DEFAULT: Time = Time {
        seconds: 0,
        minutes: 0,
        hours: 12,
        hour_mode: HourMode::H12,
        day_period: DayPeriod::Am,
    };

    /// Build a time, rejecting fields out of range for `hour_mode`.
    ///
    /// In 24 hour mode `day_period` is ignored and derived from the hour.
    pub const fn new(
        hours: u8,
        minutes: u8,
        seconds: u8,
        hour_mode: HourMode,
        day_period: DayPeriod,
    ) -> Option<Self> {
        if minutes > 59 || seconds > 59 {
            return None;
        }
        let day_period = match hour_mode {
            HourMode::H24 if hours > 23 => return None,
            HourMode::H24 => DayPeriod::of_24h(hours),
            HourMode::H12 if hours < 1 || hours > 12 => return None,
            HourMode::H12 => day_period,
        };
        Some(Self {
            seconds,
            minutes,
            hours,
            hour_mode,
            day_period,
        })
    }

    /// Decode the seconds, minutes and hours registers. `None` if the chip
    /// holds something that is not a valid time.
    pub const fn from_registers(regs: [u8; 3]) -> Option<Self> {
        let [s_reg, m_reg, h_reg] = regs;
        if s_reg & 0x0F > 9 || m_reg & 0x0F > 9 || h_reg & 0x0F > 9 {
            return None;
        }
        let seconds = decode_bcd(s_reg & !SECONDS_HALT, 0x07);
        let minutes = decode_bcd(m_reg, 0x07);
        if h_reg & HOURS_12H != 0 {
            let period = if h_reg & HOURS_PM != 0 {
                DayPeriod::Pm
            } else {
                DayPeriod::Am
            };
            Self::new(decode_bcd(h_reg, 0x01), minutes, seconds, HourMode::H12, period)
        } else {
            Self::new(decode_bcd(h_reg, 0x03), minutes, seconds, HourMode::H24, DayPeriod::Am)
        }
    }

    pub const fn seconds(&self) -> u8 {
        self.seconds
    }

    pub const fn minutes(&self) -> u8 {
        self.minutes
    }

    pub const fn hours(&self) -> u8 {
        self.hours
    }

    pub const fn hour_mode(&self) -> HourMode {
        self.hour_mode
    }

    pub const fn day_period(&self) -> DayPeriod {
        self.day_period
    }

    pub const fn second_digits(&self) -> Digits {
        Digits::of(self.seconds)
    }

    pub const fn minute_digits(&self) -> Digits {
        Digits::of(self.minutes)
    }

    pub const fn hour_digits(&self) -> Digits {
        Digits::of(self.hours)
    }

    /// Seconds register value with the clock running.
    pub const fn seconds_register(&self) -> u8 {
        self.second_digits().bcd()
    }

    pub const fn minutes_register(&self) -> u8 {
        self.minute_digits().bcd()
    }

    /// Hours register value, carrying the mode and AM/PM bits.
    pub const fn hours_register(&self) -> u8 {
        let bcd = self.hour_digits().bcd();
        match (self.hour_mode, self.day_period) {
            (HourMode::H24, _) => bcd & !HOURS_12H,
            (HourMode::H12, DayPeriod::Am) => bcd | HOURS_12H,
            (HourMode::H12, DayPeriod::Pm) => bcd | HOURS_12H | HOURS_PM,
        }
    }

    /// Minutes moved one step, wrapping 59 and 0. Hours are untouched.
    pub const fn with_minutes_stepped(self, adjust: Adjust) -> Self {
        let minutes = match (adjust, self.minutes) {
            (Adjust::Up, 59) => 0,
            (Adjust::Up, m) => m + 1,
            (Adjust::Down, 0) => 59,
            (Adjust::Down, m) => m - 1,
        };
        Self { minutes, ..self }
    }

    /// Hours moved one step.
    ///
    /// 24 hour mode wraps 23 and 0. 12 hour mode wraps 12 and 1, and the day
    /// period flips when crossing either side of 12 (11 to 12, 12 to 1 and
    /// back).
    pub const fn with_hours_stepped(self, adjust: Adjust) -> Self {
        match self.hour_mode {
            HourMode::H24 => {
                let hours = match (adjust, self.hours) {
                    (Adjust::Up, 23) => 0,
                    (Adjust::Up, h) => h + 1,
                    (Adjust::Down, 0) => 23,
                    (Adjust::Down, h) => h - 1,
                };
                Self {
                    hours,
                    day_period: DayPeriod::of_24h(hours),
                    ..self
                }
            }
            HourMode::H12 => {
                let hours = match (adjust, self.hours) {
                    (Adjust::Up, 12) => 1,
                    (Adjust::Up, h) => h + 1,
                    (Adjust::Down, 1) => 12,
                    (Adjust::Down, h) => h - 1,
                };
                let day_period = if hours == 12 || self.hours == 12 {
                    self.day_period.toggled()
                } else {
                    self.day_period
                };
                Self {
                    hours,
                    day_period,
                    ..self
                }
            }
        }
    }

    /// The same instant presented in `mode`.
    ///
    /// 0 h is 12 AM and 12 h is 12 PM.
    pub const fn with_hour_mode(self, mode: HourMode) -> Self {
        let (hours, day_period) = match (self.hour_mode, mode) {
            (HourMode::H24, HourMode::H12) => match self.hours {
                0 => (12, DayPeriod::Am),
                12 => (12, DayPeriod::Pm),
                h if h > 12 => (h - 12, DayPeriod::Pm),
                h => (h, DayPeriod::Am),
            },
            (HourMode::H12, HourMode::H24) => {
                let hours = match (self.day_period, self.hours) {
                    (DayPeriod::Pm, h) if h < 12 => h + 12,
                    (DayPeriod::Am, 12) => 0,
                    (_, h) => h,
                };
                (hours, DayPeriod::of_24h(hours))
            }
            _ => (self.hours, self.day_period),
        };
        Self {
            hours,
            hour_mode: mode,
            day_period,
            ..self
        }
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ufmt::uDisplay for HourMode {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(match self {
            HourMode::H12 => "12h",
            HourMode::H24 => "24h",
        })
    }
}

impl ufmt::uDisplay for DayPeriod {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(match self {
            DayPeriod::Am => "AM",
            DayPeriod::Pm => "PM",
        })
    }
}

/// `HH:MM:SS`, followed by ` AM`/` PM` in 12 hour mode.
impl ufmt::uDisplay for Time {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let (h, m, s) = (self.hour_digits(), self.minute_digits(), self.second_digits());
        ufmt::uwrite!(f, "{}{}:{}{}:{}{}", h.tens, h.units, m.tens, m.units, s.tens, s.units)?;
        if self.hour_mode == HourMode::H12 {
            ufmt::uwrite!(f, " {}", self.day_period)?;
        }
        Ok(())
    }
}
