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

//! Front panel behaviour: which button changes what.
//!
//! Button 1 and 2 step the minutes down and up, button 3 and 4 step the
//! hours down and up. A tap steps once when released; holding the button
//! repeats the step on every `delay2` pulse.

use crate::bus::{BusResult, Twi};
use crate::button::Buttons;
use crate::ds1307::TimeKeeper;
use crate::keys::ButtonId;
use crate::time::Adjust;

/// Time mutations the front panel can request.
pub trait ClockControl {
    fn adjust_minutes(&mut self, adjust: Adjust) -> BusResult;
    fn adjust_hours(&mut self, adjust: Adjust) -> BusResult;
    fn toggle_hour_mode(&mut self) -> BusResult;
}

impl<T: Twi> ClockControl for TimeKeeper<T> {
    fn adjust_minutes(&mut self, adjust: Adjust) -> BusResult {
        TimeKeeper::adjust_minutes(self, adjust)
    }

    fn adjust_hours(&mut self, adjust: Adjust) -> BusResult {
        TimeKeeper::adjust_hours(self, adjust)
    }

    fn toggle_hour_mode(&mut self) -> BusResult {
        TimeKeeper::toggle_hour_mode(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Minutes(Adjust),
    Hours(Adjust),
}

pub const fn action_for(id: ButtonId) -> Action {
    match id {
        ButtonId::One => Action::Minutes(Adjust::Down),
        ButtonId::Two => Action::Minutes(Adjust::Up),
        ButtonId::Three => Action::Hours(Adjust::Down),
        ButtonId::Four => Action::Hours(Adjust::Up),
    }
}

pub fn apply(action: Action, clock: &mut impl ClockControl) -> BusResult {
    match action {
        Action::Minutes(adjust) => clock.adjust_minutes(adjust),
        Action::Hours(adjust) => clock.adjust_hours(adjust),
    }
}

/// Perform the steps requested by taps and hold repeats since the last call.
///
/// Every requested step is attempted; the first bus error is returned.
pub fn dispatch(buttons: &mut Buttons, clock: &mut impl ClockControl) -> BusResult {
    let mut result = Ok(());
    for id in ButtonId::ALL {
        let button = buttons.get_mut(id);
        if button.take_repeat() || button.take_tap() {
            let step = apply(action_for(id), clock);
            if result.is_ok() {
                result = step;
            }
        }
    }
    result
}

/// A key held while the clock boots switches between 12 and 24 hour mode.
///
/// `read_key` samples the panel. When a key was held, this only returns
/// once every key has been released, even if the toggle failed, so the
/// held key never reaches the debouncers. Returns whether the mode was
/// toggled.
pub fn boot_hour_mode(
    mut read_key: impl FnMut() -> Option<ButtonId>,
    clock: &mut impl ClockControl,
) -> BusResult<bool> {
    if read_key().is_none() {
        return Ok(false);
    }
    let result = clock.toggle_hour_mode();
    while read_key().is_some() {}
    result.map(|()| true)
}
