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

//! Per-button debounce state machine.
//!
//! Each button is fed the decoded key once per fast tick and walks
//! `Idle -> Pushed -> Released -> Idle`. The press flags only exist while the
//! button is locked (pushed or waiting out the release), so an idle button
//! can never report a pending action or a hold.

use crate::config::{
    BTN_DELAY1_TICKS, BTN_DELAY2_TICKS, BTN_DELAY3_TICKS, BTN_DETECT_TICKS, BTN_LOCK_TICKS,
};
use crate::keys::ButtonId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pushed,
    Released,
}

/// Flags raised while a press is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Hold {
    /// Held past the medium threshold. Latched.
    delay1: bool,
    /// Repeat pulse, raised every `BTN_DELAY2_TICKS` once `delay1` is set.
    delay2: bool,
    /// Held past the long threshold. Latched.
    delay3: bool,
}

/// Press state carried from the push through the release lock-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Press {
    action: bool,
    hold: Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle { count: u16 },
    Pushed { count: u16, press: Press },
    Released { count: u16, press: Press },
}

/// Copy of a button's state for the foreground loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonState {
    pub id: ButtonId,
    pub phase: Phase,
    pub count: u16,
    pub action: bool,
    pub lock: bool,
    pub delay1: bool,
    pub delay2: bool,
    pub delay3: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debouncer {
    id: ButtonId,
    state: State,
}

impl Debouncer {
    pub const fn new(id: ButtonId) -> Self {
        Self {
            id,
            state: State::Idle { count: 0 },
        }
    }

    pub const fn id(&self) -> ButtonId {
        self.id
    }

    pub const fn phase(&self) -> Phase {
        match self.state {
            State::Idle { .. } => Phase::Idle,
            State::Pushed { .. } => Phase::Pushed,
            State::Released { .. } => Phase::Released,
        }
    }

    pub const fn snapshot(&self) -> ButtonState {
        let (count, press) = match self.state {
            State::Idle { count } => (count, None),
            State::Pushed { count, press } | State::Released { count, press } => {
                (count, Some(press))
            }
        };
        let (action, hold) = match press {
            Some(p) => (p.action, p.hold),
            None => (
                false,
                Hold {
                    delay1: false,
                    delay2: false,
                    delay3: false,
                },
            ),
        };
        ButtonState {
            id: self.id,
            phase: self.phase(),
            count,
            action,
            lock: press.is_some(),
            delay1: hold.delay1,
            delay2: hold.delay2,
            delay3: hold.delay3,
        }
    }

    /// Advance one tick with the currently decoded key.
    pub fn update(&mut self, key: Option<ButtonId>) {
        let matched = key == Some(self.id);
        self.state = match self.state {
            State::Idle { count } => {
                let count = if matched {
                    count + 1
                } else {
                    count.saturating_sub(1)
                };
                if count >= BTN_DETECT_TICKS {
                    State::Pushed {
                        count: 0,
                        press: Press {
                            action: true,
                            hold: Hold::default(),
                        },
                    }
                } else {
                    State::Idle { count }
                }
            }
            State::Pushed { count, mut press } => {
                if matched {
                    // Free runs while held; delay1 and delay3 are latched so a
                    // wrap only restarts the repeat cadence.
                    let count = count.wrapping_add(1);
                    if count == BTN_DELAY1_TICKS {
                        press.hold.delay1 = true;
                    }
                    if press.hold.delay1 && count % BTN_DELAY2_TICKS == 0 {
                        press.hold.delay2 = true;
                    }
                    if count >= BTN_DELAY3_TICKS {
                        press.hold.delay3 = true;
                    }
                    State::Pushed { count, press }
                } else {
                    State::Released { count: 0, press }
                }
            }
            State::Released { count, press } => {
                let count = if matched { count } else { count + 1 };
                if count >= BTN_LOCK_TICKS {
                    State::Idle { count: 0 }
                } else {
                    State::Released { count, press }
                }
            }
        };
    }

    /// Clear the pending action.
    pub fn consume_action(&mut self) {
        if let State::Pushed { press, .. } | State::Released { press, .. } = &mut self.state {
            press.action = false;
        }
    }

    /// Clear the repeat pulse.
    pub fn consume_repeat(&mut self) {
        if let State::Pushed { press, .. } | State::Released { press, .. } = &mut self.state {
            press.hold.delay2 = false;
        }
    }

    /// A short press that has just been released. Consumes the action.
    pub fn take_tap(&mut self) -> bool {
        match &mut self.state {
            State::Released { press, .. } if press.action && !press.hold.delay1 => {
                press.action = false;
                true
            }
            _ => false,
        }
    }

    /// A repeat pulse from a long hold. Consumes the pulse.
    pub fn take_repeat(&mut self) -> bool {
        match &mut self.state {
            State::Pushed { press, .. } if press.action && press.hold.delay2 => {
                press.hold.delay2 = false;
                true
            }
            _ => false,
        }
    }
}

/// The four front panel buttons, addressed by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buttons {
    debouncers: [Debouncer; 4],
}

impl Buttons {
    pub const fn new() -> Self {
        Self {
            debouncers: [
                Debouncer::new(ButtonId::One),
                Debouncer::new(ButtonId::Two),
                Debouncer::new(ButtonId::Three),
                Debouncer::new(ButtonId::Four),
            ],
        }
    }

    /// Feed the decoded key to every button.
    pub fn update(&mut self, key: Option<ButtonId>) {
        for debouncer in self.debouncers.iter_mut() {
            debouncer.update(key);
        }
    }

    pub fn get(&self, id: ButtonId) -> &Debouncer {
        &self.debouncers[id.index()]
    }

    pub fn get_mut(&mut self, id: ButtonId) -> &mut Debouncer {
        &mut self.debouncers[id.index()]
    }

    /// Look a button up by its panel number.
    pub fn by_number(&self, n: u8) -> Option<&Debouncer> {
        ButtonId::from_number(n).map(|id| self.get(id))
    }

    pub fn snapshot(&self, id: ButtonId) -> ButtonState {
        self.get(id).snapshot()
    }
}

impl Default for Buttons {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(d: &mut Debouncer, key: Option<ButtonId>, ticks: u16) {
        for _ in 0..ticks {
            d.update(key);
        }
    }

    fn pushed(id: ButtonId) -> Debouncer {
        let mut d = Debouncer::new(id);
        feed(&mut d, Some(id), BTN_DETECT_TICKS);
        d
    }

    const TWO: Option<ButtonId> = Some(ButtonId::Two);

    #[test]
    fn starts_idle_and_clear() {
        let s = Debouncer::new(ButtonId::Three).snapshot();
        assert_eq!(s.phase, Phase::Idle);
        assert_eq!(s.count, 0);
        assert!(!(s.action || s.lock || s.delay1 || s.delay2 || s.delay3));
    }

    #[test]
    fn press_hold_release_scenario() {
        let mut d = Debouncer::new(ButtonId::Two);
        feed(&mut d, TWO, BTN_DETECT_TICKS - 1);
        assert_eq!(d.phase(), Phase::Idle);
        d.update(TWO);
        let s = d.snapshot();
        assert_eq!((s.phase, s.action, s.lock, s.count), (Phase::Pushed, true, true, 0));

        feed(&mut d, TWO, 299);
        assert!(!d.snapshot().delay1);
        d.update(TWO);
        assert!(d.snapshot().delay1);

        d.update(Some(ButtonId::Three));
        let s = d.snapshot();
        assert_eq!((s.phase, s.count), (Phase::Released, 0));
        assert!(s.action && s.delay1);
    }

    #[test]
    fn idle_count_decays() {
        let mut d = Debouncer::new(ButtonId::One);
        feed(&mut d, Some(ButtonId::One), 4);
        assert_eq!(d.snapshot().count, 4);
        feed(&mut d, None, 2);
        assert_eq!(d.snapshot().count, 2);
        feed(&mut d, None, 10);
        assert_eq!(d.snapshot().count, 0);
        assert_eq!(d.phase(), Phase::Idle);
    }

    #[test]
    fn bouncing_contact_is_filtered() {
        let mut d = Debouncer::new(ButtonId::One);
        for _ in 0..20 {
            d.update(Some(ButtonId::One));
            d.update(None);
        }
        assert_eq!(d.phase(), Phase::Idle);
    }

    #[test]
    fn other_buttons_do_not_count() {
        let mut d = Debouncer::new(ButtonId::Four);
        feed(&mut d, Some(ButtonId::Three), 100);
        assert_eq!(d.snapshot().count, 0);
    }

    #[test]
    fn repeat_pulses_after_delay1() {
        let mut d = pushed(ButtonId::One);
        let key = Some(ButtonId::One);
        let mut pulses = 0;
        for tick in 1..=1000u16 {
            d.update(key);
            if d.take_repeat() {
                assert!(tick > BTN_DELAY1_TICKS);
                assert_eq!(tick % BTN_DELAY2_TICKS, 0);
                pulses += 1;
            }
        }
        // 325, 390, ... 975
        assert_eq!(pulses, 11);
    }

    #[test]
    fn delay3_latches() {
        let mut d = pushed(ButtonId::One);
        feed(&mut d, Some(ButtonId::One), BTN_DELAY3_TICKS - 1);
        assert!(!d.snapshot().delay3);
        d.update(Some(ButtonId::One));
        assert!(d.snapshot().delay3);
        feed(&mut d, Some(ButtonId::One), 5);
        assert!(d.snapshot().delay3);
    }

    #[test]
    fn release_lock_returns_to_idle() {
        let mut d = pushed(ButtonId::Two);
        d.update(None);
        assert_eq!(d.phase(), Phase::Released);
        feed(&mut d, None, BTN_LOCK_TICKS - 1);
        let s = d.snapshot();
        assert_eq!(s.phase, Phase::Released);
        assert!(s.action && s.lock);
        d.update(None);
        let s = d.snapshot();
        assert_eq!(s.phase, Phase::Idle);
        assert!(!(s.action || s.lock || s.delay1 || s.delay2 || s.delay3));
        assert_eq!(s.count, 0);
    }

    #[test]
    fn released_count_holds_while_key_returns() {
        let mut d = pushed(ButtonId::Two);
        // The first unmatched tick releases with the count reset to zero.
        d.update(None);
        feed(&mut d, None, 9);
        feed(&mut d, TWO, 10);
        let s = d.snapshot();
        assert_eq!((s.phase, s.count), (Phase::Released, 9));
    }

    #[test]
    fn tap_is_reported_once() {
        let mut d = pushed(ButtonId::Two);
        feed(&mut d, TWO, 50);
        assert!(!d.take_tap());
        d.update(None);
        assert!(d.take_tap());
        assert!(!d.take_tap());
        assert!(!d.snapshot().action);
    }

    #[test]
    fn long_hold_is_not_a_tap() {
        let mut d = pushed(ButtonId::Two);
        feed(&mut d, TWO, BTN_DELAY1_TICKS);
        d.update(None);
        assert!(!d.take_tap());
        assert!(d.snapshot().action);
    }

    #[test]
    fn consumed_action_stops_repeats() {
        let mut d = pushed(ButtonId::Two);
        d.consume_action();
        feed(&mut d, TWO, 400);
        assert!(!d.take_repeat());
        d.consume_repeat();
        assert!(!d.snapshot().delay2);
    }

    #[test]
    fn buttons_are_indexed_by_id() {
        let mut buttons = Buttons::new();
        for _ in 0..BTN_DETECT_TICKS {
            buttons.update(Some(ButtonId::Three));
        }
        assert_eq!(buttons.snapshot(ButtonId::Three).phase, Phase::Pushed);
        for id in [ButtonId::One, ButtonId::Two, ButtonId::Four] {
            assert_eq!(buttons.get(id).phase(), Phase::Idle);
        }
        assert_eq!(buttons.by_number(3).map(|d| d.id()), Some(ButtonId::Three));
        assert!(buttons.by_number(0).is_none());
        assert!(buttons.by_number(5).is_none());
    }
}
