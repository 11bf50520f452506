//! Button matrix and interrupt-on-change. Decoupled from any windowing
//! library's keycode type — the frontend maps its own key events onto
//! [`Button`] and calls [`Joypad::press`]/[`Joypad::release`]; no SDL type
//! appears anywhere in this module.

use crate::bus::Device;
use crate::interrupt::{InterruptSink, JOYPAD_BIT};
use crate::memory_map::P1_JOYP_ADDR;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoypadState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub a: bool,
    pub b: bool,
    pub start: bool,
    pub select: bool,
}

impl JoypadState {
    fn slot(&mut self, button: Button) -> &mut bool {
        match button {
            Button::Up => &mut self.up,
            Button::Down => &mut self.down,
            Button::Left => &mut self.left,
            Button::Right => &mut self.right,
            Button::A => &mut self.a,
            Button::B => &mut self.b,
            Button::Start => &mut self.start,
            Button::Select => &mut self.select,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoypadSnapshot {
    state: JoypadState,
    select: u8,
}

#[derive(Debug)]
pub struct Joypad {
    state: JoypadState,
    select: u8, // bits 4-5 of P1, as written by the CPU
}

impl Joypad {
    pub fn new() -> Self {
        Joypad {
            state: JoypadState::default(),
            select: 0x30,
        }
    }

    pub fn state(&self) -> JoypadState {
        self.state
    }

    pub fn snapshot(&self) -> JoypadSnapshot {
        JoypadSnapshot {
            state: self.state,
            select: self.select,
        }
    }

    pub fn restore(&mut self, snapshot: &JoypadSnapshot) {
        self.state = snapshot.state;
        self.select = snapshot.select;
    }

    pub fn press(&mut self, button: Button, sink: &mut dyn InterruptSink) {
        self.set(button, true, sink);
    }

    pub fn release(&mut self, button: Button, sink: &mut dyn InterruptSink) {
        self.set(button, false, sink);
    }

    fn set(&mut self, button: Button, pressed: bool, sink: &mut dyn InterruptSink) {
        let slot = self.state.slot(button);
        if *slot != pressed {
            *slot = pressed;
            sink.request(JOYPAD_BIT);
        }
    }

    fn directions_selected(&self) -> bool {
        self.select & 0x10 == 0
    }

    fn actions_selected(&self) -> bool {
        self.select & 0x20 == 0
    }

    fn read_p1(&self) -> u8 {
        let mut low_nibble = 0x0F;
        if self.directions_selected() {
            if self.state.right {
                low_nibble &= !0x01;
            }
            if self.state.left {
                low_nibble &= !0x02;
            }
            if self.state.up {
                low_nibble &= !0x04;
            }
            if self.state.down {
                low_nibble &= !0x08;
            }
        }
        if self.actions_selected() {
            if self.state.a {
                low_nibble &= !0x01;
            }
            if self.state.b {
                low_nibble &= !0x02;
            }
            if self.state.select {
                low_nibble &= !0x04;
            }
            if self.state.start {
                low_nibble &= !0x08;
            }
        }
        0xC0 | self.select | low_nibble
    }
}

impl Device for Joypad {
    fn read(&self, addr: u16) -> u8 {
        debug_assert_eq!(addr, P1_JOYP_ADDR);
        self.read_p1()
    }

    fn write(&mut self, addr: u16, value: u8) {
        debug_assert_eq!(addr, P1_JOYP_ADDR);
        self.select = value & 0x30;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CapturingSink {
        count: usize,
    }
    impl InterruptSink for CapturingSink {
        fn request(&mut self, bit: u8) {
            assert_eq!(bit, JOYPAD_BIT);
            self.count += 1;
        }
    }

    #[test]
    fn press_and_release_both_request_interrupt() {
        let mut joypad = Joypad::new();
        let mut sink = CapturingSink { count: 0 };
        joypad.press(Button::A, &mut sink);
        joypad.release(Button::A, &mut sink);
        assert_eq!(sink.count, 2);
    }

    #[test]
    fn repeated_press_without_release_does_not_re_fire() {
        let mut joypad = Joypad::new();
        let mut sink = CapturingSink { count: 0 };
        joypad.press(Button::A, &mut sink);
        joypad.press(Button::A, &mut sink);
        assert_eq!(sink.count, 1);
    }

    #[test]
    fn both_nibbles_can_be_selected_simultaneously_and_or_together() {
        let mut joypad = Joypad::new();
        let mut sink = CapturingSink { count: 0 };
        joypad.press(Button::Right, &mut sink);
        joypad.press(Button::A, &mut sink);
        joypad.write(P1_JOYP_ADDR, 0x00); // select both groups
        let p1 = joypad.read(P1_JOYP_ADDR);
        assert_eq!(p1 & 0x01, 0); // bit 0 low: both Right and A clear it
    }

    #[test]
    fn unselected_group_reports_all_released() {
        let mut joypad = Joypad::new();
        let mut sink = CapturingSink { count: 0 };
        joypad.press(Button::Up, &mut sink);
        joypad.write(P1_JOYP_ADDR, 0x20); // select actions only
        assert_eq!(joypad.read(P1_JOYP_ADDR) & 0x0F, 0x0F);
    }
}
