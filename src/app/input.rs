use pebble::System;
use pebble::joypad::Button;
use sdl2::EventPump;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;

fn button_for_keycode(key: Keycode) -> Option<Button> {
    match key {
        Keycode::Up => Some(Button::Up),
        Keycode::Down => Some(Button::Down),
        Keycode::Left => Some(Button::Left),
        Keycode::Right => Some(Button::Right),
        Keycode::Z => Some(Button::A),
        Keycode::X => Some(Button::B),
        Keycode::Return => Some(Button::Start),
        Keycode::RShift | Keycode::LShift => Some(Button::Select),
        _ => None,
    }
}

/// Polls SDL events and forwards button transitions to the running system.
/// Returns `true` if a quit event was received.
pub fn handle_input(event_pump: &mut EventPump, system: &mut System) -> bool {
    for event in event_pump.poll_iter() {
        match event {
            Event::Quit { .. }
            | Event::KeyDown {
                keycode: Some(Keycode::Escape),
                ..
            } => {
                log::info!("quit requested");
                return true;
            }
            Event::KeyDown {
                keycode: Some(key),
                repeat: false,
                ..
            } => {
                if let Some(button) = button_for_keycode(key) {
                    system.press(button);
                }
            }
            Event::KeyUp {
                keycode: Some(key),
                repeat: false,
                ..
            } => {
                if let Some(button) = button_for_keycode(key) {
                    system.release(button);
                }
            }
            _ => {}
        }
    }
    false
}
