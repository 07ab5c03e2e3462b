//! SDL window platform for running the dashboard on a desktop.
//!
//! Mouse buttons, wheel and keys from the simulator window are translated into
//! toolkit events. The wheel reports no position, so wheel events are delivered
//! at the last known pointer position.

use dashboard_ui::event::{Event, Key, MouseButton};
use dashboard_ui::Platform;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::sdl2::{Keycode, MouseButton as SdlButton};
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window};

use dashboard_ui::colors::BLACK;

pub struct SimulatorPlatform {
    display: SimulatorDisplay<Rgb565>,
    window: Window,
    pointer: Point,
}

impl SimulatorPlatform {
    pub fn new(
        size: Size,
        scale: u32,
        title: &str,
    ) -> Self {
        let mut display: SimulatorDisplay<Rgb565> = SimulatorDisplay::new(size);
        let output_settings = OutputSettingsBuilder::new().scale(scale.max(1)).build();
        let mut window = Window::new(title, &output_settings);

        // The window must be shown once before it yields events
        display.clear(BLACK).ok();
        window.update(&display);
        Self { display, window, pointer: Point::zero() }
    }
}

impl Platform for SimulatorPlatform {
    type Display = SimulatorDisplay<Rgb565>;

    fn poll_events(&mut self) -> Vec<Event> {
        let pointer = &mut self.pointer;
        self.window.events().filter_map(|event| translate(event, pointer)).collect()
    }

    fn display(&mut self) -> &mut Self::Display { &mut self.display }

    fn present(&mut self) {
        self.window.update(&self.display);
    }
}

fn translate(
    event: SimulatorEvent,
    pointer: &mut Point,
) -> Option<Event> {
    match event {
        SimulatorEvent::Quit => Some(Event::Quit),
        SimulatorEvent::MouseMove { point } => {
            *pointer = point;
            Some(Event::Motion { pos: point })
        }
        SimulatorEvent::MouseButtonDown { mouse_btn, point } => {
            *pointer = point;
            Some(Event::ButtonDown { pos: point, button: mouse_button(mouse_btn)? })
        }
        SimulatorEvent::MouseButtonUp { mouse_btn, point } => {
            *pointer = point;
            Some(Event::ButtonUp { pos: point, button: mouse_button(mouse_btn)? })
        }
        SimulatorEvent::MouseWheel { scroll_delta, .. } => {
            let button = match scroll_delta.y {
                0 => return None,
                y if y > 0 => MouseButton::WheelUp,
                _ => MouseButton::WheelDown,
            };
            Some(Event::ButtonDown { pos: *pointer, button })
        }
        SimulatorEvent::KeyDown { keycode, .. } => Some(Event::KeyDown { key: key(keycode)? }),
        SimulatorEvent::KeyUp { keycode, .. } => Some(Event::KeyUp { key: key(keycode)? }),
        _ => None,
    }
}

const fn mouse_button(button: SdlButton) -> Option<MouseButton> {
    match button {
        SdlButton::Left => Some(MouseButton::Left),
        SdlButton::Middle => Some(MouseButton::Middle),
        SdlButton::Right => Some(MouseButton::Right),
        _ => None,
    }
}

/// Map an SDL keycode by its name, which is stable across SDL binding versions.
fn key(keycode: Keycode) -> Option<Key> {
    key_from_name(&keycode.name())
}

fn key_from_name(name: &str) -> Option<Key> {
    let key = match name {
        "Up" => Key::Up,
        "Down" => Key::Down,
        "Left" => Key::Left,
        "Right" => Key::Right,
        "Return" | "Keypad Enter" => Key::Enter,
        "Escape" => Key::Escape,
        "Tab" => Key::Tab,
        "Backspace" => Key::Backspace,
        "Space" => Key::Space,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Char(c.to_ascii_lowercase()),
                _ => return None,
            }
        }
    };
    Some(key)
}
