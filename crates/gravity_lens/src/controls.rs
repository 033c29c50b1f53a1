//! Turn keyboard and mouse events into things for the simulation, and the app, to do.

use glam::Vec2;
use gravity_engine::params::{Parameter, ParameterUpdate};
use gravity_engine::Command;
use termwiz::input::{InputEvent, KeyCode, KeyEvent, Modifiers, MouseButtons, MouseEvent};

use crate::config::input::{KeybindingAction, KeybindingsAsEvents};
use crate::config::main::Steps;

/// Something the user asked for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Action {
    /// A change to the simulation. Applied at the start of the next frame.
    Engine(Command),
    /// Show or hide the heads-up display.
    ToggleHud,
    /// Exit the whole app.
    Quit,
}

/// Maps raw input to actions.
pub(crate) struct Controls {
    /// Key presses and what they do.
    keybindings: KeybindingsAsEvents,
    /// How much each key press changes things by.
    steps: Steps,
    /// World units per pixel.
    pixel_scale: f32,
    /// Whether the left mouse button was down on the previous mouse event.
    is_left_down: bool,
}

impl Controls {
    /// Instantiate
    pub const fn new(keybindings: KeybindingsAsEvents, steps: Steps, pixel_scale: f32) -> Self {
        Self {
            keybindings,
            steps,
            pixel_scale,
            is_left_down: false,
        }
    }

    /// Handle a single input event.
    pub fn handle(&mut self, event: &InputEvent) -> Vec<Action> {
        match event {
            InputEvent::Key(key) => self.handle_key(key).into_iter().collect(),
            InputEvent::Mouse(mouse) => self.handle_mouse(mouse),
            InputEvent::PixelMouse(_)
            | InputEvent::Resized { .. }
            | InputEvent::Paste(_)
            | InputEvent::Wake => Vec::new(),
        }
    }

    /// Key presses are looked up in the keybindings. Ctrl+C always quits.
    fn handle_key(&self, key: &KeyEvent) -> Option<Action> {
        let is_ctrl_c = key.modifiers.contains(Modifiers::CTRL)
            && matches!(key.key, KeyCode::Char('c' | 'C'));
        if is_ctrl_c || key.key == KeyCode::Char('\u{3}') {
            return Some(Action::Quit);
        }

        let action = crate::config::input::action_for(&self.keybindings, key)?;
        tracing::trace!("Key {key:?} triggered {action:?}");
        Some(self.action_for_binding(action))
    }

    /// What a keybinding actually does.
    fn action_for_binding(&self, binding: KeybindingAction) -> Action {
        let steps = &self.steps;
        let nudge = |parameter, amount| {
            Action::Engine(Command::Parameter(ParameterUpdate::Nudge(parameter, amount)))
        };
        let move_by = |x, y| Action::Engine(Command::NudgeAttractor(Vec2::new(x, y)));

        match binding {
            KeybindingAction::MassUp => nudge(Parameter::Mass, steps.mass),
            KeybindingAction::MassDown => nudge(Parameter::Mass, -steps.mass),
            KeybindingAction::GravityUp => {
                nudge(Parameter::GravitationalConstant, steps.gravitational_constant)
            }
            KeybindingAction::GravityDown => {
                nudge(Parameter::GravitationalConstant, -steps.gravitational_constant)
            }
            KeybindingAction::GridUp => nudge(Parameter::GridSpacing, steps.grid_spacing),
            KeybindingAction::GridDown => nudge(Parameter::GridSpacing, -steps.grid_spacing),
            KeybindingAction::TimeUp => nudge(Parameter::TimeScale, steps.time_scale),
            KeybindingAction::TimeDown => nudge(Parameter::TimeScale, -steps.time_scale),
            KeybindingAction::NudgeUp => move_by(0.0, -steps.nudge),
            KeybindingAction::NudgeDown => move_by(0.0, steps.nudge),
            KeybindingAction::NudgeLeft => move_by(-steps.nudge, 0.0),
            KeybindingAction::NudgeRight => move_by(steps.nudge, 0.0),
            KeybindingAction::SpawnBurst => Action::Engine(Command::SpawnBurst),
            KeybindingAction::TogglePause => Action::Engine(Command::TogglePause),
            KeybindingAction::ToggleModel => {
                Action::Engine(Command::Parameter(ParameterUpdate::ToggleModel))
            }
            KeybindingAction::Clear => Action::Engine(Command::Clear),
            KeybindingAction::ToggleHud => Action::ToggleHud,
            KeybindingAction::Quit => Action::Quit,
        }
    }

    /// The pointer always drags the attractor. A fresh left click spawns a burst and the wheel
    /// changes the mass.
    fn handle_mouse(&mut self, mouse: &MouseEvent) -> Vec<Action> {
        let mut actions = vec![Action::Engine(Command::MoveAttractor(
            self.cell_to_world(mouse.x, mouse.y),
        ))];

        if mouse.mouse_buttons.contains(MouseButtons::VERT_WHEEL) {
            let amount = if mouse.mouse_buttons.contains(MouseButtons::WHEEL_POSITIVE) {
                self.steps.wheel_mass
            } else {
                -self.steps.wheel_mass
            };
            actions.push(Action::Engine(Command::Parameter(ParameterUpdate::Nudge(
                Parameter::Mass,
                amount,
            ))));
            return actions;
        }

        let is_left_down = mouse.mouse_buttons.contains(MouseButtons::LEFT);
        if is_left_down && !self.is_left_down {
            actions.push(Action::Engine(Command::SpawnBurst));
        }
        self.is_left_down = is_left_down;

        actions
    }

    /// Terminal mouse coordinates are 1-based cells. Each cell is 1 pixel wide and 2 pixels high,
    /// so the pointer is put in the middle of the cell.
    fn cell_to_world(&self, column: u16, row: u16) -> Vec2 {
        let x = f32::from(column.saturating_sub(1)) + 0.5;
        let y = f32::from(row.saturating_sub(1)) * 2.0 + 1.0;
        Vec2::new(x, y) * self.pixel_scale
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn controls() -> Controls {
        let mut keybindings = KeybindingsAsEvents::new();
        keybindings.insert(
            KeybindingAction::MassUp,
            KeyEvent {
                key: KeyCode::Char('M'),
                modifiers: Modifiers::NONE,
            },
        );
        keybindings.insert(
            KeybindingAction::NudgeLeft,
            KeyEvent {
                key: KeyCode::LeftArrow,
                modifiers: Modifiers::NONE,
            },
        );
        keybindings.insert(
            KeybindingAction::ToggleHud,
            KeyEvent {
                key: KeyCode::Char('h'),
                modifiers: Modifiers::NONE,
            },
        );
        Controls::new(keybindings, Steps::default(), 4.0)
    }

    fn key(key: KeyCode, modifiers: Modifiers) -> InputEvent {
        InputEvent::Key(KeyEvent { key, modifiers })
    }

    fn mouse(x: u16, y: u16, mouse_buttons: MouseButtons) -> InputEvent {
        InputEvent::Mouse(MouseEvent {
            x,
            y,
            mouse_buttons,
            modifiers: Modifiers::NONE,
        })
    }

    #[test]
    fn bound_keys() {
        let mut controls = controls();
        assert_eq!(
            controls.handle(&key(KeyCode::Char('M'), Modifiers::NONE)),
            vec![Action::Engine(Command::Parameter(ParameterUpdate::Nudge(
                Parameter::Mass,
                0.5
            )))]
        );
        assert_eq!(
            controls.handle(&key(KeyCode::LeftArrow, Modifiers::NONE)),
            vec![Action::Engine(Command::NudgeAttractor(Vec2::new(-20.0, 0.0)))]
        );
        assert_eq!(
            controls.handle(&key(KeyCode::Char('h'), Modifiers::NONE)),
            vec![Action::ToggleHud]
        );
        assert!(controls
            .handle(&key(KeyCode::Char('z'), Modifiers::NONE))
            .is_empty());
    }

    #[test]
    fn ctrl_c_always_quits() {
        let mut controls = controls();
        assert_eq!(
            controls.handle(&key(KeyCode::Char('c'), Modifiers::CTRL)),
            vec![Action::Quit]
        );
    }

    #[test]
    fn pointer_moves_the_attractor() {
        let mut controls = controls();
        let actions = controls.handle(&mouse(1, 1, MouseButtons::NONE));
        assert_eq!(
            actions,
            vec![Action::Engine(Command::MoveAttractor(Vec2::new(2.0, 4.0)))]
        );

        let actions = controls.handle(&mouse(11, 6, MouseButtons::NONE));
        assert_eq!(
            actions,
            vec![Action::Engine(Command::MoveAttractor(Vec2::new(42.0, 44.0)))]
        );
    }

    #[test]
    fn only_fresh_clicks_spawn() {
        let mut controls = controls();
        let pressed = controls.handle(&mouse(5, 5, MouseButtons::LEFT));
        assert_eq!(pressed.last(), Some(&Action::Engine(Command::SpawnBurst)));

        let dragged = controls.handle(&mouse(6, 5, MouseButtons::LEFT));
        assert_eq!(dragged.len(), 1);

        controls.handle(&mouse(6, 5, MouseButtons::NONE));
        let pressed_again = controls.handle(&mouse(6, 5, MouseButtons::LEFT));
        assert_eq!(pressed_again.last(), Some(&Action::Engine(Command::SpawnBurst)));
    }

    #[test]
    fn wheel_changes_mass() {
        let mut controls = controls();
        let up = controls.handle(&mouse(
            1,
            1,
            MouseButtons::VERT_WHEEL | MouseButtons::WHEEL_POSITIVE,
        ));
        assert_eq!(
            up.last(),
            Some(&Action::Engine(Command::Parameter(ParameterUpdate::Nudge(
                Parameter::Mass,
                1.0
            ))))
        );

        let down = controls.handle(&mouse(1, 1, MouseButtons::VERT_WHEEL));
        assert_eq!(
            down.last(),
            Some(&Action::Engine(Command::Parameter(ParameterUpdate::Nudge(
                Parameter::Mass,
                -1.0
            ))))
        );
    }
}
