//! User-definable keybindings.

/// A single keybinding as written in the config file.
#[derive(serde::Serialize, serde::Deserialize, PartialEq, Eq, Debug, Clone)]
pub(crate) struct KeybindingConfigRaw {
    /// The modifier keys, like `CTRL`, `SHIFT`, etc.
    pub mods: Option<String>,
    /// The actual key, like a 'x' or `UpArrow`.
    pub key: String,
}

/// Everything a user can do from the keyboard.
#[derive(serde::Serialize, serde::Deserialize, PartialEq, Eq, Debug, Clone, Copy, Hash)]
#[serde(rename_all = "snake_case")]
pub(crate) enum KeybindingAction {
    /// Make the black hole heavier.
    MassUp,
    /// Make the black hole lighter.
    MassDown,
    /// Increase the gravitational constant.
    GravityUp,
    /// Decrease the gravitational constant.
    GravityDown,
    /// Spread the reference grid's lines out.
    GridUp,
    /// Bring the reference grid's lines closer together.
    GridDown,
    /// Speed up time.
    TimeUp,
    /// Slow down time.
    TimeDown,
    /// Move the black hole up.
    NudgeUp,
    /// Move the black hole down.
    NudgeDown,
    /// Move the black hole left.
    NudgeLeft,
    /// Move the black hole right.
    NudgeRight,
    /// Throw a burst of particles in from the edges.
    SpawnBurst,
    /// Pause or resume the simulation.
    TogglePause,
    /// Switch between the relativistic and Newtonian laws of gravity.
    ToggleModel,
    /// Remove every particle.
    Clear,
    /// Show or hide the heads-up display.
    ToggleHud,
    /// Exit.
    Quit,
}

/// The keybindings as found in the config file.
pub(crate) type KeybindingsRaw = std::collections::HashMap<KeybindingAction, KeybindingConfigRaw>;

/// Keybindings converted to native `termwiz::input::KeyEvent`s.
pub(crate) type KeybindingsAsEvents =
    std::collections::HashMap<KeybindingAction, termwiz::input::KeyEvent>;

impl TryFrom<KeybindingConfigRaw> for termwiz::input::KeyEvent {
    type Error = std::io::Error;

    /// `termwiz::input::KeyEvent` can't be made from a string, but it can be deserialised. So
    /// we build a tiny TOML document from the binding and let `toml` do the key name lookups.
    fn try_from(binding: KeybindingConfigRaw) -> std::result::Result<Self, Self::Error> {
        let key = if binding.key.chars().count() == 1 {
            format!("{{ Char = {:?} }}", binding.key)
        } else {
            format!("{:?}", binding.key)
        };
        let document = format!("modifiers = {{ bits = 0 }}\nkey = {key}\n");

        let mut key_event = toml::from_str::<Self>(&document).map_err(|error| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid key in {binding:?}: {}", error.message()),
            )
        })?;

        if let Some(modifiers) = binding.mods {
            key_event.modifiers = modifiers.try_into().map_err(|error| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("Couldn't parse keybinding modifier: {error:?}"),
                )
            })?;
        }

        Ok(key_event)
    }
}

/// Shift is already part of a character key, "M" vs "m", and terminals disagree about whether
/// to also report it as a modifier.
fn normalise(event: &termwiz::input::KeyEvent) -> termwiz::input::KeyEvent {
    let mut normalised = event.clone();
    if matches!(normalised.key, termwiz::input::KeyCode::Char(_)) {
        normalised.modifiers.remove(termwiz::input::Modifiers::SHIFT);
    }
    normalised
}

/// Find the action bound to a key press, if any.
#[expect(clippy::iter_over_hash_type, reason = "Bindings are unique per action")]
pub(crate) fn action_for(
    keybindings: &KeybindingsAsEvents,
    event: &termwiz::input::KeyEvent,
) -> Option<KeybindingAction> {
    let pressed = normalise(event);
    for (action, binding) in keybindings {
        if normalise(binding) == pressed {
            return Some(*action);
        }
    }
    None
}

#[cfg(test)]
mod test {
    use termwiz::input::{KeyCode, KeyEvent, Modifiers};

    use super::*;

    fn parse(config: &str) -> KeyEvent {
        let parsed: KeybindingConfigRaw = toml::from_str(config).unwrap();
        parsed.try_into().unwrap()
    }

    #[test]
    fn plain_character() {
        let actual = parse(r#"key = "m""#);
        let expected = KeyEvent {
            modifiers: Modifiers::NONE,
            key: KeyCode::Char('m'),
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn punctuation() {
        let actual = parse(r#"key = "+""#);
        assert_eq!(actual.key, KeyCode::Char('+'));
    }

    #[test]
    fn named_key() {
        let actual = parse(r#"key = "UpArrow""#);
        let expected = KeyEvent {
            modifiers: Modifiers::NONE,
            key: KeyCode::UpArrow,
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn shifted_character() {
        let actual = parse(indoc::indoc! {r#"
            mods = "SHIFT"
            key = "g"
        "#});
        let expected = KeyEvent {
            modifiers: Modifiers::SHIFT,
            key: KeyCode::Char('g'),
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn combined_modifiers() {
        let actual = parse(indoc::indoc! {r#"
            mods = "CTRL|ALT"
            key = "LeftArrow"
        "#});
        assert_eq!(actual.modifiers, Modifiers::CTRL | Modifiers::ALT);
        assert_eq!(actual.key, KeyCode::LeftArrow);
    }

    #[test]
    fn unknown_key_is_an_error() {
        let parsed: KeybindingConfigRaw = toml::from_str(r#"key = "NotAKey""#).unwrap();
        let result: std::result::Result<KeyEvent, _> = parsed.try_into();
        assert!(result.is_err());
    }

    #[test]
    fn finding_actions() {
        let mut keybindings = KeybindingsAsEvents::new();
        let space = parse(r#"key = " ""#);
        keybindings.insert(KeybindingAction::TogglePause, space.clone());
        assert_eq!(
            action_for(&keybindings, &space),
            Some(KeybindingAction::TogglePause)
        );
        assert_eq!(action_for(&keybindings, &parse(r#"key = "q""#)), None);
    }

    #[test]
    fn shift_is_ignored_for_characters() {
        let mut keybindings = KeybindingsAsEvents::new();
        keybindings.insert(KeybindingAction::MassUp, parse(r#"key = "M""#));
        let shifted = KeyEvent {
            modifiers: Modifiers::SHIFT,
            key: KeyCode::Char('M'),
        };
        assert_eq!(
            action_for(&keybindings, &shifted),
            Some(KeybindingAction::MassUp)
        );

        keybindings.insert(
            KeybindingAction::NudgeUp,
            parse("mods = \"SHIFT\"\nkey = \"UpArrow\""),
        );
        let plain_up = KeyEvent {
            modifiers: Modifiers::NONE,
            key: KeyCode::UpArrow,
        };
        assert_eq!(action_for(&keybindings, &plain_up), None);
    }
}
