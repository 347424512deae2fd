use std::fmt::{Display, Formatter};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use indexmap::IndexMap;
use multi_watch_core::error::{Error, Result};

/// What the main loop does after a key handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

impl From<&KeyEvent> for KeyBinding {
    fn from(event: &KeyEvent) -> Self {
        Self::new(event.code, event.modifiers)
    }
}

impl Display for KeyBinding {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            formatter.write_str("Ctrl-")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            formatter.write_str("Alt-")?;
        }
        match self.code {
            KeyCode::Char(c) => write!(formatter, "{c}"),
            other => write!(formatter, "{other:?}"),
        }
    }
}

type Handler = Box<dyn FnMut() -> Control>;

/// Global key bindings, checked in registration order.
#[derive(Default)]
pub struct Keybindings {
    handlers: IndexMap<KeyBinding, Handler>,
}

impl Keybindings {
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKeybinding`] if `key` is already bound.
    pub fn bind(&mut self, key: KeyBinding, handler: impl FnMut() -> Control + 'static) -> Result<()> {
        if self.handlers.contains_key(&key) {
            return Err(Error::DuplicateKeybinding(key.to_string()));
        }

        self.handlers.insert(key, Box::new(handler));
        Ok(())
    }

    /// Runs the handler bound to `event`, if any.
    pub fn dispatch(&mut self, event: &KeyEvent) -> Option<Control> {
        self.handlers
            .get_mut(&KeyBinding::from(event))
            .map(|handler| handler())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
