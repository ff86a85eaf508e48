use std::fmt;

/// A key as reported by the `key` property of a keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Character(char),
    Backspace,
    Tab,
    Enter,
    Escape,
    Delete,
    Home,
    End,
    ArrowLeft,
    ArrowUp,
    ArrowRight,
    ArrowDown,
    Shift,
}

impl Key {
    /// Legacy `keyCode` for a US layout, which is what field handlers inspect.
    pub fn key_code(self) -> u32 {
        match self {
            Self::Backspace => 8,
            Self::Tab => 9,
            Self::Enter => 13,
            Self::Shift => 16,
            Self::Escape => 27,
            Self::End => 35,
            Self::Home => 36,
            Self::ArrowLeft => 37,
            Self::ArrowUp => 38,
            Self::ArrowRight => 39,
            Self::ArrowDown => 40,
            Self::Delete => 46,
            Self::Character(ch) => character_key_code(ch),
        }
    }

    /// Character inserted by the default action, if any.
    pub fn inserted_char(self) -> Option<char> {
        match self {
            Self::Character(ch) if !ch.is_control() => Some(ch),
            _ => None,
        }
    }
}

impl From<char> for Key {
    fn from(ch: char) -> Self {
        match ch {
            '\u{8}' => Self::Backspace,
            '\t' => Self::Tab,
            '\n' | '\r' => Self::Enter,
            '\u{1b}' => Self::Escape,
            '\u{7f}' => Self::Delete,
            other => Self::Character(other),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Character(ch) => write!(f, "{ch}"),
            Self::Backspace => f.write_str("Backspace"),
            Self::Tab => f.write_str("Tab"),
            Self::Enter => f.write_str("Enter"),
            Self::Escape => f.write_str("Escape"),
            Self::Delete => f.write_str("Delete"),
            Self::Home => f.write_str("Home"),
            Self::End => f.write_str("End"),
            Self::ArrowLeft => f.write_str("ArrowLeft"),
            Self::ArrowUp => f.write_str("ArrowUp"),
            Self::ArrowRight => f.write_str("ArrowRight"),
            Self::ArrowDown => f.write_str("ArrowDown"),
            Self::Shift => f.write_str("Shift"),
        }
    }
}

fn character_key_code(ch: char) -> u32 {
    match ch {
        '0'..='9' => ch as u32,
        'a'..='z' => ch.to_ascii_uppercase() as u32,
        'A'..='Z' => ch as u32,
        ' ' => 32,
        ';' | ':' => 186,
        '=' | '+' => 187,
        ',' | '<' => 188,
        '-' | '_' => 189,
        '.' | '>' => 190,
        '/' | '?' => 191,
        _ => 0,
    }
}

/// The key-down notification delivered to field listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardEvent {
    pub key: Key,
    pub key_code: u32,
}

impl KeyboardEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            key_code: key.key_code(),
        }
    }

    /// Event whose `keyCode` disagrees with its key, as IMEs and some
    /// virtual keyboards produce (`keyCode` 229 for composition).
    pub fn with_key_code(key: Key, key_code: u32) -> Self {
        Self { key, key_code }
    }
}

impl From<Key> for KeyboardEvent {
    fn from(key: Key) -> Self {
        Self::new(key)
    }
}
