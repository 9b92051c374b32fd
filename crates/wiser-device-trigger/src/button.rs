//! Button panel trigger tokens
//!
//! A button panel exposes four buttons, each of which can be pressed briefly or
//! held. Configurations refer to one of those eight combinations with a flat token
//! such as `button_2_long_pressed`; everything past the configuration boundary
//! works with [`ButtonTrigger`] instead.

use serde::{Deserialize, Serialize};

/// Number of buttons on a panel
pub const BUTTON_COUNT: u8 = 4;

/// Wire tokens, in the order they are offered to users
pub const BUTTON_TRIGGER_TYPES: [&str; 8] = [
    "button_1_pressed",
    "button_2_pressed",
    "button_3_pressed",
    "button_4_pressed",
    "button_1_long_pressed",
    "button_2_long_pressed",
    "button_3_long_pressed",
    "button_4_long_pressed",
];

/// How long a button was held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressKind {
    Short,
    Long,
}

impl PressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PressKind::Short => "short",
            PressKind::Long => "long",
        }
    }
}

/// A decoded button trigger: which button, and how it was pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonTrigger {
    button_number: u8,
    press_kind: PressKind,
}

impl ButtonTrigger {
    /// `None` unless `button_number` is between 1 and [`BUTTON_COUNT`]
    pub fn new(button_number: u8, press_kind: PressKind) -> Option<Self> {
        (1..=BUTTON_COUNT)
            .contains(&button_number)
            .then_some(Self {
                button_number,
                press_kind,
            })
    }

    pub fn button_number(&self) -> u8 {
        self.button_number
    }

    pub fn press_kind(&self) -> PressKind {
        self.press_kind
    }

    /// All eight triggers, in [`BUTTON_TRIGGER_TYPES`] order
    pub fn all() -> impl Iterator<Item = ButtonTrigger> {
        [PressKind::Short, PressKind::Long]
            .into_iter()
            .flat_map(|press_kind| {
                (1..=BUTTON_COUNT).map(move |button_number| ButtonTrigger {
                    button_number,
                    press_kind,
                })
            })
    }

    /// The wire token for this trigger
    pub fn encode(&self) -> &'static str {
        let offset = match self.press_kind {
            PressKind::Short => 0,
            PressKind::Long => BUTTON_COUNT as usize,
        };
        BUTTON_TRIGGER_TYPES[offset + usize::from(self.button_number) - 1]
    }

    /// Decode a wire token
    ///
    /// Anything that is not exactly one of the eight tokens yields `None`, including
    /// tokens with a non-numeric or out of range button segment. Callers treat
    /// `None` as "not a button trigger", never as an error.
    pub fn decode(token: &str) -> Option<Self> {
        let body = token.strip_prefix("button_")?.strip_suffix("_pressed")?;
        let (number, press_kind) = match body.strip_suffix("_long") {
            Some(number) => (number, PressKind::Long),
            None => (body, PressKind::Short),
        };

        let decoded = Self::new(number.parse().ok()?, press_kind)?;
        // reject spellings that parse to a valid number but are not the canonical token
        (decoded.encode() == token).then_some(decoded)
    }
}

impl std::fmt::Display for ButtonTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.encode())
    }
}
