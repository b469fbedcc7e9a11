//! JSON text components.
//!
//! A [`Message`] is what the client renders in the chat box: either literal
//! text or a translation key with arguments, optionally styled and carrying
//! click/hover behaviour. On the wire it is a protocol string holding the
//! JSON form.

use std::fmt;
use std::io::{Read, Write};

use cobble_packet::{Decode, Encode, PacketError};
use serde::{Deserialize, Serialize};

/// The sixteen named chat colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Black,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
}

/// What happens when the player clicks the component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum ClickEvent {
    OpenUrl(String),
    RunCommand(String),
    /// Replaces the contents of the chat input box.
    SuggestCommand(String),
    ChangePage(String),
    CopyToClipboard(String),
}

/// What the client shows while the pointer rests on the component.
///
/// Uses the `value` form: the item and entity variants carry a text
/// component whose text is an SNBT compound (see [`crate::snbt`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum HoverEvent {
    ShowText(Box<Message>),
    ShowItem(Box<Message>),
    ShowEntity(Box<Message>),
}

impl HoverEvent {
    /// A tooltip showing `message`.
    pub fn show_text(message: Message) -> Self {
        Self::ShowText(Box::new(message))
    }

    /// An entity tooltip from its SNBT description.
    pub fn show_entity(snbt: impl Into<String>) -> Self {
        Self::ShowEntity(Box::new(Message::text(snbt)))
    }
}

/// A chat text component.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate: Option<String>,
    /// Arguments substituted into the translation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub with: Vec<Message>,
    /// Components appended after this one, inheriting its style.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<Message>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlined: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfuscated: Option<bool>,

    /// Text inserted into the chat box on shift-click.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insertion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_event: Option<ClickEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_event: Option<HoverEvent>,
}

impl Message {
    /// Literal text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// A translation key with its arguments, resolved by the client.
    pub fn translate(key: impl Into<String>, with: impl IntoIterator<Item = Message>) -> Self {
        Self {
            translate: Some(key.into()),
            with: with.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_click(mut self, event: ClickEvent) -> Self {
        self.click_event = Some(event);
        self
    }

    pub fn with_hover(mut self, event: HoverEvent) -> Self {
        self.hover_event = Some(event);
        self
    }

    pub fn with_insertion(mut self, insertion: impl Into<String>) -> Self {
        self.insertion = Some(insertion.into());
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = Some(true);
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = Some(true);
        self
    }

    pub fn underlined(mut self) -> Self {
        self.underlined = Some(true);
        self
    }

    pub fn strikethrough(mut self) -> Self {
        self.strikethrough = Some(true);
        self
    }

    pub fn obfuscated(mut self) -> Self {
        self.obfuscated = Some(true);
        self
    }

    /// Appends a child component.
    pub fn append(mut self, extra: Message) -> Self {
        self.extra.push(extra);
        self
    }

    /// Serializes the component to its JSON form.
    pub fn to_json(&self) -> String {
        // Every field is a string, bool, enum or nested Message; serde_json
        // cannot fail on them.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Renders the plain text: literal text as-is, translations as
/// `key[arg, ...]`, followed by any extra components.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)?;
        if let Some(key) = &self.translate {
            f.write_str(key)?;
            if !self.with.is_empty() {
                f.write_str("[")?;
                for (i, arg) in self.with.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str("]")?;
            }
        }
        for extra in &self.extra {
            write!(f, "{extra}")?;
        }
        Ok(())
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl Encode for Message {
    fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize, PacketError> {
        self.to_json().write_to(w)
    }
}

impl Decode for Message {
    fn read_from<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<usize, PacketError> {
        let mut json = String::new();
        let n = json.read_from(r)?;
        *self = serde_json::from_str(&json)
            .map_err(|e| PacketError::invalid("chat message", e.to_string()).after(n))?;
        Ok(n)
    }
}

/// Removes `§` formatting codes (`§` followed by `0-9`, `a-f`, `k-o` or
/// `r`, either case) from `text`.
///
/// Returns the cleaned text and whether anything was removed. A `§` not
/// followed by a formatting code is kept.
pub fn strip_control_sequences(text: &str) -> (String, bool) {
    let mut out = String::with_capacity(text.len());
    let mut changed = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '§' {
            if let Some(&code) = chars.peek() {
                if matches!(code.to_ascii_lowercase(), '0'..='9' | 'a'..='f' | 'k'..='o' | 'r') {
                    chars.next();
                    changed = true;
                    continue;
                }
            }
        }
        out.push(c);
    }
    (out, changed)
}
