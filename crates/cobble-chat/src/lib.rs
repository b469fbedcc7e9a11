//! Chat for Cobble.
//!
//! Two halves:
//!
//! - **Text** ([`Message`], [`Color`], [`ClickEvent`], [`HoverEvent`]) — the
//!   JSON text components clients render, plus
//!   [`strip_control_sequences`] and the [`snbt`] helpers used in hover
//!   tooltips.
//! - **Broadcast** ([`GlobalChat`]) — an actor that owns the set of players
//!   in global chat and fans chat lines, joins, and leaves out to them.
//!
//! ```text
//! handlers ──send_message──┐
//! login    ──add_player────┼──→ [chat actor: HashMap<Uuid, Arc<Player>>] ──push──→ player queues
//! logout   ──remove_player─┘
//! ```

mod error;
mod global;
mod message;
pub mod snbt;

pub use error::ChatError;
pub use global::{ChatPosition, GlobalChat, DEFAULT_MAILBOX_CAPACITY};
pub use message::{strip_control_sequences, ClickEvent, Color, HoverEvent, Message};
