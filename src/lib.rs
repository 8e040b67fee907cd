//! `msgshell`: a decoder for Outlook `.msg` files.
//!
//! This crate parses the compound file container of a `.msg` message into a
//! [`Message`](model::message::Message): typed properties, recipients, and
//! attachments, which may themselves be complete nested messages.
//!
//! ```no_run
//! let msg = msgshell::parse_msg_file("mail.msg")?;
//! println!("{:?}", msg.subject());
//! # Ok::<(), msgshell::error::MsgError>(())
//! ```

pub mod config;
pub mod container;
pub mod error;
pub mod model;
pub mod parser;

pub use parser::{parse_message, parse_msg_file, MsgParser, ParseOptions};
