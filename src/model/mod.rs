//! Core data model: properties, messages, recipients and attachments.

pub mod attachment;
pub mod codepage;
pub mod message;
pub mod property;
