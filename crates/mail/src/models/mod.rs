//! Domain models for mail entities

mod category;
mod message;

pub use category::{Category, CategoryError, CategoryTable};
pub use message::{
    ContentType, EmailAddress, Importance, Message, MessageBody, MessageBuilder, MessageId,
};
