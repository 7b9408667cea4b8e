//! Core types: chat, request, response, and the stored user record.

use serde::{Deserialize, Serialize};

/// Origin of a request: an opaque chat id and an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub username: Option<String>,
}

impl Chat {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
        }
    }
}

/// A single inbound message. Immutable once handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub chat: Chat,
    pub text: String,
    /// Message id assigned by the transport, if it has one.
    pub message_id: Option<String>,
}

impl Request {
    /// Creates a request from the given chat id with no username and no message id.
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat: Chat::new(chat_id),
            text: text.into(),
            message_id: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.chat.username = Some(username.into());
        self
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }
}

/// A single outbound message addressed to a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub chat_id: String,
    pub text: String,
    /// Message id this response replies to, if any.
    pub reply_to: Option<String>,
}

impl Response {
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            reply_to: None,
        }
    }

    /// Creates a response to the originating chat of `req`.
    pub fn to(req: &Request, text: impl Into<String>) -> Self {
        Self::new(req.chat.id.clone(), text)
    }

    pub fn reply_to(mut self, message_id: impl Into<String>) -> Self {
        self.reply_to = Some(message_id.into());
        self
    }
}

/// Per-chat authorization record kept by the user store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    pub chat_id: String,
    pub username: Option<String>,
    pub authorized: bool,
    pub subscribed: bool,
}

impl User {
    /// Creates an unauthorized, unsubscribed record for the given chat.
    pub fn new(chat: &Chat) -> Self {
        Self {
            chat_id: chat.id.clone(),
            username: chat.username.clone(),
            authorized: false,
            subscribed: false,
        }
    }
}
