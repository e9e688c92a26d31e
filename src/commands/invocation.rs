//! Prefix parsing: raw message text to command name and arguments

use crate::platform::{IncomingMessage, UserRef};

/// One parsed command call, alive for a single dispatch
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    /// Lower-cased command name
    pub name: String,
    /// Remaining tokens, original case and order
    pub args: Vec<&'a str>,
    pub message: &'a IncomingMessage,
}

impl<'a> Invocation<'a> {
    /// Parse `message` if it starts with `prefix` and names something
    pub fn parse(prefix: &str, message: &'a IncomingMessage) -> Option<Self> {
        let rest = message.content.strip_prefix(prefix)?;
        let mut tokens = rest.split_whitespace();
        let name = tokens.next()?.to_lowercase();
        Some(Self {
            name,
            args: tokens.collect(),
            message,
        })
    }

    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.args.get(index).copied()
    }

    /// Arguments from `start` joined with single spaces
    pub fn rest(&self, start: usize) -> String {
        self.args.get(start..).unwrap_or_default().join(" ")
    }

    pub fn invoker(&self) -> &'a UserRef {
        &self.message.author
    }

    /// First mentioned user, or the invoker
    pub fn mentioned_or_invoker(&self) -> &'a UserRef {
        self.message
            .first_mentioned_user()
            .unwrap_or(&self.message.author)
    }
}
