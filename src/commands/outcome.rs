//! Result of dispatching one inbound message

use std::time::Duration;

use crate::core::Reply;

/// Exactly one of these per inbound message; every variant except
/// `Ignored` and `NotFound` carries the single reply to emit
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Bot author or no prefix
    Ignored,
    NotFound { command: String },
    Cooldown {
        command: String,
        retry_after: Duration,
        reply: Reply,
    },
    /// Invoked where the command's scope does not allow it
    OutOfScope { command: String, reply: Reply },
    PermissionDenied { command: String, reply: Reply },
    /// Usage hint or external action failure
    Failed { command: String, reply: Reply },
    Handled { command: String, reply: Reply },
}

impl DispatchOutcome {
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::Ignored => None,
            Self::NotFound { command }
            | Self::Cooldown { command, .. }
            | Self::OutOfScope { command, .. }
            | Self::PermissionDenied { command, .. }
            | Self::Failed { command, .. }
            | Self::Handled { command, .. } => Some(command),
        }
    }

    pub fn reply(&self) -> Option<&Reply> {
        match self {
            Self::Ignored | Self::NotFound { .. } => None,
            Self::Cooldown { reply, .. }
            | Self::OutOfScope { reply, .. }
            | Self::PermissionDenied { reply, .. }
            | Self::Failed { reply, .. }
            | Self::Handled { reply, .. } => Some(reply),
        }
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::NotFound { .. } => "not_found",
            Self::Cooldown { .. } => "cooldown",
            Self::OutOfScope { .. } => "out_of_scope",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::Failed { .. } => "failed",
            Self::Handled { .. } => "handled",
        }
    }
}

/// Wait message, remaining time rounded to one decimal second
pub fn cooldown_message(command: &str, retry_after: Duration) -> String {
    format!(
        "Please wait {:.1} more second(s) before using the `{command}` command.",
        retry_after.as_secs_f64()
    )
}

pub fn permission_message(noun: &str) -> String {
    format!("You do not have permission to {noun}.")
}
