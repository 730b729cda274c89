//! Human-readable console output.
//!
//! The monitor reports status on the standard streams with short tagged
//! lines (`[info]`, `[warn]`, `[join]`, `[skip]`). This is for people
//! watching the terminal, not a machine-readable protocol; structured
//! diagnostics go through `tracing` instead.

use std::fmt::Display;

use crate::follow::FollowEvent;
use crate::identity::SelfIdentity;

/// Kind of console line; decides the prefix and the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Info,
    Warn,
    Join,
    Skip,
}

impl Tag {
    fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Join => "join",
            Self::Skip => "skip",
        }
    }
}

/// Formats a message with its `[tag]` prefix.
pub fn line(tag: Tag, message: impl Display) -> String {
    format!("[{}] {message}", tag.label())
}

/// Prints an `[info]` line to stdout.
pub fn info(message: impl Display) {
    println!("{}", line(Tag::Info, message));
}

/// Prints a `[warn]` line to stderr.
pub fn warn(message: impl Display) {
    eprintln!("{}", line(Tag::Warn, message));
}

/// Describes the resolved self identity.
pub fn identity_line(identity: &SelfIdentity) -> String {
    match identity.name() {
        Some(name) => format!("Self name: {name} (from {})", identity.source()),
        None => "Self name unknown; your own joins will not be filtered".to_string(),
    }
}

/// Breaks a follow event into tagged messages, in print order.
pub fn render(event: &FollowEvent) -> Vec<(Tag, String)> {
    match event {
        FollowEvent::Following(path) => {
            vec![(Tag::Info, format!("Following: {}", path.display()))]
        }
        FollowEvent::Switched { to, .. } => vec![(
            Tag::Info,
            format!("Switching to newer log: {}", to.display()),
        )],
        FollowEvent::Truncated(path) => vec![(
            Tag::Info,
            format!("Log truncated, reading from start: {}", path.display()),
        )],
        FollowEvent::Joined { name, warnings } => {
            let mut lines: Vec<(Tag, String)> =
                warnings.iter().map(|w| (Tag::Warn, w.clone())).collect();
            let who = name.as_deref().unwrap_or("<unknown>");
            lines.push((Tag::Join, who.to_string()));
            lines
        }
        FollowEvent::Skipped { name } => vec![(Tag::Skip, format!("{name} (self)"))],
    }
}

/// Prints a follow event; warnings go to stderr, everything else to stdout.
pub fn report(event: &FollowEvent) {
    for (tag, message) in render(event) {
        match tag {
            Tag::Info => info(message),
            Tag::Warn => warn(message),
            Tag::Join | Tag::Skip => println!("{}", line(tag, message)),
        }
    }
}
