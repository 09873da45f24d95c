//! Slash-command parsing and reply routing.
//!
//! Everything here is pure: `route` decides what (if anything) to send back
//! for a piece of message text, and the caller does the sending.

use tracing::debug;

use crate::platform::SendOptions;

pub const WELCOME_MESSAGE: &str = "Welcome to the Caption Bot! 👋\n\n\
    I can help you manage captions for your media files.\n\
    Use /help to see the available commands.";

pub const HELP_MESSAGE: &str = "<b>Caption Bot commands</b>\n\n\
    /start - Start the bot\n\
    /help - Show this help message\n\
    /set_caption &lt;template&gt; - Set the caption template\n\
    /save_template &lt;name&gt; - Save the current caption as a template\n\
    /templates - List saved templates\n\n\
    <b>Placeholders</b>\n\
    <code>{file_name}</code> - Original file name\n\n\
    Send <code>all</code> to apply the caption to all media.";

pub const SET_CAPTION_USAGE: &str = "Please provide a caption template.\n\
    Example: <code>/set_caption Hello {file_name}</code>";

pub const UNKNOWN_COMMAND_MESSAGE: &str =
    "Unknown command. Use /help to see the available commands.";

pub const PROCESS_ALL_MESSAGE: &str = "Processing all media files...";

pub const FALLBACK_MESSAGE: &str = "I can help you manage captions for your media files. \
    Use /help to see the available commands.";

/// A slash command split into its name and raw argument string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub name: &'a str,
    pub args: &'a str,
}

/// Split `/name args` into its parts. Returns `None` for text that does not
/// start with `/`.
///
/// The name runs up to the first whitespace character; the argument string
/// is whatever follows that single separator, untrimmed.
pub fn parse_command(text: &str) -> Option<ParsedCommand<'_>> {
    let rest = text.strip_prefix('/')?;

    match rest.char_indices().find(|(_, c)| c.is_whitespace()) {
        Some((idx, sep)) => Some(ParsedCommand {
            name: &rest[..idx],
            args: &rest[idx + sep.len_utf8()..],
        }),
        None => Some(ParsedCommand {
            name: rest,
            args: "",
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Start,
    Help,
    SetCaption(&'a str),
    Unknown(&'a str),
}

impl<'a> From<ParsedCommand<'a>> for Command<'a> {
    fn from(parsed: ParsedCommand<'a>) -> Self {
        match parsed.name {
            "start" => Command::Start,
            "help" => Command::Help,
            "set_caption" => Command::SetCaption(parsed.args),
            other => Command::Unknown(other),
        }
    }
}

/// Body and send options for a single outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub options: SendOptions,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: SendOptions::default(),
        }
    }
}

/// Decide the reply for a message's text. `None` means nothing is sent.
pub fn route(text: &str) -> Option<Reply> {
    if let Some(parsed) = parse_command(text) {
        return Some(reply_for_command(Command::from(parsed)));
    }

    if text.eq_ignore_ascii_case("all") {
        return Some(Reply::text(PROCESS_ALL_MESSAGE));
    }

    if text.is_empty() {
        return None;
    }

    Some(Reply::text(FALLBACK_MESSAGE))
}

pub fn reply_for_command(command: Command<'_>) -> Reply {
    match command {
        Command::Start => Reply::text(WELCOME_MESSAGE),
        Command::Help => Reply::text(HELP_MESSAGE),
        Command::SetCaption(args) if args.trim().is_empty() => Reply::text(SET_CAPTION_USAGE),
        // TODO: persist the template per chat once a key-value store exists
        Command::SetCaption(args) => Reply::text(format!(
            "Caption template set to:\n<code>{}</code>",
            escape_html(args)
        )),
        Command::Unknown(name) => {
            debug!("Unknown command: /{}", name);
            Reply::text(UNKNOWN_COMMAND_MESSAGE)
        }
    }
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
