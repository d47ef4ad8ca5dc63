use std::sync::Arc;

use teloxide::{prelude::*, types::ParseMode};

use stb_core::formatting::escape_html;

use crate::router::AppState;

use super::transcript::handle_transcript;

/// Native `/cmd` commands always count; the configured prefix is accepted as well.
pub(super) fn is_command(text: &str, prefix: &str) -> bool {
    text.starts_with('/') || (!prefix.is_empty() && text.starts_with(prefix))
}

/// Split `/cmd@botname arg1 ...` (or `<prefix>cmd ...`) into a lowercase
/// command name and the raw rest.
pub(super) fn parse_command(text: &str, prefix: &str) -> (String, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let name = if prefix.is_empty() {
        first
    } else {
        first.strip_prefix(prefix).unwrap_or(first)
    };
    let cmd = name
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

fn help_text(prefix: &str) -> String {
    let p = escape_html(prefix);
    format!(
        "🎫 <b>Support Ticket Bot</b>\n\n\
<b>Commands:</b>\n\
{p}transcript - Transcript of the ticket in this chat\n\
{p}transcript &lt;number&gt; - Transcript of one of your tickets\n\
{p}help - Show this message\n\n\
Transcripts are sent to you privately. Start a private chat with the bot first."
    )
}

pub async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let (cmd, arg) = parse_command(text, &state.cfg.command_prefix);

    match cmd.as_str() {
        "start" | "help" => {
            bot.send_message(msg.chat.id, help_text(&state.cfg.command_prefix))
                .parse_mode(ParseMode::Html)
                .await?;
            Ok(())
        }

        "transcript" => handle_transcript(&msg, user, arg, state).await,

        // Ticket lifecycle commands belong to other services sharing the chat.
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_bot_suffix_and_args() {
        assert_eq!(
            parse_command("/Transcript@support_bot 42 extra", "/"),
            ("transcript".to_string(), "42 extra".to_string())
        );
        assert_eq!(
            parse_command("  /transcript  ", "/"),
            ("transcript".to_string(), String::new())
        );
    }

    #[test]
    fn configured_prefix_routes_like_slash() {
        assert!(is_command("!transcript 42", "!"));
        assert!(is_command("/transcript 42", "!"));
        assert!(!is_command("transcript 42", "!"));
        assert!(!is_command("hello there", ""));
        assert_eq!(
            parse_command("!Transcript 42", "!"),
            ("transcript".to_string(), "42".to_string())
        );
        assert_eq!(
            parse_command("/transcript@support_bot", "!"),
            ("transcript".to_string(), String::new())
        );
    }

    #[test]
    fn help_uses_configured_prefix() {
        let help = help_text("!");
        assert!(help.contains("!transcript &lt;number&gt;"));
        assert!(!help.contains("/transcript"));
    }
}
