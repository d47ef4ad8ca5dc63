/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Inline mention of a user (`tg://user` link), safe to embed in HTML.
pub fn user_mention(user_id: i64, display_name: &str) -> String {
    let name = if display_name.trim().is_empty() {
        "user".to_string()
    } else {
        escape_html(display_name)
    };
    format!(r#"<a href="tg://user?id={user_id}">{name}</a>"#)
}

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}
