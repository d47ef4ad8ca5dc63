use crate::{
    domain::{ChatId, TicketId},
    formatting::escape_html,
};

use super::JournalEntry;

/// Self-contained HTML page. Output depends only on the inputs.
pub(super) fn render_html(ticket: TicketId, channel: ChatId, entries: &[JournalEntry]) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>Ticket {ticket}</title>\n"));
    out.push_str(
        "<style>body{font-family:sans-serif}.m{margin:4px 0}.t{color:#888}.a{font-weight:bold}</style>\n",
    );
    out.push_str("</head>\n<body>\n");
    out.push_str(&format!("<h1>Ticket {ticket}</h1>\n"));
    out.push_str(&format!(
        "<p>Chat {} &middot; {} message(s)</p>\n",
        channel.0,
        entries.len()
    ));

    for e in entries {
        let text = escape_html(&e.text).replace('\n', "<br>");
        out.push_str(&format!(
            "<div class=\"m\"><span class=\"t\">{}</span> <span class=\"a\">{}</span>: {}</div>\n",
            escape_html(&e.timestamp),
            escape_html(&e.author_name),
            text
        ));
    }

    out.push_str("</body>\n</html>\n");
    out
}
