//! Slack block-kit rendering.

use certwatch_common::types::CertCheckNotification;
use serde_json::{json, Value};

use crate::card::NotificationCard;

fn status_glyph(item: &CertCheckNotification) -> &'static str {
    if !item.is_valid {
        ":x:"
    } else if item.expiration_warning {
        ":warning:"
    } else {
        ":white_check_mark:"
    }
}

/// Builds a block-kit payload: header section (title, description and any
/// mentions), a divider, one section per certificate, a trailing divider
/// and, when a details link is configured, an actions block.
pub(crate) fn render(card: &NotificationCard<'_>) -> Value {
    let mut header = format!("{}\n{}", card.title, card.description);
    if !card.mentions.is_empty() {
        header.push(' ');
        header.push_str(&card.mentions.join(" "));
    }

    let mut blocks = vec![
        json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": header },
        }),
        json!({ "type": "divider" }),
    ];

    for item in card.items {
        blocks.push(json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!(
                    "{} *{}*\n{}",
                    status_glyph(item),
                    item.hostname,
                    item.messages.join(", ")
                ),
            },
        }));
    }

    blocks.push(json!({ "type": "divider" }));

    if let Some(url) = &card.notification_url {
        blocks.push(json!({
            "type": "actions",
            "elements": [{
                "type": "button",
                "text": { "type": "plain_text", "text": "View details", "emoji": true },
                "url": url,
            }],
        }));
    }

    json!({ "blocks": blocks })
}
