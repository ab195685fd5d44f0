//! Microsoft Teams adaptive-card rendering.

use certwatch_common::types::CertCheckNotification;
use serde_json::{json, Value};

use crate::card::NotificationCard;

fn status_glyph(item: &CertCheckNotification) -> &'static str {
    if !item.is_valid {
        "\u{274c}" // ❌
    } else if item.expiration_warning {
        "\u{26a0}\u{fe0f}" // ⚠️
    } else {
        "\u{2714}\u{fe0f}" // ✔️
    }
}

/// Builds a `message` envelope with one adaptive-card attachment: title,
/// description and a two-column table (status + hostname, then the
/// per-certificate messages). Zero items produce an empty table.
pub(crate) fn render(card: &NotificationCard<'_>) -> Value {
    let rows: Vec<Value> = card
        .items
        .iter()
        .map(|item| {
            json!({
                "type": "TableRow",
                "cells": [
                    {
                        "type": "TableCell",
                        "items": [{
                            "type": "TextBlock",
                            "text": format!("{}{}", status_glyph(item), item.hostname),
                        }],
                    },
                    {
                        "type": "TableCell",
                        "items": [{
                            "type": "TextBlock",
                            "text": item.messages.join(", "),
                            "wrap": true,
                        }],
                    },
                ],
            })
        })
        .collect();

    let mut content = json!({
        "type": "AdaptiveCard",
        "version": "1.5",
        "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
        "body": [
            {
                "type": "TextBlock",
                "text": card.title,
                "size": "large",
                "weight": "bolder",
                "wrap": true,
            },
            {
                "type": "TextBlock",
                "text": card.description,
                "isSubtle": true,
                "wrap": true,
            },
            {
                "type": "Table",
                "columns": [{ "width": 2 }, { "width": 4 }],
                "rows": rows,
            },
        ],
    });

    if let Some(url) = &card.notification_url {
        content["actions"] = json!([{
            "type": "Action.OpenUrl",
            "title": "View Details",
            "url": url,
        }]);
    }

    json!({
        "type": "message",
        "attachments": [{
            "contentType": "application/vnd.microsoft.card.adaptive",
            "content": content,
        }],
    })
}
