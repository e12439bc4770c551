//! Telegram HTML rendering for the admin summary and the channel
//! announcement. User-supplied fields are escaped; layout markup is not.

use crate::config::AuctionChannelConfig;
use crate::models::{Location, Order, TelegramUser};

/// Escape the characters Telegram HTML parse mode treats as markup
pub fn html_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn positive_bid(order: &Order) -> Option<i64> {
    order.bid.filter(|bid| *bid > 0)
}

/// Public channel announcement for an approved order
pub fn format_announcement(order: &Order, channel: &AuctionChannelConfig) -> String {
    let mut text = String::new();

    if let Some(lot) = non_empty(order.lot_name.as_deref()) {
        text.push_str(&format!("<b>Lot:</b> {}\n", html_escape(lot)));
    }
    if let Some(info) = non_empty(Some(order.text.as_str())) {
        text.push_str(&format!("<b>Info:</b> {}\n", html_escape(info)));
    }
    if let Some(bid) = positive_bid(order) {
        text.push_str(&format!("<b>Starting bid:</b> {bid}₪\n"));
    }
    text.push_str(&format!("<b>Next step:</b> {}₪\n", channel.bid_step));
    if let Some(pickup) = non_empty(order.locations.as_deref()) {
        text.push_str(&format!("<b>Pickup:</b> {}\n", html_escape(pickup)));
    }

    text.push_str(&channel.footer_lines.join("\n"));
    text
}

/// Review request sent to the admin chat
pub fn format_admin_summary(
    order: &Order,
    locations: &[Location],
    submitter: Option<&TelegramUser>,
) -> String {
    let mut text = format!(
        "<b>For admin::</b>\n📋 New lot <b>#{}</b>\n\n",
        order.id
    );

    if let Some(lot) = non_empty(order.lot_name.as_deref()) {
        text.push_str(&format!("🏷️ - {}\n", html_escape(lot)));
    }
    text.push_str(&format!("📝 - {}\n", html_escape(&order.text)));

    if !locations.is_empty() {
        let names = locations
            .iter()
            .map(Location::display_name)
            .collect::<Vec<_>>()
            .join("; ");
        text.push_str(&format!(
            "📍 - {} ({})\n",
            html_escape(order.locations.as_deref().unwrap_or_default()),
            html_escape(&names)
        ));
    }

    if let Some(bid) = positive_bid(order) {
        text.push_str(&format!("💰 - {bid}₪\n"));
    }
    if let Some(handle) = submitter.and_then(TelegramUser::handle) {
        text.push_str(&format!("👤 - @{}\n", html_escape(handle)));
    }
    text.push_str(&format!("🆔 - {}\n", order.id));

    text
}
