//! Order notice rendering and reverse parsing.
//!
//! The rendered notice doubles as the amendment interface: operators reply
//! to it, and the handler reads the original order back out of the text.
//! Render and parse must therefore stay inverse to each other; the tests
//! below pin that round trip.

use std::sync::LazyLock;

use regex::Regex;

use zakazflow_types::error::NoticeParseError;
use zakazflow_types::order::FinalizedOrder;

const HEADER_PREFIX: &str = "🆕 Yangi zakaz";
const CANCELLED_MARKER: &str = "❌ Buyurtma bekor qilingan";
const PLACEHOLDER: &str = "—";

static ORDER_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(ID:\s*(\d+)\)").expect("order id pattern"));
static CLIENT_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("client id pattern"));

/// Everything needed to render one order notice.
#[derive(Debug, Clone)]
pub struct NoticeView {
    pub order_id: Option<i64>,
    /// True for amendment replacements ("yangilangan" header).
    pub updated: bool,
    pub chat_title: String,
    pub client_name: String,
    pub client_id: i64,
    /// Display phones, `--` suffix included.
    pub phones: Vec<String>,
    pub location_text: Option<String>,
    pub comment: String,
    pub products: String,
}

impl NoticeView {
    pub fn from_order(order: &FinalizedOrder, order_id: Option<i64>, updated: bool) -> Self {
        Self {
            order_id,
            updated,
            chat_title: order.chat.label(),
            client_name: order.customer.label(),
            client_id: order.customer.id,
            phones: order.phones.clone(),
            location_text: order.location.as_ref().map(|l| l.display_text()),
            comment: order.comment.clone(),
            products: order.product_text.clone(),
        }
    }

    pub fn render(&self) -> String {
        let mut header = HEADER_PREFIX.to_string();
        if self.updated {
            header.push_str(" (yangilangan)");
        }
        if let Some(id) = self.order_id {
            header.push_str(&format!(" (ID: {id})"));
        }

        let phones = if self.phones.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            self.phones.join(", ")
        };
        let location = self
            .location_text
            .clone()
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let comment = or_placeholder(&self.comment);
        let products = or_placeholder(&self.products);

        format!(
            "{header}\n\
             👥 Guruhdan: {chat}\n\
             👤 Mijoz: {name} (id: {id})\n\
             \n\
             📞 Telefon(lar): {phones}\n\
             📍 Manzil: {location}\n\
             💬 Izoh/comment:\n{comment}\n\
             \n\
             ☕️ Mahsulot/zakaz matni:\n{products}",
            chat = self.chat_title,
            name = self.client_name,
            id = self.client_id,
        )
    }
}

fn or_placeholder(s: &str) -> &str {
    if s.trim().is_empty() { PLACEHOLDER } else { s }
}

/// Suffix appended to a notice when an amendment supersedes it.
pub fn superseded_suffix(reason: &str) -> String {
    format!("\n\n{CANCELLED_MARKER} ({reason}).")
}

/// What reverse parsing recovers from a rendered notice.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNotice {
    pub order_id: i64,
    pub chat_title: String,
    pub client_name: String,
    pub client_id: Option<i64>,
    /// Phones as displayed, placeholder filtered out.
    pub phones: Vec<String>,
    pub location_text: Option<String>,
    pub comment: String,
    pub products: String,
    /// The notice already carries the cancelled marker.
    pub superseded: bool,
}

/// Reverse-parse a rendered order notice.
///
/// Anything that does not start with the notice header is rejected so
/// ordinary replies fall through to normal ingestion.
pub fn parse(text: &str) -> Result<ParsedNotice, NoticeParseError> {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or("");
    if !first.starts_with(HEADER_PREFIX) {
        return Err(NoticeParseError::NotAnOrderNotice);
    }

    let order_id = ORDER_ID_PATTERN
        .captures(first)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .ok_or(NoticeParseError::MissingOrderId)?;

    let mut chat_title = String::new();
    let mut client_name = String::new();
    let mut client_id = None;
    let mut location_text = None;
    let mut phones = Vec::new();

    enum Section {
        Head,
        Comment,
        Products,
    }
    let mut section = Section::Head;
    let mut comment_lines: Vec<&str> = Vec::new();
    let mut product_lines: Vec<&str> = Vec::new();

    for line in text.lines().skip(1) {
        if let Some(rest) = line.strip_prefix("💬 Izoh/comment:") {
            section = Section::Comment;
            if !rest.trim().is_empty() {
                comment_lines.push(rest.trim());
            }
            continue;
        }
        if line.starts_with("☕️ Mahsulot/zakaz matni:") {
            section = Section::Products;
            continue;
        }

        match section {
            Section::Head => {
                if let Some(rest) = line.strip_prefix("👥 Guruhdan:") {
                    chat_title = rest.trim().to_string();
                } else if let Some(rest) = line.strip_prefix("👤 Mijoz:") {
                    let body = rest.trim();
                    match body.split_once("(id:") {
                        Some((name, id_part)) => {
                            client_name = name.trim().to_string();
                            client_id = CLIENT_ID_PATTERN
                                .find(id_part)
                                .and_then(|m| m.as_str().parse::<i64>().ok());
                        }
                        None => client_name = body.to_string(),
                    }
                } else if let Some(rest) = line.strip_prefix("📍 Manzil:") {
                    let value = rest.trim();
                    if !value.is_empty() && value != PLACEHOLDER {
                        location_text = Some(value.to_string());
                    }
                } else if let Some(rest) = line.strip_prefix("📞 Telefon(lar):") {
                    phones = rest
                        .split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty() && *p != PLACEHOLDER)
                        .map(str::to_string)
                        .collect();
                }
            }
            Section::Comment => comment_lines.push(line),
            Section::Products => product_lines.push(line),
        }
    }

    let superseded = text.contains(CANCELLED_MARKER);

    // The cancelled marker lands after the products section; strip it.
    let mut products = product_lines.join("\n").trim().to_string();
    if superseded {
        if let Some(idx) = products.find(CANCELLED_MARKER) {
            products.truncate(idx);
            products = products.trim().to_string();
        }
    }

    let comment = clean_section(comment_lines);
    let products = if products == PLACEHOLDER {
        String::new()
    } else {
        products
    };

    Ok(ParsedNotice {
        order_id,
        chat_title,
        client_name,
        client_id,
        phones,
        location_text,
        comment,
        products,
        superseded,
    })
}

fn clean_section(lines: Vec<&str>) -> String {
    let joined = lines.join("\n").trim().to_string();
    if joined == PLACEHOLDER { String::new() } else { joined }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use zakazflow_types::location::Location;
    use zakazflow_types::message::{ChatRef, ParticipantRef};

    fn sample_order() -> FinalizedOrder {
        FinalizedOrder {
            chat: ChatRef {
                id: -100,
                title: Some("Dostavka 24/7".to_string()),
            },
            customer: ParticipantRef {
                id: 4242,
                display_name: Some("Aziz Karimov".to_string()),
            },
            phones: vec!["+998901234567--".to_string()],
            amount: Some(250_000),
            location: Some(Location::Native {
                lat: 41.31,
                lon: 69.24,
            }),
            product_text: "latte 2ta\nsummasi 250 000".to_string(),
            comment: "eshik oldida kutib turaman".to_string(),
            transcript: vec!["latte 2ta".to_string()],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_contains_every_section() {
        let view = NoticeView::from_order(&sample_order(), Some(17), false);
        let text = view.render();
        assert!(text.starts_with("🆕 Yangi zakaz (ID: 17)\n"));
        assert!(text.contains("👥 Guruhdan: Dostavka 24/7"));
        assert!(text.contains("👤 Mijoz: Aziz Karimov (id: 4242)"));
        assert!(text.contains("📞 Telefon(lar): +998901234567--"));
        assert!(text.contains("☕️ Mahsulot/zakaz matni:\nlatte 2ta"));
    }

    #[test]
    fn test_render_updated_header() {
        let view = NoticeView::from_order(&sample_order(), Some(18), true);
        assert!(view.render().starts_with("🆕 Yangi zakaz (yangilangan) (ID: 18)"));
    }

    #[test]
    fn test_render_placeholders_for_missing_fields() {
        let mut order = sample_order();
        order.phones.clear();
        order.location = None;
        order.comment = String::new();
        let text = NoticeView::from_order(&order, None, false).render();
        assert!(text.contains("📞 Telefon(lar): —"));
        assert!(text.contains("📍 Manzil: —"));
        assert!(text.contains("💬 Izoh/comment:\n—"));
    }

    #[test]
    fn test_parse_round_trips_render() {
        let order = sample_order();
        let text = NoticeView::from_order(&order, Some(17), false).render();
        let parsed = parse(&text).unwrap();

        assert_eq!(parsed.order_id, 17);
        assert_eq!(parsed.chat_title, "Dostavka 24/7");
        assert_eq!(parsed.client_name, "Aziz Karimov");
        assert_eq!(parsed.client_id, Some(4242));
        assert_eq!(parsed.phones, vec!["+998901234567--".to_string()]);
        assert_eq!(parsed.comment, "eshik oldida kutib turaman");
        assert_eq!(parsed.products, "latte 2ta\nsummasi 250 000");
        assert!(!parsed.superseded);
    }

    #[test]
    fn test_parse_rejects_ordinary_text() {
        assert_eq!(
            parse("salom, zakaz qabul qilasizmi?"),
            Err(NoticeParseError::NotAnOrderNotice)
        );
    }

    #[test]
    fn test_parse_requires_order_id() {
        let text = NoticeView::from_order(&sample_order(), None, false).render();
        assert_eq!(parse(&text), Err(NoticeParseError::MissingOrderId));
    }

    #[test]
    fn test_parse_detects_superseded_marker() {
        let mut text = NoticeView::from_order(&sample_order(), Some(17), false).render();
        text.push_str(&superseded_suffix("lokatsiya o'zgartirildi"));
        let parsed = parse(&text).unwrap();
        assert!(parsed.superseded);
        assert_eq!(parsed.products, "latte 2ta\nsummasi 250 000");
    }

    #[test]
    fn test_parse_placeholder_phones_are_empty() {
        let mut order = sample_order();
        order.phones.clear();
        order.comment = String::new();
        let text = NoticeView::from_order(&order, Some(3), false).render();
        let parsed = parse(&text).unwrap();
        assert!(parsed.phones.is_empty());
        assert!(parsed.comment.is_empty());
    }
}
