//! Finalize-time reconciliation: phone ownership and product cleanup.
//!
//! Group transcripts mix the customer's number with the shop's own, and
//! order text with phone/amount noise. Reconciliation sorts that out using
//! the contextual keywords around each phone and the facts already merged
//! into the session.

use std::collections::{BTreeSet, HashMap};

use crate::extract::keywords::{
    self, CLIENT_KEYWORDS, COMMENT_KEYWORDS, PHONE_LABEL_KEYWORDS, SHOP_KEYWORDS,
};
use crate::extract::phones;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ownership {
    Unknown,
    Client,
    Shop,
}

/// Decide which of the session's phones belong to the customer.
///
/// Two passes over the transcript: whole-message keyword context first,
/// then per-line for precision. Shop marking is sticky; a number can move
/// from unknown to client but never out of shop. With no keyword signal at
/// all, the non-shop set is the answer, preferring a singleton.
pub fn choose_customer_phones(
    transcript: &[String],
    session_phones: &BTreeSet<String>,
    shop_phones: &[String],
) -> Vec<String> {
    if session_phones.is_empty() {
        return Vec::new();
    }

    let mut ownership: HashMap<String, Ownership> = session_phones
        .iter()
        .map(|p| (p.clone(), Ownership::Unknown))
        .collect();

    // Configured shop numbers are shop regardless of context.
    for raw in shop_phones {
        if let Some(normalized) = phones::normalize(raw) {
            if let Some(role) = ownership.get_mut(&normalized) {
                *role = Ownership::Shop;
            }
        }
    }

    let mark = |chunk: &str, ownership: &mut HashMap<String, Ownership>| {
        let chunk_phones = phones::extract(chunk);
        if chunk_phones.is_empty() {
            return;
        }
        let lower = chunk.to_lowercase();
        let is_shop = keywords::contains_any(&lower, SHOP_KEYWORDS);
        let is_client = keywords::contains_any(&lower, CLIENT_KEYWORDS);

        for phone in chunk_phones {
            let role = ownership.entry(phone).or_insert(Ownership::Unknown);
            if is_shop {
                *role = Ownership::Shop;
            } else if is_client && *role != Ownership::Shop {
                *role = Ownership::Client;
            }
        }
    };

    for message in transcript {
        mark(message, &mut ownership);
    }
    for message in transcript {
        for line in message.lines() {
            let line = line.trim();
            if !line.is_empty() {
                mark(line, &mut ownership);
            }
        }
    }

    let mut clients: Vec<String> = ownership
        .iter()
        .filter(|(_, role)| **role == Ownership::Client)
        .map(|(p, _)| p.clone())
        .collect();
    if !clients.is_empty() {
        clients.sort();
        return clients;
    }

    let mut non_shop: Vec<String> = ownership
        .iter()
        .filter(|(_, role)| **role != Ownership::Shop)
        .map(|(p, _)| p.clone())
        .collect();
    non_shop.sort();

    if !non_shop.is_empty() {
        return non_shop;
    }
    session_phones.iter().cloned().collect()
}

/// Split the transcript into product text and comment text.
///
/// Dropped from the product side: phone-labeled lines, lines reducible to a
/// customer phone, lines carrying the reconciled amount's digit run, and
/// lines starting with the customer name. Comment-keyword lines move to the
/// comment side. Everything keeps original order.
pub fn split_product_comment(
    transcript: &[String],
    customer_phones: &[String],
    amount: Option<i64>,
    customer_name: &str,
) -> (String, String) {
    // Last 7 digits identify a phone across formatting variants.
    let customer_tails: Vec<String> = customer_phones
        .iter()
        .map(|p| phones::digits_only(p))
        .filter(|d| d.len() >= 7)
        .map(|d| d[d.len() - 7..].to_string())
        .collect();

    let amount_digits = amount.map(|a| a.to_string());
    let name_lower = customer_name.trim().to_lowercase();

    let mut product_lines: Vec<&str> = Vec::new();
    let mut comment_lines: Vec<&str> = Vec::new();

    for message in transcript {
        let text = message.trim();
        if text.is_empty() {
            continue;
        }
        let lower = text.to_lowercase();
        let digits = phones::digits_only(text);

        if !phones::extract(text).is_empty()
            && keywords::contains_any(&lower, PHONE_LABEL_KEYWORDS)
        {
            continue;
        }

        if keywords::contains_any(&lower, COMMENT_KEYWORDS) {
            comment_lines.push(text);
            continue;
        }

        let is_pure_phone = customer_tails
            .iter()
            .any(|tail| digits.ends_with(tail.as_str()) && digits.len() <= 13);
        if is_pure_phone {
            continue;
        }

        if let Some(amount_digits) = &amount_digits {
            if digits.contains(amount_digits.as_str()) {
                continue;
            }
        }

        if !name_lower.is_empty() && lower.starts_with(&name_lower) {
            continue;
        }

        product_lines.push(text);
    }

    (product_lines.join("\n"), comment_lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone_set(phones: &[&str]) -> BTreeSet<String> {
        phones.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_client_keyword_selects_customer_phone() {
        let transcript = vec![
            "mijoz raqami +998901234567".to_string(),
            "bu наш магазин +998712005000".to_string(),
        ];
        let phones = phone_set(&["+998901234567", "+998712005000"]);
        let result = choose_customer_phones(&transcript, &phones, &[]);
        assert_eq!(result, vec!["+998901234567".to_string()]);
    }

    #[test]
    fn test_shop_marking_is_sticky() {
        // Same number labeled shop first, then near a client keyword.
        let transcript = vec![
            "наш магазин 998712005000".to_string(),
            "mijoz: 998712005000".to_string(),
        ];
        let phones = phone_set(&["+998712005000", "+998901234567"]);
        let result = choose_customer_phones(&transcript, &phones, &[]);
        assert_eq!(result, vec!["+998901234567".to_string()]);
    }

    #[test]
    fn test_no_keywords_returns_non_shop_set() {
        let transcript = vec!["latte 2ta 998901234567".to_string()];
        let phones = phone_set(&["+998901234567"]);
        let result = choose_customer_phones(&transcript, &phones, &[]);
        assert_eq!(result, vec!["+998901234567".to_string()]);
    }

    #[test]
    fn test_configured_shop_phone_excluded() {
        let transcript = vec!["998901234567 va 998712005000".to_string()];
        let phones = phone_set(&["+998901234567", "+998712005000"]);
        let result =
            choose_customer_phones(&transcript, &phones, &["+998712005000".to_string()]);
        assert_eq!(result, vec!["+998901234567".to_string()]);
    }

    #[test]
    fn test_all_shop_falls_back_to_full_set() {
        let transcript = vec!["наш магазин 998712005000".to_string()];
        let phones = phone_set(&["+998712005000"]);
        let result = choose_customer_phones(&transcript, &phones, &[]);
        assert_eq!(result, vec!["+998712005000".to_string()]);
    }

    #[test]
    fn test_empty_phone_set() {
        assert!(choose_customer_phones(&[], &BTreeSet::new(), &[]).is_empty());
    }

    #[test]
    fn test_comment_lines_split_off() {
        let transcript = vec![
            "latte 2ta".to_string(),
            "eshik oldida kutib turaman".to_string(),
        ];
        let (products, comments) = split_product_comment(&transcript, &[], None, "");
        assert_eq!(products, "latte 2ta");
        assert_eq!(comments, "eshik oldida kutib turaman");
    }

    #[test]
    fn test_pure_phone_line_dropped() {
        let transcript = vec![
            "latte 2ta".to_string(),
            "+998 90 123 45 67".to_string(),
        ];
        let (products, _) =
            split_product_comment(&transcript, &["+998901234567".to_string()], None, "");
        assert_eq!(products, "latte 2ta");
    }

    #[test]
    fn test_phone_label_line_dropped() {
        let transcript = vec![
            "telefon: +998901234567 yozib oling".to_string(),
            "latte 2ta".to_string(),
        ];
        let (products, _) = split_product_comment(&transcript, &[], None, "");
        assert_eq!(products, "latte 2ta");
    }

    #[test]
    fn test_amount_line_dropped() {
        let transcript = vec![
            "latte 2ta".to_string(),
            "summa 250 000".to_string(),
        ];
        let (products, _) = split_product_comment(&transcript, &[], Some(250_000), "");
        assert_eq!(products, "latte 2ta");
    }

    #[test]
    fn test_customer_name_line_dropped() {
        let transcript = vec![
            "Aziz Karimov yozdi".to_string(),
            "latte 2ta".to_string(),
        ];
        let (products, _) = split_product_comment(&transcript, &[], None, "Aziz Karimov");
        assert_eq!(products, "latte 2ta");
    }
}
