//! Keyword vocabularies for the rule-based paths.
//!
//! Mixed Uzbek (Latin and Cyrillic) and Russian, matching how customers in
//! the target groups actually write.

/// Lines carrying courier/entrance/apartment instructions become comments.
pub const COMMENT_KEYWORDS: &[&str] = &[
    "kuryer",
    "kurier",
    "kur'er",
    "курьер",
    "eshik oldida",
    "uyga olib chiqib",
    "uyga olib chiqing",
    "orqa eshik",
    "oldi eshik",
    "oldida kutaman",
    "kutib turaman",
    "moshinada kuting",
    "машинада кутиб",
    "к клиенту",
    "klientga",
    "подъезд",
    "подьезд",
    "podezd",
    "podyezd",
    "этаж",
    "etaj",
    "qavat",
    "kvartira",
    "kv.",
    "kv ",
    "квартир",
    "кв ",
    "dom",
    "дом",
    "uy",
    "mahalla",
    "mahallasi",
    "mavze",
    "район",
    "tuman",
];

/// Address fragments: streets, blocks, apartments, districts.
pub const ADDRESS_KEYWORDS: &[&str] = &[
    "dom",
    "kv",
    "kv.",
    "kvartira",
    "подъезд",
    "подьезд",
    "uy",
    "eshik",
    "kvartir",
    "подъез",
    "подьез",
    "дом",
    "улица",
    "улиц",
    "mavze",
    "orqa eshik",
    "oldi",
    "oldida",
    "mahalla",
    "mahallasi",
    "rayon",
    "tuman",
    "район",
    "квартал",
];

/// Product names seen in order texts.
pub const PRODUCT_KEYWORDS: &[&str] = &[
    "latte",
    "капучино",
    "cappuccino",
    "americano",
    "kofe",
    "coffee",
    "espresso",
    "эспрессо",
    "pizza",
    "burger",
    "lavash",
    "doner",
    "donar",
    "set",
    "combo",
    "kombo",
];

/// Payment and amount vocabulary.
pub const AMOUNT_KEYWORDS: &[&str] = &[
    "summa",
    "sum",
    "summasi",
    "ming",
    "min",
    "мин",
    "минг",
    "сум",
    "сом",
    "тыс",
    "oplacheno",
    "oplata",
    "оплачено",
    "kredit",
    "bez kredit",
    "кредит",
    "to'lov",
    "tolov",
    "nal",
];

/// Greetings and small talk.
pub const GREETING_KEYWORDS: &[&str] = &[
    "salom",
    "assalomu",
    "qalesiz",
    "как дела",
    "привет",
    "hello",
    "hi",
];

/// A phone mentioned near these words belongs to the customer.
pub const CLIENT_KEYWORDS: &[&str] = &[
    "номер клиента",
    "клиента",
    "клиент:",
    "клиент ",
    "mijoz",
    "mijoz:",
    "mijoz tel",
    "telefon klienta",
    "покупатель",
    "номер покупателя",
    "client",
    "klient",
];

/// A phone mentioned near these words belongs to the shop.
pub const SHOP_KEYWORDS: &[&str] = &[
    "номер нашего магазина",
    "нашего магазина",
    "наш магазин",
    "магазин",
    "magazin",
    "our shop",
    "номер магазина",
    "наша точка",
    "наш номер",
    "наш тел",
    "наш телефон",
];

/// Phone-label prefixes: a line that is just a labeled phone number is not
/// product text.
pub const PHONE_LABEL_KEYWORDS: &[&str] = &[
    "номер телефона",
    "номер клиента",
    "телефон:",
    "telefon:",
    "телефон ",
    "telefon ",
];

/// True when any keyword occurs in the (lowercased) text.
pub fn contains_any(lower_text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| lower_text.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_any() {
        assert!(contains_any("mijoz raqami 90", CLIENT_KEYWORDS));
        assert!(!contains_any("latte 2ta", CLIENT_KEYWORDS));
    }

    #[test]
    fn test_comment_keywords_hit_courier_lines() {
        let line = "eshik oldida kutib turaman".to_lowercase();
        assert!(contains_any(&line, COMMENT_KEYWORDS));
    }

    #[test]
    fn test_shop_keywords_cyrillic() {
        assert!(contains_any("это номер нашего магазина", SHOP_KEYWORDS));
    }
}
