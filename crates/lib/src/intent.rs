//! Text-intent classification for inbound messages.
//!
//! Matching is deliberately simple: exact greeting strings first, then raw
//! case-sensitive substring containment against a fixed keyword table, first
//! match wins. Classification is a pure function of the text; anything that
//! matches no rule falls back to knowledge search.

/// The classified purpose of a user's text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    PriceInquiry,
    OrderInquiry,
    ContactInquiry,
    HoursInquiry,
    GasInfoInquiry,
    Fallback,
}

/// Exact-match greetings.
const GREETINGS: [&str; 3] = ["hi", "你好", "Hello"];

/// Ordered keyword rules; the first rule with a contained keyword wins.
const KEYWORD_RULES: [(&[&str], Intent); 5] = [
    (&["價格"], Intent::PriceInquiry),
    (&["訂購", "訂單"], Intent::OrderInquiry),
    (&["客服", "聯絡"], Intent::ContactInquiry),
    (&["時間", "營業"], Intent::HoursInquiry),
    (&["瓦斯"], Intent::GasInfoInquiry),
];

/// Classify a message text. Deterministic and total.
pub fn classify(text: &str) -> Intent {
    if GREETINGS.contains(&text) {
        return Intent::Greeting;
    }
    for (keywords, intent) in KEYWORD_RULES {
        if keywords.iter().any(|k| text.contains(k)) {
            return intent;
        }
    }
    Intent::Fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greetings_match_exactly() {
        assert_eq!(classify("hi"), Intent::Greeting);
        assert_eq!(classify("你好"), Intent::Greeting);
        assert_eq!(classify("Hello"), Intent::Greeting);
        // containment is not enough for greetings
        assert_eq!(classify("hi there"), Intent::Fallback);
        assert_eq!(classify("hello"), Intent::Fallback);
    }

    #[test]
    fn keyword_rules_match_by_containment() {
        assert_eq!(classify("價格"), Intent::PriceInquiry);
        assert_eq!(classify("請問價格表"), Intent::PriceInquiry);
        assert_eq!(classify("我要訂購"), Intent::OrderInquiry);
        assert_eq!(classify("查詢訂單狀態"), Intent::OrderInquiry);
        assert_eq!(classify("找客服"), Intent::ContactInquiry);
        assert_eq!(classify("怎麼聯絡你們"), Intent::ContactInquiry);
        assert_eq!(classify("營業時間？"), Intent::HoursInquiry);
        assert_eq!(classify("瓦斯怎麼換"), Intent::GasInfoInquiry);
    }

    #[test]
    fn first_matching_rule_wins() {
        // contains both an order keyword and a contact keyword
        assert_eq!(classify("訂購要找客服嗎"), Intent::OrderInquiry);
        // price outranks gas
        assert_eq!(classify("瓦斯價格多少"), Intent::PriceInquiry);
    }

    #[test]
    fn unmatched_text_falls_back() {
        assert_eq!(classify("今天天氣如何"), Intent::Fallback);
        assert_eq!(classify(""), Intent::Fallback);
    }
}
