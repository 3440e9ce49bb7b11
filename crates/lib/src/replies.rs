//! Canned reply templates.
//!
//! Static content owned by this module; the dispatcher picks a template for a
//! classified intent, or falls back to knowledge search when none applies.

use crate::intent::Intent;

/// Reply to an exact greeting.
pub const GREETING: &str = "你好！我是九九瓦斯行的客服機器人。請問有什麼可以為您服務的嗎？";

/// Welcome message sent on a follow event.
pub const WELCOME: &str = "歡迎加入九九瓦斯行！我們是您可信賴的瓦斯供應商，隨時為您提供優質服務。";

/// Reply to an image message.
pub const IMAGE_ONLY_TEXT: &str = "收到了圖片，但目前僅支援文字訊息。";

/// Reply to any other non-text message kind.
pub const UNSUPPORTED_TYPE: &str = "很抱歉，我只支援文字訊息。";

pub const PRICE_LIST: &str = "🔥 瓦斯價格表 🔥

📍 美崙站 (花蓮市中美路二街79號)
📞 (03) 831-5888
├ 50公斤：NT$1,850
├ 20公斤：NT$740
├ 16公斤：NT$630
├ 10公斤：NT$450
└ 4公斤：NT$250

📍 吉安站 (花蓮縣吉安鄉南昌路25號)
📞 (03) 833-1999
├ 20公斤：NT$720
├ 16公斤：NT$610
├ 10公斤：NT$430
└ 4公斤：NT$210

💡 注意事項：
• 價格僅供參考，實際價格以現場為準
• 配送費另計
• 歡迎來電諮詢最新優惠";

pub const ORDER_INFO: &str = "📋 訂購方式：

📞 電話訂購：02-XXXX-XXXX
💻 線上訂購：訪問我們的網站
📠 傳真：02-XXXX-XXXX
📧 Email：order@99gas.com

⏰ 配送時間：
• 平日：08:00-18:00
• 假日：09:00-17:00

🚚 配送範圍：
• 台北市、新北市主要地區
• 其他地區請諮詢客服";

pub const CONTACT_INFO: &str = "📞 客服資訊：

🔥 花蓮九九瓦斯行/帝皇瓦斯行/高銘瓦斯行

📍 美崙站
   花蓮市中美路二街79號
   📞 (03) 831-5888
   ⏰ 08:00-21:00

📍 吉安站
   花蓮縣吉安鄉南昌路25號
   📞 (03) 833-1999
   ⏰ 08:00-20:00

📍 帝皇瓦斯行
   花蓮縣吉安鄉南昌路25號
   📞 (03) 822-2688
   ⏰ 08:30-19:30

💡 如需立即服務，歡迎撥打以上電話！";

pub const BUSINESS_HOURS: &str = "⏰ 營業時間：

🏢 美崙站 (高銘瓦斯行)
   花蓮市中美路二街79號
   📞 (03) 831-5888
   ⏰ 週一至週日 08:00-21:00

🏢 吉安站 (九九瓦斯行)
   花蓮縣吉安鄉南昌路25號2F
   📞 (03) 833-1999
   ⏰ 週一至週日 08:00-20:00

🏢 帝皇瓦斯行
   花蓮縣吉安鄉南昌路25號
   📞 (03) 822-2688
   ⏰ 週一至週日 08:30-19:30

🚚 配送服務：
   各站點營業時間內均可安排配送";

pub const GAS_INFO: &str = "🔥 瓦斯資訊：

📦 產品規格：
• 4kg 瓦斯桶：適合小家庭
• 10kg 瓦斯桶：一般家庭
• 16kg 瓦斯桶：大家庭
• 20kg 瓦斯桶：商業用
• 50kg 瓦斯桶：餐廳用

🔒 安全保證：
• 定期檢測確保安全
• 專業配送團隊
• 24小時緊急服務

⚠️ 使用注意事項：
• 定期檢查管線
• 保持通風良好
• 發現異味立即停用";

/// Template for a classified intent; `Fallback` has none and is answered by
/// knowledge search instead.
pub fn for_intent(intent: Intent) -> Option<&'static str> {
    match intent {
        Intent::Greeting => Some(GREETING),
        Intent::PriceInquiry => Some(PRICE_LIST),
        Intent::OrderInquiry => Some(ORDER_INFO),
        Intent::ContactInquiry => Some(CONTACT_INFO),
        Intent::HoursInquiry => Some(BUSINESS_HOURS),
        Intent::GasInfoInquiry => Some(GAS_INFO),
        Intent::Fallback => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_list_has_expected_header() {
        assert!(PRICE_LIST.starts_with("🔥 瓦斯價格表 🔥"));
    }

    #[test]
    fn greeting_is_exact() {
        assert_eq!(
            for_intent(Intent::Greeting),
            Some("你好！我是九九瓦斯行的客服機器人。請問有什麼可以為您服務的嗎？")
        );
    }

    #[test]
    fn every_non_fallback_intent_has_a_template() {
        for intent in [
            Intent::Greeting,
            Intent::PriceInquiry,
            Intent::OrderInquiry,
            Intent::ContactInquiry,
            Intent::HoursInquiry,
            Intent::GasInfoInquiry,
        ] {
            assert!(for_intent(intent).is_some());
        }
        assert!(for_intent(Intent::Fallback).is_none());
    }
}
