//! 支持的语言映射表与跳过判定
//!
//! 内部语言代码到各 Provider 专用代码的静态映射、宏语言（中文变体）
//! 判定，以及"不可翻译填充文本"的匹配规则。

use crate::ProviderType;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// 单个语言条目
///
/// Provider 代码为 `None` 表示该 Provider 不支持此语言，
/// 回退链会跳过它。
#[derive(Debug, Clone, Copy)]
pub struct LanguageEntry {
    /// 中文显示名
    pub name: &'static str,
    pub deepl: Option<&'static str>,
    pub google: Option<&'static str>,
    pub microsoft: Option<&'static str>,
}

impl LanguageEntry {
    pub fn code_for(&self, provider: ProviderType) -> Option<&'static str> {
        match provider {
            ProviderType::DeepL => self.deepl,
            ProviderType::Google => self.google,
            ProviderType::Microsoft => self.microsoft,
        }
    }
}

macro_rules! lang {
    ($name:expr, $deepl:expr, $google:expr, $microsoft:expr) => {
        LanguageEntry {
            name: $name,
            deepl: $deepl,
            google: $google,
            microsoft: $microsoft,
        }
    };
}

/// 支持的语言映射表
pub static SUPPORTED_LANGUAGES: Lazy<HashMap<&'static str, LanguageEntry>> = Lazy::new(|| {
    HashMap::from([
        ("en", lang!("英文", Some("EN"), Some("en"), Some("en"))),
        ("zh-TW", lang!("繁体中文", Some("ZH"), Some("zh-TW"), Some("zh-Hant"))),
        ("zh-CN", lang!("简体中文", Some("ZH"), Some("zh-CN"), Some("zh-Hans"))),
        ("ja", lang!("日文", Some("JA"), Some("ja"), Some("ja"))),
        ("ko", lang!("韩文", Some("KO"), Some("ko"), Some("ko"))),
        ("fr", lang!("法文", Some("FR"), Some("fr"), Some("fr"))),
        ("de", lang!("德文", Some("DE"), Some("de"), Some("de"))),
        ("es", lang!("西班牙文", Some("ES"), Some("es"), Some("es"))),
        ("it", lang!("义大利文", Some("IT"), Some("it"), Some("it"))),
        ("ru", lang!("俄文", Some("RU"), Some("ru"), Some("ru"))),
        ("pt", lang!("葡萄牙文", Some("PT"), Some("pt"), Some("pt"))),
        ("nl", lang!("荷兰文", Some("NL"), Some("nl"), Some("nl"))),
        ("pl", lang!("波兰文", Some("PL"), Some("pl"), Some("pl"))),
        ("ar", lang!("阿拉伯文", None, Some("ar"), Some("ar"))),
        ("hi", lang!("印地文", None, Some("hi"), Some("hi"))),
        ("th", lang!("泰文", None, Some("th"), Some("th"))),
        ("vi", lang!("越南文", None, Some("vi"), Some("vi"))),
        ("tr", lang!("土耳其文", Some("TR"), Some("tr"), Some("tr"))),
    ])
});

/// 默认的不可翻译填充文本模式（中文笑声等拟声词）
pub static DEFAULT_FILLER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[哈呵嘻嘿啊]{2,}$").expect("invalid filler regex"));

/// 将内部语言代码规一化为指定 Provider 的代码
///
/// 不在映射表中的代码原样透传（假定已经是 Provider 兼容代码）。
/// 返回 `None` 表示该语言在表中但该 Provider 明确不支持。
pub fn code_for(provider: ProviderType, internal: &str) -> Option<String> {
    match SUPPORTED_LANGUAGES.get(internal) {
        Some(entry) => entry.code_for(provider).map(|c| c.to_string()),
        None => Some(internal.to_string()),
    }
}

/// Provider 是否支持该目标语言
pub fn provider_supports(provider: ProviderType, internal: &str) -> bool {
    code_for(provider, internal).is_some()
}

/// 是否为中文变体（zh / zh-CN / zh-TW 视为同一宏语言）
pub fn is_chinese_variant(code: &str) -> bool {
    matches!(code, "zh" | "zh-CN" | "zh-TW")
}

/// 文本是否命中不可翻译填充模式
pub fn is_untranslatable_filler(text: &str) -> bool {
    DEFAULT_FILLER_RE.is_match(text.trim())
}
