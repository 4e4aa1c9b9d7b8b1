use serde::{Deserialize, Serialize};

/// Per-project Google localization settings. Consumed only when building the
/// search URL; the tracker never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizationConfig {
    pub country_code: String,
    pub language_code: String,
    pub city_code: Option<String>,
    pub content_restriction: bool,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        LocalizationConfig {
            country_code: "IT".to_string(),
            language_code: "it".to_string(),
            city_code: None,
            content_restriction: true,
        }
    }
}
