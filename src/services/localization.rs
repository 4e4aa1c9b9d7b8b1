use base64::{engine::general_purpose::STANDARD, Engine as _};
use url::form_urlencoded;

use crate::domain::localization::LocalizationConfig;

const GOOGLE_SEARCH_URL: &str = "https://www.google.com/search";

/// gl / cr parameter pair for a supported country code.
fn country_params(country_code: &str) -> Option<(&'static str, &'static str)> {
    match country_code {
        "IT" => Some(("it", "countryIT")),
        "US" => Some(("us", "countryUS")),
        "DE" => Some(("de", "countryDE")),
        "FR" => Some(("fr", "countryFR")),
        "ES" => Some(("es", "countryES")),
        "UK" => Some(("uk", "countryUK")),
        _ => None,
    }
}

/// Pre-generated UULE codes for the main Italian cities.
fn italian_city_uule(city_code: &str) -> Option<&'static str> {
    match city_code {
        "roma" => Some("w+CAIQICIGUm9tZSxMYXppbyxJdGFseQ=="),
        "milano" => Some("w+CAIQICIHTWlsYW4sTG9tYmFyZHksaXRhbHk="),
        "napoli" => Some("w+CAIQICIITmFwbGVzLENhbXBhbmlhLEl0YWx5"),
        "torino" => Some("w+CAIQICIHVHVyaW4sUGllZG1vbnQsSXRhbHk="),
        "bologna" => Some("w+CAIQICILQm9sb2duYSxFbWlsaWEtUm9tYWduYSxJdGFseQ=="),
        "firenze" => Some("w+CAIQICIJRmxvcmVuY2UsVHVzY2FueSwgSXRhbHk="),
        "genova" => Some("w+CAIQICIHR2Vub2EsTGlndXJpYSxJdGFseQ=="),
        "palermo" => Some("w+CAIQICIJUGFsZXJtbyxTaWNpbHksaXRhbHk="),
        _ => None,
    }
}

/// Builds a UULE code from a canonical location name
/// (e.g. `Rome,Lazio,Italy`).
pub fn generate_uule(canonical_name: &str) -> String {
    format!("w+CAIQICI{}", STANDARD.encode(canonical_name.as_bytes()))
}

/// Builds the localized Google search URL for one keyword: `q`, `gl`, `hl`,
/// `num=100`, plus `cr` under content restriction and `uule` for a known
/// Italian city. Unsupported country codes fall back to the Italian
/// defaults instead of failing the keyword.
pub fn build_google_url(keyword: &str, config: &LocalizationConfig) -> String {
    let encoded_keyword: String = form_urlencoded::byte_serialize(keyword.as_bytes()).collect();
    let (gl, cr) = country_params(&config.country_code).unwrap_or(("it", "countryIT"));

    let mut params = vec![
        format!("q={}", encoded_keyword),
        format!("gl={}", gl),
        format!("hl={}", config.language_code),
        "num=100".to_string(),
    ];

    if config.content_restriction && country_params(&config.country_code).is_some() {
        params.push(format!("cr={}", cr));
    }

    if let Some(city_code) = &config.city_code {
        if config.country_code == "IT" {
            if let Some(uule) = italian_city_uule(city_code) {
                params.push(format!("uule={}", uule));
            }
        }
    }

    format!("{}?{}", GOOGLE_SEARCH_URL, params.join("&"))
}
