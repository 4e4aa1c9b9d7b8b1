use std::collections::HashMap;

use serde::Serialize;

/// The classes of result slots tracked on a SERP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SerpCategory {
    Organic,
    Ads,
    FeaturedSnippet,
    LocalPack,
    Shopping,
}

impl SerpCategory {
    pub const ALL: [SerpCategory; 5] = [
        SerpCategory::Organic,
        SerpCategory::Ads,
        SerpCategory::FeaturedSnippet,
        SerpCategory::LocalPack,
        SerpCategory::Shopping,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SerpCategory::Organic => "organic",
            SerpCategory::Ads => "ads",
            SerpCategory::FeaturedSnippet => "featured_snippet",
            SerpCategory::LocalPack => "local_pack",
            SerpCategory::Shopping => "shopping",
        }
    }

    pub fn parse(value: &str) -> Option<SerpCategory> {
        SerpCategory::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

/// One positioned result extracted from a SERP. Immutable once produced.
///
/// `position` is the 1-based rank within the category; featured snippets
/// carry the reserved position 0 (above all ranks).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedResult {
    pub category: SerpCategory,
    pub position: u32,
    pub domain: String,
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Where the tracked domain first appeared within one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetPosition {
    pub position: u32,
    pub url: String,
    pub title: String,
}

/// The full structured view of one fetched SERP.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SerpAnalysis {
    pub results: HashMap<SerpCategory, Vec<ExtractedResult>>,
    pub target_positions: HashMap<SerpCategory, TargetPosition>,
}

impl SerpAnalysis {
    pub fn results_for(&self, category: SerpCategory) -> &[ExtractedResult] {
        self.results.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn organic_position(&self) -> Option<u32> {
        self.target_positions
            .get(&SerpCategory::Organic)
            .map(|p| p.position)
    }
}

#[cfg(test)]
mod tests {
    use super::SerpCategory;

    #[test]
    fn category_strings_round_trip() {
        for category in SerpCategory::ALL {
            assert_eq!(SerpCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(SerpCategory::parse("videos"), None);
    }
}
