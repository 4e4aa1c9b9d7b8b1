use crate::domain::serp::{SerpAnalysis, SerpCategory};

/// Which SERP categories a check keeps in its output. Decided once when the
/// project row is loaded; the core never inspects mode strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingConfig {
    OrganicOnly,
    FullSerp,
    Custom {
        ads: bool,
        snippets: bool,
        local: bool,
        shopping: bool,
    },
}

impl TrackingConfig {
    /// Maps the persisted `tracking_mode` string plus its flag columns.
    /// Unknown modes degrade to organic-only, the storage default.
    pub fn from_row(mode: &str, ads: bool, snippets: bool, local: bool, shopping: bool) -> Self {
        match mode {
            "FULL_SERP" => TrackingConfig::FullSerp,
            "CUSTOM" => TrackingConfig::Custom {
                ads,
                snippets,
                local,
                shopping,
            },
            _ => TrackingConfig::OrganicOnly,
        }
    }

    pub fn mode_str(&self) -> &'static str {
        match self {
            TrackingConfig::OrganicOnly => "ORGANIC_ONLY",
            TrackingConfig::FullSerp => "FULL_SERP",
            TrackingConfig::Custom { .. } => "CUSTOM",
        }
    }

    /// Flag column values for the project row.
    pub fn flag_columns(&self) -> (bool, bool, bool, bool) {
        match self {
            TrackingConfig::OrganicOnly => (false, false, false, false),
            TrackingConfig::FullSerp => (true, true, true, true),
            TrackingConfig::Custom {
                ads,
                snippets,
                local,
                shopping,
            } => (*ads, *snippets, *local, *shopping),
        }
    }

    pub fn retains(&self, category: SerpCategory) -> bool {
        if category == SerpCategory::Organic {
            return true;
        }
        match self {
            TrackingConfig::OrganicOnly => false,
            TrackingConfig::FullSerp => true,
            TrackingConfig::Custom {
                ads,
                snippets,
                local,
                shopping,
            } => match category {
                SerpCategory::Ads => *ads,
                SerpCategory::FeaturedSnippet => *snippets,
                SerpCategory::LocalPack => *local,
                SerpCategory::Shopping => *shopping,
                SerpCategory::Organic => true,
            },
        }
    }

    /// Projects an analysis down to the retained categories. Pure: positions
    /// of retained results are untouched.
    pub fn apply(&self, analysis: SerpAnalysis) -> SerpAnalysis {
        let SerpAnalysis {
            results,
            target_positions,
        } = analysis;

        SerpAnalysis {
            results: results
                .into_iter()
                .filter(|(category, _)| self.retains(*category))
                .collect(),
            target_positions: target_positions
                .into_iter()
                .filter(|(category, _)| self.retains(*category))
                .collect(),
        }
    }
}
