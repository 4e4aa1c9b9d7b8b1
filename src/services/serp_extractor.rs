use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::domain::{
    domain_name::{domains_match, normalize_domain},
    serp::{ExtractedResult, SerpAnalysis, SerpCategory, TargetPosition},
};

/// How a category's rule groups combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CombinePolicy {
    /// Groups are a fallback chain: the first group that yields at least one
    /// accepted result wins, later groups are never consulted.
    FirstSuccess,
    /// Every group contributes; matches are merged in group order.
    Union,
}

/// What identifies a slot within a category for deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DedupKey {
    Domain,
    /// Distinct paths on the same advertiser domain count as distinct slots.
    Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PositionRule {
    /// One counter across all groups, starting at 1.
    Sequential,
    /// Featured snippets sit above the ranked results.
    FixedZero,
}

/// What a rule group's captures carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureShape {
    /// Group 1 is a domain-ish token.
    Domain,
    /// Group 1 is a full href, group 2 the anchor text.
    UrlAndTitle,
}

struct RuleGroup {
    name: &'static str,
    pattern: Regex,
    shape: CaptureShape,
}

struct CategoryRules {
    category: SerpCategory,
    policy: CombinePolicy,
    dedup: DedupKey,
    position: PositionRule,
    groups: Vec<RuleGroup>,
}

/// Layered pattern extraction over raw SERP markup.
///
/// Google's markup is not under our control and changes over time, so each
/// category carries an ordered list of best-effort pattern groups instead of
/// a DOM walk. Patterns and combination policy are plain data; the walk
/// below is shared by all five categories.
pub struct SerpExtractor {
    categories: Vec<CategoryRules>,
    tag_re: Regex,
    whitespace_re: Regex,
}

impl SerpExtractor {
    pub fn new() -> Self {
        let group = |name: &'static str, pattern: &str, shape: CaptureShape| RuleGroup {
            name,
            pattern: Regex::new(pattern).unwrap(),
            shape,
        };

        let organic = CategoryRules {
            category: SerpCategory::Organic,
            policy: CombinePolicy::FirstSuccess,
            dedup: DedupKey::Domain,
            position: PositionRule::Sequential,
            groups: vec![
                group(
                    "cite",
                    r#"(?is)<cite[^>]*class="[^"]*"[^>]*>(?:https?://)?([^<\s]+)"#,
                    CaptureShape::Domain,
                ),
                group(
                    "result-container",
                    r#"(?is)<div[^>]*class="[^"]*\bg[^"]*"[^>]*>.*?<a[^>]*href="https?://([^/"]+)"#,
                    CaptureShape::Domain,
                ),
                group(
                    "heading-link",
                    r#"(?is)<h3[^>]*><a[^>]*href="https?://([^/"]+)"#,
                    CaptureShape::Domain,
                ),
            ],
        };

        let ads = CategoryRules {
            category: SerpCategory::Ads,
            policy: CombinePolicy::Union,
            dedup: DedupKey::Url,
            position: PositionRule::Sequential,
            groups: vec![
                group(
                    "ad-container",
                    r#"(?is)<div[^>]*class="[^"]*(?:ads|uEierd|mnr-c|v0rgu|pla-unit)[^"]*"[^>]*>.*?href="([^"]*)"[^>]*>.*?([^<]+)</a>"#,
                    CaptureShape::UrlAndTitle,
                ),
                group(
                    "sponsored-label",
                    r#"(?is)<span[^>]*(?:sponsorizzato|sponsored|annuncio)[^>]*>.*?href="([^"]*)"[^>]*>.*?([^<]+)</a>"#,
                    CaptureShape::UrlAndTitle,
                ),
                group(
                    "text-ad",
                    r#"(?is)<div[^>]*data-text-ad[^>]*>.*?href="([^"]*)"[^>]*>.*?([^<]+)</a>"#,
                    CaptureShape::UrlAndTitle,
                ),
            ],
        };

        let featured_snippets = CategoryRules {
            category: SerpCategory::FeaturedSnippet,
            policy: CombinePolicy::Union,
            dedup: DedupKey::Domain,
            position: PositionRule::FixedZero,
            groups: vec![
                group(
                    "knowledge-panel",
                    r#"(?is)<div[^>]*class="[^"]*(?:kno-rdesc|IZ6rdc|xpdopen|g9WsWb)[^"]*"[^>]*>.*?(?:https?://)?([^/\s<>"]+\.[a-z]{2,})"#,
                    CaptureShape::Domain,
                ),
                group(
                    "attributed-snippet",
                    r#"(?is)<div[^>]*data-attrid="[^"]*"[^>]*>.*?<cite[^>]*>(?:https?://)?([^/<\s]+)"#,
                    CaptureShape::Domain,
                ),
                group(
                    "answer-box",
                    r#"(?is)<div[^>]*class="[^"]*(?:Z0LcW|XcVN5d)[^"]*"[^>]*>.*?([^/\s<>"]+\.[a-z]{2,})"#,
                    CaptureShape::Domain,
                ),
            ],
        };

        let local_pack = CategoryRules {
            category: SerpCategory::LocalPack,
            policy: CombinePolicy::Union,
            dedup: DedupKey::Domain,
            position: PositionRule::Sequential,
            groups: vec![
                group(
                    "local-details",
                    r#"(?is)<div[^>]*class="[^"]*(?:rllt__details|VkpGBb|dbg0pd)[^"]*"[^>]*>.*?(?:https?://)?([^/\s<>"]+\.[a-z]{2,})"#,
                    CaptureShape::Domain,
                ),
                group(
                    "local-attribute",
                    r#"(?is)<div[^>]*data-local-attribute[^>]*>.*?<cite[^>]*>(?:https?://)?([^/<\s]+)"#,
                    CaptureShape::Domain,
                ),
            ],
        };

        let shopping = CategoryRules {
            category: SerpCategory::Shopping,
            policy: CombinePolicy::Union,
            dedup: DedupKey::Url,
            position: PositionRule::Sequential,
            groups: vec![
                group(
                    "product-unit",
                    r#"(?is)<div[^>]*class="[^"]*(?:pla-unit|sh-dlr)[^"]*"[^>]*>.*?href="([^"]*)"[^>]*>.*?([^<]+)</a>"#,
                    CaptureShape::UrlAndTitle,
                ),
                group(
                    "shopping-container",
                    r#"(?is)<div[^>]*data-shopping[^>]*>.*?href="([^"]*)"[^>]*>.*?([^<]+)</a>"#,
                    CaptureShape::UrlAndTitle,
                ),
            ],
        };

        SerpExtractor {
            categories: vec![organic, ads, featured_snippets, local_pack, shopping],
            tag_re: Regex::new(r"<[^>]+>").unwrap(),
            whitespace_re: Regex::new(r"\s+").unwrap(),
        }
    }

    /// Runs all five category extractors over the raw markup, then resolves
    /// the tracked domain's first position per category when one was given.
    pub fn analyze(&self, html: &str, target_domain: Option<&str>) -> SerpAnalysis {
        let mut results = HashMap::new();
        for rules in &self.categories {
            let extracted = self.extract_category(rules, html);
            log::debug!(
                "Extracted {} {} results",
                extracted.len(),
                rules.category.as_str()
            );
            results.insert(rules.category, extracted);
        }

        let target_positions = match target_domain.and_then(normalize_domain) {
            Some(target) => resolve_target_positions(&results, &target),
            None => HashMap::new(),
        };

        SerpAnalysis {
            results,
            target_positions,
        }
    }

    fn extract_category(&self, rules: &CategoryRules, html: &str) -> Vec<ExtractedResult> {
        let mut out: Vec<ExtractedResult> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut next_position: u32 = 1;

        for group in &rules.groups {
            for caps in group.pattern.captures_iter(html) {
                let (domain, url, title) = match group.shape {
                    CaptureShape::Domain => {
                        let raw = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                        let Some(domain) = normalize_domain(raw) else {
                            continue;
                        };
                        if rules.category == SerpCategory::Organic
                            && !is_allowed_organic_domain(&domain)
                        {
                            continue;
                        }
                        if !seen.insert(domain.clone()) {
                            continue;
                        }
                        let (url, title) = self.find_result_context(html, &domain);
                        let url = match url.is_empty() {
                            true => format!("https://{}", domain),
                            false => url,
                        };
                        (domain, url, title)
                    }
                    CaptureShape::UrlAndTitle => {
                        let url = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                        let title = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                        let Some(domain) = normalize_domain(url) else {
                            continue;
                        };
                        let key = match rules.dedup {
                            DedupKey::Url => url.to_string(),
                            DedupKey::Domain => domain.clone(),
                        };
                        if !seen.insert(key) {
                            continue;
                        }
                        (domain, url.to_string(), self.clean_text(title))
                    }
                };

                let position = match rules.position {
                    PositionRule::FixedZero => 0,
                    PositionRule::Sequential => {
                        let position = next_position;
                        next_position += 1;
                        position
                    }
                };

                out.push(ExtractedResult {
                    category: rules.category,
                    position,
                    domain,
                    url,
                    title,
                    snippet: String::new(),
                });
            }

            if rules.policy == CombinePolicy::FirstSuccess && !out.is_empty() {
                log::debug!(
                    "{} extraction settled on rule group '{}'",
                    rules.category.as_str(),
                    group.name
                );
                break;
            }
        }

        out
    }

    /// Best-effort recovery of a full URL and heading title for a domain
    /// found without surrounding markup context.
    fn find_result_context(&self, html: &str, domain: &str) -> (String, String) {
        let escaped = regex::escape(domain);

        let url = Regex::new(&format!(r#"(?i)href="(https?://[^"]*{}[^"]*)""#, escaped))
            .ok()
            .and_then(|re| re.captures(html).map(|caps| caps[1].to_string()))
            .unwrap_or_default();

        let title = Regex::new(&format!(
            r#"(?is)<h3[^>]*>.*?<a[^>]*href="[^"]*{}[^"]*"[^>]*>([^<]+)</a>"#,
            escaped
        ))
        .ok()
        .and_then(|re| re.captures(html).map(|caps| self.clean_text(&caps[1])))
        .unwrap_or_default();

        (url, title)
    }

    fn clean_text(&self, text: &str) -> String {
        let stripped = self.tag_re.replace_all(text, "");
        self.whitespace_re
            .replace_all(&stripped, " ")
            .trim()
            .to_string()
    }
}

impl Default for SerpExtractor {
    fn default() -> Self {
        SerpExtractor::new()
    }
}

/// First match per category wins, even when the target appears again later.
pub fn resolve_target_positions(
    results: &HashMap<SerpCategory, Vec<ExtractedResult>>,
    target: &str,
) -> HashMap<SerpCategory, TargetPosition> {
    let mut positions = HashMap::new();

    for (category, list) in results {
        if let Some(hit) = list.iter().find(|r| domains_match(target, &r.domain)) {
            positions.insert(
                *category,
                TargetPosition {
                    position: hit.position,
                    url: hit.url.clone(),
                    title: hit.title.clone(),
                },
            );
        }
    }

    positions
}

fn is_allowed_organic_domain(domain: &str) -> bool {
    const GOOGLE_FAMILY: [&str; 4] = ["google.", "youtube.", "maps.google", "translate.google"];
    !GOOGLE_FAMILY.iter().any(|family| domain.contains(family))
}

#[cfg(test)]
mod tests {
    use super::SerpExtractor;
    use crate::domain::serp::SerpCategory;

    const ORGANIC_SERP: &str = r#"
        <html><body>
        <div class="g first"><h3 class="r"><a href="https://www.isacco.it/divise-da-lavoro">Divise da lavoro professionali</a></h3></div>
        <cite class="iUh30">https://www.isacco.it</cite>
        <cite class="iUh30">www.youtube.com</cite>
        <cite class="iUh30">worklinediviseisacco.it/catalogo</cite>
        <cite class="iUh30">https://www.isacco.it/scarpe</cite>
        <cite class="iUh30">rossodivise.eu</cite>
        <div class="g other"><a href="https://hidden-fallback.com/x">fallback</a></div>
        </body></html>
    "#;

    #[test]
    fn organic_positions_follow_document_order_with_dedup() {
        let extractor = SerpExtractor::new();
        let analysis = extractor.analyze(ORGANIC_SERP, None);
        let organic = analysis.results_for(SerpCategory::Organic);

        let domains: Vec<&str> = organic.iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(
            domains,
            vec!["isacco.it", "worklinediviseisacco.it", "rossodivise.eu"]
        );
        let positions: Vec<u32> = organic.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn organic_excludes_search_engine_family_domains() {
        let extractor = SerpExtractor::new();
        let analysis = extractor.analyze(ORGANIC_SERP, None);

        assert!(analysis
            .results_for(SerpCategory::Organic)
            .iter()
            .all(|r| r.domain != "youtube.com"));
    }

    #[test]
    fn organic_winning_group_recovers_url_and_title_context() {
        let extractor = SerpExtractor::new();
        let analysis = extractor.analyze(ORGANIC_SERP, None);
        let first = &analysis.results_for(SerpCategory::Organic)[0];

        assert_eq!(first.url, "https://www.isacco.it/divise-da-lavoro");
        assert_eq!(first.title, "Divise da lavoro professionali");
    }

    #[test]
    fn organic_context_miss_synthesizes_url() {
        let extractor = SerpExtractor::new();
        let analysis = extractor.analyze(ORGANIC_SERP, None);
        let third = &analysis.results_for(SerpCategory::Organic)[2];

        assert_eq!(third.url, "https://rossodivise.eu");
        assert_eq!(third.title, "");
    }

    #[test]
    fn organic_first_group_wins_over_later_groups() {
        let extractor = SerpExtractor::new();
        let analysis = extractor.analyze(ORGANIC_SERP, None);

        // The cite group produced candidates, so the container group's
        // domain must not be merged in.
        assert!(analysis
            .results_for(SerpCategory::Organic)
            .iter()
            .all(|r| r.domain != "hidden-fallback.com"));
    }

    #[test]
    fn organic_falls_back_to_second_group_only() {
        let html = r#"
            <div class="g one"><a href="https://container-hit.com/page">A</a></div>
            <h3><a href="https://heading-only.com/page">B</a></h3>
        "#;
        let extractor = SerpExtractor::new();
        let analysis = extractor.analyze(html, None);
        let organic = analysis.results_for(SerpCategory::Organic);

        let domains: Vec<&str> = organic.iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(domains, vec!["container-hit.com"]);
    }

    #[test]
    fn extraction_is_deterministic() {
        let extractor = SerpExtractor::new();
        let first = extractor.analyze(ORGANIC_SERP, Some("isacco.it"));
        let second = extractor.analyze(ORGANIC_SERP, Some("isacco.it"));

        assert_eq!(first, second);
    }

    const ADS_SERP: &str = r#"
        <div class="uEierd"><a href="https://advertiser.com/offer-a">Offerta A</a></div>
        <div class="uEierd"><a href="https://advertiser.com/offer-b">Offerta B</a></div>
        <div data-text-ad="1"><a href="https://advertiser.com/offer-a">Offerta A ripetuta</a></div>
        <div data-text-ad="1"><a href="https://other-ads.com/landing">Altra offerta</a></div>
    "#;

    #[test]
    fn ads_union_dedups_by_url_across_groups() {
        let extractor = SerpExtractor::new();
        let analysis = extractor.analyze(ADS_SERP, None);
        let ads = analysis.results_for(SerpCategory::Ads);

        let urls: Vec<&str> = ads.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://advertiser.com/offer-a",
                "https://advertiser.com/offer-b",
                "https://other-ads.com/landing",
            ]
        );
        let positions: Vec<u32> = ads.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn ads_same_domain_distinct_paths_are_distinct_slots() {
        let extractor = SerpExtractor::new();
        let analysis = extractor.analyze(ADS_SERP, None);

        let advertiser_slots = analysis
            .results_for(SerpCategory::Ads)
            .iter()
            .filter(|r| r.domain == "advertiser.com")
            .count();
        assert_eq!(advertiser_slots, 2);
    }

    #[test]
    fn featured_snippets_sit_at_position_zero_deduped_by_domain() {
        let html = r#"
            <div class="xpdopen"><span>risposta</span> https://wiki-answers.com/voce</div>
            <div data-attrid="kc:/thing"><cite>wiki-answers.com</cite></div>
            <div data-attrid="kc:/other"><cite>second-source.org</cite></div>
        "#;
        let extractor = SerpExtractor::new();
        let analysis = extractor.analyze(html, None);
        let snippets = analysis.results_for(SerpCategory::FeaturedSnippet);

        let domains: Vec<&str> = snippets.iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(domains, vec!["wiki-answers.com", "second-source.org"]);
        assert!(snippets.iter().all(|r| r.position == 0));
    }

    #[test]
    fn local_pack_counts_new_domains_across_groups() {
        let html = r#"
            <div class="rllt__details">Isacco Store 10:00 isacco.it</div>
            <div class="VkpGBb">Divise Rosse rossodivise.eu</div>
            <div data-local-attribute="d:1"><cite>isacco.it</cite></div>
        "#;
        let extractor = SerpExtractor::new();
        let analysis = extractor.analyze(html, None);
        let local = analysis.results_for(SerpCategory::LocalPack);

        let entries: Vec<(u32, &str)> = local
            .iter()
            .map(|r| (r.position, r.domain.as_str()))
            .collect();
        assert_eq!(
            entries,
            vec![(1, "isacco.it"), (2, "rossodivise.eu")]
        );
    }

    #[test]
    fn shopping_union_dedups_by_url() {
        let html = r#"
            <div class="pla-unit"><a href="https://shop.example.com/p/1">Scarpa antinfortunistica</a></div>
            <div data-shopping="1"><a href="https://shop.example.com/p/1">Scarpa antinfortunistica</a></div>
            <div data-shopping="1"><a href="https://shop.example.com/p/2">Giacca da cuoco</a></div>
        "#;
        let extractor = SerpExtractor::new();
        let analysis = extractor.analyze(html, None);
        let shopping = analysis.results_for(SerpCategory::Shopping);

        assert_eq!(shopping.len(), 2);
        assert_eq!(shopping[0].title, "Scarpa antinfortunistica");
        assert_eq!(shopping[1].position, 2);
    }

    #[test]
    fn target_resolution_takes_first_match_only() {
        let extractor = SerpExtractor::new();
        let analysis = extractor.analyze(ORGANIC_SERP, Some("https://www.isacco.it/"));

        let organic = analysis
            .target_positions
            .get(&SerpCategory::Organic)
            .expect("target should be found in organic results");
        assert_eq!(organic.position, 1);
        assert_eq!(organic.url, "https://www.isacco.it/divise-da-lavoro");
    }

    #[test]
    fn target_subdomain_matches_tracked_root() {
        let html = r#"<cite class="iUh30">shop.isacco.it</cite>"#;
        let extractor = SerpExtractor::new();
        let analysis = extractor.analyze(html, Some("isacco.it"));

        assert_eq!(analysis.organic_position(), Some(1));
    }

    #[test]
    fn target_substring_domain_does_not_resolve() {
        let html = r#"<cite class="iUh30">worklinediviseisacco.it</cite>"#;
        let extractor = SerpExtractor::new();
        let analysis = extractor.analyze(html, Some("isacco.it"));

        assert_eq!(analysis.organic_position(), None);
    }
}
