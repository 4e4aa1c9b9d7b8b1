use std::time::Duration;

use async_trait::async_trait;
use fake_user_agent::get_rua;
use reqwest::header;
use scraper::{Html, Selector};

/// What came back for one SERP URL.
#[derive(Debug)]
pub enum FetchOutcome {
    /// A page with results on it.
    Html(String),
    /// Google answered but found nothing for the query.
    NoResults,
    /// Network failure or exhausted captcha retries.
    Failed(String),
}

/// Fetch seam for the orchestrator. The production implementation owns its
/// retry policy; the tracker never retries on top of it.
#[async_trait]
pub trait SerpFetcher: Send + Sync {
    async fn fetch_serp(&self, url: &str) -> FetchOutcome;
}

pub struct GoogleFetcher {
    client: reqwest::Client,
    captcha_retries: u8,
}

impl GoogleFetcher {
    pub fn new(captcha_retries: u8) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .read_timeout(Duration::from_secs(30))
            .build()
            .unwrap();

        GoogleFetcher {
            client,
            captcha_retries,
        }
    }
}

#[async_trait]
impl SerpFetcher for GoogleFetcher {
    async fn fetch_serp(&self, url: &str) -> FetchOutcome {
        let mut retry_count = 0;
        let mut last_error = "blocked by captcha".to_string();

        while retry_count < self.captcha_retries {
            let request = self
                .client
                .get(url)
                .header(header::USER_AGENT, get_rua())
                .header(
                    header::ACCEPT,
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                )
                .header(header::ACCEPT_LANGUAGE, "it-IT,it;q=0.8,en-US;q=0.5")
                .header(header::UPGRADE_INSECURE_REQUESTS, "1")
                .header(header::CACHE_CONTROL, "max-age=0");

            match request.send().await {
                Ok(response) => match response.text().await {
                    Ok(html_content) => match has_result_headings(&html_content) {
                        true => return FetchOutcome::Html(html_content),
                        false => match html_content.contains("did not match any documents") {
                            true => {
                                log::info!("Found no results on url: {}", url);
                                return FetchOutcome::NoResults;
                            }
                            false => {
                                log::error!("Blocked by captcha on url: {}", url);
                                last_error = "blocked by captcha".to_string();
                                retry_count += 1;
                            }
                        },
                    },
                    Err(e) => {
                        log::error!("Failed to read response body. Error: {:?}", e);
                        last_error = e.to_string();
                        retry_count += 1;
                    }
                },
                Err(e) => {
                    log::error!("No response from reqwest, error: {:?}", e);
                    last_error = e.to_string();
                    retry_count += 1;
                }
            }
        }

        FetchOutcome::Failed(format!(
            "fetch failed after {} attempts: {}",
            self.captcha_retries, last_error
        ))
    }
}

/// A SERP with results always carries h3 headings; a captcha interstitial
/// and the "did not match any documents" page carry none.
fn has_result_headings(html: &str) -> bool {
    let heading_selector = Selector::parse("h3").unwrap();
    let document = Html::parse_document(html);
    document.select(&heading_selector).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::has_result_headings;

    #[test]
    fn headings_mark_a_results_page() {
        let html = "<html><body><h3><a href=\"https://example.com\">Example</a></h3></body></html>";
        assert!(has_result_headings(html));
    }

    #[test]
    fn captcha_interstitial_has_no_headings() {
        let html = "<html><body><form id=\"captcha-form\">unusual traffic</form></body></html>";
        assert!(!has_result_headings(html));
    }
}
