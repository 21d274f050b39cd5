//! HTTP access to the content source.

use readability::extractor;
use std::future::Future;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use super::types::{
    Article, ExtractResponse, FetchError, API_URL, MAX_RETRIES, REQUEST_TIMEOUT, RETRY_DELAY,
    USER_AGENT,
};
use super::util::{collapse_newlines, is_valid_url, normalize_topic, page_url};
use crate::TARGET_WIKI_REQUEST;

pub fn create_http_client() -> Result<reqwest::Client, FetchError> {
    debug!(target: TARGET_WIKI_REQUEST, "Creating HTTP client");
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .gzip(true)
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// Fetches the article for `topic`.
///
/// A topic that parses as an http(s) URL is extracted with readability;
/// anything else is normalized into a page title and looked up through the
/// extracts API. Transient failures are retried with exponential backoff.
pub async fn fetch_article(topic: &str) -> Result<Article, FetchError> {
    let topic = topic.trim();

    if is_valid_url(topic) {
        return with_retries(topic, || extract_page(topic)).await;
    }

    let title = normalize_topic(topic);
    if title.is_empty() {
        return Err(FetchError::EmptyTopic);
    }

    let client = create_http_client()?;
    with_retries(&title, || request_extract(&client, &title)).await
}

async fn with_retries<F, Fut>(label: &str, mut attempt: F) -> Result<Article, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Article, FetchError>>,
{
    let mut backoff = RETRY_DELAY;
    let mut tries = 0;

    loop {
        tries += 1;
        debug!(target: TARGET_WIKI_REQUEST, "Fetching '{}' ({}/{})", label, tries, MAX_RETRIES);

        match attempt().await {
            Ok(article) => {
                info!(target: TARGET_WIKI_REQUEST,
                    "Fetched '{}': {} characters, {} words",
                    article.title,
                    article.char_count(),
                    article.word_count()
                );
                return Ok(article);
            }
            Err(e) if e.is_transient() && tries < MAX_RETRIES => {
                warn!(target: TARGET_WIKI_REQUEST,
                    "Error fetching '{}': {}. Retrying in {:?} ({}/{})",
                    label,
                    e,
                    backoff,
                    tries,
                    MAX_RETRIES
                );
                sleep(backoff).await;
                backoff *= 2;
            }
            Err(e) => {
                error!(target: TARGET_WIKI_REQUEST, "Failed to fetch '{}': {}", label, e);
                return Err(e);
            }
        }
    }
}

async fn request_extract(client: &reqwest::Client, title: &str) -> Result<Article, FetchError> {
    let request = client
        .get(API_URL)
        .query(&[
            ("action", "query"),
            ("format", "json"),
            ("formatversion", "2"),
            ("prop", "extracts"),
            ("explaintext", "1"),
            ("redirects", "1"),
            ("titles", title),
        ])
        .send();

    let response = timeout(REQUEST_TIMEOUT, request)
        .await
        .map_err(|_| FetchError::Timeout(REQUEST_TIMEOUT))??;
    let body: ExtractResponse = response.error_for_status()?.json().await?;

    article_from_response(body, title)
}

fn article_from_response(body: ExtractResponse, requested: &str) -> Result<Article, FetchError> {
    let page = body
        .query
        .and_then(|q| q.pages.into_iter().next())
        .ok_or_else(|| FetchError::NotFound {
            title: requested.to_string(),
        })?;

    if page.missing || page.invalid {
        return Err(FetchError::NotFound { title: page.title });
    }

    let text = collapse_newlines(page.extract.as_deref().unwrap_or_default())
        .trim()
        .to_string();
    if text.is_empty() {
        return Err(FetchError::EmptyPage { title: page.title });
    }

    Ok(Article {
        source: page_url(&page.title),
        title: page.title,
        text,
    })
}

/// Extracts the main text of an arbitrary page. readability blocks, so it
/// runs on a blocking worker.
async fn extract_page(url: &str) -> Result<Article, FetchError> {
    let owned = url.to_string();
    let scrape = tokio::task::spawn_blocking(move || {
        extractor::scrape(&owned).map_err(|e| e.to_string())
    });

    match timeout(REQUEST_TIMEOUT, scrape).await {
        Ok(Ok(Ok(product))) => {
            let text = collapse_newlines(&product.text).trim().to_string();
            if text.is_empty() {
                warn!(target: TARGET_WIKI_REQUEST, "Extracted empty article from URL: {}", url);
                return Err(FetchError::EmptyPage {
                    title: product.title,
                });
            }
            Ok(Article {
                title: product.title,
                text,
                source: url.to_string(),
            })
        }
        Ok(Ok(Err(reason))) => Err(FetchError::Extraction {
            url: url.to_string(),
            reason,
        }),
        Ok(Err(join_error)) => Err(FetchError::Extraction {
            url: url.to_string(),
            reason: join_error.to_string(),
        }),
        Err(_) => Err(FetchError::Timeout(REQUEST_TIMEOUT)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ExtractResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_found_page_becomes_article() {
        let body = parse(
            r#"{"batchcomplete":true,"query":{"pages":[{"pageid":19653,"ns":0,
                "title":"Nile","extract":"The Nile is a river.\n\n\nHistory\nIt floods."}]}}"#,
        );

        let article = article_from_response(body, "Nile").unwrap();
        assert_eq!(article.title, "Nile");
        assert_eq!(article.text, "The Nile is a river.\nHistory\nIt floods.");
        assert_eq!(article.source, "https://en.wikipedia.org/wiki/Nile");
        assert_eq!(article.word_count(), 8);
    }

    #[test]
    fn test_missing_page_is_not_found() {
        let body = parse(
            r#"{"batchcomplete":true,"query":{"pages":[{"ns":0,"title":"Qwzx Plorf","missing":true}]}}"#,
        );

        match article_from_response(body, "Qwzx Plorf") {
            Err(FetchError::NotFound { title }) => assert_eq!(title, "Qwzx Plorf"),
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_extract_is_reported() {
        let body = parse(r#"{"query":{"pages":[{"ns":0,"title":"Stub","extract":"  \n "}]}}"#);
        assert!(matches!(
            article_from_response(body, "Stub"),
            Err(FetchError::EmptyPage { .. })
        ));
    }

    #[test]
    fn test_response_without_pages_is_not_found() {
        let body = parse(r#"{"batchcomplete":true}"#);
        assert!(matches!(
            article_from_response(body, "Anything"),
            Err(FetchError::NotFound { .. })
        ));
    }

    #[test]
    fn test_only_network_failures_are_transient() {
        assert!(FetchError::Timeout(REQUEST_TIMEOUT).is_transient());
        assert!(!FetchError::NotFound {
            title: "X".to_string()
        }
        .is_transient());
        assert!(!FetchError::EmptyTopic.is_transient());
    }

    #[tokio::test]
    async fn test_punctuation_only_topic_is_rejected_before_any_request() {
        assert!(matches!(
            fetch_article(" ?!, ").await,
            Err(FetchError::EmptyTopic)
        ));
    }
}
