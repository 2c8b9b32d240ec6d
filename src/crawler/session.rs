//! Page sessions the scrape runner drives. A session is opened fresh for each
//! attempt and closed when the attempt ends, whatever its result.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};

#[async_trait]
pub trait PageSession: Send + Sync {
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Trimmed text of the first element matching `selector`, if any.
    async fn text(&self, selector: &str) -> Result<Option<String>>;

    /// Values of `attribute` on every element matching `selector`.
    async fn attribute_values(&self, selector: &str, attribute: &str) -> Result<Vec<String>>;

    async fn close(self: Box<Self>);
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageSession>>;
}

/// Opens sessions backed by a dedicated HTTP client with its own cookie jar,
/// so nothing leaks from one attempt into the next.
pub struct HttpSessionFactory {
    user_agent: String,
    timeout: Duration,
}

impl HttpSessionFactory {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout,
        }
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn open(&self) -> Result<Box<dyn PageSession>> {
        let client = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(self.user_agent.as_str())
            .cookie_store(true)
            .build()?;

        tracing::debug!("launching page session");
        Ok(Box::new(HttpSession { client, html: None }))
    }
}

struct HttpSession {
    client: Client,
    html: Option<String>,
}

impl HttpSession {
    fn page(&self) -> Result<&str> {
        self.html
            .as_deref()
            .ok_or_else(|| AppError::Scrape("no page loaded".to_string()))
    }
}

#[async_trait]
impl PageSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("HTTP {} for {}", response.status(), url).into());
        }

        self.html = Some(response.text().await?);
        Ok(())
    }

    async fn text(&self, selector: &str) -> Result<Option<String>> {
        first_text(self.page()?, selector)
    }

    async fn attribute_values(&self, selector: &str, attribute: &str) -> Result<Vec<String>> {
        all_attributes(self.page()?, selector, attribute)
    }

    async fn close(self: Box<Self>) {
        tracing::debug!("quitting page session");
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| AppError::Scrape(format!("invalid selector {selector:?}: {e}")))
}

fn first_text(html: &str, selector: &str) -> Result<Option<String>> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty()))
}

fn all_attributes(html: &str, selector: &str, attribute: &str) -> Result<Vec<String>> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .filter_map(|el| el.value().attr(attribute))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<html>
  <body>
    <h1 class="ch-title">
      The Show
    </h1>
    <span class="tv-status runing">Airing Fridays</span>
    <table>
      <tr><td><a hreflang="zh-hans" title="The.Show.S01E02.1080p">dl</a></td></tr>
      <tr><td><a hreflang="zh-hans" title="The.Show.S01E01.1080p">dl</a></td></tr>
      <tr><td><a hreflang="en" title="The.Show.S01E01.eng">dl</a></td></tr>
      <tr><td><a hreflang="zh-hans">no title</a></td></tr>
    </table>
  </body>
</html>"#;

    #[test]
    fn first_text_is_trimmed() {
        assert_eq!(
            first_text(PAGE, ".ch-title").unwrap().as_deref(),
            Some("The Show")
        );
        assert_eq!(
            first_text(PAGE, ".tv-status.runing").unwrap().as_deref(),
            Some("Airing Fridays")
        );
    }

    #[test]
    fn missing_element_is_none() {
        assert!(first_text(PAGE, ".nope").unwrap().is_none());
    }

    #[test]
    fn attributes_skip_elements_without_them() {
        let titles = all_attributes(PAGE, r#"td a[hreflang="zh-hans"]"#, "title").unwrap();
        assert_eq!(titles, vec!["The.Show.S01E02.1080p", "The.Show.S01E01.1080p"]);
    }

    #[test]
    fn bad_selector_is_an_error() {
        assert!(first_text(PAGE, "td[[").is_err());
    }

    #[tokio::test]
    async fn reading_before_navigate_fails() {
        let factory = HttpSessionFactory::new("test-agent", Duration::from_secs(1));
        let session = factory.open().await.unwrap();
        assert!(session.text(".ch-title").await.is_err());
        session.close().await;
    }
}
