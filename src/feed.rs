//! RSS index retrieval and item parsing.
//!
//! The feed is fetched as text, repaired with [`sanitize`], and streamed through
//! `quick-xml`. Only `<item>` elements matter; of those only `<link>` and
//! `<title>` are read. Any XML error is fatal for the run since there is no
//! way to tell which items a broken document still describes.

use itertools::Itertools;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::fetch::HttpClient;
use crate::models::FeedItem;
use crate::sanitize::sanitize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Link,
    Title,
}

/// Fetch, sanitize and parse the feed at `url`.
///
/// Items repeating an earlier link are dropped, keeping document order.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_items(client: &HttpClient, url: &str) -> Result<Vec<FeedItem>> {
    let raw = client.get_text(url).await?;
    let items = parse_items(&sanitize(&raw))?;
    let total = items.len();
    let items: Vec<FeedItem> = items.into_iter().unique_by(|i| i.link.clone()).collect();
    if items.len() != total {
        debug!(duplicates = total - items.len(), "Dropped repeated feed links");
    }
    info!(count = items.len(), "Found possible articles");
    Ok(items)
}

/// Parse every `<item>` of an RSS document.
///
/// Items without a `<link>` are skipped. A missing `<title>` becomes empty.
pub fn parse_items(xml: &str) -> Result<Vec<FeedItem>> {
    let mut reader = Reader::from_str(xml);

    let mut items = Vec::new();
    let mut in_item = false;
    let mut field: Option<Field> = None;
    let mut link = String::new();
    let mut title = String::new();

    loop {
        let target = match field {
            Some(Field::Link) => Some(&mut link),
            Some(Field::Title) => Some(&mut title),
            None => None,
        };

        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" => {
                    in_item = true;
                    field = None;
                    link.clear();
                    title.clear();
                }
                b"link" if in_item => field = Some(Field::Link),
                b"title" if in_item => field = Some(Field::Title),
                _ => field = None,
            },
            Ok(Event::End(e)) => {
                field = None;
                if e.name().as_ref() == b"item" && in_item {
                    in_item = false;
                    let item_link = link.trim();
                    if item_link.is_empty() {
                        warn!(title = %title.trim(), "Feed item has no link; ignoring");
                        continue;
                    }
                    items.push(FeedItem::new(item_link, title.trim()));
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(buf) = target {
                    let raw = String::from_utf8_lossy(&e);
                    let text = unescape(&raw).map_err(|err| Error::Feed(err.to_string()))?;
                    buf.push_str(&text);
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if let Some(buf) = target {
                    let entity = format!("&{};", String::from_utf8_lossy(&r));
                    match unescape(&entity) {
                        Ok(text) => buf.push_str(&text),
                        Err(_) => buf.push_str(&entity),
                    }
                }
            }
            Ok(Event::CData(e)) => {
                // sanitize() escapes bare `&` inside CDATA sections as well.
                if let Some(buf) = target {
                    let raw = String::from_utf8_lossy(&e);
                    match unescape(&raw) {
                        Ok(text) => buf.push_str(&text),
                        Err(_) => buf.push_str(&raw),
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Feed(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
<channel>
  <title>Local News</title>
  <link>https://www.example.com/</link>
  <item>
    <title>Council OKs budget</title>
    <link>https://www.example.com/news/local/budget.html</link>
    <georss:point>45.68 -111.04</georss:point>
  </item>
  <item>
    <title><![CDATA[Snow & ice close pass]]></title>
    <link>https://www.example.com/news/local/pass.html</link>
  </item>
  <item>
    <title>No link here</title>
  </item>
  <item>
    <title>Q&A with the mayor</title>
    <link>https://www.example.com/news/local/qa.html?a=1&b=2</link>
  </item>
</channel>
</rss>"#;

    #[test]
    fn test_parse_sanitized_feed() {
        let items = parse_items(&sanitize(FEED)).unwrap();
        assert_eq!(
            items,
            vec![
                FeedItem::new("https://www.example.com/news/local/budget.html", "Council OKs budget"),
                FeedItem::new("https://www.example.com/news/local/pass.html", "Snow & ice close pass"),
                FeedItem::new("https://www.example.com/news/local/qa.html?a=1&b=2", "Q&A with the mayor"),
            ]
        );
    }

    #[test]
    fn test_channel_link_is_not_an_item() {
        let items = parse_items(&sanitize(FEED)).unwrap();
        assert!(items.iter().all(|i| i.link != "https://www.example.com/"));
    }

    #[test]
    fn test_malformed_feed_is_an_error() {
        let err = parse_items("<rss><channel><item></channel></rss>").unwrap_err();
        assert!(matches!(err, Error::Feed(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_fetch_items_dedupes_links() {
        let xml = "<rss><channel>\
            <item><title>A</title><link>https://x.com/a.html</link></item>\
            <item><title>A again</title><link>https://x.com/a.html</link></item>\
            <item><title>B</title><link>https://x.com/b.html</link></item>\
            </channel></rss>";
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(xml))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let items = fetch_items(&client, &format!("{}/rss", server.uri()))
            .await
            .unwrap();
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["A", "B"]);
    }
}
