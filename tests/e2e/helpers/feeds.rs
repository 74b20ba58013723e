use chrono::{DateTime, Utc};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// RSS 2.0 channel whose items carry no `<guid>`, so links double as identity
pub fn rss_without_guids(title: &str, items: &[(&str, &str)]) -> String {
    rss_published_at(title, items, Utc::now())
}

/// Same channel with every item dated `published`
pub fn rss_published_at(title: &str, items: &[(&str, &str)], published: DateTime<Utc>) -> String {
    let published = published.to_rfc2822();
    let items: String = items
        .iter()
        .map(|(item_title, link)| {
            format!(
                "<item><title>{}</title><link>{}</link>\
                 <description>About {}</description>\
                 <pubDate>{}</pubDate></item>",
                item_title, link, item_title, published
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>{}</title><link>http://publisher.test/</link><description>Test publisher</description>{}</channel></rss>"#,
        title, items
    )
}

pub fn atom_feed(title: &str, entries: &[(&str, &str, &str)]) -> String {
    let updated = Utc::now().to_rfc3339();
    let entries: String = entries
        .iter()
        .map(|(id, entry_title, link)| {
            format!(
                r#"<entry><id>{}</id><title>{}</title><link rel="alternate" href="{}"/><updated>{}</updated><summary>Summary of {}</summary></entry>"#,
                id, entry_title, link, updated, entry_title
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"><title>{}</title><id>urn:test:feed</id><updated>{}</updated>{}</feed>"#,
        title, updated, entries
    )
}

/// Serve `body` as XML at `at` on the mock publisher
pub async fn serve_feed(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

pub async fn serve_status(server: &MockServer, at: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
