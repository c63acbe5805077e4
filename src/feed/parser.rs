use crate::feed::dom::{parse_document, Document, Element, Node, ParseError};
use crate::feed::item::{Item, MARKUP_PLACEHOLDER};

/// Parses a feed document and extracts its items in document order.
///
/// `feed_id` becomes the publisher of every item that lacks an
/// `<rm:publisher>` child.
pub fn parse_items(bytes: &[u8], feed_id: &str) -> Result<Vec<Item>, ParseError> {
    let doc = parse_document(bytes)?;
    Ok(extract_items(&doc, feed_id))
}

/// Collects every `<item>` below the document's top-level elements.
///
/// The search does not descend into an `<item>` once found, so nested
/// `<item>` elements are never reported separately. Works for RSS 0.9x/2.0
/// (items under `<channel>`) as well as RDF/RSS 1.0 (items beside it).
pub fn extract_items(doc: &Document, feed_id: &str) -> Vec<Item> {
    let mut items = Vec::new();
    for root in &doc.roots {
        find_items(root, feed_id, &mut items);
    }
    items
}

fn find_items(element: &Element, feed_id: &str, items: &mut Vec<Item>) {
    for child in element.child_elements() {
        if child.name == "item" {
            items.push(extract_item(child, feed_id));
        } else {
            find_items(child, feed_id, items);
        }
    }
}

/// Builds an [`Item`] from an `<item>` element.
///
/// Each field is extracted independently; a missing or empty field keeps its
/// default. When both `<description>` and `<content:encoded>` are present the
/// one appearing last wins.
fn extract_item(node: &Element, feed_id: &str) -> Item {
    let mut item = Item::with_defaults(feed_id);

    for child in node.child_elements() {
        let target = match child.name.as_str() {
            "title" => &mut item.title,
            "link" => &mut item.link,
            "description" | "content:encoded" => &mut item.description,
            "rm:publisher" => &mut item.publisher,
            "date" => &mut item.date,
            _ => continue,
        };
        if let Some(value) = field_text(child, feed_id) {
            *target = value;
        }
    }

    tracing::trace!(publisher = %item.publisher, title = %item.title, "Extracted item");
    item
}

/// Reads a field from its first child node.
///
/// Returns `None` for an empty element. Markup in front of the text (usually
/// unescaped HTML) yields the `??` placeholder instead of failing.
fn field_text(field: &Element, feed_id: &str) -> Option<String> {
    match field.first_child()? {
        Node::Text(text) => Some(text.trim().to_string()),
        Node::Element(_) => {
            tracing::debug!(
                feed = %feed_id,
                field = %field.name,
                "Field has no text data (HTML tag in data?)"
            );
            Some(MARKUP_PLACEHOLDER.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::item::{DEFAULT_DESCRIPTION, DEFAULT_LINK, DEFAULT_TITLE};
    use pretty_assertions::assert_eq;

    const RSS2: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Example</title>
    <item>
        <title>  Second  </title>
        <link>https://example.com/2</link>
        <description>Two</description>
        <date>Tue, 10 Jun 2003 04:00:00 +0000</date>
    </item>
    <item>
        <title>First</title>
        <link>https://example.com/1</link>
    </item>
</channel></rss>"#;

    #[test]
    fn test_extracts_items_in_document_order() {
        let items = parse_items(RSS2.as_bytes(), "example").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Second");
        assert_eq!(items[0].link, "https://example.com/2");
        assert_eq!(items[0].description, "Two");
        assert_eq!(items[0].date, "Tue, 10 Jun 2003 04:00:00 +0000");
        assert_eq!(items[0].publisher, "example");
        assert_eq!(items[1].title, "First");
        assert_eq!(items[1].description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_rdf_items_outside_channel() {
        let rdf = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/">
    <channel rdf:about="https://example.com"><title>RDF</title></channel>
    <item rdf:about="https://example.com/a"><title>A</title><link>https://example.com/a</link></item>
    <item rdf:about="https://example.com/b"><title>B</title><link>https://example.com/b</link></item>
</rdf:RDF>"#;
        let items = parse_items(rdf.as_bytes(), "rdf").unwrap();
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_nested_items_not_searched() {
        let xml = "<rss><channel><item><title>Outer</title><item><title>Inner</title></item></item></channel></rss>";
        let items = parse_items(xml.as_bytes(), "nested").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Outer");
    }

    #[test]
    fn test_empty_title_keeps_default() {
        let xml = "<rss><channel><item><title></title><link/></item></channel></rss>";
        let items = parse_items(xml.as_bytes(), "empty").unwrap();
        assert_eq!(items[0].title, DEFAULT_TITLE);
        assert_eq!(items[0].link, DEFAULT_LINK);
    }

    #[test]
    fn test_markup_in_field_yields_placeholder() {
        let xml = "<rss><channel><item><title>T</title><description><p>Hi</p></description></item></channel></rss>";
        let items = parse_items(xml.as_bytes(), "html").unwrap();
        assert_eq!(items[0].description, MARKUP_PLACEHOLDER);
    }

    #[test]
    fn test_content_encoded_last_wins() {
        let xml = r#"<rss xmlns:content="http://purl.org/rss/1.0/modules/content/"><channel>
<item><description>Short</description><content:encoded><![CDATA[Long body]]></content:encoded></item>
<item><content:encoded>Body</content:encoded><description>Summary</description></item>
</channel></rss>"#;
        let items = parse_items(xml.as_bytes(), "content").unwrap();
        assert_eq!(items[0].description, "Long body");
        assert_eq!(items[1].description, "Summary");
    }

    #[test]
    fn test_publisher_element_overrides_feed_id() {
        let xml = r#"<rss xmlns:rm="http://localhost/rssmerger/"><channel>
<item><title>T</title><rm:publisher>slashdot</rm:publisher></item>
</channel></rss>"#;
        let items = parse_items(xml.as_bytes(), "seen").unwrap();
        assert_eq!(items[0].publisher, "slashdot");
    }

    #[test]
    fn test_document_without_items() {
        let xml = "<rss><channel><title>Nothing</title></channel></rss>";
        assert!(parse_items(xml.as_bytes(), "none").unwrap().is_empty());
    }

    #[test]
    fn test_latin1_feed_decoded() {
        let xml = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n\
<rss version=\"2.0\"><channel><item><title>Caf\xE9</title>\
<description>Cr\xE8me br\xFBl\xE9e</description></item></channel></rss>";
        let items = parse_items(xml, "fr").unwrap();
        assert_eq!(items[0].title, "Caf\u{e9}");
        assert_eq!(items[0].description, "Cr\u{e8}me br\u{fb}l\u{e9}e");
    }

    #[test]
    fn test_netscape_doctype_feed_keeps_items() {
        let xml = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<!DOCTYPE rss PUBLIC "-//Netscape Communications//DTD RSS 0.91//EN"
  "http://my.netscape.com/publish/formats/rss-0.91.dtd">
<rss version="0.91"><channel>
<title>Old school</title>
<item><title>Caf&eacute; opens</title><link>https://example.com/cafe</link></item>
<item><title>Ok</title><link>https://example.com/ok</link></item>
</channel></rss>"#;
        let items = parse_items(xml.as_bytes(), "netscape").unwrap();
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Caf opens", "Ok"]);
    }

    #[test]
    fn test_declared_entity_not_expanded() {
        let xml = r#"<?xml version="1.0"?>
<!DOCTYPE rss [<!ENTITY xxe SYSTEM "file:///etc/passwd">]>
<rss><channel><item><title>&xxe;</title><link>https://example.com/x</link></item></channel></rss>"#;
        let items = parse_items(xml.as_bytes(), "xxe").unwrap();
        assert_eq!(items[0].title, DEFAULT_TITLE);
        assert_eq!(items[0].link, "https://example.com/x");
    }

    #[test]
    fn test_malformed_document_errors() {
        assert!(parse_items(b"<rss><channel><item></channel>", "bad").is_err());
    }
}
