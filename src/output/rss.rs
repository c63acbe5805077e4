use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

use super::WriteError;
use crate::feed::Item;

/// Namespace of the `<rm:publisher>` element carried by every written item.
pub const PUBLISHER_NAMESPACE: &str = "http://localhost/rssmerger/";

/// Fixed channel metadata of a written document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub title: &'static str,
    pub link: &'static str,
    pub description: &'static str,
}

/// Channel of the merged document.
pub const MERGED_CHANNEL: Channel = Channel {
    title: "rssmerger Merged items",
    link: "http://localhost/",
    description: "This file contains items which have been merged from various RSS feeds",
};

/// Channel of the watermark document.
pub const SEEN_CHANNEL: Channel = Channel {
    title: "rssmerger Seen items",
    link: "http://localhost/",
    description: "This file contains the last seen items for each feed",
};

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Renders `items` as an RSS 2.0 document.
///
/// Items are written with their children in the order title, link, date,
/// `rm:publisher`, description. The `rm` prefix is declared on the root.
pub fn render_document(channel: &Channel, items: &[Item]) -> Result<String, WriteError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:rm", PUBLISHER_NAMESPACE));
    emit(&mut writer, Event::Start(rss))?;
    emit(&mut writer, Event::Start(BytesStart::new("channel")))?;

    text_element(&mut writer, "title", channel.title)?;
    text_element(&mut writer, "link", channel.link)?;
    text_element(&mut writer, "description", channel.description)?;

    for item in items {
        emit(&mut writer, Event::Start(BytesStart::new("item")))?;
        text_element(&mut writer, "title", &item.title)?;
        text_element(&mut writer, "link", &item.link)?;
        text_element(&mut writer, "date", &item.date)?;
        text_element(&mut writer, "rm:publisher", &item.publisher)?;
        text_element(&mut writer, "description", &item.description)?;
        emit(&mut writer, Event::End(BytesEnd::new("item")))?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("channel")))?;
    emit(&mut writer, Event::End(BytesEnd::new("rss")))?;

    let result = writer.into_inner().into_inner();
    String::from_utf8(result)
        .map_err(|e| WriteError::Serialize(format!("Generated RSS contains invalid UTF-8: {e}")))
}

/// Writes `items` to `path` as an RSS 2.0 document, atomically.
///
/// The document goes to a temporary file in the same directory, is synced
/// to disk, then renamed over `path`, so a reader never sees a partial file.
pub fn write_document(path: &Path, channel: &Channel, items: &[Item]) -> Result<(), WriteError> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let content = render_document(channel, items)?;
    let io_error = |source| WriteError::Io {
        path: path.display().to_string(),
        source,
    };

    // Randomized temp filename so a stale or planted temp file is never reused
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(io_error)?;

    let written = std::io::Write::write_all(&mut file, content.as_bytes())
        .and_then(|()| file.sync_all());
    drop(file);

    if let Err(e) = written.and_then(|()| std::fs::rename(&temp_path, path)) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(io_error(e));
    }

    tracing::debug!(path = %path.display(), items = items.len(), "Wrote RSS document");
    Ok(())
}

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), WriteError> {
    writer
        .write_event(event)
        .map_err(|e| WriteError::Serialize(e.to_string()))
}

fn text_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<(), WriteError> {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{parse_items, DEFAULT_TITLE};
    use pretty_assertions::assert_eq;

    fn sample_items() -> Vec<Item> {
        vec![
            Item {
                title: "Fish & <Chips>".to_string(),
                link: "https://example.com/a?x=1&y=2".to_string(),
                description: "It's \"quoted\"".to_string(),
                publisher: "food".to_string(),
                date: "Tue, 10 Jun 2003 04:00:00 +0000".to_string(),
            },
            Item {
                title: "Plain".to_string(),
                link: "https://example.com/b".to_string(),
                description: "No description".to_string(),
                publisher: "news".to_string(),
                date: "Wed, 11 Jun 2003 04:00:00 +0000".to_string(),
            },
        ]
    }

    #[test]
    fn test_round_trip_preserves_items() {
        let items = sample_items();
        let rendered = render_document(&MERGED_CHANNEL, &items).unwrap();
        let parsed = parse_items(rendered.as_bytes(), "other").unwrap();
        assert_eq!(parsed, items);
    }

    #[test]
    fn test_channel_metadata_written() {
        let rendered = render_document(&SEEN_CHANNEL, &[]).unwrap();
        assert!(rendered.starts_with("<?xml"));
        assert!(rendered.contains(r#"<rss version="2.0" xmlns:rm="http://localhost/rssmerger/">"#));
        assert!(rendered.contains("<title>rssmerger Seen items</title>"));
        assert!(rendered.contains("<link>http://localhost/</link>"));
        // Channel title is not an item
        assert!(parse_items(rendered.as_bytes(), "x").unwrap().is_empty());
    }

    #[test]
    fn test_item_children_order() {
        let rendered = render_document(&MERGED_CHANNEL, &sample_items()[1..]).unwrap();
        let item = &rendered[rendered.find("<item>").unwrap()..];
        let positions: Vec<usize> = ["<title>", "<link>", "<date>", "<rm:publisher>", "<description>"]
            .iter()
            .map(|needle| item.find(needle).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_empty_title_reparses_as_default() {
        let mut items = sample_items();
        items[1].title = String::new();
        let rendered = render_document(&MERGED_CHANNEL, &items).unwrap();
        let parsed = parse_items(rendered.as_bytes(), "x").unwrap();
        assert_eq!(parsed[1].title, DEFAULT_TITLE);
    }

    #[test]
    fn test_write_document_replaces_file() {
        let path = std::env::temp_dir().join("rssmerger_write_document.rss");
        std::fs::write(&path, "stale").unwrap();

        write_document(&path, &MERGED_CHANNEL, &sample_items()).unwrap();

        let content = std::fs::read(&path).unwrap();
        let parsed = parse_items(&content, "x").unwrap();
        assert_eq!(parsed.len(), 2);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_write_document_missing_directory_errors() {
        let path = std::env::temp_dir()
            .join("rssmerger_no_such_dir")
            .join("merged.rss");
        let result = write_document(&path, &MERGED_CHANNEL, &sample_items());
        assert!(matches!(result, Err(WriteError::Io { .. })));
    }
}
