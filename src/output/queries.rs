use std::borrow::Cow;
use std::io::Write;

use crate::feed::Item;

/// Escapes single quotes with a backslash. Nothing else is escaped.
pub fn escape_quotes(value: &str) -> Cow<'_, str> {
    if value.contains('\'') {
        Cow::Owned(value.replace('\'', "\\'"))
    } else {
        Cow::Borrowed(value)
    }
}

/// Formats one item as an `INSERT INTO rssitems` statement.
pub fn insert_statement(item: &Item) -> String {
    format!(
        "INSERT INTO rssitems (title, link, date, publisher, description) VALUES ('{}','{}','{}','{}','{}');",
        escape_quotes(&item.title),
        escape_quotes(&item.link),
        escape_quotes(&item.date),
        escape_quotes(&item.publisher),
        escape_quotes(&item.description),
    )
}

/// Writes one statement per line for `new_items`, oldest first.
///
/// `new_items` is in discovery order (newest first per feed), so it is
/// emitted in reverse.
pub fn write_statements<W: Write>(out: &mut W, new_items: &[Item]) -> std::io::Result<()> {
    for item in new_items.iter().rev() {
        writeln!(out, "{}", insert_statement(item))?;
    }
    out.flush()
}
