//! Request bodies for the remote table API.
//!
//! The database schema is fixed: five columns, the same on every run, never inferred
//! from the records being published. Only the title's timestamp varies between calls.

use chrono::{DateTime, TimeZone};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::contract::Record;

/// Prefix of every created database's title.
pub const TITLE_PREFIX: &str = "Obsidian Table Export";

/// Column kinds understood by the remote API, serialized as its type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Title,
    Url,
    MultiSelect,
    RichText,
    Select,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Title => "title",
            ColumnKind::Url => "url",
            ColumnKind::MultiSelect => "multi_select",
            ColumnKind::RichText => "rich_text",
            ColumnKind::Select => "select",
        }
    }
}

/// The fixed table layout: column name and kind.
pub const COLUMNS: [(&str, ColumnKind); 5] = [
    ("name", ColumnKind::Title),
    ("link", ColumnKind::Url),
    ("tags", ColumnKind::MultiSelect),
    ("description", ColumnKind::RichText),
    ("type", ColumnKind::Select),
];

/// A column declaration, serialized as `{"type": <kind>, <kind>: {}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSchema {
    pub kind: ColumnKind,
}

impl Serialize for ColumnSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tag = self.kind.as_str();
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", tag)?;
        map.serialize_entry(tag, &BTreeMap::<String, String>::new())?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    pub content: String,
}

/// A rich-text span. Database titles carry an explicit `"type": "text"`, row values don't.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichText {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub text: TextContent,
}

impl RichText {
    pub fn typed(content: impl Into<String>) -> Self {
        Self {
            kind: Some("text".to_string()),
            text: TextContent {
                content: content.into(),
            },
        }
    }

    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            kind: None,
            text: TextContent {
                content: content.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageParent {
    pub page_id: String,
}

/// Body of the create-database call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateDatabaseRequest {
    pub parent: PageParent,
    pub title: Vec<RichText>,
    pub properties: BTreeMap<String, ColumnSchema>,
}

impl CreateDatabaseRequest {
    /// The plain title text of the new database.
    pub fn title_text(&self) -> String {
        self.title.iter().map(|t| t.text.content.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseParent {
    pub database_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleValue {
    pub title: Vec<RichText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlValue {
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiSelectValue {
    pub multi_select: Vec<SelectOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichTextValue {
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectValue {
    pub select: Option<SelectOption>,
}

/// Row values, one per column of [`COLUMNS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowProperties {
    pub name: TitleValue,
    pub link: UrlValue,
    pub tags: MultiSelectValue,
    pub description: RichTextValue,
    #[serde(rename = "type")]
    pub kind: SelectValue,
}

/// Body of the create-page (insert row) call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatePageRequest {
    pub parent: DatabaseParent,
    pub properties: RowProperties,
}

impl CreatePageRequest {
    /// The row's title-column text.
    pub fn row_name(&self) -> String {
        self.properties
            .name
            .title
            .iter()
            .map(|t| t.text.content.as_str())
            .collect()
    }
}

/// Render a timestamp the way a desktop locale would, e.g. `10/15/2026, 3:04:05 PM`.
pub fn timestamp_label<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    now.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

/// Build the create-database request for a new table under `page_id`.
pub fn build_create_request(page_id: &str, timestamp_label: &str) -> CreateDatabaseRequest {
    let properties = COLUMNS
        .iter()
        .map(|(name, kind)| (name.to_string(), ColumnSchema { kind: *kind }))
        .collect();

    CreateDatabaseRequest {
        parent: PageParent {
            page_id: page_id.to_string(),
        },
        title: vec![RichText::typed(format!("{TITLE_PREFIX} - {timestamp_label}"))],
        properties,
    }
}

/// Build the insert-row request mapping one record onto the fixed columns.
///
/// An empty link or type is sent as `null`; the remote API rejects empty URLs and
/// nameless select options.
pub fn build_row_request(database_id: &str, record: &Record) -> CreatePageRequest {
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

    CreatePageRequest {
        parent: DatabaseParent {
            database_id: database_id.to_string(),
        },
        properties: RowProperties {
            name: TitleValue {
                title: vec![RichText::plain(record.name.as_str())],
            },
            link: UrlValue {
                url: non_empty(&record.link),
            },
            tags: MultiSelectValue {
                multi_select: record
                    .tags
                    .iter()
                    .map(|tag| SelectOption { name: tag.clone() })
                    .collect(),
            },
            description: RichTextValue {
                rich_text: vec![RichText::plain(record.description.as_str())],
            },
            kind: SelectValue {
                select: non_empty(&record.kind).map(|name| SelectOption { name }),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record() -> Record {
        Record {
            name: "ripgrep".into(),
            link: "https://github.com/BurntSushi/ripgrep".into(),
            tags: vec!["Search".into(), "CLI".into()],
            description: "fast grep".into(),
            kind: "tool".into(),
        }
    }

    #[test]
    fn create_request_declares_the_five_columns() {
        let req = build_create_request("page-123", "1/2/2026, 3:04:05 PM");
        let body = serde_json::to_value(&req).unwrap();

        assert_eq!(
            body,
            json!({
                "parent": { "page_id": "page-123" },
                "title": [{
                    "type": "text",
                    "text": { "content": "Obsidian Table Export - 1/2/2026, 3:04:05 PM" }
                }],
                "properties": {
                    "name": { "type": "title", "title": {} },
                    "link": { "type": "url", "url": {} },
                    "tags": { "type": "multi_select", "multi_select": {} },
                    "description": { "type": "rich_text", "rich_text": {} },
                    "type": { "type": "select", "select": {} }
                }
            })
        );
    }

    #[test]
    fn create_request_columns_do_not_depend_on_timestamp() {
        let a = build_create_request("p", "first");
        let b = build_create_request("p", "second");
        assert_eq!(a.properties, b.properties);
        assert_eq!(a.parent, b.parent);
        assert_ne!(a.title_text(), b.title_text());
    }

    #[test]
    fn row_request_maps_each_field() {
        let req = build_row_request("db-1", &record());
        let body = serde_json::to_value(&req).unwrap();

        assert_eq!(
            body,
            json!({
                "parent": { "database_id": "db-1" },
                "properties": {
                    "name": { "title": [{ "text": { "content": "ripgrep" } }] },
                    "link": { "url": "https://github.com/BurntSushi/ripgrep" },
                    "tags": { "multi_select": [{ "name": "Search" }, { "name": "CLI" }] },
                    "description": { "rich_text": [{ "text": { "content": "fast grep" } }] },
                    "type": { "select": { "name": "tool" } }
                }
            })
        );
        assert_eq!(req.row_name(), "ripgrep");
    }

    #[test]
    fn row_request_sends_null_for_empty_link_and_type() {
        let rec = Record {
            link: String::new(),
            kind: String::new(),
            tags: vec![],
            ..record()
        };
        let body = serde_json::to_value(build_row_request("db-1", &rec)).unwrap();

        assert_eq!(body["properties"]["link"], json!({ "url": null }));
        assert_eq!(body["properties"]["type"], json!({ "select": null }));
        assert_eq!(body["properties"]["tags"], json!({ "multi_select": [] }));
    }

    #[test]
    fn timestamp_label_uses_twelve_hour_clock() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let at = tz.with_ymd_and_hms(2026, 10, 15, 15, 4, 5).unwrap();
        assert_eq!(timestamp_label(&at), "10/15/2026, 3:04:05 PM");
    }
}
