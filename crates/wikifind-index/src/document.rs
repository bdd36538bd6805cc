//! Document types for indexing.
//!
//! The host wiki hands typed records ([`PageContent`], [`Message`], [`PageAttachment`],
//! [`WikiFile`]) to the engine. Each is wrapped in an [`IndexDocument`], which flattens
//! into the ordered field list its [`DocumentType`] declares. Hits come back as
//! [`StoredFields`], a field-to-string mapping of whatever the schema stores.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use tantivy::{TantivyDocument, schema::Value};
use tracing::error;

use crate::{
    IndexError,
    schema::{DocumentType, IndexSchema, SearchField},
};

/// Identifies a page within a wiki.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRef {
    /// Wiki the page belongs to.
    pub wiki: String,
    /// Full page name, e.g. `Main.HomePage`.
    pub full_name: String,
}

impl PageRef {
    /// Creates a page reference.
    pub fn new(wiki: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            wiki: wiki.into(),
            full_name: full_name.into(),
        }
    }
}

/// Current content of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    /// Wiki the page belongs to.
    pub wiki: String,
    /// Full page name.
    pub full_name: String,
    /// Display title.
    pub title: String,
    /// Page markup.
    pub content: String,
}

impl PageContent {
    /// Returns the reference identifying this page.
    pub fn page_ref(&self) -> PageRef {
        PageRef::new(self.wiki.clone(), self.full_name.clone())
    }
}

/// A discussion message posted on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Identifier unique within the page's discussion.
    pub id: u64,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// When the message was posted.
    pub datetime: DateTime<Utc>,
}

/// A file attached to a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAttachment {
    /// Attachment file name.
    pub file_name: String,
    /// Extracted text, empty when none could be extracted.
    pub content: String,
}

/// A wiki-level file not attached to any page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiFile {
    /// Wiki the file belongs to.
    pub wiki: String,
    /// Full file name, including its directory.
    pub full_name: String,
    /// Extracted text, or `None` when none could be extracted.
    pub content: Option<String>,
}

/// A document ready for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexDocument {
    /// A page.
    Page(PageContent),
    /// A message on a page.
    Message {
        /// Owning page.
        page: PageRef,
        /// The message.
        message: Message,
    },
    /// An attachment on a page.
    Attachment {
        /// Owning page.
        page: PageRef,
        /// The attachment.
        attachment: PageAttachment,
    },
    /// A wiki-level file.
    File(WikiFile),
}

impl IndexDocument {
    /// The document's type.
    pub fn document_type(&self) -> DocumentType {
        match self {
            Self::Page(_) => DocumentType::Page,
            Self::Message { .. } => DocumentType::Message,
            Self::Attachment { .. } => DocumentType::Attachment,
            Self::File(_) => DocumentType::File,
        }
    }

    /// The wiki the document belongs to.
    pub fn wiki(&self) -> &str {
        match self {
            Self::Page(page) => &page.wiki,
            Self::Message { page, .. } | Self::Attachment { page, .. } => &page.wiki,
            Self::File(file) => &file.wiki,
        }
    }

    /// Flattens the document into the field list its type declares, in declaration order.
    ///
    /// Optional fields without a value are omitted.
    pub fn field_values(&self) -> Vec<(SearchField, String)> {
        let document_type = self.document_type();
        let mut values = BTreeMap::new();
        values.insert(SearchField::DocumentType, document_type.as_str().to_string());
        values.insert(SearchField::Wiki, self.wiki().to_string());

        match self {
            Self::Page(page) => {
                values.insert(SearchField::PageFullName, page.full_name.clone());
                values.insert(SearchField::Title, page.title.clone());
                values.insert(SearchField::Content, page.content.clone());
            }
            Self::Message { page, message } => {
                values.insert(SearchField::PageFullName, page.full_name.clone());
                values.insert(SearchField::MessageId, message.id.to_string());
                values.insert(SearchField::Title, message.subject.clone());
                values.insert(SearchField::Content, message.body.clone());
                values.insert(
                    SearchField::MessageDatetime,
                    message
                        .datetime
                        .to_rfc3339_opts(SecondsFormat::AutoSi, true),
                );
            }
            Self::Attachment { page, attachment } => {
                values.insert(SearchField::PageFullName, page.full_name.clone());
                values.insert(SearchField::Title, attachment.file_name.clone());
                values.insert(SearchField::FileName, attachment.file_name.clone());
                values.insert(SearchField::Content, attachment.content.clone());
            }
            Self::File(file) => {
                values.insert(SearchField::Title, file.full_name.clone());
                values.insert(SearchField::FileName, file.full_name.clone());
                if let Some(content) = &file.content {
                    values.insert(SearchField::Content, content.clone());
                }
            }
        }

        document_type
            .fields()
            .into_iter()
            .filter_map(|spec| values.remove(&spec.field).map(|value| (spec.field, value)))
            .collect()
    }

    /// Converts the document into Tantivy's representation.
    pub(crate) fn to_tantivy(&self, schema: &IndexSchema) -> TantivyDocument {
        let mut doc = TantivyDocument::new();
        for (field, value) in self.field_values() {
            doc.add_text(schema.field(field), value);
        }
        doc
    }
}

/// Stored field values of a hit, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredFields {
    /// Field values present on the document.
    values: BTreeMap<SearchField, String>,
}

impl StoredFields {
    /// Collects the stored text values of a Tantivy document.
    pub(crate) fn from_tantivy(doc: &TantivyDocument, schema: &IndexSchema) -> Self {
        let values = SearchField::ALL
            .into_iter()
            .filter(|field| field.is_stored())
            .filter_map(|field| {
                doc.get_first(schema.field(field))
                    .and_then(|value| value.as_str())
                    .map(|text| (field, text.to_string()))
            })
            .collect();
        Self { values }
    }

    /// Returns a field's value, if stored on this document.
    pub fn get(&self, field: SearchField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Returns a field's value, failing if the document lacks it.
    pub fn require(&self, field: SearchField) -> Result<&str, IndexError> {
        self.get(field).ok_or_else(|| {
            let message = format!("stored document is missing required field '{field}'");
            error!(field = field.as_str(), "{message}");
            IndexError::SchemaMismatch(message)
        })
    }

    /// Parses the document's type tag.
    pub fn document_type(&self) -> Result<DocumentType, IndexError> {
        self.require(SearchField::DocumentType)?
            .parse()
            .inspect_err(|err| error!(%err, "unrecognized stored document type"))
    }

    /// Returns the values as a field-name to string mapping.
    pub fn to_map(&self) -> BTreeMap<&'static str, &str> {
        self.values
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_str()))
            .collect()
    }

    /// Iterates over present fields in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (SearchField, &str)> {
        self.values.iter().map(|(field, value)| (*field, value.as_str()))
    }
}

impl FromIterator<(SearchField, String)> for StoredFields {
    fn from_iter<I: IntoIterator<Item = (SearchField, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
