//! Index schema definition for wiki indexes.
//!
//! All document types share one Tantivy schema; each type populates only the fields
//! it declares (see [`DocumentType::fields`]).
//! - `document_type`, `wiki`, `page_full_name`: exact, stored
//! - `title`, `content`: tokenized with positions, stored
//! - `message_id`, `file_name`: exact, not stored (deletion keys)
//! - `message_datetime`: stored only

use std::{fmt, str::FromStr};

use serde::Serialize;
use tantivy::schema::{
    Field, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions,
};

use crate::{IndexError, analyzer::WIKI_TOKENIZER};

/// Named fields of the index schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    /// Type tag of the document.
    DocumentType,
    /// Wiki the document belongs to.
    Wiki,
    /// Full name of the owning page.
    PageFullName,
    /// Page title, message subject or file name.
    Title,
    /// Page content, message body or extracted file text.
    Content,
    /// Message identifier.
    MessageId,
    /// Message timestamp (RFC 3339).
    MessageDatetime,
    /// Attachment or file name.
    FileName,
}

impl SearchField {
    /// Every field, in schema order.
    pub const ALL: [Self; 8] = [
        Self::DocumentType,
        Self::Wiki,
        Self::PageFullName,
        Self::Title,
        Self::Content,
        Self::MessageId,
        Self::MessageDatetime,
        Self::FileName,
    ];

    /// Fields searched when the caller names none.
    pub const DEFAULT_SEARCH: [Self; 2] = [Self::Title, Self::Content];

    /// Field name as it appears in the schema and in queries.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DocumentType => "document_type",
            Self::Wiki => "wiki",
            Self::PageFullName => "page_full_name",
            Self::Title => "title",
            Self::Content => "content",
            Self::MessageId => "message_id",
            Self::MessageDatetime => "message_datetime",
            Self::FileName => "file_name",
        }
    }

    /// Looks up a field by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }

    /// How the field is indexed.
    pub fn indexing(self) -> FieldIndexing {
        match self {
            Self::Title | Self::Content => FieldIndexing::Tokenized,
            Self::DocumentType
            | Self::Wiki
            | Self::PageFullName
            | Self::MessageId
            | Self::FileName => FieldIndexing::Exact,
            Self::MessageDatetime => FieldIndexing::NotIndexed,
        }
    }

    /// Whether the field's value is retrievable from a hit.
    pub fn is_stored(self) -> bool {
        !matches!(self, Self::MessageId | Self::FileName)
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a field's value is turned into index terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldIndexing {
    /// Analyzed into searchable terms.
    Tokenized,
    /// Indexed as one verbatim token; equality is exact and case-sensitive.
    Exact,
    /// Stored for display only.
    NotIndexed,
}

/// Declaration of one field within a document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// The field.
    pub field: SearchField,
    /// Whether the value is stored verbatim.
    pub stored: bool,
    /// How the value is indexed.
    pub indexing: FieldIndexing,
    /// Whether every document of the type must carry the field.
    pub required: bool,
}

impl FieldSpec {
    /// Declares a field with its schema-wide storage and indexing options.
    const fn new(field: SearchField, stored: bool, indexing: FieldIndexing, required: bool) -> Self {
        Self {
            field,
            stored,
            indexing,
            required,
        }
    }
}

/// Kind of indexed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// A wiki page.
    Page,
    /// A discussion message attached to a page.
    Message,
    /// A file attached to a page.
    Attachment,
    /// A wiki-level file not attached to any page.
    File,
}

impl DocumentType {
    /// Type tag stored in the `document_type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Message => "message",
            Self::Attachment => "attachment",
            Self::File => "file",
        }
    }

    /// Ordered field declarations for this type.
    pub fn fields(self) -> Vec<FieldSpec> {
        use FieldIndexing::{Exact, NotIndexed, Tokenized};
        use SearchField as F;

        let mut fields = vec![
            FieldSpec::new(F::DocumentType, true, Exact, true),
            FieldSpec::new(F::Wiki, true, Exact, true),
        ];
        match self {
            Self::Page => fields.extend([
                FieldSpec::new(F::PageFullName, true, Exact, true),
                FieldSpec::new(F::Title, true, Tokenized, true),
                FieldSpec::new(F::Content, true, Tokenized, true),
            ]),
            Self::Message => fields.extend([
                FieldSpec::new(F::PageFullName, true, Exact, true),
                FieldSpec::new(F::MessageId, false, Exact, true),
                FieldSpec::new(F::Title, true, Tokenized, true),
                FieldSpec::new(F::Content, true, Tokenized, true),
                FieldSpec::new(F::MessageDatetime, true, NotIndexed, true),
            ]),
            Self::Attachment => fields.extend([
                FieldSpec::new(F::PageFullName, true, Exact, true),
                FieldSpec::new(F::Title, true, Tokenized, true),
                FieldSpec::new(F::FileName, false, Exact, true),
                FieldSpec::new(F::Content, true, Tokenized, true),
            ]),
            Self::File => fields.extend([
                FieldSpec::new(F::Title, true, Tokenized, true),
                FieldSpec::new(F::FileName, false, Exact, true),
                FieldSpec::new(F::Content, true, Tokenized, false),
            ]),
        }
        fields
    }

    /// Returns the declaration of `field` for this type, if declared.
    pub fn field(self, field: SearchField) -> Option<FieldSpec> {
        self.fields().into_iter().find(|spec| spec.field == field)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "page" => Ok(Self::Page),
            "message" => Ok(Self::Message),
            "attachment" => Ok(Self::Attachment),
            "file" => Ok(Self::File),
            other => Err(IndexError::InvalidDocumentType(other.to_string())),
        }
    }
}

/// Handles to all fields in the index schema.
#[derive(Debug, Clone)]
pub struct IndexSchema {
    /// The underlying Tantivy schema.
    schema: Schema,
    /// Document type tag.
    pub document_type: Field,
    /// Owning wiki id.
    pub wiki: Field,
    /// Owning page full name.
    pub page_full_name: Field,
    /// Title, subject or file name.
    pub title: Field,
    /// Content, body or extracted text.
    pub content: Field,
    /// Message identifier.
    pub message_id: Field,
    /// Message timestamp.
    pub message_datetime: Field,
    /// Attachment or file name.
    pub file_name: Field,
}

impl IndexSchema {
    /// Creates the index schema with all fields configured.
    pub fn new() -> Self {
        let mut builder = Schema::builder();

        let text_options = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(WIKI_TOKENIZER)
                    .set_index_option(IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();

        let document_type =
            builder.add_text_field(SearchField::DocumentType.as_str(), STRING | STORED);
        let wiki = builder.add_text_field(SearchField::Wiki.as_str(), STRING | STORED);
        let page_full_name =
            builder.add_text_field(SearchField::PageFullName.as_str(), STRING | STORED);
        let title = builder.add_text_field(SearchField::Title.as_str(), text_options.clone());
        let content = builder.add_text_field(SearchField::Content.as_str(), text_options);
        let message_id = builder.add_text_field(SearchField::MessageId.as_str(), STRING);
        let message_datetime =
            builder.add_text_field(SearchField::MessageDatetime.as_str(), STORED);
        let file_name = builder.add_text_field(SearchField::FileName.as_str(), STRING);

        Self {
            schema: builder.build(),
            document_type,
            wiki,
            page_full_name,
            title,
            content,
            message_id,
            message_datetime,
            file_name,
        }
    }

    /// Returns a reference to the underlying Tantivy schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the Tantivy handle for a named field.
    pub fn field(&self, field: SearchField) -> Field {
        match field {
            SearchField::DocumentType => self.document_type,
            SearchField::Wiki => self.wiki,
            SearchField::PageFullName => self.page_full_name,
            SearchField::Title => self.title,
            SearchField::Content => self.content,
            SearchField::MessageId => self.message_id,
            SearchField::MessageDatetime => self.message_datetime,
            SearchField::FileName => self.file_name,
        }
    }
}

impl Default for IndexSchema {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use tantivy::schema::FieldType;

    use super::*;

    /// Tokenizer name of an indexed text field, or `None` when not indexed.
    fn tokenizer_of(schema: &IndexSchema, field: SearchField) -> Option<String> {
        let entry = schema.schema().get_field_entry(schema.field(field));
        match entry.field_type() {
            FieldType::Str(opts) => opts
                .get_indexing_options()
                .map(|indexing| indexing.tokenizer().to_string()),
            _ => panic!("{field} should be a text field"),
        }
    }

    #[test]
    fn schema_matches_field_declarations() {
        let schema = IndexSchema::new();
        for field in SearchField::ALL {
            let entry = schema.schema().get_field_entry(schema.field(field));
            assert_eq!(entry.name(), field.as_str());
            assert_eq!(entry.is_stored(), field.is_stored(), "{field} stored");

            let tokenizer = tokenizer_of(&schema, field);
            match field.indexing() {
                FieldIndexing::Tokenized => assert_eq!(tokenizer.as_deref(), Some(WIKI_TOKENIZER)),
                FieldIndexing::Exact => assert_eq!(tokenizer.as_deref(), Some("raw")),
                FieldIndexing::NotIndexed => assert!(tokenizer.is_none()),
            }
        }
    }

    #[test]
    fn type_declarations_agree_with_schema() {
        for doc_type in [
            DocumentType::Page,
            DocumentType::Message,
            DocumentType::Attachment,
            DocumentType::File,
        ] {
            for spec in doc_type.fields() {
                assert_eq!(spec.stored, spec.field.is_stored());
                assert_eq!(spec.indexing, spec.field.indexing());
            }
        }
    }

    #[test]
    fn page_fields_in_order() {
        let names: Vec<_> = DocumentType::Page
            .fields()
            .iter()
            .map(|spec| spec.field.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["document_type", "wiki", "page_full_name", "title", "content"]
        );
    }

    #[test]
    fn message_keys() {
        let id = DocumentType::Message.field(SearchField::MessageId).unwrap();
        assert!(!id.stored);
        assert_eq!(id.indexing, FieldIndexing::Exact);

        let datetime = DocumentType::Message
            .field(SearchField::MessageDatetime)
            .unwrap();
        assert!(datetime.stored);
        assert_eq!(datetime.indexing, FieldIndexing::NotIndexed);
    }

    #[test]
    fn content_is_optional_only_for_files() {
        assert!(DocumentType::Attachment.field(SearchField::Content).unwrap().required);
        assert!(!DocumentType::File.field(SearchField::Content).unwrap().required);
        assert!(DocumentType::File.field(SearchField::PageFullName).is_none());
        assert!(DocumentType::Page.field(SearchField::FileName).is_none());
    }

    #[test]
    fn document_type_round_trip() {
        for name in ["page", "message", "attachment", "file"] {
            assert_eq!(name.parse::<DocumentType>().unwrap().as_str(), name);
        }
        let err = "Page".parse::<DocumentType>().unwrap_err();
        assert!(matches!(err, IndexError::InvalidDocumentType(ref t) if t == "Page"));
    }

    #[test]
    fn field_lookup_by_name() {
        assert_eq!(SearchField::from_name("title"), Some(SearchField::Title));
        assert_eq!(
            SearchField::from_name("page_full_name"),
            Some(SearchField::PageFullName)
        );
        assert_eq!(SearchField::from_name("body"), None);
    }
}
