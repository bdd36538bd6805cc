//! Search results.
//!
//! A hit's stored fields are rehydrated into a typed record matching its document
//! type, with highlighted excerpts of its label and text.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use crate::{
    IndexError,
    document::StoredFields,
    highlight::Highlighter,
    schema::{DocumentType, SearchField},
};

/// Factor applied to raw relevance scores for display.
pub const RELEVANCE_SCALE: f32 = 100.0;

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Type of the matched document.
    pub document_type: DocumentType,
    /// Relevance: non-negative, higher is better.
    pub relevance: f32,
    /// The matched document with highlighted excerpts.
    pub document: ResultDocument,
}

/// A matched document, by type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultDocument {
    /// A page.
    Page(PageResult),
    /// A message.
    Message(MessageResult),
    /// A page attachment.
    Attachment(AttachmentResult),
    /// A wiki-level file.
    File(FileResult),
}

/// A matched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResult {
    /// Wiki the page belongs to.
    pub wiki: String,
    /// Full page name.
    pub page_full_name: String,
    /// Page title.
    pub title: String,
    /// Page content.
    pub content: String,
    /// Excerpts of the title.
    pub highlighted_title: Vec<String>,
    /// Excerpts of the content.
    pub highlighted_content: Vec<String>,
}

/// A matched message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageResult {
    /// Wiki the message belongs to.
    pub wiki: String,
    /// Page the message was posted on.
    pub page_full_name: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// When the message was posted.
    pub datetime: DateTime<Utc>,
    /// Excerpts of the subject.
    pub highlighted_subject: Vec<String>,
    /// Excerpts of the body.
    pub highlighted_body: Vec<String>,
}

/// A matched page attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentResult {
    /// Wiki the attachment belongs to.
    pub wiki: String,
    /// Page the file is attached to.
    pub page_full_name: String,
    /// Attachment file name.
    pub file_name: String,
    /// Extracted text, empty when none was available.
    pub content: String,
    /// Excerpts of the file name.
    pub highlighted_file_name: Vec<String>,
    /// Excerpts of the extracted text.
    pub highlighted_content: Vec<String>,
}

/// A matched wiki-level file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileResult {
    /// Wiki the file belongs to.
    pub wiki: String,
    /// Full file name.
    pub full_name: String,
    /// Extracted text, if any was indexed.
    pub content: Option<String>,
    /// Excerpts of the file name.
    pub highlighted_full_name: Vec<String>,
    /// Excerpts of the extracted text.
    pub highlighted_content: Vec<String>,
}

impl SearchResult {
    /// Builds a result from a hit's stored fields and raw score.
    pub fn assemble(
        stored: &StoredFields,
        score: f32,
        highlighter: &Highlighter,
    ) -> Result<Self, IndexError> {
        let document_type = stored.document_type()?;
        let text = |field| stored.require(field).map(str::to_string);
        let optional = |field| stored.get(field).map(str::to_string);
        let excerpts = |value: &str| highlighter.best_fragments(value);

        let document = match document_type {
            DocumentType::Page => {
                let title = text(SearchField::Title)?;
                let content = text(SearchField::Content)?;
                ResultDocument::Page(PageResult {
                    wiki: text(SearchField::Wiki)?,
                    page_full_name: text(SearchField::PageFullName)?,
                    highlighted_title: excerpts(&title),
                    highlighted_content: excerpts(&content),
                    title,
                    content,
                })
            }
            DocumentType::Message => {
                let subject = text(SearchField::Title)?;
                let body = text(SearchField::Content)?;
                ResultDocument::Message(MessageResult {
                    wiki: text(SearchField::Wiki)?,
                    page_full_name: text(SearchField::PageFullName)?,
                    datetime: parse_datetime(stored.require(SearchField::MessageDatetime)?)?,
                    highlighted_subject: excerpts(&subject),
                    highlighted_body: excerpts(&body),
                    subject,
                    body,
                })
            }
            DocumentType::Attachment => {
                let file_name = text(SearchField::Title)?;
                let content = text(SearchField::Content)?;
                ResultDocument::Attachment(AttachmentResult {
                    wiki: text(SearchField::Wiki)?,
                    page_full_name: text(SearchField::PageFullName)?,
                    highlighted_file_name: excerpts(&file_name),
                    highlighted_content: excerpts(&content),
                    file_name,
                    content,
                })
            }
            DocumentType::File => {
                let full_name = text(SearchField::Title)?;
                let content = optional(SearchField::Content);
                ResultDocument::File(FileResult {
                    wiki: text(SearchField::Wiki)?,
                    highlighted_full_name: excerpts(&full_name),
                    highlighted_content: content.as_deref().map(excerpts).unwrap_or_default(),
                    full_name,
                    content,
                })
            }
        };

        Ok(Self {
            document_type,
            relevance: score * RELEVANCE_SCALE,
            document,
        })
    }

    /// Full name of the page the document belongs to, if any.
    pub fn page_full_name(&self) -> Option<&str> {
        match &self.document {
            ResultDocument::Page(page) => Some(&page.page_full_name),
            ResultDocument::Message(message) => Some(&message.page_full_name),
            ResultDocument::Attachment(attachment) => Some(&attachment.page_full_name),
            ResultDocument::File(_) => None,
        }
    }
}

/// Parses a stored RFC 3339 timestamp.
fn parse_datetime(value: &str) -> Result<DateTime<Utc>, IndexError> {
    DateTime::parse_from_rfc3339(value)
        .map(|datetime| datetime.with_timezone(&Utc))
        .map_err(|err| {
            let message = format!("invalid stored message datetime '{value}': {err}");
            error!("{message}");
            IndexError::SchemaMismatch(message)
        })
}
