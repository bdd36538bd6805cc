//! Indexing operations.
//!
//! Each operation takes the store's write lock, applies one structural change, commits
//! and releases the lock on every exit path. Indexing an entity replaces any document
//! previously indexed under the same key, so re-indexing a modified page never leaves
//! a stale copy behind.

use tracing::debug;

use crate::{
    IndexError,
    document::{IndexDocument, Message, PageAttachment, PageContent, PageRef, WikiFile},
    schema::{DocumentType, SearchField},
    store::{IndexStore, StoreWriter},
};

impl IndexStore {
    /// Indexes a page, replacing any earlier version of it.
    pub fn index_page(&self, page: &PageContent) -> Result<(), IndexError> {
        debug!(wiki = %page.wiki, page = %page.full_name, "indexing page");
        self.apply(|writer| {
            writer.delete_matching(&[
                (SearchField::DocumentType, DocumentType::Page.as_str()),
                (SearchField::PageFullName, &page.full_name),
            ])?;
            writer.add(&IndexDocument::Page(page.clone()))
        })
    }

    /// Indexes a message posted on `page`, replacing any earlier version of it.
    pub fn index_message(&self, message: &Message, page: &PageRef) -> Result<(), IndexError> {
        debug!(wiki = %page.wiki, page = %page.full_name, message = message.id, "indexing message");
        let id = message.id.to_string();
        self.apply(|writer| {
            writer.delete_matching(&[
                (SearchField::PageFullName, &page.full_name),
                (SearchField::MessageId, &id),
            ])?;
            writer.add(&IndexDocument::Message {
                page: page.clone(),
                message: message.clone(),
            })
        })
    }

    /// Indexes an attachment of `page`, replacing any earlier version of it.
    pub fn index_attachment(
        &self,
        attachment: &PageAttachment,
        page: &PageRef,
    ) -> Result<(), IndexError> {
        debug!(
            wiki = %page.wiki,
            page = %page.full_name,
            file = %attachment.file_name,
            has_content = !attachment.content.is_empty(),
            "indexing attachment"
        );
        self.apply(|writer| {
            writer.delete_matching(&attachment_key(&attachment.file_name, page))?;
            writer.add(&IndexDocument::Attachment {
                page: page.clone(),
                attachment: attachment.clone(),
            })
        })
    }

    /// Indexes a wiki-level file, replacing any earlier version of it.
    pub fn index_file(&self, file: &WikiFile) -> Result<(), IndexError> {
        debug!(wiki = %file.wiki, file = %file.full_name, "indexing file");
        self.apply(|writer| {
            writer.delete_matching(&file_key(&file.full_name))?;
            writer.add(&IndexDocument::File(file.clone()))
        })
    }

    /// Removes every document indexed under `page`: the page itself and its messages
    /// and attachments. Removing a page that is not indexed is a no-op.
    pub fn unindex_page(&self, page: &PageRef) -> Result<(), IndexError> {
        debug!(wiki = %page.wiki, page = %page.full_name, "unindexing page");
        self.apply(|writer| writer.delete_matching(&[(SearchField::PageFullName, &page.full_name)]))
    }

    /// Removes one message of `page`.
    pub fn unindex_message(&self, message_id: u64, page: &PageRef) -> Result<(), IndexError> {
        debug!(wiki = %page.wiki, page = %page.full_name, message = message_id, "unindexing message");
        let id = message_id.to_string();
        self.apply(|writer| {
            writer.delete_matching(&[
                (SearchField::PageFullName, &page.full_name),
                (SearchField::MessageId, &id),
            ])
        })
    }

    /// Removes one attachment of `page`.
    pub fn unindex_attachment(&self, file_name: &str, page: &PageRef) -> Result<(), IndexError> {
        debug!(wiki = %page.wiki, page = %page.full_name, file = file_name, "unindexing attachment");
        self.apply(|writer| writer.delete_matching(&attachment_key(file_name, page)))
    }

    /// Removes a wiki-level file.
    pub fn unindex_file(&self, full_name: &str) -> Result<(), IndexError> {
        debug!(wiki = %self.wiki(), file = full_name, "unindexing file");
        self.apply(|writer| writer.delete_matching(&file_key(full_name)))
    }

    /// Moves a page to a new name in a single commit.
    ///
    /// Everything indexed under `old_full_name` is removed; the caller re-indexes the
    /// page's messages and attachments under the new name.
    pub fn rename_page(&self, old_full_name: &str, page: &PageContent) -> Result<(), IndexError> {
        debug!(wiki = %page.wiki, from = old_full_name, to = %page.full_name, "renaming page");
        self.apply(|writer| {
            writer.delete_matching(&[(SearchField::PageFullName, old_full_name)])?;
            writer.delete_matching(&[
                (SearchField::DocumentType, DocumentType::Page.as_str()),
                (SearchField::PageFullName, &page.full_name),
            ])?;
            writer.add(&IndexDocument::Page(page.clone()))
        })
    }

    /// Replaces the whole index with `documents` in a single commit.
    ///
    /// Returns the number of documents written. If any document fails, nothing changes.
    pub fn rebuild<I>(&self, documents: I) -> Result<usize, IndexError>
    where
        I: IntoIterator<Item = IndexDocument>,
    {
        let mut written = 0;
        self.apply(|writer| {
            writer.delete_all()?;
            for document in documents {
                writer.add(&document)?;
                written += 1;
            }
            Ok(())
        })?;
        debug!(wiki = %self.wiki(), documents = written, "rebuilt index");
        Ok(written)
    }

    /// Runs `change` inside one writer session and commits it.
    fn apply<F>(&self, change: F) -> Result<(), IndexError>
    where
        F: FnOnce(&mut StoreWriter<'_>) -> Result<(), IndexError>,
    {
        let mut writer = self.writer()?;
        change(&mut writer)?;
        writer.commit()
    }
}

/// Exact-match key of an attachment.
fn attachment_key<'a>(file_name: &'a str, page: &'a PageRef) -> [(SearchField, &'a str); 3] {
    [
        (SearchField::DocumentType, DocumentType::Attachment.as_str()),
        (SearchField::PageFullName, &page.full_name),
        (SearchField::FileName, file_name),
    ]
}

/// Exact-match key of a wiki-level file.
fn file_key(full_name: &str) -> [(SearchField, &str); 2] {
    [
        (SearchField::DocumentType, DocumentType::File.as_str()),
        (SearchField::FileName, full_name),
    ]
}
