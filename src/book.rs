//! Book document model and the JSON loader that validates it.
//!
//! A `Book` is replaced wholesale on every load. Everything downstream (plates,
//! previews, navigation) assumes the invariants enforced by [`Book::validate`].

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, FolderNaming, Result};

/// A validated book: metadata plus ordered pages of excerpts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Grouping key and archive filename stem (may be empty)
    pub id: String,
    pub title: String,
    pub author: String,
    /// Pages in source order
    pub pages: Vec<Page>,
}

/// One page of the book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Author-assigned display ordinal, not necessarily contiguous
    pub number: i64,
    /// One excerpt per plate, in display order
    pub content: Vec<String>,
}

impl Book {
    /// Parse a JSON document and validate it.
    ///
    /// Field presence and types are enforced by deserialization; the
    /// structural checks live in [`Book::validate`].
    ///
    /// ```
    /// let book = facsimile::Book::from_json(
    ///     r#"{"id":"bk","title":"T","author":"A","pages":[{"number":1,"content":["x"]}]}"#,
    /// ).unwrap();
    /// assert_eq!(book.plate_count(), 1);
    /// ```
    pub fn from_json(text: &str) -> Result<Self> {
        let book: Book = serde_json::from_str(text)?;
        book.validate()?;
        Ok(book)
    }

    /// Check the invariants the plate pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.pages.is_empty() {
            return Err(Error::InvalidDocument("book has no pages".into()));
        }
        if self.id.contains(['/', '\\']) {
            return Err(Error::InvalidDocument(format!(
                "book id {:?} must not contain path separators",
                self.id
            )));
        }

        let mut seen = HashSet::new();
        for page in &self.pages {
            if !seen.insert(page.number) {
                return Err(Error::InvalidDocument(format!(
                    "page number {} appears more than once",
                    page.number
                )));
            }
        }
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total number of excerpts across all pages
    pub fn plate_count(&self) -> usize {
        self.pages.iter().map(|p| p.content.len()).sum()
    }

    /// Archive file name, falling back to `fallback` when the id is empty
    pub fn archive_name(&self, fallback: &str) -> String {
        if self.id.is_empty() {
            format!("{}.zip", fallback)
        } else {
            format!("{}.zip", self.id)
        }
    }
}

/// Identifier of a page container: `bookId-pageNumber`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageId {
    pub book_id: String,
    pub page_number: i64,
}

impl PageId {
    pub fn new(book_id: impl Into<String>, page_number: i64) -> Self {
        Self {
            book_id: book_id.into(),
            page_number,
        }
    }

    /// Archive folder for this page.
    ///
    /// `Concatenated` joins id and number with nothing in between (`bk` and
    /// `17` give `bk17`), which is what existing archives contain.
    pub fn folder(&self, naming: FolderNaming) -> String {
        match naming {
            FolderNaming::Concatenated => format!("{}{}", self.book_id, self.page_number),
            FolderNaming::Separated(sep) => {
                format!("{}{}{}", self.book_id, sep, self.page_number)
            }
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.book_id, self.page_number)
    }
}

/// Identifier of a plate: `bookId-pageNumber-excerptIndex`.
///
/// The parts are kept structured so nothing ever has to split the rendered
/// string back apart (book ids may themselves contain dashes).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlateId {
    pub page: PageId,
    pub index: usize,
}

impl PlateId {
    pub fn new(book_id: impl Into<String>, page_number: i64, index: usize) -> Self {
        Self {
            page: PageId::new(book_id, page_number),
            index,
        }
    }

    /// File name used both for single downloads and inside the archive
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self, extension)
    }
}

impl fmt::Display for PlateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.page, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "id": "bk",
            "title": "Title",
            "author": "Author",
            "pages": [
                { "number": 1, "content": ["a", "b"] },
                { "number": 7, "content": ["c"] }
            ]
        }"#
    }

    #[test]
    fn from_json_loads_pages_in_source_order() {
        let book = Book::from_json(sample_json()).unwrap();
        assert_eq!(book.page_count(), 2);
        assert_eq!(book.plate_count(), 3);
        assert_eq!(book.pages[1].number, 7);
        assert_eq!(book.pages[1].content, vec!["c".to_string()]);
    }

    #[test]
    fn missing_fields_are_rejected() {
        let err = Book::from_json(r#"{"id":"bk","title":"T","pages":[]}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }

    #[test]
    fn mistyped_content_is_rejected() {
        let text = r#"{"id":"bk","title":"T","author":"A","pages":[{"number":1,"content":[3]}]}"#;
        assert!(matches!(Book::from_json(text), Err(Error::InvalidDocument(_))));
    }

    #[test]
    fn empty_page_list_is_rejected() {
        let text = r#"{"id":"bk","title":"T","author":"A","pages":[]}"#;
        let err = Book::from_json(text).unwrap_err();
        assert!(err.to_string().contains("no pages"));
    }

    #[test]
    fn duplicate_page_numbers_are_rejected() {
        let text = r#"{"id":"bk","title":"T","author":"A","pages":[
            {"number":2,"content":["a"]},{"number":2,"content":["b"]}]}"#;
        let err = Book::from_json(text).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn path_separators_in_id_are_rejected() {
        let text = r#"{"id":"../bk","title":"T","author":"A","pages":[{"number":1,"content":[]}]}"#;
        assert!(Book::from_json(text).is_err());
    }

    #[test]
    fn archive_name_falls_back_for_empty_id() {
        let mut book = Book::from_json(sample_json()).unwrap();
        assert_eq!(book.archive_name("facsimile-results"), "bk.zip");
        book.id.clear();
        assert_eq!(book.archive_name("facsimile-results"), "facsimile-results.zip");
    }

    #[test]
    fn plate_id_formats_and_folders() {
        let id = PlateId::new("bk", 7, 0);
        assert_eq!(id.to_string(), "bk-7-0");
        assert_eq!(id.page.to_string(), "bk-7");
        assert_eq!(id.page.folder(FolderNaming::Concatenated), "bk7");
        assert_eq!(id.page.folder(FolderNaming::Separated('-')), "bk-7");
        assert_eq!(id.file_name("png"), "bk-7-0.png");
    }

    #[test]
    fn dashed_book_ids_keep_their_folder() {
        let id = PlateId::new("my-book", 3, 1);
        assert_eq!(id.to_string(), "my-book-3-1");
        assert_eq!(id.page.folder(FolderNaming::Concatenated), "my-book3");
    }
}
