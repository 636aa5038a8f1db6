//! Plate generation: one page container per page, one plate per excerpt.
//!
//! The gallery is the crate's stand-in for a rendered document tree. It keeps
//! pages and plates in construction order so nothing downstream depends on a
//! traversal order of some host surface.

use crate::book::{Book, PageId, PlateId};
use crate::StudioConfig;

pub const PAGE_CLASS: &str = "page";
pub const PLATE_CLASS: &str = "plate";
pub const PLATE_BLOCK_CLASS: &str = "plate-block";
pub const CONTENT_CLASS: &str = "content";
pub const REFERENCE_CLASS: &str = "reference";
pub const AUTHOR_CLASS: &str = "author";
pub const TITLE_CLASS: &str = "title";
pub const PREVIEW_CLASS: &str = "preview";

/// Where a page container currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Freshly generated, the small-page browsing container
    Staging,
    /// Shared region the capture pass moves pages into
    Summary,
}

/// A styled visual element handed to the rasterizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: &'static str,
    pub class: &'static str,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: &'static str, class: &'static str) -> Self {
        Self {
            tag,
            class,
            text: None,
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn append(&mut self, child: Element) {
        self.children.push(child);
    }

    /// First element with `class` in depth-first document order, self included
    pub fn find_class(&self, class: &str) -> Option<&Element> {
        if self.class == class {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_class(class))
    }

    /// Concatenated text of this element and its descendants
    pub fn text_content(&self) -> String {
        let mut out = self.text.clone().unwrap_or_default();
        for child in &self.children {
            out.push_str(&child.text_content());
        }
        out
    }
}

/// One plate: a single excerpt plus attribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateNode {
    pub id: PlateId,
    pub content: String,
    pub author: String,
    pub title: String,
    visible: bool,
}

impl PlateNode {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Plates are never mutated after creation, only hidden once captured.
    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Build the element tree: content paragraph, then a reference block with
    /// author and title.
    pub fn element(&self) -> Element {
        let mut reference = Element::new("div", REFERENCE_CLASS);
        reference.append(Element::new("p", AUTHOR_CLASS).with_text(&self.author));
        reference.append(Element::new("p", TITLE_CLASS).with_text(&self.title));

        let mut block = Element::new("div", PLATE_BLOCK_CLASS);
        block.append(Element::new("p", CONTENT_CLASS).with_text(&self.content));
        block.append(reference);

        let mut plate = Element::new("div", PLATE_CLASS);
        plate.append(block);
        plate
    }
}

/// A page container with its plates and, after capture, its previews
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNode {
    pub id: PageId,
    pub plates: Vec<PlateNode>,
    /// Previews attached by the capture pass, in completion order
    pub previews: Vec<PlateId>,
    pub region: Region,
    pub visible: bool,
}

impl PageNode {
    /// Build the page container: plates still showing, then the previews
    /// that replaced captured ones, in attachment order.
    pub fn element(&self) -> Element {
        let mut page = Element::new("section", PAGE_CLASS);
        for plate in self.plates.iter().filter(|p| p.is_visible()) {
            page.append(plate.element());
        }
        for id in &self.previews {
            page.append(Element::new("img", PREVIEW_CLASS).with_text(id.to_string()));
        }
        page
    }
}

/// All generated pages for one book render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gallery {
    pub book_id: String,
    pub pages: Vec<PageNode>,
    /// Surface scale factor, 1 until a capture pass expands it
    pub scale: u32,
}

impl Gallery {
    /// Plate ids in construction order: page order, then excerpt order
    pub fn plate_ids(&self) -> Vec<PlateId> {
        self.pages
            .iter()
            .flat_map(|p| p.plates.iter().map(|plate| plate.id.clone()))
            .collect()
    }

    pub fn plate(&self, id: &PlateId) -> Option<&PlateNode> {
        self.pages
            .iter()
            .flat_map(|p| p.plates.iter())
            .find(|plate| &plate.id == id)
    }

    pub fn plate_count(&self) -> usize {
        self.pages.iter().map(|p| p.plates.len()).sum()
    }

    /// Height of the summary surface at the current scale: one row of plates
    /// per page, separated by `page_gap`.
    pub fn surface_height(&self, config: &StudioConfig) -> u64 {
        let row = config.plate_size.height as u64 * self.scale as u64 + config.page_gap as u64;
        row * self.pages.len() as u64
    }
}

/// Build the page and plate structure for `book`.
///
/// The result is a fresh value, so regenerating means replacing the previous
/// gallery; holding on to an old one and merging is the caller's mistake.
pub fn generate_plates(book: &Book) -> Gallery {
    let pages = book
        .pages
        .iter()
        .map(|page| {
            let plates = page
                .content
                .iter()
                .enumerate()
                .map(|(index, excerpt)| PlateNode {
                    id: PlateId::new(book.id.clone(), page.number, index),
                    content: excerpt.clone(),
                    author: book.author.clone(),
                    title: book.title.clone(),
                    visible: true,
                })
                .collect();
            PageNode {
                id: PageId::new(book.id.clone(), page.number),
                plates,
                previews: Vec::new(),
                region: Region::Staging,
                visible: true,
            }
        })
        .collect();

    Gallery {
        book_id: book.id.clone(),
        pages,
        scale: 1,
    }
}
