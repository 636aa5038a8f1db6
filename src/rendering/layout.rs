/// Box layout for a single plate
///
/// Plates have a fixed frame: the excerpt flows from the top, the reference
/// block (author over title) sits against the bottom edge. Text is measured
/// in fixed-size cells, scaled with the surface.

use crate::gallery::{Element, AUTHOR_CLASS, CONTENT_CLASS, TITLE_CLASS};
use crate::PlateSize;

/// Unscaled frame padding
const PADDING: u32 = 16;
/// Unscaled content cell (width, height)
const CONTENT_CELL: (u32, u32) = (6, 12);
/// Unscaled reference cell (width, height)
const REFERENCE_CELL: (u32, u32) = (5, 10);
/// Unscaled gap between author and title lines
const REFERENCE_GAP: u32 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxModel {
    pub margin: u32,
    pub border: u32,
    pub padding: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub rect: Rect,
    pub box_model: BoxModel,
}

impl LayoutBox {
    pub fn content_width(&self) -> u32 {
        let total = self.box_model.margin + self.box_model.border + self.box_model.padding;
        self.rect.width.saturating_sub(total)
    }
}

/// Which part of the plate a node renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Content,
    Author,
    Title,
}

/// Size of one text cell in surface pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub width: u32,
    pub height: u32,
}

/// A layout node couples a `LayoutBox` with wrapped text and its role.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub lb: LayoutBox,
    /// Wrapped lines joined with `\n`
    pub text: String,
    pub elem_type: ElementType,
    pub cell: Cell,
}

/// Lay out a plate element on a `size` frame scaled by `scale`.
/// - Content wraps to the frame width and is cut off above the reference block
/// - Author and title are single lines anchored to the bottom
pub fn layout_plate(plate: &Element, size: PlateSize, scale: u32) -> Vec<LayoutNode> {
    let scale = scale.max(1);
    let PlateSize { width, height } = size.scaled(scale);
    let padding = PADDING.saturating_mul(scale);
    let inner_w = width.saturating_sub(padding.saturating_mul(2));

    let ref_cell = Cell {
        width: REFERENCE_CELL.0.saturating_mul(scale),
        height: REFERENCE_CELL.1.saturating_mul(scale),
    };
    let content_cell = Cell {
        width: CONTENT_CELL.0.saturating_mul(scale),
        height: CONTENT_CELL.1.saturating_mul(scale),
    };

    let text_of = |class: &str| {
        plate
            .find_class(class)
            .map(|e| e.text_content())
            .unwrap_or_default()
    };

    let mut nodes = Vec::new();

    // Reference block first so the content knows where to stop
    let title_y = height.saturating_sub(padding.saturating_add(ref_cell.height));
    let author_y = title_y
        .saturating_sub(ref_cell.height.saturating_add(REFERENCE_GAP.saturating_mul(scale)));
    for (class, elem_type, y) in [
        (AUTHOR_CLASS, ElementType::Author, author_y),
        (TITLE_CLASS, ElementType::Title, title_y),
    ] {
        let lines = wrap(&text_of(class), chars_per_line(inner_w, ref_cell));
        let text = lines.into_iter().next().unwrap_or_default();
        nodes.push(LayoutNode {
            lb: line_box(padding, y, inner_w, ref_cell.height),
            text,
            elem_type,
            cell: ref_cell,
        });
    }

    let content_bottom = author_y.saturating_sub(padding);
    let max_lines = (content_bottom.saturating_sub(padding) / content_cell.height) as usize;
    let mut lines = wrap(&text_of(CONTENT_CLASS), chars_per_line(inner_w, content_cell));
    lines.truncate(max_lines);
    let lines_count = (lines.len() as u32).max(1);
    nodes.insert(
        0,
        LayoutNode {
            lb: line_box(padding, padding, inner_w, lines_count.saturating_mul(content_cell.height)),
            text: lines.join("\n"),
            elem_type: ElementType::Content,
            cell: content_cell,
        },
    );

    nodes
}

fn line_box(x: u32, y: u32, width: u32, height: u32) -> LayoutBox {
    LayoutBox {
        rect: Rect {
            x: x as i32,
            y: y as i32,
            width,
            height,
        },
        box_model: BoxModel {
            margin: 0,
            border: 0,
            padding: 0,
        },
    }
}

fn chars_per_line(width: u32, cell: Cell) -> usize {
    if cell.width == 0 {
        return 1;
    }
    ((width / cell.width) as usize).max(1)
}

/// Greedy word wrap; words longer than a line are split across lines.
pub fn wrap(text: &str, chars_per_line: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut cur = String::new();
    let mut cur_len = 0usize;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > chars_per_line {
            if cur_len > 0 {
                lines.push(std::mem::take(&mut cur));
                cur_len = 0;
            }
            lines.push(chars.drain(..chars_per_line).collect());
        }
        let word_len = chars.len();
        if word_len == 0 {
            continue;
        }
        if cur_len > 0 && cur_len + 1 + word_len > chars_per_line {
            lines.push(std::mem::take(&mut cur));
            cur_len = 0;
        }
        if cur_len > 0 {
            cur.push(' ');
            cur_len += 1;
        }
        cur.extend(chars);
        cur_len += word_len;
    }
    if cur_len > 0 {
        lines.push(cur);
    }
    lines
}
