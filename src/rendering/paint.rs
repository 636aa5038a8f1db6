/// Paint command set for plates

use crate::rendering::layout::{Cell, ElementType, LayoutNode};
use crate::style::{PlateStyle, Rgba};

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    /// Fill the whole surface with a gradient running bottom (first stop) to
    /// top (last stop)
    VerticalGradient { stops: Vec<Rgba> },
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    /// Text drawn as one filled cell per visible glyph
    Text {
        x: i32,
        y: i32,
        text: String,
        cell: Cell,
        rgba: Rgba,
    },
}

/// Turn a plate layout into an ordered display list
pub fn build_display_list(nodes: &[LayoutNode], style: &PlateStyle) -> Vec<PaintCommand> {
    let text = style.text_rgba();
    let mut commands = vec![PaintCommand::VerticalGradient {
        stops: style.background_rgba(),
    }];

    for node in nodes {
        if node.elem_type == ElementType::Author {
            // rule separating the excerpt from its attribution
            commands.push(PaintCommand::SolidRect {
                x: node.lb.rect.x,
                y: node.lb.rect.y - (node.cell.height / 2) as i32,
                width: node.lb.rect.width / 4,
                height: (node.cell.height / 10).max(1),
                rgba: text,
            });
        }
        for (i, line) in node.text.lines().enumerate() {
            commands.push(PaintCommand::Text {
                x: node.lb.rect.x,
                y: node.lb.rect.y + (i as u32 * node.cell.height) as i32,
                text: line.to_string(),
                cell: node.cell,
                rgba: text,
            });
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::layout::{BoxModel, LayoutBox, Rect};

    fn node(text: &str, y: i32) -> LayoutNode {
        LayoutNode {
            lb: LayoutBox {
                rect: Rect { x: 4, y, width: 100, height: 20 },
                box_model: BoxModel { margin: 0, border: 0, padding: 0 },
            },
            text: text.to_string(),
            elem_type: ElementType::Content,
            cell: Cell { width: 6, height: 10 },
        }
    }

    #[test]
    fn display_list_starts_with_background() {
        let cmds = build_display_list(&[node("one\ntwo", 8)], &PlateStyle::default());
        assert!(matches!(cmds[0], PaintCommand::VerticalGradient { .. }));
        assert_eq!(cmds.len(), 3);
        match &cmds[2] {
            PaintCommand::Text { y, text, .. } => {
                assert_eq!(*y, 18);
                assert_eq!(text, "two");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn author_line_gets_a_rule() {
        let mut author = node("Author", 50);
        author.elem_type = ElementType::Author;
        let cmds = build_display_list(&[author], &PlateStyle::default());
        match &cmds[1] {
            PaintCommand::SolidRect { y, width, height, .. } => {
                assert_eq!(*y, 45);
                assert_eq!(*width, 25);
                assert_eq!(*height, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn text_uses_style_color() {
        let style = PlateStyle {
            text_color: Some("#ff0000".into()),
            background: Vec::new(),
        };
        let cmds = build_display_list(&[node("x", 0)], &style);
        match &cmds[1] {
            PaintCommand::Text { rgba, .. } => assert_eq!(*rgba, Rgba(255, 0, 0, 255)),
            other => panic!("unexpected {:?}", other),
        }
    }
}
