/// Thumbnail grid: geometry and widgets
///
/// Tiles have a fixed size and flow left to right, so the position of every
/// tile can be computed from the window width, the scroll offset and the
/// tile's index among the visible entries. `GridLayout` is the preview's
/// `LayoutSource`.
use iced::widget::{column, container, image, mouse_area, scrollable, text, Column, Row, Space};
use iced::{Element, Length, Size};
use std::collections::HashMap;

use super::Message;
use crate::preview::layout::{AnchorId, LayoutSource, Rect};
use crate::render::VIEW_SIZE;
use crate::thumbnails::ThumbnailEntry;

/// Image part of a tile (the preview anchor)
pub const TILE_SIZE: f32 = VIEW_SIZE as f32;
pub const LABEL_HEIGHT: f32 = 20.0;
pub const TILE_SPACING: f32 = 10.0;
pub const GRID_PADDING: f32 = 10.0;
/// Fixed height of the header above the grid
pub const HEADER_HEIGHT: f32 = 130.0;
/// Horizontal room kept free for the scrollbar
const SCROLLBAR_ALLOWANCE: f32 = 20.0;

#[derive(Debug, Clone)]
pub struct GridLayout {
    window: Size,
    scroll_y: f32,
    /// Visible ids -> position in the grid
    positions: HashMap<String, usize>,
}

impl GridLayout {
    pub fn new(window: Size) -> Self {
        Self {
            window,
            scroll_y: 0.0,
            positions: HashMap::new(),
        }
    }

    pub fn set_window(&mut self, window: Size) {
        self.window = window;
    }

    pub fn set_scroll(&mut self, offset_y: f32) {
        self.scroll_y = offset_y;
    }

    /// Replace the visible entries (after a filter change or a new entry)
    pub fn set_visible<'a>(&mut self, ids: impl Iterator<Item = &'a str>) {
        self.positions = ids
            .enumerate()
            .map(|(index, id)| (id.to_string(), index))
            .collect();
    }

    pub fn columns(&self) -> usize {
        let usable = self.window.width - 2.0 * GRID_PADDING - SCROLLBAR_ALLOWANCE + TILE_SPACING;
        ((usable / (TILE_SIZE + TILE_SPACING)).floor() as usize).max(1)
    }

    /// Window rectangle of the image of the tile at `index`
    pub fn tile_rect(&self, index: usize) -> Rect {
        let columns = self.columns();
        let (row, col) = (index / columns, index % columns);
        Rect {
            x: GRID_PADDING + col as f32 * (TILE_SIZE + TILE_SPACING),
            y: HEADER_HEIGHT + GRID_PADDING + row as f32 * (TILE_SIZE + LABEL_HEIGHT + TILE_SPACING)
                - self.scroll_y,
            width: TILE_SIZE,
            height: TILE_SIZE,
        }
    }
}

impl LayoutSource for GridLayout {
    fn anchor_rect(&self, anchor: &AnchorId) -> Option<Rect> {
        self.positions
            .get(&anchor.0)
            .map(|&index| self.tile_rect(index))
    }
}

/// The scrollable grid of visible entries
pub fn view<'a>(
    layout: &GridLayout,
    entries: Vec<&'a ThumbnailEntry>,
    images: &HashMap<String, image::Handle>,
) -> Element<'a, Message> {
    let columns = layout.columns();

    let rows: Vec<Element<'a, Message>> = entries
        .chunks(columns)
        .map(|chunk| {
            Row::with_children(
                chunk
                    .iter()
                    .map(|entry| tile(*entry, images.get(&entry.file.id))),
            )
            .spacing(TILE_SPACING)
            .into()
        })
        .collect();

    let grid = Column::with_children(rows)
        .spacing(TILE_SPACING)
        .padding(GRID_PADDING)
        .width(Length::Fill);

    scrollable(grid)
        .on_scroll(|viewport| Message::Scrolled(viewport.absolute_offset().y))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn tile<'a>(entry: &'a ThumbnailEntry, handle: Option<&image::Handle>) -> Element<'a, Message> {
    let picture: Element<'a, Message> = match handle {
        Some(handle) => image(handle.clone())
            .width(Length::Fixed(TILE_SIZE))
            .height(Length::Fixed(TILE_SIZE))
            .into(),
        None => Space::new(Length::Fixed(TILE_SIZE), Length::Fixed(TILE_SIZE)).into(),
    };

    let hovered = entry.file.id.clone();
    let picture = mouse_area(picture)
        .on_move(move |_| Message::ThumbnailHovered(hovered.clone()))
        .on_press(Message::ThumbnailPressed(entry.file.id.clone()));

    let label = container(text(entry.file.display_name()).size(13))
        .height(Length::Fixed(LABEL_HEIGHT))
        .center_x(Length::Fixed(TILE_SIZE))
        .clip(true);

    column![picture, label].width(Length::Fixed(TILE_SIZE)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(width: f32, ids: &[&str]) -> GridLayout {
        let mut layout = GridLayout::new(Size::new(width, 800.0));
        layout.set_visible(ids.iter().copied());
        layout
    }

    #[test]
    fn test_columns_follow_width() {
        // 2 * 10 padding + 20 scrollbar + 3 * 200 + 2 * 10 spacing
        assert_eq!(layout(660.0, &[]).columns(), 3);
        assert_eq!(layout(659.0, &[]).columns(), 2);
        assert_eq!(layout(50.0, &[]).columns(), 1);
    }

    #[test]
    fn test_anchor_rect_wraps_rows() {
        let grid = layout(660.0, &["a", "b", "c", "d"]);

        let a = grid.anchor_rect(&"a".into()).expect("a laid out");
        assert_eq!((a.x, a.y), (GRID_PADDING, HEADER_HEIGHT + GRID_PADDING));

        let d = grid.anchor_rect(&"d".into()).expect("d laid out");
        assert_eq!(d.x, a.x);
        assert_eq!(d.y, a.y + TILE_SIZE + LABEL_HEIGHT + TILE_SPACING);

        assert!(grid.anchor_rect(&"missing".into()).is_none());
    }

    #[test]
    fn test_scroll_moves_rects_up() {
        let mut grid = layout(660.0, &["a"]);
        grid.set_scroll(75.0);
        let a = grid.anchor_rect(&"a".into()).expect("a laid out");
        assert_eq!(a.y, HEADER_HEIGHT + GRID_PADDING - 75.0);
    }

    #[test]
    fn test_filtering_reindexes() {
        let mut grid = layout(660.0, &["a", "b"]);
        grid.set_visible(["b"].into_iter());
        let b = grid.anchor_rect(&"b".into()).expect("b laid out");
        assert_eq!(b.x, GRID_PADDING);
        assert!(grid.anchor_rect(&"a".into()).is_none());
    }
}
