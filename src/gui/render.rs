//! Paints the widget tree with egui, once per frame
//!
//! Arrangements map onto egui layouts. A stretch splits an arrangement: what
//! comes before it packs from the start, what follows packs from the end.
//! Only the first stretch splits; `A stretch B stretch C` paints as
//! `A stretch B C`. Expanding children share the remaining main-axis space.

use std::collections::HashMap;

use eframe::egui::{self, Align, Color32, Layout, Margin, RichText, Sense, TextWrapMode, Ui, Vec2};
use tracing::trace;

use super::constants::*;
use crate::toolkit::{
    Alignment, Direction, Handle, LayoutHost, LayoutItem, Rgb, Role, SizePolicy, Style,
    TextBearing, TitleBearing, Toolkit,
};

/// Icon textures uploaded so far, keyed by pixmap key
#[derive(Default)]
pub struct TextureCache {
    textures: HashMap<String, egui::TextureHandle>,
}

impl TextureCache {
    fn texture(&mut self, ctx: &egui::Context, handle: &Handle) -> Option<egui::TextureHandle> {
        let widget = handle.borrow();
        let pixmap = widget.image_bearing()?.pixmap()?;
        let texture = self
            .textures
            .entry(pixmap.key().to_string())
            .or_insert_with(|| {
                trace!(key = pixmap.key(), "uploading icon texture");
                let size = [pixmap.width() as usize, pixmap.height() as usize];
                let image = egui::ColorImage::from_rgba_unmultiplied(size, pixmap.rgba());
                ctx.load_texture(pixmap.key(), image, egui::TextureOptions::LINEAR)
            });
        Some(texture.clone())
    }
}

/// Snapshot of what a widget draws, taken so no borrow is held while its
/// children render or its click handler runs
enum Shape {
    Arrangement(Direction, Vec<LayoutItem>),
    Label { text: String, wrap: bool },
    Button { text: String, layout: Option<Handle> },
    GroupBox { title: String, layout: Option<Handle> },
    Panel(Option<Handle>),
    ScrollArea(Option<Handle>),
}

impl Shape {
    fn of(role: &Role) -> Self {
        match role {
            Role::Arrangement(arrangement) => {
                Shape::Arrangement(arrangement.direction, arrangement.items.clone())
            }
            Role::Label(label) => Shape::Label {
                text: label.text().to_string(),
                wrap: label.word_wrap,
            },
            Role::Button(button) => Shape::Button {
                text: button.text().to_string(),
                layout: button.layout().cloned(),
            },
            Role::GroupBox(group) => Shape::GroupBox {
                title: group.title().to_string(),
                layout: group.layout().cloned(),
            },
            Role::Panel(container) => Shape::Panel(container.layout().cloned()),
            Role::ScrollArea(container) => Shape::ScrollArea(container.layout().cloned()),
        }
    }
}

pub struct Painter<'a> {
    toolkit: &'a Toolkit,
    textures: &'a mut TextureCache,
    clicked: bool,
}

impl<'a> Painter<'a> {
    pub fn new(toolkit: &'a Toolkit, textures: &'a mut TextureCache) -> Self {
        Self {
            toolkit,
            textures,
            clicked: false,
        }
    }

    /// Whether any widget was clicked while painting
    pub fn clicked(&self) -> bool {
        self.clicked
    }

    pub fn widget(&mut self, ui: &mut Ui, handle: &Handle) {
        if !handle.borrow().is_visible() {
            return;
        }
        self.toolkit.ensure_polished(handle);
        let (shape, style, expanding) = {
            let widget = handle.borrow();
            (
                Shape::of(widget.role()),
                widget.computed_style().cloned().unwrap_or_default(),
                widget.size_policy() == SizePolicy::Expanding,
            )
        };

        match shape {
            Shape::Arrangement(direction, items) => self.arrangement(ui, direction, &items),
            Shape::Label { text, wrap } => self.label(ui, handle, &text, wrap, &style),
            Shape::Button { text, layout } => {
                self.button(ui, handle, &text, layout.as_ref(), &style, expanding)
            }
            Shape::GroupBox { title, layout } => {
                let mut frame = egui::Frame::group(ui.style());
                if let Some(background) = style.background {
                    frame = frame.fill(color(background));
                }
                frame.show(ui, |ui| {
                    fill_width(ui, expanding);
                    apply_height(ui, &style);
                    ui.vertical(|ui| {
                        if !title.is_empty() {
                            ui.label(rich_text(&title, &style));
                        }
                        if let Some(layout) = &layout {
                            self.widget(ui, layout);
                        }
                    });
                });
            }
            Shape::Panel(layout) => {
                let fill = style.background.map_or(Color32::TRANSPARENT, color);
                egui::Frame::new()
                    .fill(fill)
                    .inner_margin(Margin::same(PANEL_PADDING))
                    .show(ui, |ui| {
                        let available = ui.available_size();
                        ui.set_min_size(Vec2::new(finite(available.x), finite(available.y)));
                        if let Some(layout) = &layout {
                            self.widget(ui, layout);
                        }
                    });
            }
            Shape::ScrollArea(layout) => {
                egui::ScrollArea::vertical()
                    .id_salt(handle.key())
                    .auto_shrink([!expanding, true])
                    .show(ui, |ui| {
                        if let Some(layout) = &layout {
                            self.widget(ui, layout);
                        }
                    });
            }
        }
    }

    fn label(&mut self, ui: &mut Ui, handle: &Handle, text: &str, wrap: bool, style: &Style) {
        if let Some(texture) = self.textures.texture(ui.ctx(), handle) {
            ui.image((texture.id(), texture.size_vec2()));
            return;
        }
        let mode = if wrap {
            TextWrapMode::Wrap
        } else {
            TextWrapMode::Extend
        };
        ui.add(egui::Label::new(rich_text(text, style)).wrap_mode(mode));
    }

    /// Buttons are framed areas, so they can host a whole layout
    fn button(
        &mut self,
        ui: &mut Ui,
        handle: &Handle,
        text: &str,
        layout: Option<&Handle>,
        style: &Style,
        expanding: bool,
    ) {
        let fill = style.background.map_or(DEFAULT_BUTTON_FILL, color);
        let inner = egui::Frame::new()
            .fill(fill)
            .corner_radius(CORNER_RADIUS)
            .inner_margin(Margin::same(BUTTON_PADDING))
            .show(ui, |ui| {
                fill_width(ui, expanding);
                apply_height(ui, style);
                match layout {
                    Some(layout) => self.widget(ui, layout),
                    None => {
                        ui.vertical_centered(|ui| ui.label(rich_text(text, style)));
                    }
                }
            });

        let response = inner
            .response
            .interact(Sense::click())
            .on_hover_cursor(egui::CursorIcon::PointingHand);
        if response.clicked() {
            self.clicked = true;
            if !handle.click() {
                trace!(?handle, "clicked button has no handler");
            }
        }
    }

    fn arrangement(&mut self, ui: &mut Ui, direction: Direction, items: &[LayoutItem]) {
        let (leading, trailing) = split_at_stretch(items);
        let mut expanding_left = leading.iter().filter(|item| is_expanding(item)).count();

        let (layout, tail_layout) = match direction {
            Direction::Horizontal => (
                Layout::left_to_right(Align::Min),
                Layout::right_to_left(Align::Min),
            ),
            Direction::Vertical => (Layout::top_down(Align::Min), Layout::bottom_up(Align::Min)),
        };

        ui.with_layout(layout, |ui| {
            ui.spacing_mut().item_spacing = Vec2::splat(ITEM_SPACING);
            for item in leading {
                self.item(ui, item, direction, &mut expanding_left);
            }
            if trailing.iter().any(|item| item.handle().is_some()) {
                ui.with_layout(tail_layout, |ui| {
                    let mut none_left = 0;
                    for item in trailing.iter().rev() {
                        self.item(ui, item, direction, &mut none_left);
                    }
                });
            }
        });
    }

    fn item(
        &mut self,
        ui: &mut Ui,
        item: &LayoutItem,
        direction: Direction,
        expanding_left: &mut usize,
    ) {
        let Some(child) = item.handle() else {
            return;
        };
        let (visible, expanding, alignment) = {
            let widget = child.borrow();
            (
                widget.is_visible(),
                widget.size_policy() == SizePolicy::Expanding,
                widget.alignment(),
            )
        };
        if !visible {
            return;
        }

        if expanding && *expanding_left > 0 {
            let (max, min) = share(ui, direction, *expanding_left);
            *expanding_left -= 1;
            ui.allocate_ui_with_layout(max, Layout::top_down(Align::Min), |ui| {
                ui.set_min_size(min);
                self.widget(ui, child);
            });
            return;
        }

        match (direction, alignment) {
            (Direction::Vertical, Some(alignment)) => {
                ui.with_layout(Layout::top_down(align(alignment)), |ui| {
                    self.widget(ui, child);
                });
            }
            _ => self.widget(ui, child),
        }
    }
}

/// Items before and after the first stretch. egui has no notion of spare
/// space shared between several stretches, so only the first one splits;
/// any later stretch stays in the trailing run and paints as nothing.
fn split_at_stretch(items: &[LayoutItem]) -> (&[LayoutItem], &[LayoutItem]) {
    match items
        .iter()
        .position(|item| matches!(item, LayoutItem::Stretch))
    {
        Some(index) => (&items[..index], &items[index + 1..]),
        None => (items, &[]),
    }
}

fn is_expanding(item: &LayoutItem) -> bool {
    item.handle().is_some_and(|handle| {
        let widget = handle.borrow();
        widget.is_visible() && widget.size_policy() == SizePolicy::Expanding
    })
}

/// Maximum and minimum size for the next of `count` expanding children.
/// Only the main axis is shared; a vertical arrangement also fills its width.
fn share(ui: &Ui, direction: Direction, count: usize) -> (Vec2, Vec2) {
    let available = ui.available_size();
    let gaps = ITEM_SPACING * (count - 1) as f32;
    match direction {
        Direction::Horizontal => {
            let width = ((available.x - gaps) / count as f32).max(0.0);
            (Vec2::new(width, available.y), Vec2::new(finite(width), 0.0))
        }
        Direction::Vertical => {
            let height = ((available.y - gaps) / count as f32).max(0.0);
            (
                Vec2::new(available.x, height),
                Vec2::new(finite(available.x), finite(height)),
            )
        }
    }
}

fn fill_width(ui: &mut Ui, expanding: bool) {
    if expanding {
        ui.set_min_width(finite(ui.available_width()));
    }
}

fn apply_height(ui: &mut Ui, style: &Style) {
    if let Some(min) = style.height.or(style.min_height) {
        ui.set_min_height(min);
    }
    if let Some(height) = style.height {
        ui.set_max_height(height);
    }
}

/// Scroll areas report unbounded space
fn finite(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}

fn align(alignment: Alignment) -> Align {
    match alignment {
        Alignment::Left => Align::Min,
        Alignment::Center => Align::Center,
        Alignment::Right => Align::Max,
    }
}

fn color(rgb: Rgb) -> Color32 {
    Color32::from_rgb(rgb.r, rgb.g, rgb.b)
}

fn rich_text(text: &str, style: &Style) -> RichText {
    let mut rich = RichText::new(text);
    if let Some(rgb) = style.color {
        rich = rich.color(color(rgb));
    }
    if let Some(size) = style.font_size {
        rich = rich.size(size);
    }
    if style.bold == Some(true) {
        rich = rich.strong();
    }
    rich
}
