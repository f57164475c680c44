//! Retained widget tree that layout notation is built into
//!
//! Widgets are shared through [`Handle`]s (single-threaded `Rc<RefCell<_>>`).
//! Parents own their children; lookup tables elsewhere hold [`WeakHandle`]s.
//! Nothing in here paints: `gui::render` walks the tree every frame.

pub mod kinds;
pub mod pixmap;
pub mod style;

use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use tracing::trace;

pub use kinds::KindRegistry;
pub use pixmap::Pixmap;
pub use style::{Rgb, Style, StyleSheet};

/// Callback bound to a clickable widget
pub type ClickHandler = Rc<dyn Fn()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
    Center,
}

impl Alignment {
    /// Parse a notation alignment value (`left`, `right`, `center`/`hcenter`)
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "center" | "hcenter" => Some(Self::Center),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizePolicy {
    #[default]
    Preferred,
    /// Grow to fill available space in both axes
    Expanding,
}

/// One slot in an arrangement
#[derive(Clone)]
pub enum LayoutItem {
    Widget(Handle),
    Layout(Handle),
    /// Flexible empty space
    Stretch,
}

impl LayoutItem {
    pub fn handle(&self) -> Option<&Handle> {
        match self {
            LayoutItem::Widget(handle) | LayoutItem::Layout(handle) => Some(handle),
            LayoutItem::Stretch => None,
        }
    }
}

pub struct Arrangement {
    pub direction: Direction,
    pub items: Vec<LayoutItem>,
}

impl Arrangement {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item: LayoutItem) {
        self.items.push(item);
    }
}

#[derive(Default)]
pub struct Label {
    text: String,
    pixmap: Option<Pixmap>,
    pub word_wrap: bool,
}

#[derive(Default)]
pub struct Button {
    text: String,
    handler: Option<ClickHandler>,
    layout: Option<Handle>,
}

#[derive(Default)]
pub struct GroupBox {
    title: String,
    layout: Option<Handle>,
}

/// Plain container widget that only hosts a layout (panels, scroll areas)
#[derive(Default)]
pub struct Container {
    layout: Option<Handle>,
}

/// What a widget is, fixed when the kind factory creates it
pub enum Role {
    Arrangement(Arrangement),
    Label(Label),
    Button(Button),
    GroupBox(GroupBox),
    Panel(Container),
    ScrollArea(Container),
}

// Capabilities. Each role implements the ones it supports; callers ask the
// widget for a capability instead of checking its kind name.

pub trait TextBearing {
    fn text(&self) -> &str;
    fn set_text(&mut self, text: &str);
}

pub trait TitleBearing {
    fn title(&self) -> &str;
    fn set_title(&mut self, title: &str);
}

pub trait ImageBearing {
    fn pixmap(&self) -> Option<&Pixmap>;
    fn set_pixmap(&mut self, pixmap: Pixmap);
}

pub trait Clickable {
    fn click_handler(&self) -> Option<ClickHandler>;
    /// Bind `handler`, returning the subscription it replaced
    fn replace_click_handler(&mut self, handler: ClickHandler) -> Option<ClickHandler>;
}

pub trait LayoutHost {
    fn layout(&self) -> Option<&Handle>;
    fn set_layout(&mut self, layout: Handle);
}

impl TextBearing for Label {
    fn text(&self) -> &str {
        &self.text
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }
}

impl ImageBearing for Label {
    fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    fn set_pixmap(&mut self, pixmap: Pixmap) {
        self.pixmap = Some(pixmap);
    }
}

impl TextBearing for Button {
    fn text(&self) -> &str {
        &self.text
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }
}

impl Clickable for Button {
    fn click_handler(&self) -> Option<ClickHandler> {
        self.handler.clone()
    }

    fn replace_click_handler(&mut self, handler: ClickHandler) -> Option<ClickHandler> {
        self.handler.replace(handler)
    }
}

impl LayoutHost for Button {
    fn layout(&self) -> Option<&Handle> {
        self.layout.as_ref()
    }

    fn set_layout(&mut self, layout: Handle) {
        self.layout = Some(layout);
    }
}

impl TitleBearing for GroupBox {
    fn title(&self) -> &str {
        &self.title
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }
}

impl LayoutHost for GroupBox {
    fn layout(&self) -> Option<&Handle> {
        self.layout.as_ref()
    }

    fn set_layout(&mut self, layout: Handle) {
        self.layout = Some(layout);
    }
}

impl LayoutHost for Container {
    fn layout(&self) -> Option<&Handle> {
        self.layout.as_ref()
    }

    fn set_layout(&mut self, layout: Handle) {
        self.layout = Some(layout);
    }
}

/// Mutable access to whichever caption a widget carries
pub enum CaptionMut<'a> {
    Text(&'a mut dyn TextBearing),
    Title(&'a mut dyn TitleBearing),
}

pub struct Widget {
    kind: String,
    object_name: Option<String>,
    class: Option<String>,
    visible: bool,
    alignment: Option<Alignment>,
    size_policy: SizePolicy,
    inline_style: String,
    computed_style: Option<Style>,
    properties: BTreeMap<String, String>,
    role: Role,
}

impl Widget {
    pub fn new(kind: impl Into<String>, role: Role) -> Self {
        Self {
            kind: kind.into(),
            object_name: None,
            class: None,
            visible: true,
            alignment: None,
            size_policy: SizePolicy::default(),
            inline_style: String::new(),
            computed_style: None,
            properties: BTreeMap::new(),
            role,
        }
    }

    pub fn hbox() -> Self {
        Self::new("HBoxLayout", Role::Arrangement(Arrangement::new(Direction::Horizontal)))
    }

    pub fn vbox() -> Self {
        Self::new("VBoxLayout", Role::Arrangement(Arrangement::new(Direction::Vertical)))
    }

    pub fn label() -> Self {
        Self::new("Label", Role::Label(Label::default()))
    }

    pub fn button() -> Self {
        Self::new("Button", Role::Button(Button::default()))
    }

    pub fn group_box() -> Self {
        Self::new("GroupBox", Role::GroupBox(GroupBox::default()))
    }

    pub fn panel() -> Self {
        Self::new("Panel", Role::Panel(Container::default()))
    }

    pub fn scroll_area() -> Self {
        Self::new("ScrollArea", Role::ScrollArea(Container::default()))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub(crate) fn set_kind(&mut self, kind: &str) {
        self.kind = kind.to_string();
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn role_mut(&mut self) -> &mut Role {
        &mut self.role
    }

    pub fn object_name(&self) -> Option<&str> {
        self.object_name.as_deref()
    }

    pub fn set_object_name(&mut self, name: &str) {
        self.object_name = Some(name.to_string());
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn set_class(&mut self, class: &str) {
        self.class = Some(class.to_string());
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn alignment(&self) -> Option<Alignment> {
        self.alignment
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = Some(alignment);
    }

    pub fn size_policy(&self) -> SizePolicy {
        self.size_policy
    }

    pub fn set_size_policy(&mut self, policy: SizePolicy) {
        self.size_policy = policy;
    }

    pub fn inline_style(&self) -> &str {
        &self.inline_style
    }

    /// Replace the inline style. The computed style is left as-is until the
    /// widget is polished again.
    pub fn set_inline_style(&mut self, style: &str) {
        self.inline_style = style.to_string();
    }

    pub fn computed_style(&self) -> Option<&Style> {
        self.computed_style.as_ref()
    }

    pub(crate) fn set_computed_style(&mut self, style: Option<Style>) {
        self.computed_style = style;
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Set an opaque property. Like the inline style, this only affects the
    /// computed style after a re-polish.
    pub fn set_property(&mut self, name: &str, value: impl Into<String>) {
        self.properties.insert(name.to_string(), value.into());
    }

    pub fn is_arrangement(&self) -> bool {
        matches!(self.role, Role::Arrangement(_))
    }

    /// Whether declarations may be nested under this widget
    pub fn accepts_children(&self) -> bool {
        self.is_arrangement() || self.layout_host().is_some()
    }

    pub fn arrangement(&self) -> Option<&Arrangement> {
        match &self.role {
            Role::Arrangement(arrangement) => Some(arrangement),
            _ => None,
        }
    }

    pub fn arrangement_mut(&mut self) -> Option<&mut Arrangement> {
        match &mut self.role {
            Role::Arrangement(arrangement) => Some(arrangement),
            _ => None,
        }
    }

    pub fn text_bearing(&self) -> Option<&dyn TextBearing> {
        match &self.role {
            Role::Label(label) => Some(label),
            Role::Button(button) => Some(button),
            _ => None,
        }
    }

    pub fn title_bearing(&self) -> Option<&dyn TitleBearing> {
        match &self.role {
            Role::GroupBox(group) => Some(group),
            _ => None,
        }
    }

    pub fn caption_mut(&mut self) -> Option<CaptionMut<'_>> {
        match &mut self.role {
            Role::Label(label) => Some(CaptionMut::Text(label)),
            Role::Button(button) => Some(CaptionMut::Text(button)),
            Role::GroupBox(group) => Some(CaptionMut::Title(group)),
            _ => None,
        }
    }

    /// Current text or title, whichever the widget carries
    pub fn caption(&self) -> Option<&str> {
        self.text_bearing()
            .map(|bearing| bearing.text())
            .or_else(|| self.title_bearing().map(|bearing| bearing.title()))
    }

    pub fn image_bearing(&self) -> Option<&dyn ImageBearing> {
        match &self.role {
            Role::Label(label) => Some(label),
            _ => None,
        }
    }

    pub fn image_bearing_mut(&mut self) -> Option<&mut dyn ImageBearing> {
        match &mut self.role {
            Role::Label(label) => Some(label),
            _ => None,
        }
    }

    pub fn clickable(&self) -> Option<&dyn Clickable> {
        match &self.role {
            Role::Button(button) => Some(button),
            _ => None,
        }
    }

    pub fn clickable_mut(&mut self) -> Option<&mut dyn Clickable> {
        match &mut self.role {
            Role::Button(button) => Some(button),
            _ => None,
        }
    }

    pub fn layout_host(&self) -> Option<&dyn LayoutHost> {
        match &self.role {
            Role::Button(button) => Some(button),
            Role::GroupBox(group) => Some(group),
            Role::Panel(container) | Role::ScrollArea(container) => Some(container),
            _ => None,
        }
    }

    pub fn layout_host_mut(&mut self) -> Option<&mut dyn LayoutHost> {
        match &mut self.role {
            Role::Button(button) => Some(button),
            Role::GroupBox(group) => Some(group),
            Role::Panel(container) | Role::ScrollArea(container) => Some(container),
            _ => None,
        }
    }
}

/// Shared reference to a widget
#[derive(Clone)]
pub struct Handle(Rc<RefCell<Widget>>);

impl Handle {
    pub fn new(widget: Widget) -> Self {
        Self(Rc::new(RefCell::new(widget)))
    }

    pub fn borrow(&self) -> Ref<'_, Widget> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Widget> {
        self.0.borrow_mut()
    }

    pub fn downgrade(&self) -> WeakHandle {
        WeakHandle(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &Handle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Stable identity for per-widget caches (textures, egui ids)
    pub fn key(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn caption(&self) -> Option<String> {
        self.borrow().caption().map(str::to_string)
    }

    /// The layout hosted by a container widget
    pub fn layout(&self) -> Option<Handle> {
        self.borrow().layout_host().and_then(|host| host.layout().cloned())
    }

    /// Items of an arrangement, in order. Empty for anything else.
    pub fn items(&self) -> Vec<LayoutItem> {
        self.borrow()
            .arrangement()
            .map(|arrangement| arrangement.items.clone())
            .unwrap_or_default()
    }

    /// Append a widget to an arrangement (toolkit-level `addWidget`)
    pub fn add_widget(&self, widget: Handle) -> bool {
        match self.borrow_mut().arrangement_mut() {
            Some(arrangement) => {
                arrangement.push(LayoutItem::Widget(widget));
                true
            }
            None => false,
        }
    }

    /// Remove every item from an arrangement
    pub fn clear_items(&self) {
        if let Some(arrangement) = self.borrow_mut().arrangement_mut() {
            arrangement.items.clear();
        }
    }

    /// Fire the bound click handler. Returns whether one was bound.
    pub fn click(&self) -> bool {
        // Release the borrow before running the handler: it may touch this widget.
        let handler = self.borrow().clickable().and_then(|c| c.click_handler());
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widget = self.borrow();
        f.debug_struct("Handle")
            .field("kind", &widget.kind())
            .field("object_name", &widget.object_name())
            .finish()
    }
}

/// Non-owning reference to a widget
#[derive(Clone)]
pub struct WeakHandle(Weak<RefCell<Widget>>);

impl WeakHandle {
    pub fn upgrade(&self) -> Option<Handle> {
        self.0.upgrade().map(Handle)
    }
}

/// Environment widgets are created and styled in: kind factories, the
/// application style sheet and the icon cache directory
pub struct Toolkit {
    kinds: KindRegistry,
    stylesheet: StyleSheet,
    icon_dir: PathBuf,
}

impl Toolkit {
    pub fn new(kinds: KindRegistry, stylesheet: StyleSheet, icon_dir: impl Into<PathBuf>) -> Self {
        Self {
            kinds,
            stylesheet,
            icon_dir: icon_dir.into(),
        }
    }

    /// Standard kinds, no style sheet, default icon cache
    pub fn standard() -> Self {
        Self::new(
            KindRegistry::standard(),
            StyleSheet::default(),
            crate::constants::paths::ICON_CACHE_DIR,
        )
    }

    pub fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    pub fn stylesheet(&self) -> &StyleSheet {
        &self.stylesheet
    }

    pub fn icon_dir(&self) -> &Path {
        &self.icon_dir
    }

    pub fn icon_path(&self, icon: &str) -> PathBuf {
        self.icon_dir.join(format!("{icon}.png"))
    }

    /// Compute and cache the widget's style
    pub fn polish(&self, handle: &Handle) {
        let style = self.stylesheet.compute(&handle.borrow());
        handle.borrow_mut().set_computed_style(Some(style));
    }

    /// Drop the cached style
    pub fn unpolish(&self, handle: &Handle) {
        handle.borrow_mut().set_computed_style(None);
    }

    /// Unpolish then polish, picking up inline style and property changes
    pub fn restyle(&self, handle: &Handle) {
        self.unpolish(handle);
        self.polish(handle);
        trace!(kind = %handle.borrow().kind(), "restyled widget");
    }

    /// Polish a widget only if it has no cached style yet
    pub fn ensure_polished(&self, handle: &Handle) {
        if handle.borrow().computed_style().is_none() {
            self.polish(handle);
        }
    }
}
