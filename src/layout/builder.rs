use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use super::notation::{self, Declaration, NodeDecl, SourceLine};
use super::LayoutError;
use crate::toolkit::kinds::is_arrangement_kind;
use crate::toolkit::{
    Alignment, CaptionMut, Handle, LayoutItem, Pixmap, SizePolicy, Toolkit, WeakHandle,
};

const ATTR_ALIGN: &str = "align";
const ATTR_EXPANDING: &str = "expanding";
const ATTR_STYLE: &str = "style";

/// Position over the filtered lines, shared by every level of the recursive
/// block parser so consumed lines are never revisited
struct Cursor<'a> {
    lines: Vec<SourceLine<'a>>,
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(lines: Vec<SourceLine<'a>>) -> Self {
        Self { lines, position: 0 }
    }

    fn peek(&self) -> Option<SourceLine<'a>> {
        self.lines.get(self.position).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }
}

/// Most recent declaration at the current depth
enum Previous {
    Nothing,
    Stretch,
    Node(Handle),
}

struct Registered {
    handle: WeakHandle,
    line: usize,
}

/// Builds a widget tree from layout notation under a caller-owned root, and
/// addresses the declared widgets afterwards by identifier or class.
///
/// Registries only hold weak references; the root keeps the tree alive.
pub struct LayoutBuilder {
    toolkit: Rc<Toolkit>,
    ids: HashMap<String, Registered>,
    classes: HashMap<String, Vec<WeakHandle>>,
}

impl LayoutBuilder {
    pub fn new(toolkit: Rc<Toolkit>, root: &Handle, source: &str) -> Result<Self, LayoutError> {
        let mut cursor = Cursor::new(notation::significant_lines(source)?);
        let mut builder = Self {
            toolkit,
            ids: HashMap::new(),
            classes: HashMap::new(),
        };
        builder.parse_block(&mut cursor, root, 0)?;
        debug!(
            lines = cursor.lines.len(),
            ids = builder.ids.len(),
            classes = builder.classes.len(),
            "built layout"
        );
        Ok(builder)
    }

    fn parse_block(
        &mut self,
        cursor: &mut Cursor<'_>,
        parent: &Handle,
        depth: usize,
    ) -> Result<(), LayoutError> {
        let mut previous = Previous::Nothing;

        while let Some(line) = cursor.peek() {
            if line.depth < depth {
                return Ok(());
            }
            if line.depth > depth + 1 {
                return Err(LayoutError::IndentJump {
                    line: line.number,
                    from: depth,
                    to: line.depth,
                });
            }
            if line.depth == depth + 1 {
                let node = match &previous {
                    Previous::Node(node) => node.clone(),
                    Previous::Stretch => {
                        return Err(LayoutError::ChildrenOfLeaf {
                            line: line.number,
                            kind: notation::STRETCH.to_string(),
                        });
                    }
                    Previous::Nothing => {
                        return Err(LayoutError::OrphanIndent { line: line.number });
                    }
                };
                if !node.borrow().accepts_children() {
                    return Err(LayoutError::ChildrenOfLeaf {
                        line: line.number,
                        kind: node.borrow().kind().to_string(),
                    });
                }
                self.parse_block(cursor, &node, depth + 1)?;
                continue;
            }

            cursor.advance();
            previous = match notation::parse_declaration(&line)? {
                Declaration::Stretch => {
                    attach(parent, LayoutItem::Stretch, notation::STRETCH, line.number)?;
                    Previous::Stretch
                }
                Declaration::Node(decl) => Previous::Node(self.materialize(parent, decl, line.number)?),
            };
        }

        Ok(())
    }

    /// Create, configure, attach and register the widget for one declaration
    fn materialize(
        &mut self,
        parent: &Handle,
        decl: NodeDecl,
        line: usize,
    ) -> Result<Handle, LayoutError> {
        let widget = self
            .toolkit
            .kinds()
            .create(&decl.kind)
            .ok_or_else(|| LayoutError::UnknownKind {
                line,
                kind: decl.kind.clone(),
            })?;
        let arrangement = is_arrangement_kind(&decl.kind);
        if widget.is_arrangement() != arrangement {
            return Err(LayoutError::KindMismatch {
                line,
                kind: decl.kind,
            });
        }

        if let Some(id) = &decl.id {
            if let Some(first) = self.ids.get(id) {
                return Err(LayoutError::DuplicateId {
                    line,
                    id: id.clone(),
                    first: first.line,
                });
            }
        }

        let handle = Handle::new(widget);
        let styled = self.apply_attributes(&handle, &decl, line)?;
        if let Some(text) = &decl.text {
            let mut widget = handle.borrow_mut();
            match widget.caption_mut() {
                Some(CaptionMut::Text(bearing)) => bearing.set_text(text),
                Some(CaptionMut::Title(bearing)) => bearing.set_title(text),
                None => {
                    return Err(LayoutError::NoCaption {
                        line,
                        kind: decl.kind,
                    });
                }
            }
        }

        let item = if arrangement {
            LayoutItem::Layout(handle.clone())
        } else {
            LayoutItem::Widget(handle.clone())
        };
        attach(parent, item, &decl.kind, line)?;

        if let Some(id) = decl.id {
            handle.borrow_mut().set_object_name(&id);
            self.ids.insert(
                id,
                Registered {
                    handle: handle.downgrade(),
                    line,
                },
            );
        }
        if let Some(class) = decl.class {
            handle.borrow_mut().set_class(&class);
            self.classes.entry(class).or_default().push(handle.downgrade());
        }
        // Selectors see the id, class and properties only once all are set
        if styled {
            self.toolkit.restyle(&handle);
        }

        trace!(line, kind = %decl.kind, "materialized widget");
        Ok(handle)
    }

    /// Alignment, then expanding, then inline style, then everything else as
    /// opaque properties, whatever order the source lists them in. Returns
    /// whether an inline style was set; the caller polishes once the widget
    /// is fully named.
    fn apply_attributes(
        &self,
        handle: &Handle,
        decl: &NodeDecl,
        line: usize,
    ) -> Result<bool, LayoutError> {
        let mut consumed = Vec::new();

        if let Some(value) = decl.attribute(ATTR_ALIGN) {
            let alignment = Alignment::parse(value).ok_or_else(|| LayoutError::UnknownAlignment {
                line,
                value: value.to_string(),
            })?;
            handle.borrow_mut().set_alignment(alignment);
            consumed.push(ATTR_ALIGN);
        }

        if decl.attribute(ATTR_EXPANDING) == Some("true") {
            handle.borrow_mut().set_size_policy(SizePolicy::Expanding);
            consumed.push(ATTR_EXPANDING);
        }

        let styled = match decl.attribute(ATTR_STYLE) {
            Some(style) => {
                handle.borrow_mut().set_inline_style(style);
                consumed.push(ATTR_STYLE);
                true
            }
            None => false,
        };

        let mut widget = handle.borrow_mut();
        for (key, value) in &decl.attributes {
            if !consumed.contains(&key.as_str()) {
                widget.set_property(key, value.as_str());
            }
        }
        Ok(styled)
    }

    pub fn toolkit(&self) -> &Rc<Toolkit> {
        &self.toolkit
    }

    pub fn by_id(&self, id: &str) -> Result<Handle, LayoutError> {
        self.ids
            .get(id)
            .and_then(|registered| registered.handle.upgrade())
            .ok_or_else(|| LayoutError::NotFound(id.to_string()))
    }

    /// Every live widget tagged `class`, in declaration order
    pub fn by_class(&self, class: &str) -> Vec<Handle> {
        self.classes
            .get(class)
            .map(|handles| handles.iter().filter_map(WeakHandle::upgrade).collect())
            .unwrap_or_default()
    }

    /// Set the text of a text-bearing widget or the title of a title-bearing one
    pub fn set_text(&self, id: &str, text: &str) -> Result<(), LayoutError> {
        let handle = self.by_id(id)?;
        let mut widget = handle.borrow_mut();
        let kind = widget.kind().to_string();
        match widget.caption_mut() {
            Some(CaptionMut::Text(bearing)) => bearing.set_text(text),
            Some(CaptionMut::Title(bearing)) => bearing.set_title(text),
            None => return Err(unsupported(id, kind, "text")),
        }
        Ok(())
    }

    /// Replace the inline style and re-polish so the change shows
    pub fn set_stylesheet(&self, id: &str, style: &str) -> Result<(), LayoutError> {
        let handle = self.by_id(id)?;
        handle.borrow_mut().set_inline_style(style);
        self.toolkit.restyle(&handle);
        Ok(())
    }

    /// Re-polish after properties changed
    pub fn restyle(&self, id: &str) -> Result<(), LayoutError> {
        let handle = self.by_id(id)?;
        self.toolkit.restyle(&handle);
        Ok(())
    }

    /// Show the cached icon `<icon_dir>/<icon>.png`, optionally fitted to a
    /// `size`×`size` square
    pub fn set_icon(&self, id: &str, icon: &str, size: Option<u32>) -> Result<(), LayoutError> {
        let handle = self.by_id(id)?;
        if handle.borrow().image_bearing().is_none() {
            let kind = handle.borrow().kind().to_string();
            return Err(unsupported(id, kind, "images"));
        }

        let path = self.toolkit.icon_path(icon);
        let pixmap = Pixmap::load(&path, size).map_err(|source| LayoutError::Icon { path, source })?;
        if let Some(bearing) = handle.borrow_mut().image_bearing_mut() {
            bearing.set_pixmap(pixmap);
        }
        Ok(())
    }

    pub fn show(&self, id: &str) -> Result<(), LayoutError> {
        self.by_id(id)?.borrow_mut().set_visible(true);
        Ok(())
    }

    pub fn hide(&self, id: &str) -> Result<(), LayoutError> {
        self.by_id(id)?.borrow_mut().set_visible(false);
        Ok(())
    }

    /// Bind the click handler, dropping whatever was bound before. Binding
    /// twice replaces; it never stacks.
    pub fn on_click(&self, id: &str, callback: impl Fn() + 'static) -> Result<(), LayoutError> {
        let handle = self.by_id(id)?;
        let mut widget = handle.borrow_mut();
        let kind = widget.kind().to_string();
        let clickable = widget
            .clickable_mut()
            .ok_or_else(|| unsupported(id, kind, "click handlers"))?;
        if clickable.replace_click_handler(Rc::new(callback)).is_some() {
            trace!(id, "replaced click handler");
        }
        Ok(())
    }
}

impl fmt::Debug for LayoutBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutBuilder")
            .field("ids", &self.ids.len())
            .field("classes", &self.classes.len())
            .finish()
    }
}

fn unsupported(id: &str, kind: String, operation: &'static str) -> LayoutError {
    LayoutError::Unsupported {
        id: id.to_string(),
        kind,
        operation,
    }
}

/// Add `item` under `parent`.
///
/// Arrangements take any item. A container widget adopts an arrangement as
/// its layout when it has none yet; otherwise items go into its existing
/// layout.
fn attach(parent: &Handle, item: LayoutItem, kind: &str, line: usize) -> Result<(), LayoutError> {
    let existing = {
        let mut parent_widget = parent.borrow_mut();
        if let Some(arrangement) = parent_widget.arrangement_mut() {
            arrangement.push(item);
            return Ok(());
        }

        let parent_kind = parent_widget.kind().to_string();
        let Some(host) = parent_widget.layout_host_mut() else {
            return Err(LayoutError::ChildrenOfLeaf {
                line,
                kind: parent_kind,
            });
        };
        match (host.layout().cloned(), item) {
            (Some(layout), item) => (layout, item),
            (None, LayoutItem::Layout(layout)) => {
                host.set_layout(layout);
                return Ok(());
            }
            (None, _) => {
                return Err(LayoutError::NoLayout {
                    line,
                    parent: parent_kind,
                    kind: kind.to_string(),
                });
            }
        }
    };

    let (layout, item) = existing;
    let mut layout_widget = layout.borrow_mut();
    match layout_widget.arrangement_mut() {
        Some(arrangement) => {
            arrangement.push(item);
            Ok(())
        }
        None => Err(LayoutError::NoLayout {
            line,
            parent: layout_widget.kind().to_string(),
            kind: kind.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::{Direction, KindRegistry, Rgb, StyleSheet, Widget};
    use image::{Rgba, RgbaImage};
    use std::cell::Cell;

    fn toolkit() -> Rc<Toolkit> {
        Rc::new(Toolkit::standard())
    }

    fn build(source: &str) -> (Handle, LayoutBuilder) {
        let root = Handle::new(Widget::panel());
        let builder = LayoutBuilder::new(toolkit(), &root, source).unwrap();
        (root, builder)
    }

    fn build_err(source: &str) -> LayoutError {
        let root = Handle::new(Widget::panel());
        LayoutBuilder::new(toolkit(), &root, source).unwrap_err()
    }

    fn kinds(items: &[LayoutItem]) -> Vec<String> {
        items
            .iter()
            .map(|item| match item {
                LayoutItem::Stretch => "stretch".to_string(),
                LayoutItem::Widget(h) | LayoutItem::Layout(h) => h.borrow().kind().to_string(),
            })
            .collect()
    }

    #[test]
    fn test_set_text_addresses_one_widget() {
        let (_root, ui) = build(
            "VBoxLayout
    Label#foo
    Label#bar Bar",
        );
        ui.set_text("foo", "X").unwrap();
        assert_eq!(ui.by_id("foo").unwrap().caption().as_deref(), Some("X"));
        assert_eq!(ui.by_id("bar").unwrap().caption().as_deref(), Some("Bar"));
    }

    #[test]
    fn test_set_text_sets_group_title() {
        let (_root, ui) = build(
            "VBoxLayout
    GroupBox#weather-box Weather
        VBoxLayout",
        );
        ui.set_text("weather-box", "Weather for Springfield").unwrap();
        let group = ui.by_id("weather-box").unwrap();
        assert_eq!(group.borrow().title_bearing().unwrap().title(), "Weather for Springfield");
    }

    #[test]
    fn test_by_class_keeps_declaration_order() {
        let (_root, ui) = build(
            "VBoxLayout
    Label#a.row
    HBoxLayout
        Label#b.row
    Label#other.column
    Label#c.row",
        );
        let rows: Vec<_> = ui
            .by_class("row")
            .iter()
            .map(|h| h.borrow().object_name().unwrap().to_string())
            .collect();
        assert_eq!(rows, vec!["a", "b", "c"]);
        assert!(ui.by_class("missing").is_empty());
    }

    #[test]
    fn test_depth_nesting() {
        let (root, ui) = build(
            "VBoxLayout#top
    GroupBox#first
        VBoxLayout#inner
    GroupBox#second",
        );
        let top = root.layout().unwrap();
        assert!(top.ptr_eq(&ui.by_id("top").unwrap()));

        let items = top.items();
        assert_eq!(kinds(&items), vec!["GroupBox", "GroupBox"]);
        assert!(items[0].handle().unwrap().ptr_eq(&ui.by_id("first").unwrap()));
        assert!(items[1].handle().unwrap().ptr_eq(&ui.by_id("second").unwrap()));

        let first_layout = ui.by_id("first").unwrap().layout().unwrap();
        assert!(first_layout.ptr_eq(&ui.by_id("inner").unwrap()));
        assert!(ui.by_id("second").unwrap().layout().is_none());
    }

    #[test]
    fn test_dedent_closes_several_blocks() {
        let (root, _ui) = build(
            "VBoxLayout
    HBoxLayout
        Button
            VBoxLayout
                Label
    Label",
        );
        let top = root.layout().unwrap();
        assert_eq!(kinds(&top.items()), vec!["HBoxLayout", "Label"]);
    }

    #[test]
    fn test_stretch_takes_one_slot_and_is_never_registered() {
        let (root, ui) = build(
            "HBoxLayout
    Label#low.temperature
    stretch
    Label#high.temperature",
        );
        let row = root.layout().unwrap();
        assert_eq!(row.borrow().arrangement().unwrap().direction, Direction::Horizontal);
        assert_eq!(kinds(&row.items()), vec!["Label", "stretch", "Label"]);
        assert_eq!(ui.by_class("temperature").len(), 2);
        assert!(ui.by_id("stretch").is_err());
    }

    #[test]
    fn test_click_rebind_fires_latest_only() {
        let (_root, ui) = build(
            "VBoxLayout
    Button#toggle",
        );
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));

        let counter = first.clone();
        ui.on_click("toggle", move || counter.set(counter.get() + 1)).unwrap();
        let counter = second.clone();
        ui.on_click("toggle", move || counter.set(counter.get() + 1)).unwrap();

        assert!(ui.by_id("toggle").unwrap().click());
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = build_err(
            "VBoxLayout
    Label#ok
    QSlider#volume",
        );
        assert!(matches!(
            err,
            LayoutError::UnknownKind { line: 3, ref kind } if kind == "QSlider"
        ));
    }

    #[test]
    fn test_registered_kind_extends_notation() {
        let mut kinds = KindRegistry::standard();
        kinds.register("Heading", Widget::label);
        let toolkit = Rc::new(Toolkit::new(kinds, StyleSheet::default(), "cache"));
        let root = Handle::new(Widget::panel());

        let ui = LayoutBuilder::new(toolkit, &root, "VBoxLayout\n    Heading#title Hello").unwrap();
        assert_eq!(ui.by_id("title").unwrap().borrow().kind(), "Heading");
    }

    #[test]
    fn test_kind_must_follow_arrangement_convention() {
        let mut kinds = KindRegistry::standard();
        kinds.register("GridLayout", Widget::label);
        let toolkit = Rc::new(Toolkit::new(kinds, StyleSheet::default(), "cache"));
        let root = Handle::new(Widget::panel());

        let err = LayoutBuilder::new(toolkit, &root, "GridLayout").unwrap_err();
        assert!(matches!(err, LayoutError::KindMismatch { line: 1, .. }));
    }

    #[test]
    fn test_indent_jump_is_rejected() {
        let err = build_err(
            "VBoxLayout
    HBoxLayout
            Label",
        );
        assert!(matches!(err, LayoutError::IndentJump { line: 3, from: 1, to: 3 }));
    }

    #[test]
    fn test_indented_first_line_is_orphan() {
        assert!(matches!(
            build_err("    VBoxLayout"),
            LayoutError::OrphanIndent { line: 1 }
        ));
    }

    #[test]
    fn test_children_under_leaf_are_rejected() {
        let err = build_err(
            "VBoxLayout
    Label
        Label",
        );
        assert!(matches!(
            err,
            LayoutError::ChildrenOfLeaf { line: 3, ref kind } if kind == "Label"
        ));

        let err = build_err(
            "VBoxLayout
    stretch
        Label",
        );
        assert!(matches!(
            err,
            LayoutError::ChildrenOfLeaf { line: 3, ref kind } if kind == "stretch"
        ));
    }

    #[test]
    fn test_widget_needs_a_layout_to_live_in() {
        let err = build_err("Label#stray");
        assert!(matches!(err, LayoutError::NoLayout { line: 1, .. }));
    }

    #[test]
    fn test_second_layout_nests_into_first() {
        let (root, ui) = build(
            "VBoxLayout#outer
HBoxLayout#row",
        );
        let outer = root.layout().unwrap();
        assert!(outer.ptr_eq(&ui.by_id("outer").unwrap()));
        assert!(outer.items()[0].handle().unwrap().ptr_eq(&ui.by_id("row").unwrap()));
    }

    #[test]
    fn test_duplicate_identifier_is_rejected() {
        let err = build_err(
            "VBoxLayout
    Label#same
    Label#same",
        );
        assert!(matches!(
            err,
            LayoutError::DuplicateId { line: 3, first: 2, ref id } if id == "same"
        ));
    }

    #[test]
    fn test_text_on_arrangement_is_rejected() {
        assert!(matches!(
            build_err("VBoxLayout Title"),
            LayoutError::NoCaption { line: 1, .. }
        ));
    }

    #[test]
    fn test_attributes_are_interpreted_in_fixed_order() {
        let (_root, ui) = build(
            "VBoxLayout
    Label#t(custom=1, style=color: #ff0000;, expanding=true, align=right) Hi
    Label#u(expanding=no, align=hcenter)",
        );
        let t = ui.by_id("t").unwrap();
        let t = t.borrow();
        assert_eq!(t.alignment(), Some(Alignment::Right));
        assert_eq!(t.size_policy(), SizePolicy::Expanding);
        assert_eq!(t.computed_style().unwrap().color, Some(Rgb::new(0xff, 0, 0)));
        assert_eq!(t.property("custom"), Some("1"));
        assert_eq!(t.property("style"), None);
        assert_eq!(t.property("align"), None);

        let u = ui.by_id("u").unwrap();
        let u = u.borrow();
        assert_eq!(u.alignment(), Some(Alignment::Center));
        assert_eq!(u.size_policy(), SizePolicy::Preferred);
        assert_eq!(u.property("expanding"), Some("no"));
    }

    #[test]
    fn test_unknown_alignment() {
        assert!(matches!(
            build_err("VBoxLayout\n    Label(align=justify)"),
            LayoutError::UnknownAlignment { line: 2, .. }
        ));
    }

    #[test]
    fn test_set_stylesheet_repolishes() {
        let (_root, ui) = build("VBoxLayout\n    Label#temp");
        ui.set_stylesheet("temp", "color: #3fff6e;").unwrap();
        let temp = ui.by_id("temp").unwrap();
        assert_eq!(temp.borrow().inline_style(), "color: #3fff6e;");
        assert_eq!(
            temp.borrow().computed_style().unwrap().color,
            Some(Rgb::new(0x3f, 0xff, 0x6e))
        );
    }

    #[test]
    fn test_inline_style_cascades_with_id_class_and_properties() {
        let sheet = StyleSheet::parse(
            r#"
            Button.forecast-day { background-color: #1d2126; }
            #styled { color: #00ff00; }
            Label[tone="warm"] { font-size: 20px; }
            "#,
        )
        .unwrap();
        let toolkit = Rc::new(Toolkit::new(KindRegistry::standard(), sheet, "cache"));
        let root = Handle::new(Widget::panel());
        let ui = LayoutBuilder::new(
            toolkit,
            &root,
            "VBoxLayout
    Button#day.forecast-day(style=height: 150px;)
    Label#styled(style=font-weight: bold;)
    Label#warm(tone=warm, style=min-height: 10px;)",
        )
        .unwrap();

        let day = ui.by_id("day").unwrap();
        let style = day.borrow().computed_style().cloned().unwrap();
        assert_eq!(style.background, Some(Rgb::new(29, 33, 38)));
        assert_eq!(style.height, Some(150.0));

        let styled = ui.by_id("styled").unwrap();
        let style = styled.borrow().computed_style().cloned().unwrap();
        assert_eq!(style.color, Some(Rgb::new(0, 0xff, 0)));
        assert_eq!(style.bold, Some(true));

        let warm = ui.by_id("warm").unwrap();
        let style = warm.borrow().computed_style().cloned().unwrap();
        assert_eq!(style.font_size, Some(20.0));
        assert_eq!(style.min_height, Some(10.0));
    }

    #[test]
    fn test_show_and_hide() {
        let (_root, ui) = build("VBoxLayout\n    Label#lights-error");
        ui.hide("lights-error").unwrap();
        assert!(!ui.by_id("lights-error").unwrap().borrow().is_visible());
        ui.show("lights-error").unwrap();
        assert!(ui.by_id("lights-error").unwrap().borrow().is_visible());
    }

    #[test]
    fn test_lookup_miss_is_not_found() {
        let (_root, ui) = build("VBoxLayout");
        assert!(matches!(ui.set_text("nope", "x"), Err(LayoutError::NotFound(ref id)) if id == "nope"));
        assert!(matches!(ui.hide("nope"), Err(LayoutError::NotFound(_))));
        assert!(matches!(ui.on_click("nope", || {}), Err(LayoutError::NotFound(_))));
    }

    #[test]
    fn test_capability_mismatch_is_unsupported() {
        let (_root, ui) = build("VBoxLayout#box\n    Label#plain");
        assert!(matches!(
            ui.on_click("plain", || {}),
            Err(LayoutError::Unsupported { operation: "click handlers", .. })
        ));
        assert!(matches!(
            ui.set_text("box", "x"),
            Err(LayoutError::Unsupported { operation: "text", .. })
        ));
    }

    #[test]
    fn test_set_icon_loads_and_scales_from_icon_dir() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]))
            .save(dir.path().join("10d.png"))
            .unwrap();
        let toolkit = Rc::new(Toolkit::new(KindRegistry::standard(), StyleSheet::default(), dir.path()));
        let root = Handle::new(Widget::panel());
        let ui = LayoutBuilder::new(toolkit, &root, "VBoxLayout\n    Label#icon\n    Button#btn").unwrap();

        ui.set_icon("icon", "10d", Some(50)).unwrap();
        let icon = ui.by_id("icon").unwrap();
        let widget = icon.borrow();
        let pixmap = widget.image_bearing().unwrap().pixmap().unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (50, 50));

        assert!(matches!(ui.set_icon("icon", "missing", None), Err(LayoutError::Icon { .. })));
        assert!(matches!(
            ui.set_icon("btn", "10d", None),
            Err(LayoutError::Unsupported { operation: "images", .. })
        ));
    }

    #[test]
    fn test_scoped_builders_have_separate_registries() {
        let toolkit = toolkit();
        let main_root = Handle::new(Widget::panel());
        let main = LayoutBuilder::new(toolkit.clone(), &main_root, "VBoxLayout\n    Label#time-0").unwrap();

        let detail_root = Handle::new(Widget::hbox());
        let detail = LayoutBuilder::new(toolkit, &detail_root, "Label#time-0\nLabel#temp-0").unwrap();

        detail.set_text("time-0", "3 PM").unwrap();
        assert_eq!(main.by_id("time-0").unwrap().caption().as_deref(), Some(""));
        assert!(main.by_id("temp-0").is_err());
        assert_eq!(detail_root.items().len(), 2);
    }

    #[test]
    fn test_comments_do_not_affect_nesting() {
        let (root, ui) = build(
            "VBoxLayout
    HBoxLayout
// a comment at column zero
        Label#inside
            // an over-indented comment
        Label#also-inside",
        );
        let row = root.layout().unwrap().items()[0].handle().unwrap().clone();
        assert_eq!(row.items().len(), 2);
        assert!(ui.by_id("also-inside").is_ok());
    }
}
