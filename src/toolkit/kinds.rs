//! Widget kind registration table
//!
//! Maps the kind token at the start of a notation line to a factory closure.
//! New kinds are added with [`KindRegistry::register`]; the layout builder
//! never matches on kind names itself.

use std::collections::HashMap;

use super::Widget;

/// Kinds whose name ends in this suffix are arrangements (they hold items)
pub const ARRANGEMENT_SUFFIX: &str = "Layout";

pub fn is_arrangement_kind(kind: &str) -> bool {
    kind.ends_with(ARRANGEMENT_SUFFIX)
}

type WidgetFactory = Box<dyn Fn() -> Widget>;

pub struct KindRegistry {
    factories: HashMap<String, WidgetFactory>,
}

impl KindRegistry {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the built-in kinds
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register("HBoxLayout", Widget::hbox);
        registry.register("VBoxLayout", Widget::vbox);
        registry.register("Label", Widget::label);
        registry.register("Button", Widget::button);
        registry.register("GroupBox", Widget::group_box);
        registry.register("Panel", Widget::panel);
        registry.register("ScrollArea", Widget::scroll_area);
        registry
    }

    /// Register (or replace) the factory for `kind`
    pub fn register(&mut self, kind: &str, factory: impl Fn() -> Widget + 'static) {
        self.factories.insert(kind.to_string(), Box::new(factory));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Create a widget of `kind`, or `None` if no factory is registered.
    /// The widget reports the registered kind name, so style selectors match it.
    pub fn create(&self, kind: &str) -> Option<Widget> {
        self.factories.get(kind).map(|factory| {
            let mut widget = factory();
            widget.set_kind(kind);
            widget
        })
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_kinds() {
        let registry = KindRegistry::standard();
        for kind in ["HBoxLayout", "VBoxLayout", "Label", "Button", "GroupBox", "Panel", "ScrollArea"] {
            assert!(registry.contains(kind), "missing {kind}");
        }
        assert!(registry.create("QWidget").is_none());
    }

    #[test]
    fn test_arrangement_convention() {
        assert!(is_arrangement_kind("HBoxLayout"));
        assert!(is_arrangement_kind("VBoxLayout"));
        assert!(!is_arrangement_kind("Label"));
        assert!(!is_arrangement_kind("GroupBox"));
    }

    #[test]
    fn test_registered_kind_name_is_reported() {
        let mut registry = KindRegistry::standard();
        registry.register("Heading", || {
            let mut widget = Widget::label();
            widget.set_property("header", "true");
            widget
        });

        let widget = registry.create("Heading").unwrap();
        assert_eq!(widget.kind(), "Heading");
        assert_eq!(widget.property("header"), Some("true"));
        assert!(widget.text_bearing().is_some());
    }
}
