//! Well-known chrome areas.
//!
//! Area names are free-form strings; these constructors only cover the areas
//! every native host is expected to understand.

use serde_json::Value;

use super::element::ElementDescriptor;

pub const TITLE_BAR: &str = "titleBar";
pub const TOOLBAR: &str = "toolbar";
pub const STATUS_BAR: &str = "statusBar";
pub const MENU_BAR: &str = "menuBar";

pub const SHEET: &str = "sheet";
pub const SIDE_PANEL: &str = "sidePanel";
pub const WINDOW: &str = "window";
pub const POPOVER: &str = "popover";

pub const SINGLETON_AREAS: [&str; 4] = [TITLE_BAR, TOOLBAR, STATUS_BAR, MENU_BAR];
pub const NAMED_AREAS: [&str; 4] = [SHEET, SIDE_PANEL, WINDOW, POPOVER];

/// Key under which every live instance of a named area is grouped.
pub fn plural_key(area: &str) -> String {
    format!("{area}s")
}

pub fn title_bar(config: Value) -> ElementDescriptor {
    ElementDescriptor::singleton(TITLE_BAR, config)
}

pub fn toolbar(config: Value) -> ElementDescriptor {
    ElementDescriptor::singleton(TOOLBAR, config)
}

pub fn status_bar(config: Value) -> ElementDescriptor {
    ElementDescriptor::singleton(STATUS_BAR, config)
}

pub fn menu_bar(config: Value) -> ElementDescriptor {
    ElementDescriptor::singleton(MENU_BAR, config)
}

pub fn sheet(name: impl Into<String>, config: Value) -> ElementDescriptor {
    ElementDescriptor::named(SHEET, name, config)
}

pub fn side_panel(name: impl Into<String>, config: Value) -> ElementDescriptor {
    ElementDescriptor::named(SIDE_PANEL, name, config)
}

pub fn window(name: impl Into<String>, config: Value) -> ElementDescriptor {
    ElementDescriptor::named(WINDOW, name, config)
}

pub fn popover(name: impl Into<String>, config: Value) -> ElementDescriptor {
    ElementDescriptor::named(POPOVER, name, config)
}
