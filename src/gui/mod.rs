//! Dashboard window implemented with egui/eframe

mod constants;
mod render;

use std::time::Instant;

use anyhow::{anyhow, Result};
use eframe::{egui, CreationContext, NativeOptions};
use tracing::{debug, info};

use crate::dashboard::{Dashboard, Dialog, DialogBody};
use crate::toolkit::{Handle, Widget};
use constants::*;
use render::{Painter, TextureCache};

/// Object name of the panel wrapping every dialog body
const DIALOG_PANEL: &str = "dialog";

struct OpenDialog {
    id: u64,
    title: String,
    body: OpenBody,
}

enum OpenBody {
    Message(String),
    Widgets(Handle),
}

impl OpenDialog {
    fn new(id: u64, dialog: Dialog) -> Self {
        let body = match dialog.body {
            DialogBody::Message(text) => OpenBody::Message(text),
            DialogBody::Widgets(content) => OpenBody::Widgets(dialog_panel(content)),
        };
        Self {
            id,
            title: dialog.title,
            body,
        }
    }
}

/// Host `content` in a panel the style sheet can target as `Panel#dialog`
fn dialog_panel(content: Handle) -> Handle {
    let mut panel = Widget::panel();
    panel.set_object_name(DIALOG_PANEL);
    if let Some(host) = panel.layout_host_mut() {
        host.set_layout(content);
    }
    Handle::new(panel)
}

struct DashboardApp {
    dashboard: Dashboard,
    textures: TextureCache,
    dialogs: Vec<OpenDialog>,
    next_dialog: u64,
}

impl DashboardApp {
    fn new(cc: &CreationContext<'_>, dashboard: Dashboard) -> Self {
        info!("Initializing dashboard window");
        // Labels inside buttons must not swallow the button's click
        cc.egui_ctx
            .style_mut(|style| style.interaction.selectable_labels = false);

        Self {
            dashboard,
            textures: TextureCache::default(),
            dialogs: Vec::new(),
            next_dialog: 0,
        }
    }

    fn open_dialogs(&mut self) {
        for dialog in self.dashboard.take_dialogs() {
            debug!(title = %dialog.title, "opening dialog");
            self.dialogs.push(OpenDialog::new(self.next_dialog, dialog));
            self.next_dialog += 1;
        }
    }

    /// Returns whether anything inside a dialog was clicked
    fn show_dialogs(&mut self, ctx: &egui::Context) -> bool {
        let toolkit = self.dashboard.toolkit().clone();
        let mut painter = Painter::new(&toolkit, &mut self.textures);
        let mut closed = Vec::new();

        for dialog in &self.dialogs {
            let mut open = true;
            let mut dismissed = false;
            egui::Window::new(dialog.title.as_str())
                .id(egui::Id::new(("dialog", dialog.id)))
                .collapsible(false)
                .resizable(true)
                .min_width(DIALOG_MIN_WIDTH)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .open(&mut open)
                .show(ctx, |ui| {
                    egui::ScrollArea::both()
                        .max_height(DIALOG_MAX_HEIGHT)
                        .show(ui, |ui| match &dialog.body {
                            OpenBody::Message(text) => {
                                ui.label(text);
                            }
                            OpenBody::Widgets(panel) => painter.widget(ui, panel),
                        });
                    ui.separator();
                    ui.vertical_centered(|ui| {
                        if ui.button("Close").clicked() {
                            dismissed = true;
                        }
                    });
                });
            if !open || dismissed {
                closed.push(dialog.id);
            }
        }

        let clicked = painter.clicked();
        if !closed.is_empty() {
            self.dialogs.retain(|dialog| !closed.contains(&dialog.id));
        }
        clicked
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.dashboard.tick(Instant::now());
        self.open_dialogs();

        let root = self.dashboard.root().clone();
        let toolkit = self.dashboard.toolkit().clone();
        let mut painter = Painter::new(&toolkit, &mut self.textures);
        egui::CentralPanel::default()
            .frame(egui::Frame::new())
            .show(ctx, |ui| painter.widget(ui, &root));
        let clicked = painter.clicked() | self.show_dialogs(ctx);

        if clicked {
            // Commands queued by the click run on the next frame
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(self.dashboard.next_wake(Instant::now()));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Dashboard exiting");
    }
}

pub fn run_gui(dashboard: Dashboard, fullscreen: bool) -> Result<()> {
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
            .with_fullscreen(fullscreen)
            .with_title(APP_TITLE),
        ..Default::default()
    };

    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, dashboard)))),
    )
    .map_err(|err| anyhow!("Failed to launch dashboard window: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialog_body_is_wrapped_in_styled_panel() {
        let content = Handle::new(Widget::vbox());
        let dialog = OpenDialog::new(
            3,
            Dialog {
                title: "Weather Alert".to_string(),
                body: DialogBody::Widgets(content.clone()),
            },
        );

        let OpenBody::Widgets(panel) = &dialog.body else {
            panic!("expected widgets");
        };
        assert_eq!(panel.borrow().object_name(), Some(DIALOG_PANEL));
        assert!(panel.layout().is_some_and(|layout| layout.ptr_eq(&content)));
    }
}
