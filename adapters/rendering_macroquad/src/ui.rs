//! Immediate-mode UI helpers for the Macroquad rendering backend.
//!
//! This module hosts all uses of `macroquad::ui` so the rest of the adapter can
//! remain agnostic of Macroquad's UI types.

use macroquad::{
    color::{Color, WHITE},
    math::{RectOffset, Vec2},
    ui::{hash, Ui},
};
use convoy_rendering::StatusPanel;

/// Buttons pressed on the status panel during the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct StatusPanelUiResult {
    /// Pause or resume was pressed.
    pub pause: bool,
    /// Reset was pressed.
    pub reset: bool,
    /// Mute or unmute was pressed.
    pub mute: bool,
    /// Next voice was pressed.
    pub voice: bool,
}

/// Snapshot of the status panel's layout and data for the current frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StatusPanelUiContext {
    /// Top-left corner of the panel in screen coordinates.
    pub origin: Vec2,
    /// Panel dimensions in screen space.
    pub size: Vec2,
    /// Background colour applied to the window skin so the UI matches the
    /// adapter's solid rectangle.
    pub background: Color,
    /// Values published by the orchestrator.
    pub status: StatusPanel,
}

/// Renders the status panel labels and buttons for the current frame.
pub(crate) fn draw_status_panel_ui(
    ui: &mut Ui,
    context: StatusPanelUiContext,
) -> StatusPanelUiResult {
    let mut skin = ui.default_skin();
    skin.margin = 0.0;

    let window_style = ui
        .style_builder()
        .color(context.background)
        .color_hovered(context.background)
        .color_clicked(context.background)
        .color_selected(context.background)
        .color_selected_hovered(context.background)
        .color_inactive(context.background)
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(16.0, 16.0, 16.0, 16.0))
        .build();
    skin.window_style = window_style;

    let label_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(0.0, 0.0, 4.0, 4.0))
        .build();
    skin.label_style = label_style;

    let button_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .color(Color::from_rgba(70, 70, 70, 255))
        .color_hovered(Color::from_rgba(96, 96, 96, 255))
        .color_clicked(Color::from_rgba(56, 56, 56, 255))
        .color_selected(Color::from_rgba(70, 70, 70, 255))
        .color_selected_hovered(Color::from_rgba(96, 96, 96, 255))
        .color_inactive(Color::from_rgba(56, 56, 56, 200))
        .margin(RectOffset::new(0.0, 0.0, 8.0, 8.0))
        .build();
    skin.button_style = button_style;

    ui.push_skin(&skin);

    let status = context.status;
    let mut result = StatusPanelUiResult::default();
    let _ = ui.window(hash!("status_panel"), context.origin, context.size, |ui| {
        ui.label(None, &format!("Mode: {}", status.mode.label()));
        ui.label(None, &format!("Tick: {}", status.tick));
        ui.label(None, &format!("Interval: {} ms", status.interval_ms));
        let brush = if status.eraser { "eraser" } else { "paint" };
        ui.label(None, &format!("Brush: {} ({brush})", status.brush_radius));

        let audio = match (status.audio_ready, status.muted) {
            (false, _) => "Audio: click to start",
            (true, true) => "Audio: muted",
            (true, false) => "Audio: on",
        };
        ui.label(None, audio);
        ui.label(None, &format!("Voice: {:?}", status.voice));

        let pause_label = if status.paused { "Resume" } else { "Pause" };
        result.pause = ui.button(None, pause_label);
        result.reset = ui.button(None, "Reset");
        let mute_label = if status.muted { "Unmute" } else { "Mute" };
        result.mute = ui.button(None, mute_label);
        result.voice = ui.button(None, "Next voice");

        ui.label(None, "1-6 mode, E eraser, [ ] brush");
        ui.label(None, "+/- speed, Tab panel, Q quit");
    });

    ui.pop_skin();

    result
}
