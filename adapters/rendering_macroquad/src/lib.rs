#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Convoy.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature; sound is synthesised by the audio system instead.
//!
//! The adapter scales the scene to the window, maps the pointer to grid cells,
//! and hosts the status panel through Macroquad's immediate-mode UI. All
//! UI-specific calls live inside the local `ui` module to avoid leaking
//! Macroquad UI types throughout the renderer.

mod ui;

use self::ui::{draw_status_panel_ui, StatusPanelUiContext, StatusPanelUiResult};
use anyhow::Result;
use convoy_core::{GridDimensions, Mode};
use convoy_rendering::{
    Backdrop, Color, FrameInput, Presentation, RenderingBackend, Scene, Shape, Sprite,
    SurfaceLayout,
};
use glam::Vec2;
use macroquad::math::Vec2 as MacroquadVec2;
use macroquad::input::{
    is_key_pressed, is_mouse_button_down, is_mouse_button_pressed, mouse_position, KeyCode,
    MouseButton,
};
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};
use tracing::info;

/// Width of the status panel docked to the right edge of the window, in pixels.
pub const STATUS_PANEL_WIDTH: f32 = 220.0;

const PANEL_BACKGROUND: Color = Color::new(0.08, 0.08, 0.1, 1.0);
const GLOW_ALPHA: f32 = 0.25;
const TRAIL_FRAMES: usize = 24;
const TRAIL_CUTOFF: f32 = 0.02;

const MODE_KEYS: [KeyCode; 6] = [
    KeyCode::Key1,
    KeyCode::Key2,
    KeyCode::Key3,
    KeyCode::Key4,
    KeyCode::Key5,
    KeyCode::Key6,
];

/// Tracks UI-sourced interactions so they can be merged with physical input on the next frame.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlPanelInputState {
    pause_latched: bool,
    reset_latched: bool,
    mute_latched: bool,
    voice_latched: bool,
}

impl ControlPanelInputState {
    /// Returns whether the UI requested a pause toggle and clears the latch so
    /// the action fires only once.
    pub fn take_pause(&mut self) -> bool {
        std::mem::take(&mut self.pause_latched)
    }

    /// Records that the pause button was pressed this frame.
    pub fn register_pause(&mut self) {
        self.pause_latched = true;
    }

    /// Returns the latched reset request, clearing it so the action fires once.
    pub fn take_reset(&mut self) -> bool {
        std::mem::take(&mut self.reset_latched)
    }

    /// Records that the reset button was pressed this frame.
    pub fn register_reset(&mut self) {
        self.reset_latched = true;
    }

    /// Returns the latched mute toggle, clearing it so the action fires once.
    pub fn take_mute(&mut self) -> bool {
        std::mem::take(&mut self.mute_latched)
    }

    /// Records that the mute button was pressed this frame.
    pub fn register_mute(&mut self) {
        self.mute_latched = true;
    }

    /// Returns the latched voice change, clearing it so the action fires once.
    pub fn take_voice(&mut self) -> bool {
        std::mem::take(&mut self.voice_latched)
    }

    /// Records that the voice button was pressed this frame.
    pub fn register_voice(&mut self) {
        self.voice_latched = true;
    }

    fn register(&mut self, result: StatusPanelUiResult) {
        self.pause_latched |= result.pause;
        self.reset_latched |= result.reset;
        self.mute_latched |= result.mute;
        self.voice_latched |= result.voice;
    }
}

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to quit the render loop.
    quit_requested: bool,
    /// `Space` pauses or resumes the simulation.
    toggle_pause: bool,
    /// `R` sets the active mode up again.
    reset: bool,
    /// `M` toggles mute.
    toggle_mute: bool,
    /// `E` toggles the eraser brush.
    toggle_eraser: bool,
    /// `V` cycles the voice algorithm.
    cycle_voice: bool,
    /// `+` shortens the update interval.
    faster: bool,
    /// `-` lengthens the update interval.
    slower: bool,
    /// `]` grows the brush.
    brush_grow: bool,
    /// `[` shrinks the brush.
    brush_shrink: bool,
    /// `Tab` shows or hides the status panel.
    toggle_panel: bool,
    /// `1` to `6` select a mode.
    select_mode: Option<Mode>,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self {
            quit_requested: is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q),
            toggle_pause: is_key_pressed(KeyCode::Space),
            reset: is_key_pressed(KeyCode::R),
            toggle_mute: is_key_pressed(KeyCode::M),
            toggle_eraser: is_key_pressed(KeyCode::E),
            cycle_voice: is_key_pressed(KeyCode::V),
            faster: is_key_pressed(KeyCode::Equal) || is_key_pressed(KeyCode::KpAdd),
            slower: is_key_pressed(KeyCode::Minus) || is_key_pressed(KeyCode::KpSubtract),
            brush_grow: is_key_pressed(KeyCode::RightBracket),
            brush_shrink: is_key_pressed(KeyCode::LeftBracket),
            toggle_panel: is_key_pressed(KeyCode::Tab),
            select_mode: MODE_KEYS
                .iter()
                .zip(Mode::ALL)
                .find(|(key, _)| is_key_pressed(**key))
                .map(|(_, mode)| mode),
        }
    }

    /// Whether any simulation shortcut fired; such presses count as audio-unlocking gestures.
    fn any(&self) -> bool {
        self.toggle_pause
            || self.reset
            || self.toggle_mute
            || self.toggle_eraser
            || self.cycle_voice
            || self.faster
            || self.slower
            || self.brush_grow
            || self.brush_shrink
            || self.select_mode.is_some()
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    show_status_panel: bool,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            show_fps: false,
            show_status_panel: true,
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    /// Configures whether the status panel is visible at start-up.
    #[must_use]
    pub fn with_status_panel(mut self, show: bool) -> Self {
        self.show_status_panel = show;
        self
    }
}

/// Time spent on the parts of a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct FrameBreakdown {
    frame: Duration,
    simulation: Duration,
    render: Duration,
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
    simulation_accum: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_simulation: Duration,
    avg_render: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, breakdown: FrameBreakdown) -> Option<FpsMetrics> {
        self.elapsed += breakdown.frame;
        self.frames = self.frames.saturating_add(1);
        self.simulation_accum += breakdown.simulation;
        self.render_accum += breakdown.render;

        self.frame_times.push_back(breakdown.frame);
        self.window_duration += breakdown.frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            if let Some(removed) = self.frame_times.pop_front() {
                self.window_duration = self.window_duration.saturating_sub(removed);
            } else {
                break;
            }
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let frames = self.frames;
        let per_second = frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        let metrics = FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_simulation: self.simulation_accum / frames,
            avg_render: self.render_accum / frames,
        };

        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.simulation_accum = Duration::ZERO;
        self.render_accum = Duration::ZERO;
        Some(metrics)
    }
}

/// Recent frames of a trail backdrop, newest first.
#[derive(Debug, Default)]
struct TrailHistory {
    frames: VecDeque<Vec<Sprite>>,
}

impl TrailHistory {
    fn record(&mut self, sprites: &[Sprite]) {
        let mut frame = if self.frames.len() >= TRAIL_FRAMES {
            self.frames.pop_back().unwrap_or_default()
        } else {
            Vec::new()
        };
        frame.clear();
        frame.extend_from_slice(sprites);
        self.frames.push_front(frame);
    }

    fn clear(&mut self) {
        self.frames.clear();
    }

    /// Stored frames from oldest to newest with the opacity each is drawn at.
    fn faded(&self, wash: Color) -> impl Iterator<Item = (f32, &[Sprite])> + '_ {
        self.frames
            .iter()
            .enumerate()
            .rev()
            .map(move |(index, sprites)| (trail_fade(index + 1, wash.alpha), sprites.as_slice()))
            .filter(|(fade, _)| *fade >= TRAIL_CUTOFF)
    }
}

/// Opacity left after `age` translucent washes of the given alpha.
fn trail_fade(age: usize, wash_alpha: f32) -> f32 {
    let age = i32::try_from(age).unwrap_or(i32::MAX);
    (1.0 - wash_alpha.clamp(0.0, 1.0)).powi(age)
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            show_status_panel,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            layout,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 1280,
            window_height: 800,
            window_resizable: true,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();
            let mut control_panel_input = ControlPanelInputState::default();
            let mut trail = TrailHistory::default();
            let mut reported_surface: Option<GridDimensions> = None;
            let mut show_panel = show_status_panel;

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }
                if keyboard.toggle_panel {
                    show_panel = !show_panel;
                }

                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();
                let panel_width = if show_panel {
                    STATUS_PANEL_WIDTH.min(screen_width)
                } else {
                    0.0
                };
                let available_width = (screen_width - panel_width).max(0.0);

                let surface = layout.grid_for_surface(available_width, screen_height);
                let surface_changed = (reported_surface != Some(surface)).then_some(surface);
                reported_surface = Some(surface);

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let metrics_before =
                    SceneMetrics::from_scene(&scene, available_width, screen_height);
                let panel = PanelRequests {
                    pause: control_panel_input.take_pause(),
                    reset: control_panel_input.take_reset(),
                    mute: control_panel_input.take_mute(),
                    voice: control_panel_input.take_voice(),
                };
                let frame_input = gather_frame_input(
                    &scene,
                    &metrics_before,
                    layout,
                    surface_changed,
                    panel,
                    keyboard,
                );

                let simulation_start = Instant::now();
                update_scene(frame_dt, frame_input, &mut scene);
                let simulation = simulation_start.elapsed();

                let metrics = SceneMetrics::from_scene(&scene, available_width, screen_height);
                let render_start = Instant::now();
                macroquad::window::clear_background(background);
                draw_scene(&scene, &metrics, &mut trail);

                if show_panel {
                    let context =
                        draw_status_panel(&scene, panel_width, screen_width, screen_height);
                    if let Some(context) = context {
                        let mut status_panel_ui = macroquad::ui::root_ui();
                        let result = draw_status_panel_ui(&mut status_panel_ui, context);
                        control_panel_input.register(result);
                    }
                }
                let render = render_start.elapsed();

                let fps_metrics = fps_counter.record_frame(FrameBreakdown {
                    frame: frame_dt,
                    simulation,
                    render,
                });
                if show_fps {
                    if let Some(FpsMetrics {
                        per_second,
                        trailing_ten_seconds,
                        avg_simulation,
                        avg_render,
                    }) = fps_metrics
                    {
                        info!(
                            fps = per_second,
                            fps_10s = trailing_ten_seconds,
                            simulation_ms = avg_simulation.as_secs_f64() * 1_000.0,
                            render_ms = avg_render.as_secs_f64() * 1_000.0,
                            "frame timing"
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Placement of the scaled scene inside the window.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SceneMetrics {
    scale: f32,
    offset: Vec2,
    size: Vec2,
}

impl SceneMetrics {
    fn from_scene(scene: &Scene, available_width: f32, screen_height: f32) -> Self {
        let world = Vec2::new(scene.width(), scene.height());
        let scale = if world.x <= f32::EPSILON || world.y <= f32::EPSILON {
            1.0
        } else {
            (available_width / world.x).min(screen_height / world.y).max(0.0)
        };
        let size = world * scale;
        let offset = Vec2::new(
            ((available_width - size.x) * 0.5).max(0.0),
            ((screen_height - size.y) * 0.5).max(0.0),
        );
        Self {
            scale,
            offset,
            size,
        }
    }

    fn to_screen(&self, point: Vec2) -> MacroquadVec2 {
        let screen = self.offset + point * self.scale;
        MacroquadVec2::new(screen.x, screen.y)
    }

    fn to_world(&self, cursor: Vec2) -> Option<Vec2> {
        if self.scale <= f32::EPSILON {
            return None;
        }
        Some((cursor - self.offset) / self.scale)
    }
}

/// Status panel buttons latched during the previous frame.
#[derive(Clone, Copy, Debug, Default)]
struct PanelRequests {
    pause: bool,
    reset: bool,
    mute: bool,
    voice: bool,
}

impl PanelRequests {
    fn any(&self) -> bool {
        self.pause || self.reset || self.mute || self.voice
    }
}

/// Pointer state sampled for a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct PointerObservation {
    position: Vec2,
    held: bool,
    pressed: bool,
}

fn gather_frame_input(
    scene: &Scene,
    metrics: &SceneMetrics,
    layout: SurfaceLayout,
    surface: Option<GridDimensions>,
    panel: PanelRequests,
    keyboard: KeyboardShortcuts,
) -> FrameInput {
    let (cursor_x, cursor_y) = mouse_position();
    let pointer = PointerObservation {
        position: Vec2::new(cursor_x, cursor_y),
        held: is_mouse_button_down(MouseButton::Left),
        pressed: is_mouse_button_pressed(MouseButton::Left),
    };
    gather_frame_input_from_observations(scene, metrics, layout, surface, panel, keyboard, pointer)
}

fn gather_frame_input_from_observations(
    scene: &Scene,
    metrics: &SceneMetrics,
    layout: SurfaceLayout,
    surface: Option<GridDimensions>,
    panel: PanelRequests,
    keyboard: KeyboardShortcuts,
    pointer: PointerObservation,
) -> FrameInput {
    let brush = if pointer.held {
        metrics
            .to_world(pointer.position)
            .and_then(|world| layout.cell_at(scene.dimensions, world * layout.world_scale()))
    } else {
        None
    };

    FrameInput {
        surface,
        brush,
        gesture: pointer.pressed || keyboard.any() || panel.any(),
        toggle_pause: keyboard.toggle_pause || panel.pause,
        reset: keyboard.reset || panel.reset,
        toggle_mute: keyboard.toggle_mute || panel.mute,
        toggle_eraser: keyboard.toggle_eraser,
        cycle_voice: keyboard.cycle_voice || panel.voice,
        faster: keyboard.faster,
        slower: keyboard.slower,
        brush_grow: keyboard.brush_grow,
        brush_shrink: keyboard.brush_shrink,
        select_mode: keyboard.select_mode,
    }
}

fn draw_scene(scene: &Scene, metrics: &SceneMetrics, trail: &mut TrailHistory) {
    match scene.backdrop {
        Backdrop::Clear => trail.clear(),
        Backdrop::Trail { wash } => {
            for (fade, sprites) in trail.faded(wash) {
                for sprite in sprites {
                    draw_sprite(sprite, metrics, fade);
                }
            }
            trail.record(&scene.sprites);
        }
    }

    for sprite in &scene.sprites {
        draw_sprite(sprite, metrics, 1.0);
    }

    if scene.dim > 0.0 {
        let overlay = to_macroquad_color(Color::BLACK.with_alpha(scene.dim));
        macroquad::shapes::draw_rectangle(
            metrics.offset.x,
            metrics.offset.y,
            metrics.size.x,
            metrics.size.y,
            overlay,
        );
    }
}

fn draw_sprite(sprite: &Sprite, metrics: &SceneMetrics, opacity: f32) {
    let color = sprite.color.with_alpha(sprite.color.alpha * opacity);
    if sprite.glow > 0.0 {
        let (centre, extent) = shape_bounds(&sprite.shape);
        let centre = metrics.to_screen(centre);
        macroquad::shapes::draw_circle(
            centre.x,
            centre.y,
            (extent + sprite.glow) * metrics.scale,
            to_macroquad_color(color.with_alpha(color.alpha * GLOW_ALPHA)),
        );
    }

    let fill = to_macroquad_color(color);
    match sprite.shape {
        Shape::Rect { origin, size } => {
            let corner = metrics.to_screen(origin);
            macroquad::shapes::draw_rectangle(
                corner.x,
                corner.y,
                size.x * metrics.scale,
                size.y * metrics.scale,
                fill,
            );
        }
        Shape::Circle { centre, radius } => {
            let centre = metrics.to_screen(centre);
            macroquad::shapes::draw_circle(centre.x, centre.y, radius * metrics.scale, fill);
        }
        Shape::Triangle { points } => {
            macroquad::shapes::draw_triangle(
                metrics.to_screen(points[0]),
                metrics.to_screen(points[1]),
                metrics.to_screen(points[2]),
                fill,
            );
        }
    }
}

/// Centre and bounding radius of a shape in world units.
fn shape_bounds(shape: &Shape) -> (Vec2, f32) {
    match *shape {
        Shape::Rect { origin, size } => (origin + size * 0.5, size.max_element() * 0.5),
        Shape::Circle { centre, radius } => (centre, radius),
        Shape::Triangle { points } => {
            let centre = (points[0] + points[1] + points[2]) / 3.0;
            let extent = points
                .iter()
                .map(|point| point.distance(centre))
                .fold(0.0, f32::max);
            (centre, extent)
        }
    }
}

fn draw_status_panel(
    scene: &Scene,
    width: f32,
    screen_width: f32,
    screen_height: f32,
) -> Option<StatusPanelUiContext> {
    let status = scene.status?;
    if width <= f32::EPSILON {
        return None;
    }

    let left = (screen_width - width).max(0.0);
    let background = to_macroquad_color(PANEL_BACKGROUND);
    macroquad::shapes::draw_rectangle(left, 0.0, width, screen_height, background);

    Some(StatusPanelUiContext {
        origin: MacroquadVec2::new(left, 0.0),
        size: MacroquadVec2::new(width, screen_height),
        background,
        status,
    })
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
