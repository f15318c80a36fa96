#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Convoy adapters.
//!
//! Engines describe each frame as a list of [`Sprite`] values expressed in
//! world units ([`CELL_UNITS`] per grid cell). Backends scale the world to the
//! window, so nothing in the simulation depends on the pixel size of a cell.

use anyhow::Result as AnyResult;
use convoy_core::{CellCoord, GridDimensions, Mode, RenderStyle, VoiceAlgorithm, CELL_UNITS};
use glam::Vec2;
use std::time::Duration;
use thiserror::Error;

/// Gap left between neighbouring square cells, in world units.
pub const SQUARE_GAP: f32 = 1.0;
/// Gap left between neighbouring circular cells, in world units.
pub const CIRCLE_GAP: f32 = 2.0;
/// Halo radius of glowing cells, in world units.
pub const GLOW_RADIUS: f32 = 1.5 * CELL_UNITS;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Creates an opaque color from hue in degrees and saturation/lightness
    /// percentages.
    #[must_use]
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let hue = hue.rem_euclid(360.0) / 360.0;
        let saturation = (saturation / 100.0).clamp(0.0, 1.0);
        let lightness = (lightness / 100.0).clamp(0.0, 1.0);

        if saturation <= f32::EPSILON {
            return Self::new(lightness, lightness, lightness, 1.0);
        }

        let q = if lightness < 0.5 {
            lightness * (1.0 + saturation)
        } else {
            lightness + saturation - lightness * saturation
        };
        let p = 2.0 * lightness - q;

        Self::new(
            hue_to_channel(p, q, hue + 1.0 / 3.0),
            hue_to_channel(p, q, hue),
            hue_to_channel(p, q, hue - 1.0 / 3.0),
            1.0,
        )
    }

    /// Returns the same color with a replaced alpha channel.
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Geometric primitive drawn by backends, in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Axis-aligned rectangle.
    Rect {
        /// Top-left corner.
        origin: Vec2,
        /// Width and height.
        size: Vec2,
    },
    /// Filled circle.
    Circle {
        /// Centre point.
        centre: Vec2,
        /// Radius.
        radius: f32,
    },
    /// Filled triangle.
    Triangle {
        /// Corner points.
        points: [Vec2; 3],
    },
}

/// Single coloured primitive of a scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    /// Geometry of the sprite.
    pub shape: Shape,
    /// Fill color.
    pub color: Color,
    /// Radius of the soft halo drawn behind the sprite; zero disables it.
    pub glow: f32,
}

impl Sprite {
    /// Creates a sprite without glow.
    #[must_use]
    pub const fn new(shape: Shape, color: Color) -> Self {
        Self {
            shape,
            color,
            glow: 0.0,
        }
    }

    /// Fills an entire grid cell.
    #[must_use]
    pub fn cell_fill(column: u32, row: u32, color: Color) -> Self {
        Self::new(
            Shape::Rect {
                origin: cell_origin(column, row),
                size: Vec2::splat(CELL_UNITS),
            },
            color,
        )
    }

    /// Draws a grid cell using the provided style.
    #[must_use]
    pub fn cell(column: u32, row: u32, style: RenderStyle, color: Color) -> Self {
        let origin = cell_origin(column, row);
        match style {
            RenderStyle::Squares => Self::new(
                Shape::Rect {
                    origin,
                    size: Vec2::splat(CELL_UNITS - SQUARE_GAP),
                },
                color,
            ),
            RenderStyle::Circles => Self::new(
                Shape::Circle {
                    centre: origin + Vec2::splat(CELL_UNITS * 0.5),
                    radius: (CELL_UNITS - CIRCLE_GAP) * 0.5,
                },
                color,
            ),
            RenderStyle::Glow => Self {
                glow: GLOW_RADIUS,
                ..Self::new(
                    Shape::Rect {
                        origin,
                        size: Vec2::splat(CELL_UNITS - SQUARE_GAP),
                    },
                    color,
                )
            },
        }
    }
}

fn cell_origin(column: u32, row: u32) -> Vec2 {
    Vec2::new(column as f32 * CELL_UNITS, row as f32 * CELL_UNITS)
}

/// How the previous frame is cleared before drawing sprites.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Backdrop {
    /// Opaque clear with the presentation's clear color.
    #[default]
    Clear,
    /// Translucent wash over the previous frame, leaving motion trails.
    Trail {
        /// Color of the wash; its alpha controls trail length.
        wash: Color,
    },
}

/// Status values shown by backends next to the simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatusPanel {
    /// Active simulation mode.
    pub mode: Mode,
    /// Whether simulation steps are suspended.
    pub paused: bool,
    /// Whether the aggregate audio output is silenced.
    pub muted: bool,
    /// Whether the audio device has been started.
    pub audio_ready: bool,
    /// Active voice algorithm.
    pub voice: VoiceAlgorithm,
    /// Whether the brush clears cells.
    pub eraser: bool,
    /// Brush radius in cells.
    pub brush_radius: u32,
    /// Update interval in milliseconds.
    pub interval_ms: u64,
    /// Steps since the last setup.
    pub tick: u64,
}

/// Scene description populated every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Grid extent of the simulation being drawn.
    pub dimensions: GridDimensions,
    /// Clearing behaviour for the frame.
    pub backdrop: Backdrop,
    /// Primitives drawn in order.
    pub sprites: Vec<Sprite>,
    /// Alpha of the black overlay drawn above the sprites.
    pub dim: f32,
    /// Optional status panel.
    pub status: Option<StatusPanel>,
}

impl Scene {
    /// Creates an empty scene for the provided grid.
    #[must_use]
    pub fn new(dimensions: GridDimensions) -> Self {
        Self {
            dimensions,
            backdrop: Backdrop::Clear,
            sprites: Vec::new(),
            dim: 0.0,
            status: None,
        }
    }

    /// Clears per-frame content while keeping the sprite allocation.
    pub fn begin_frame(&mut self, dimensions: GridDimensions) {
        self.dimensions = dimensions;
        self.backdrop = Backdrop::Clear;
        self.sprites.clear();
        self.dim = 0.0;
    }

    /// Appends a sprite.
    pub fn push(&mut self, sprite: Sprite) {
        self.sprites.push(sprite);
    }

    /// Width of the scene in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.dimensions.width_units()
    }

    /// Height of the scene in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.dimensions.height_units()
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Grid extent implied by the current surface, reported when it changes.
    pub surface: Option<GridDimensions>,
    /// Cell under the pointer while the primary button is held.
    pub brush: Option<CellCoord>,
    /// Any user gesture that may unlock the audio device.
    pub gesture: bool,
    /// Toggle pause.
    pub toggle_pause: bool,
    /// Reset the active mode.
    pub reset: bool,
    /// Toggle mute.
    pub toggle_mute: bool,
    /// Toggle eraser brush.
    pub toggle_eraser: bool,
    /// Cycle the voice algorithm.
    pub cycle_voice: bool,
    /// Shorten the update interval.
    pub faster: bool,
    /// Lengthen the update interval.
    pub slower: bool,
    /// Grow the brush.
    pub brush_grow: bool,
    /// Shrink the brush.
    pub brush_shrink: bool,
    /// Switch to the provided mode.
    pub select_mode: Option<Mode>,
}

/// Mapping between surface pixels and grid cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceLayout {
    cell_pixels: f32,
}

impl SurfaceLayout {
    /// Default on-screen size of a cell.
    pub const DEFAULT_CELL_PIXELS: f32 = 8.0;

    /// Creates a layout drawing every cell `cell_pixels` wide.
    pub fn new(cell_pixels: f32) -> Result<Self, RenderingError> {
        if !cell_pixels.is_finite() || cell_pixels < 1.0 {
            return Err(RenderingError::InvalidCellSize { cell_pixels });
        }
        Ok(Self { cell_pixels })
    }

    /// On-screen size of a cell.
    #[must_use]
    pub const fn cell_pixels(&self) -> f32 {
        self.cell_pixels
    }

    /// Grid extent that fits a surface of the provided pixel size.
    #[must_use]
    pub fn grid_for_surface(&self, width: f32, height: f32) -> GridDimensions {
        let columns = (width.max(0.0) / self.cell_pixels).floor() as u32;
        let rows = (height.max(0.0) / self.cell_pixels).floor() as u32;
        GridDimensions::new(columns, rows)
    }

    /// Cell under a pointer positioned at `pixel` relative to the grid origin.
    #[must_use]
    pub fn cell_at(&self, dimensions: GridDimensions, pixel: Vec2) -> Option<CellCoord> {
        if !pixel.is_finite() || pixel.x < 0.0 || pixel.y < 0.0 {
            return None;
        }
        let column = (pixel.x / self.cell_pixels).floor() as u32;
        let row = (pixel.y / self.cell_pixels).floor() as u32;
        dimensions
            .index_of(column, row)
            .map(|_| CellCoord::new(column, row))
    }

    /// Scale factor from world units to pixels.
    #[must_use]
    pub fn world_scale(&self) -> f32 {
        self.cell_pixels / CELL_UNITS
    }
}

impl Default for SurfaceLayout {
    fn default() -> Self {
        Self {
            cell_pixels: Self::DEFAULT_CELL_PIXELS,
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Pixel layout of the grid.
    pub layout: SurfaceLayout,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, layout: SurfaceLayout, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            layout,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Convoy scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// per-frame input captured by the adapter, and repopulates the scene
    /// before it is drawn.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, Error, PartialEq)]
pub enum RenderingError {
    /// Cells must be at least one pixel wide.
    #[error("cell size must be a finite value of at least one pixel (received {cell_pixels})")]
    InvalidCellSize {
        /// Provided size that failed validation.
        cell_pixels: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Color, expected: Color) {
        for (a, e) in [
            (actual.red, expected.red),
            (actual.green, expected.green),
            (actual.blue, expected.blue),
        ] {
            assert!((a - e).abs() < 1e-3, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn hsl_primaries() {
        assert_close(Color::from_hsl(0.0, 100.0, 50.0), Color::new(1.0, 0.0, 0.0, 1.0));
        assert_close(Color::from_hsl(120.0, 100.0, 50.0), Color::new(0.0, 1.0, 0.0, 1.0));
        assert_close(Color::from_hsl(240.0, 100.0, 50.0), Color::new(0.0, 0.0, 1.0, 1.0));
        assert_close(Color::from_hsl(360.0, 100.0, 100.0), Color::new(1.0, 1.0, 1.0, 1.0));
        assert_close(Color::from_hsl(42.0, 0.0, 25.0), Color::new(0.25, 0.25, 0.25, 1.0));
    }

    #[test]
    fn square_cells_leave_a_gap() {
        let sprite = Sprite::cell(2, 3, RenderStyle::Squares, Color::BLACK);
        assert_eq!(
            sprite.shape,
            Shape::Rect {
                origin: Vec2::new(16.0, 24.0),
                size: Vec2::splat(7.0),
            }
        );
        assert_eq!(sprite.glow, 0.0);
        assert!(Sprite::cell(0, 0, RenderStyle::Glow, Color::BLACK).glow > 0.0);
    }

    #[test]
    fn layout_rejects_degenerate_cells() {
        assert_eq!(
            SurfaceLayout::new(0.0),
            Err(RenderingError::InvalidCellSize { cell_pixels: 0.0 })
        );
        assert!(SurfaceLayout::new(f32::NAN).is_err());
    }

    #[test]
    fn layout_maps_pixels_to_cells() {
        let layout = SurfaceLayout::new(10.0).expect("valid layout");
        let dimensions = layout.grid_for_surface(95.0, 40.0);
        assert_eq!(dimensions, GridDimensions::new(9, 4));

        assert_eq!(
            layout.cell_at(dimensions, Vec2::new(35.0, 12.0)),
            Some(CellCoord::new(3, 1))
        );
        assert_eq!(layout.cell_at(dimensions, Vec2::new(95.0, 12.0)), None);
        assert_eq!(layout.cell_at(dimensions, Vec2::new(-1.0, 12.0)), None);
    }

    #[test]
    fn begin_frame_clears_transient_content() {
        let mut scene = Scene::new(GridDimensions::new(4, 4));
        scene.push(Sprite::cell_fill(0, 0, Color::BLACK));
        scene.dim = 0.5;
        scene.backdrop = Backdrop::Trail {
            wash: Color::BLACK.with_alpha(0.15),
        };

        scene.begin_frame(GridDimensions::new(8, 2));
        assert!(scene.sprites.is_empty());
        assert_eq!(scene.dim, 0.0);
        assert_eq!(scene.backdrop, Backdrop::Clear);
        assert_eq!(scene.width(), 64.0);
    }
}
