//! Road renderer.
//!
//! Drawing goes through the [`Canvas`] trait so the core never depends on a
//! graphics backend. A frame has two strict phases:
//!
//! 1. projection: walk the visible window near-to-far from the camera's
//!    segment, project every segment, then bend the window with
//!    [`accumulate_curves`];
//! 2. painting: walk the same window back-to-front so nearer road and sprites
//!    cover farther ones.

use serde::{Deserialize, Serialize};

use crate::{
    camera::{accumulate_curves, Camera},
    config::RoadConfig,
    math::{lerp, ScreenPoint},
    road::{ColorBand, Segment, SegmentStore, NEAR_LEFT, NEAR_RIGHT},
};

/// RGBA colour, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same colour with alpha `alpha` in [0, 1].
    pub fn with_alpha(self, alpha: f64) -> Self {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self { a, ..self }
    }

    /// Parses `#rgb` or `#rrggbb`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
        let pair = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            3 => Some(Self::rgb(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
            6 => Some(Self::rgb(pair(0)?, pair(2)?, pair(4)?)),
            _ => None,
        }
    }
}

/// Road surface colours for one band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandPalette {
    pub road: Color,
    pub grass: Color,
    pub rumble: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoadPalette {
    pub light: BandPalette,
    pub dark: BandPalette,
    pub lane: Color,
    pub fog: Color,
}

impl RoadPalette {
    pub fn band(&self, band: ColorBand) -> &BandPalette {
        match band {
            ColorBand::Light => &self.light,
            ColorBand::Dark => &self.dark,
        }
    }
}

impl Default for RoadPalette {
    fn default() -> Self {
        Self {
            light: BandPalette {
                road: Color::rgb(0x88, 0x88, 0x88),
                grass: Color::rgb(0x28, 0xb5, 0x20),
                rumble: Color::rgb(0xb7, 0x2e, 0x3e),
            },
            dark: BandPalette {
                road: Color::rgb(0x66, 0x66, 0x66),
                grass: Color::rgb(0x24, 0xa5, 0x1c),
                rumble: Color::rgb(0xb7, 0x2e, 0x3e),
            },
            lane: Color::WHITE,
            fog: Color::BLACK,
        }
    }
}

/// Axis-aligned rectangle in screen pixels; `h` may come in negative and is
/// normalised by [`Rect::spanning`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    /// Rectangle covering rows `y0..y1` in either order.
    pub fn spanning(x: f64, w: f64, y0: f64, y1: f64) -> Self {
        Self {
            x,
            y: y0.min(y1),
            w,
            h: (y1 - y0).abs(),
        }
    }
}

/// A 2D screen position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pos {
    pub x: f64,
    pub y: f64,
}

impl Pos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<ScreenPoint> for Pos {
    fn from(p: ScreenPoint) -> Self {
        Self::new(p.x, p.y)
    }
}

/// Drawing surface.
pub trait Canvas {
    fn begin_frame(&mut self, width: f64, height: f64);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn fill_polygon(&mut self, points: &[Pos], color: Color);
    /// `sprite` is an opaque id; resolving it to an image is the backend's job.
    fn draw_sprite(&mut self, sprite: &str, at: Pos, scale: f64);
    fn end_frame(&mut self);
}

/// Discards every call; useful for headless runs.
#[derive(Default)]
pub struct NullCanvas;

impl Canvas for NullCanvas {
    fn begin_frame(&mut self, _width: f64, _height: f64) {}
    fn fill_rect(&mut self, _rect: Rect, _color: Color) {}
    fn fill_polygon(&mut self, _points: &[Pos], _color: Color) {}
    fn draw_sprite(&mut self, _sprite: &str, _at: Pos, _scale: f64) {}
    fn end_frame(&mut self) {}
}

/// A recorded canvas call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    BeginFrame { width: f64, height: f64 },
    Rect { rect: Rect, color: Color },
    Polygon { points: Vec<Pos>, color: Color },
    Sprite { sprite: String, at: Pos, scale: f64 },
    EndFrame,
}

/// Keeps every call of the last frame.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn sprites(&self) -> impl Iterator<Item = (&str, Pos, f64)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Sprite { sprite, at, scale } => Some((sprite.as_str(), *at, *scale)),
            _ => None,
        })
    }

    pub fn polygon_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Polygon { .. }))
            .count()
    }
}

impl Canvas for RecordingCanvas {
    fn begin_frame(&mut self, width: f64, height: f64) {
        self.commands.clear();
        self.commands.push(DrawCommand::BeginFrame { width, height });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::Rect { rect, color });
    }

    fn fill_polygon(&mut self, points: &[Pos], color: Color) {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
            color,
        });
    }

    fn draw_sprite(&mut self, sprite: &str, at: Pos, scale: f64) {
        self.commands.push(DrawCommand::Sprite {
            sprite: sprite.to_string(),
            at,
            scale,
        });
    }

    fn end_frame(&mut self) {
        self.commands.push(DrawCommand::EndFrame);
    }
}

/// A car as the renderer sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSprite {
    pub sprite: String,
    pub x: f64,
    pub y: f64,
    /// Wrapped onto the track.
    pub z: f64,
    /// Drawn at the fixed chase-view anchor instead of projected.
    pub is_player: bool,
}

/// One entry of the visible window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleSegment {
    pub index: usize,
    /// Added to the segment's world z to line it up with the camera.
    pub z_offset: f64,
}

/// Per-frame counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub visible: usize,
    pub painted: usize,
    pub clipped: usize,
    pub sprites: usize,
}

/// Projects and paints the road.
#[derive(Debug, Clone)]
pub struct RoadRenderer {
    cfg: RoadConfig,
    palette: RoadPalette,
    window: Vec<VisibleSegment>,
}

impl RoadRenderer {
    pub fn new(cfg: RoadConfig) -> Self {
        Self::with_palette(cfg, RoadPalette::default())
    }

    pub fn with_palette(cfg: RoadConfig, palette: RoadPalette) -> Self {
        Self {
            cfg,
            palette,
            window: Vec::new(),
        }
    }

    pub fn palette(&self) -> &RoadPalette {
        &self.palette
    }

    /// Tracks tint the distance fog; the road colours stay fixed.
    pub fn set_fog_color(&mut self, fog: Color) {
        self.palette.fog = fog;
    }

    /// Window computed by the last [`RoadRenderer::project`], near-to-far.
    pub fn window(&self) -> &[VisibleSegment] {
        &self.window
    }

    /// Projection phase: fills every visible segment's screen fields.
    pub fn project(&mut self, store: &mut SegmentStore, camera: &Camera) {
        self.window.clear();
        if store.is_empty() {
            return;
        }

        let segment_length = store.segment_length();
        let base_index = store.index_at(camera.z);
        // Unwrapped z of the base segment's near edge.
        let base_z = (camera.z / segment_length).floor() * segment_length;
        let count = self.cfg.visible_segments.min(store.len());

        // The window is segments[base..] followed by segments[..base].
        let (head, tail) = store.segments_mut().split_at_mut(base_index);
        for (n, segment) in tail.iter_mut().chain(head.iter_mut()).take(count).enumerate() {
            let z_offset = base_z + n as f64 * segment_length - segment.near_z();
            camera.project_segment(segment, z_offset);
            self.window.push(VisibleSegment {
                index: segment.index,
                z_offset,
            });
        }

        let (head, tail) = store.segments_mut().split_at_mut(base_index);
        accumulate_curves(
            tail.iter_mut().chain(head.iter_mut()).take(count),
            camera.draw_distance(),
        );
    }

    /// Painting phase. Call after [`RoadRenderer::project`] for this frame.
    pub fn paint(
        &self,
        canvas: &mut dyn Canvas,
        store: &SegmentStore,
        camera: &Camera,
        vehicles: &[VehicleSprite],
    ) -> FrameStats {
        let screen = camera.screen();
        let mut stats = FrameStats {
            visible: self.window.len(),
            ..FrameStats::default()
        };

        for entry in self.window.iter().rev() {
            let Some(segment) = store.get(entry.index) else {
                continue;
            };
            if segment.clipped {
                stats.clipped += 1;
                continue;
            }
            self.paint_segment(canvas, segment, screen.width);
            stats.painted += 1;
            stats.sprites += self.paint_sprites(canvas, segment, entry, camera, store, vehicles);
        }
        stats
    }

    fn paint_segment(&self, canvas: &mut dyn Canvas, segment: &Segment, width: f64) {
        let colors = self.palette.band(segment.color_band);
        let [nl, nr, fr, fl] = segment.screen;

        canvas.fill_rect(Rect::spanning(0.0, width, nl.y, fl.y), colors.grass);

        canvas.fill_polygon(
            &[nl.into(), nr.into(), fr.into(), fl.into()],
            colors.road,
        );

        let near_rumble = (nr.x - nl.x) / 2.0 * self.cfg.rumble_fraction;
        let far_rumble = (fr.x - fl.x) / 2.0 * self.cfg.rumble_fraction;
        canvas.fill_polygon(
            &[
                Pos::new(nl.x - near_rumble, nl.y),
                nl.into(),
                fl.into(),
                Pos::new(fl.x - far_rumble, fl.y),
            ],
            colors.rumble,
        );
        canvas.fill_polygon(
            &[
                nr.into(),
                Pos::new(nr.x + near_rumble, nr.y),
                Pos::new(fr.x + far_rumble, fr.y),
                fr.into(),
            ],
            colors.rumble,
        );

        if segment.color_band == ColorBand::Dark {
            let lanes = self.cfg.lanes.max(1);
            let marker = self.cfg.lane_marker_width * nl.w * 2.0;
            for lane in 1..lanes {
                let t = lane as f64 / lanes as f64;
                let x = lerp(nl.x, nr.x, t);
                canvas.fill_rect(
                    Rect::spanning(x - marker / 2.0, marker, nl.y, fl.y),
                    self.palette.lane,
                );
            }
        }

        if segment.fog > 0.0 {
            canvas.fill_rect(
                Rect::spanning(0.0, width, nl.y, fl.y),
                self.palette.fog.with_alpha(segment.fog),
            );
        }
    }

    /// Objects first, then vehicles, so cars are never hidden by scenery of
    /// the same segment.
    fn paint_sprites(
        &self,
        canvas: &mut dyn Canvas,
        segment: &Segment,
        entry: &VisibleSegment,
        camera: &Camera,
        store: &SegmentStore,
        vehicles: &[VehicleSprite],
    ) -> usize {
        let screen = camera.screen();
        let near_left = segment.screen[NEAR_LEFT];
        let near_right = segment.screen[NEAR_RIGHT];
        let across = |offset: f64| lerp(near_left.x, near_right.x, (offset + 1.0) / 2.0);
        let mut drawn = 0;

        let object_scale = camera.scale_at(segment.near_z() + entry.z_offset);
        for object in segment.objects() {
            canvas.draw_sprite(
                &object.sprite,
                Pos::new(across(object.offset), near_left.y),
                object_scale,
            );
            drawn += 1;
        }

        let road_width = store.road_width();
        for vehicle in vehicles.iter().filter(|v| segment.contains_z(v.z)) {
            let z = vehicle.z + entry.z_offset;
            let scale = camera.scale_at(z);
            let at = if vehicle.is_player {
                Pos::new(screen.width / 2.0, screen.height * 0.8)
            } else {
                let lift = camera.screen_y(vehicle.y, screen.height)
                    - camera.screen_y(segment.y(), screen.height);
                Pos::new(across(vehicle.x / road_width), near_left.y + lift)
            };
            canvas.draw_sprite(&vehicle.sprite, at, scale);
            drawn += 1;
        }
        drawn
    }
}
