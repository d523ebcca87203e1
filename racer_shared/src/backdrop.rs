//! Horizon backdrop.
//!
//! A flat silhouette layer drawn between the sky fill and the road: a mountain
//! range or a city skyline. Shapes are rolled once per race from the race RNG
//! and stored in screen fractions, so every frame of a race draws the same
//! backdrop at any viewport size.

use rand::Rng;

use crate::render::{Canvas, Color, Pos, Rect};

/// Horizon row as a fraction of screen height.
pub const HORIZON: f64 = 0.3;

const MOUNTAIN_COLOR: Color = Color::rgb(0x4a, 0x4a, 0x4a);
const BUILDING_COLOR: Color = Color::rgb(0x33, 0x33, 0x33);
const WINDOW_COLOR: Color = Color::rgb(0xff, 0xff, 0x00);

const PEAKS: usize = 5;
const BUILDINGS: usize = 20;
const WINDOW_COLUMNS: u32 = 3;
const WINDOW_ROWS: u32 = 5;
/// Pixel inset of the window grid from the building's top-left corner.
const WINDOW_INSET: f64 = 5.0;

/// Silhouette height in [0.1, 0.3) of the screen.
fn rise<R: Rng>(rng: &mut R) -> f64 {
    0.1 + rng.gen::<f64>() * 0.2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackdropStyle {
    Mountains,
    Skyline,
}

impl BackdropStyle {
    /// City tracks get a skyline, everything else mountains.
    pub fn for_track(name: &str) -> Self {
        if name.contains("City") {
            Self::Skyline
        } else {
            Self::Mountains
        }
    }
}

/// One silhouette. `left` is a fraction of width, `height` of screen height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackdropShape {
    Peak {
        left: f64,
        height: f64,
    },
    Building {
        left: f64,
        height: f64,
        /// Lit windows, bit `column * rows + row`.
        lit: u16,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Backdrop {
    shapes: Vec<BackdropShape>,
}

impl Backdrop {
    pub fn generate<R: Rng>(style: BackdropStyle, rng: &mut R) -> Self {
        let shapes = match style {
            BackdropStyle::Mountains => (0..PEAKS)
                .map(|i| BackdropShape::Peak {
                    left: i as f64 * 0.2,
                    height: rise(rng),
                })
                .collect(),
            BackdropStyle::Skyline => (0..BUILDINGS)
                .map(|i| {
                    let height = rise(rng);
                    let lit = (0..WINDOW_COLUMNS * WINDOW_ROWS)
                        .filter(|_| rng.gen::<f64>() > 0.5)
                        .fold(0u16, |acc, bit| acc | 1 << bit);
                    BackdropShape::Building {
                        left: i as f64 * 0.05,
                        height,
                        lit,
                    }
                })
                .collect(),
        };
        Self { shapes }
    }

    pub fn shapes(&self) -> &[BackdropShape] {
        &self.shapes
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Draws every silhouette onto a `width` × `height` canvas.
    pub fn paint(&self, canvas: &mut dyn Canvas, width: f64, height: f64) {
        let horizon = height * HORIZON;
        for shape in &self.shapes {
            match *shape {
                BackdropShape::Peak { left, height: h } => {
                    let x = left * width;
                    canvas.fill_polygon(
                        &[
                            Pos::new(x, horizon),
                            Pos::new(x + width * 0.2, horizon - h * height),
                            Pos::new(x + width * 0.4, horizon),
                        ],
                        MOUNTAIN_COLOR,
                    );
                }
                BackdropShape::Building { left, height: h, lit } => {
                    let x = left * width;
                    let w = width * 0.05;
                    let h = h * height;
                    let top = horizon - h;
                    canvas.fill_rect(
                        Rect {
                            x,
                            y: top,
                            w: w * 0.8,
                            h,
                        },
                        BUILDING_COLOR,
                    );
                    for column in 0..WINDOW_COLUMNS {
                        for row in 0..WINDOW_ROWS {
                            if lit & (1 << (column * WINDOW_ROWS + row)) == 0 {
                                continue;
                            }
                            canvas.fill_rect(
                                Rect {
                                    x: x + f64::from(column) * w * 0.2 + WINDOW_INSET,
                                    y: top + f64::from(row) * h * 0.2 + WINDOW_INSET,
                                    w: w * 0.1,
                                    h: h * 0.1,
                                },
                                WINDOW_COLOR,
                            );
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::render::{DrawCommand, RecordingCanvas};

    fn painted(backdrop: &Backdrop) -> RecordingCanvas {
        let mut canvas = RecordingCanvas::default();
        backdrop.paint(&mut canvas, 900.0, 600.0);
        canvas
    }

    #[test]
    fn style_follows_track_name() {
        assert_eq!(BackdropStyle::for_track("City Nights"), BackdropStyle::Skyline);
        assert_eq!(
            BackdropStyle::for_track("Countryside Sprint"),
            BackdropStyle::Mountains
        );
    }

    #[test]
    fn mountains_are_five_peaks_on_the_horizon() {
        let backdrop = Backdrop::generate(BackdropStyle::Mountains, &mut StdRng::seed_from_u64(1));
        let canvas = painted(&backdrop);
        assert_eq!(canvas.polygon_count(), 5);
        for command in &canvas.commands {
            let DrawCommand::Polygon { points, color } = command else {
                panic!("unexpected {command:?}");
            };
            assert_eq!(*color, MOUNTAIN_COLOR);
            assert_eq!(points[0].y, 180.0);
            assert_eq!(points[2].y, 180.0);
            let rise = 180.0 - points[1].y;
            assert!((60.0..=180.0).contains(&rise));
        }
    }

    #[test]
    fn skyline_draws_buildings_and_windows() {
        let backdrop = Backdrop::generate(BackdropStyle::Skyline, &mut StdRng::seed_from_u64(2));
        let canvas = painted(&backdrop);
        assert_eq!(canvas.polygon_count(), 0);
        let colours: Vec<Color> = canvas
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Rect { color, .. } => Some(*color),
                _ => None,
            })
            .collect();
        let buildings = colours.iter().filter(|c| **c == BUILDING_COLOR).count();
        let windows = colours.iter().filter(|c| **c == WINDOW_COLOR).count();
        assert_eq!(buildings, 20);
        assert!(windows > 0 && windows < 20 * 15);
    }

    #[test]
    fn same_seed_same_backdrop() {
        let a = Backdrop::generate(BackdropStyle::Skyline, &mut StdRng::seed_from_u64(3));
        let b = Backdrop::generate(BackdropStyle::Skyline, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
        assert!(Backdrop::default().is_empty());
    }
}
