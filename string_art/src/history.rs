use std::{fmt, ops::Deref};

use ::image::GrayImage;
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};

use crate::{
    geometry::{Point, Segment},
    image::PixelBuffer,
    pins::PinTable,
    stroke::StrokeMask,
    Float, Grid,
};

/// A thread going from one pin to another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chord {
    pub start: usize,
    pub end: usize,
}

impl Chord {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pin {} → Pin {}", self.start, self.end)
    }
}

/// Every chord drawn so far, in drawing order. Entry `i` is line `i + 1`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<Chord>);

impl History {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn push(&mut self, chord: Chord) {
        self.0.push(chord);
    }

    /// One `"<line>: Pin <a> → Pin <b>"` row per chord.
    pub fn instructions(&self) -> String {
        let mut instructions = String::new();
        instructions.extend(
            self.0
                .iter()
                .enumerate()
                .map(|(index, chord)| format!("{}: {}\n", index + 1, chord)),
        );
        instructions
    }
}

impl Deref for History {
    type Target = [Chord];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Chord>> for History {
    fn from(chords: Vec<Chord>) -> Self {
        Self(chords)
    }
}

impl From<History> for Vec<Chord> {
    fn from(history: History) -> Self {
        history.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle<S> {
    pub width: S,
    pub opacity: S,
}

impl<S: Float> Default for StrokeStyle<S> {
    fn default() -> Self {
        Self {
            width: S::ONE,
            opacity: num_traits::cast(0.1).unwrap_or(S::ONE),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke<S> {
    pub chord: Chord,
    pub segment: Segment<S>,
}

/// Threads to draw for a given number of lines, independent from any running
/// computation.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene<S> {
    pins: Vec<Point<S>>,
    strokes: Vec<Stroke<S>>,
    lines: usize,
    last: Option<Chord>,
    style: StrokeStyle<S>,
}

/// Replays the first `prefix` chords of `history`.
///
/// `prefix` is clamped to the history length. Chords naming a pin that does
/// not exist in `pins` are skipped.
pub fn reconstruct<S: Float>(
    history: &[Chord],
    pins: &PinTable<S>,
    prefix: usize,
    style: StrokeStyle<S>,
) -> Scene<S> {
    let chords = &history[..prefix.min(history.len())];
    let strokes = chords
        .iter()
        .filter_map(|&chord| {
            let start = *pins.get(chord.start)?;
            let end = *pins.get(chord.end)?;
            Some(Stroke {
                chord,
                segment: Segment::new(start, end),
            })
        })
        .collect();
    Scene {
        pins: pins.pins().to_vec(),
        strokes,
        lines: chords.len(),
        last: chords.last().copied(),
        style,
    }
}

impl<S: Float> Scene<S> {
    pub fn strokes(&self) -> &[Stroke<S>] {
        &self.strokes
    }

    pub fn pins(&self) -> &[Point<S>] {
        &self.pins
    }

    pub fn style(&self) -> StrokeStyle<S> {
        self.style
    }

    /// Number of replayed lines.
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn last_chord(&self) -> Option<Chord> {
        self.last
    }

    /// `"<line>: Pin <a> → Pin <b>"` for the last replayed line, `"-"` if none.
    pub fn status(&self) -> String {
        match self.last {
            Some(chord) => format!("{}: {}", self.lines, chord),
            None => String::from("-"),
        }
    }

    /// Draws the threads in black over a white background.
    pub fn render(&self, grid: Grid) -> GrayImage
    where
        usize: AsPrimitive<S>,
    {
        let mut canvas = PixelBuffer::filled(S::ONE, grid);
        for stroke in self.strokes.iter() {
            StrokeMask::new(
                &grid,
                stroke.segment.start,
                stroke.segment.end,
                self.style.width,
                self.style.opacity,
            )
            .darken(&mut canvas);
        }
        canvas.map(|&sample| sample * S::TWO_FIVE_FIVE).to_luma8()
    }

    pub fn to_svg(&self, grid: Grid) -> svg::Document {
        let mut doc = svg::Document::new()
            .set("viewBox", format!("0 0 {} {}", grid.width, grid.height))
            .add(
                svg::node::element::Rectangle::new()
                    .set("width", grid.width.to_string())
                    .set("height", grid.height.to_string())
                    .set("fill", "white"),
            );
        for &pin in self.pins.iter() {
            doc = doc.add(
                svg::node::element::Circle::new()
                    .set("cx", pin.x)
                    .set("cy", pin.y)
                    .set("r", 2)
                    .set("fill", "black"),
            );
        }
        for stroke in self.strokes.iter() {
            let segment = stroke.segment;
            doc = doc.add(
                svg::node::element::Line::new()
                    .set("x1", format!("{:.4}", segment.start.x))
                    .set("y1", format!("{:.4}", segment.start.y))
                    .set("x2", format!("{:.4}", segment.end.x))
                    .set("y2", format!("{:.4}", segment.end.y))
                    .set("stroke", "black")
                    .set("stroke-width", format!("{:.4}", self.style.width))
                    .set("stroke-opacity", format!("{:.4}", self.style.opacity)),
            );
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verboser::Silent;

    fn pins() -> PinTable<f32> {
        PinTable::inscribed(Grid::new(40, 40), 10, &mut Silent).unwrap()
    }

    fn history() -> History {
        History::from(vec![
            Chord::new(0, 5),
            Chord::new(5, 2),
            Chord::new(2, 8),
            Chord::new(8, 3),
        ])
    }

    #[test]
    fn prefix_is_clamped() {
        let scene = reconstruct(&history(), &pins(), 99, StrokeStyle::default());
        assert_eq!(scene.lines(), 4);
        assert_eq!(scene.strokes().len(), 4);
        assert_eq!(scene.last_chord(), Some(Chord::new(8, 3)));
    }

    #[test]
    fn empty_prefix_has_no_strokes() {
        let scene = reconstruct(&history(), &pins(), 0, StrokeStyle::default());
        assert!(scene.strokes().is_empty());
        assert_eq!(scene.last_chord(), None);
        assert_eq!(scene.status(), "-");
        assert!(scene
            .render(Grid::new(40, 40))
            .pixels()
            .all(|pixel| pixel.0[0] == 255));
    }

    #[test]
    fn shorter_prefix_is_a_prefix_of_longer_one() {
        let short = reconstruct(&history(), &pins(), 2, StrokeStyle::default());
        let long = reconstruct(&history(), &pins(), 3, StrokeStyle::default());
        assert_eq!(short.strokes(), &long.strokes()[..2]);
        assert_eq!(short.status(), "2: Pin 5 → Pin 2");
    }

    #[test]
    fn replay_is_repeatable() {
        let a = reconstruct(&history(), &pins(), 3, StrokeStyle::default());
        let b = reconstruct(&history(), &pins(), 3, StrokeStyle::default());
        assert_eq!(a, b);
        let grid = Grid::new(40, 40);
        assert_eq!(a.render(grid), b.render(grid));
    }

    #[test]
    fn strokes_darken_the_render() {
        let scene = reconstruct(&history(), &pins(), 1, StrokeStyle::default());
        let image = scene.render(Grid::new(40, 40));
        assert!(image.pixels().any(|pixel| pixel.0[0] < 255));
        assert_eq!(image.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn unknown_pins_are_skipped() {
        let history = History::from(vec![Chord::new(0, 42), Chord::new(1, 2)]);
        let scene = reconstruct(&history, &pins(), 2, StrokeStyle::default());
        assert_eq!(scene.strokes().len(), 1);
        assert_eq!(scene.lines(), 2);
    }

    #[test]
    fn instructions_number_lines_from_one() {
        let instructions = history().instructions();
        let mut lines = instructions.lines();
        assert_eq!(lines.next(), Some("1: Pin 0 → Pin 5"));
        assert_eq!(lines.last(), Some("4: Pin 8 → Pin 3"));
    }

    #[test]
    fn svg_has_one_line_per_stroke() {
        let scene = reconstruct(&history(), &pins(), 3, StrokeStyle::default());
        let svg = scene.to_svg(Grid::new(40, 40)).to_string();
        assert_eq!(svg.matches("<line").count(), 3);
        assert_eq!(svg.matches("<circle").count(), 10);
    }

    #[test]
    fn history_survives_serialization() {
        let bytes = bincode::serialize(&history()).unwrap();
        assert_eq!(bincode::deserialize::<History>(&bytes).unwrap(), history());
    }
}
