use crate::{
    config::{self, RunConfig},
    geometry::Point,
    history::{self, Chord, History, Scene, StrokeStyle},
    image::{Luminance, Source},
    pins::{self, PinTable},
    stroke::StrokeMask,
    verboser::{Message, Verboser},
    Float,
};
use num_traits::AsPrimitive;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// What a single [`Algorithm::step`] left behind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// A line was drawn and the budget still allows more.
    Continue,
    /// The line budget is spent.
    Finished,
    /// No pin can be reached from the current one.
    Exhausted,
}

/// How a whole computation ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Finished,
    Exhausted,
    Cancelled,
}

/// Greedy line selection over a darkness buffer.
///
/// Starting at pin 0, every step scores the chords to every other pin except the
/// current and the previous one, draws the best one and removes its stroke from
/// the working buffer so the same area becomes less attractive.
pub struct Algorithm<S> {
    config: RunConfig<S>,
    pins: PinTable<S>,
    working: Luminance<S>,
    history: History,
    current: usize,
    previous: Option<usize>,
    exhausted: bool,
}

impl<S: Float> Algorithm<S>
where
    usize: AsPrimitive<S>,
{
    /// Starts a run over a copy of `reference`, which is expected to be the
    /// already preprocessed darkness buffer.
    ///
    /// `reference` is used as is: the contrast of `config` is only recorded.
    /// Use [`Self::from_source`] to have it applied.
    pub fn new(
        config: RunConfig<S>,
        reference: &Luminance<S>,
        verboser: &mut impl Verboser,
    ) -> Result<Self, Error> {
        config.validate()?;
        if reference.is_empty() {
            return Err(config::Error::EmptyImage.into());
        }
        let pins = PinTable::inscribed(*reference.grid(), config.pins, verboser)?;
        Ok(Self::with_pins(config, pins, reference.clone()))
    }

    /// Starts a run over `source` processed with the contrast of `config`.
    ///
    /// The already processed buffer is reused when its contrast matches.
    pub fn from_source(
        config: RunConfig<S>,
        source: &Source<S>,
        verboser: &mut impl Verboser,
    ) -> Result<Self, Error> {
        config.validate()?;
        let contrast = config.contrast();
        if source.contrast() == contrast {
            return Self::new(config, source.processed(), verboser);
        }
        verboser.verbose(Message::Preprocessing);
        Self::new(config, &contrast.process(source.raw()), verboser)
    }

    fn with_pins(config: RunConfig<S>, pins: PinTable<S>, working: Luminance<S>) -> Self {
        log::info!(
            "starting a run of {} lines over {} pins on a {}x{} image",
            config.lines,
            pins.len(),
            working.width,
            working.height
        );
        Self {
            config,
            pins,
            working,
            history: History::new(),
            current: 0,
            previous: None,
            exhausted: false,
        }
    }

    /// Draws one more line, if possible.
    ///
    /// Once a terminal status is reached, further calls return it again without
    /// touching any state.
    pub fn step(&mut self) -> Status {
        if let Some(status) = self.terminal() {
            return status;
        }
        let Some(next) = self.best_next() else {
            log::warn!(
                "no pin reachable from pin {} after {} lines",
                self.current,
                self.history.len()
            );
            self.exhausted = true;
            return Status::Exhausted;
        };

        let chord = Chord::new(self.current, next);
        let (start, end) = (self.pins.pins()[chord.start], self.pins.pins()[chord.end]);
        StrokeMask::new(
            self.working.grid(),
            start,
            end,
            self.config.line_width,
            self.config.line_weight,
        )
        .subtract_from(&mut self.working);
        self.history.push(chord);
        log::debug!("line {}: {}", self.history.len(), chord);

        self.previous = Some(self.current);
        self.current = next;
        self.terminal().unwrap_or(Status::Continue)
    }

    /// Steps until the budget is spent, no move is left or `should_stop`
    /// returns true. `should_stop` is asked before every step.
    pub fn run(
        &mut self,
        verboser: &mut impl Verboser,
        mut should_stop: impl FnMut() -> bool,
    ) -> Outcome {
        let outcome = loop {
            verboser.verbose(Message::Computing(self.history.len(), self.config.lines));
            match self.terminal() {
                Some(Status::Exhausted) => break Outcome::Exhausted,
                Some(_) => break Outcome::Finished,
                None if should_stop() => break Outcome::Cancelled,
                None => {
                    self.step();
                }
            }
        };
        log::info!("run ended ({outcome:?}) after {} lines", self.history.len());
        outcome
    }

    pub fn compute(&mut self, verboser: &mut impl Verboser) -> Outcome {
        self.run(verboser, || false)
    }

    /// Score of the chord from the current pin to `candidate`, or `None` when
    /// `candidate` is not a legal target.
    pub fn score(&self, candidate: usize) -> Option<S> {
        (candidate < self.pins.len() && self.is_allowed(candidate))
            .then(|| self.score_unchecked(candidate))
    }

    pub fn scene(&self, prefix: usize, style: StrokeStyle<S>) -> Scene<S> {
        history::reconstruct(&self.history, &self.pins, prefix, style)
    }

    fn score_unchecked(&self, candidate: usize) -> S {
        let pins = self.pins.pins();
        let (start, end) = (pins[self.current], pins[candidate]);
        let darkness = self.darkness_along(start, end);
        darkness * start.distance(&end).powf(self.config.distance_bias)
    }

    fn darkness_along(&self, start: Point<S>, end: Point<S>) -> S {
        let pixels = self.working.pixels();
        self.working
            .grid()
            .line_indexes(start, end)
            .fold(S::ZERO, |darkness, index| darkness + pixels[index])
    }

    fn best_next(&self) -> Option<usize> {
        (0..self.pins.len())
            .into_par_iter()
            .filter(|&candidate| self.is_allowed(candidate))
            .map(|candidate| Candidate {
                pin: candidate,
                score: self.score_unchecked(candidate),
            })
            .filter(|candidate| !candidate.score.is_nan())
            .reduce_with(Candidate::best)
            .map(|candidate| candidate.pin)
    }
}

impl<S> Algorithm<S> {
    fn is_allowed(&self, candidate: usize) -> bool {
        candidate != self.current && Some(candidate) != self.previous
    }

    fn terminal(&self) -> Option<Status> {
        if self.exhausted {
            Some(Status::Exhausted)
        } else if self.history.len() >= self.config.lines {
            Some(Status::Finished)
        } else {
            None
        }
    }

    pub fn is_done(&self) -> bool {
        self.terminal().is_some()
    }

    /// Fraction of the line budget already drawn.
    pub fn progress(&self) -> f32 {
        if self.config.lines == 0 {
            1.0
        } else {
            self.history.len() as f32 / self.config.lines as f32
        }
    }

    pub fn config(&self) -> &RunConfig<S> {
        &self.config
    }

    pub fn pins(&self) -> &PinTable<S> {
        &self.pins
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn working(&self) -> &Luminance<S> {
        &self.working
    }

    pub fn current_pin(&self) -> usize {
        self.current
    }

    pub fn previous_pin(&self) -> Option<usize> {
        self.previous
    }
}

#[derive(Clone, Copy)]
struct Candidate<S> {
    pin: usize,
    score: S,
}

impl<S: Float> Candidate<S> {
    /// Highest score wins, ties go to the lowest pin.
    fn best(self, other: Self) -> Self {
        if other.score > self.score || (other.score == self.score && other.pin < self.pin) {
            other
        } else {
            self
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::Error),
    #[error(transparent)]
    Pins(#[from] pins::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        image::{Contrast, PixelBuffer},
        verboser::Silent,
        Grid,
    };

    fn config(pins: usize, lines: usize) -> RunConfig<f64> {
        RunConfig {
            pins,
            lines,
            line_weight: 20.0,
            line_width: 1.0,
            contrast: 0.0,
            distance_bias: 0.0,
        }
    }

    fn uniform(value: f64) -> Luminance<f64> {
        PixelBuffer::filled(value, Grid::new(64, 64))
    }

    #[test]
    fn rejects_invalid_config_before_allocating() {
        let error = Algorithm::new(config(2, 10), &uniform(1.0), &mut Silent).err();
        assert!(matches!(
            error,
            Some(Error::Config(config::Error::MinPinCount(2)))
        ));
    }

    #[test]
    fn rejects_empty_image() {
        let empty = PixelBuffer::filled(0.0, Grid::new(0, 0));
        let error = Algorithm::new(config(8, 10), &empty, &mut Silent).err();
        assert!(matches!(error, Some(Error::Config(config::Error::EmptyImage))));
    }

    #[test]
    fn initial_state() {
        let algorithm = Algorithm::new(config(8, 10), &uniform(1.0), &mut Silent).unwrap();
        assert_eq!(algorithm.current_pin(), 0);
        assert_eq!(algorithm.previous_pin(), None);
        assert!(algorithm.history().is_empty());
        assert_eq!(algorithm.working(), &uniform(1.0));
        assert_eq!(algorithm.progress(), 0.0);
    }

    #[test]
    fn forbidden_targets_have_no_score() {
        let mut algorithm = Algorithm::new(config(8, 10), &uniform(1.0), &mut Silent).unwrap();
        assert_eq!(algorithm.score(0), None);
        assert_eq!(algorithm.score(8), None);
        assert!(algorithm.score(3).is_some());
        algorithm.step();
        let chord = algorithm.history()[0];
        assert_eq!(algorithm.score(chord.start), None);
        assert_eq!(algorithm.score(chord.end), None);
    }

    #[test]
    fn ties_go_to_the_lowest_pin() {
        let mut algorithm = Algorithm::new(config(12, 4), &uniform(0.0), &mut Silent).unwrap();
        assert_eq!(algorithm.compute(&mut Silent), Outcome::Finished);
        let chords: Vec<_> = algorithm.history().iter().copied().collect();
        assert_eq!(
            chords,
            [
                Chord::new(0, 1),
                Chord::new(1, 2),
                Chord::new(2, 0),
                Chord::new(0, 1),
            ]
        );
    }

    #[test]
    fn drawn_line_is_removed_from_the_working_buffer() {
        let mut algorithm = Algorithm::new(config(16, 1), &uniform(50.0), &mut Silent).unwrap();
        assert_eq!(algorithm.step(), Status::Finished);
        let chord = algorithm.history()[0];
        let pins = algorithm.pins().pins();
        let grid = *algorithm.working().grid();
        for index in grid.trace_indexes(pins[chord.start], pins[chord.end]) {
            assert_eq!(algorithm.working().pixels()[index], 30.0);
        }
        let untouched = algorithm
            .working()
            .pixels()
            .iter()
            .filter(|&&sample| sample == 50.0)
            .count();
        assert!(untouched > 0);
    }

    #[test]
    fn stepping_after_the_end_changes_nothing() {
        let mut algorithm = Algorithm::new(config(8, 2), &uniform(10.0), &mut Silent).unwrap();
        assert_eq!(algorithm.step(), Status::Continue);
        assert_eq!(algorithm.step(), Status::Finished);
        let working = algorithm.working().clone();
        assert_eq!(algorithm.step(), Status::Finished);
        assert_eq!(algorithm.history().len(), 2);
        assert_eq!(algorithm.working(), &working);
        assert_eq!(algorithm.progress(), 1.0);
    }

    #[test]
    fn nan_field_exhausts_the_run() {
        let mut algorithm = Algorithm::new(config(8, 5), &uniform(f64::NAN), &mut Silent).unwrap();
        assert_eq!(algorithm.step(), Status::Exhausted);
        assert_eq!(algorithm.step(), Status::Exhausted);
        assert!(algorithm.history().is_empty());
        assert_eq!(algorithm.compute(&mut Silent), Outcome::Exhausted);
    }

    #[test]
    fn cancellation_is_checked_between_steps() {
        let mut algorithm = Algorithm::new(config(16, 50), &uniform(100.0), &mut Silent).unwrap();
        let mut asked = 0;
        let outcome = algorithm.run(&mut Silent, || {
            asked += 1;
            asked > 3
        });
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(algorithm.history().len(), 3);
        assert!(!algorithm.is_done());
        assert_eq!(algorithm.run(&mut Silent, || false), Outcome::Finished);
        assert_eq!(algorithm.history().len(), 50);
    }

    #[test]
    fn source_is_processed_with_the_configured_contrast() {
        let raw = PixelBuffer::new(|p| ((p.x * 5 + p.y * 11) % 256) as f64, Grid::new(64, 64));
        let source = Source::new(raw.clone(), Contrast::new(0.0));
        let contrasted = RunConfig {
            contrast: 50.0,
            ..config(8, 3)
        };
        let algorithm = Algorithm::from_source(contrasted, &source, &mut Silent).unwrap();
        assert_eq!(algorithm.working(), &Contrast::new(50.0).process(&raw));
        assert_eq!(algorithm.config().contrast, 50.0);

        let matching = Algorithm::from_source(config(8, 3), &source, &mut Silent).unwrap();
        assert_eq!(matching.working(), source.processed());
    }

    #[test]
    fn score_is_the_darkness_along_the_traced_chord() {
        let reference = PixelBuffer::new(|p| (p.x * 3 + p.y) as f64, Grid::new(64, 64));
        let algorithm = Algorithm::new(config(12, 1), &reference, &mut Silent).unwrap();
        let pins = algorithm.pins().pins();
        let grid = *reference.grid();
        for candidate in 1..12 {
            let expected: f64 = grid
                .trace_indexes(pins[0], pins[candidate])
                .into_iter()
                .map(|index| reference.pixels()[index])
                .sum();
            let score = algorithm.score(candidate).unwrap();
            assert!((score - expected).abs() < 1e-9, "pin {candidate}");
        }
    }

    #[test]
    fn distance_bias_scales_the_score() {
        let flat = Algorithm::new(config(16, 1), &uniform(1.0), &mut Silent).unwrap();
        let biased = Algorithm::new(
            RunConfig {
                distance_bias: 2.0,
                ..config(16, 1)
            },
            &uniform(1.0),
            &mut Silent,
        )
        .unwrap();
        let pins = flat.pins().pins();
        for candidate in 1..16 {
            let (Some(a), Some(b)) = (flat.score(candidate), biased.score(candidate)) else {
                panic!("pin {candidate} must be reachable");
            };
            let distance = pins[0].distance(&pins[candidate]);
            assert!((b - a * distance * distance).abs() < 1e-9 * b);
        }
    }
}
