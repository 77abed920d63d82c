use num_traits::AsPrimitive;

use crate::{
    algorithm::{self, Algorithm, Outcome},
    config::RunConfig,
    history::{Chord, Scene, StrokeStyle},
    image::{Contrast, Luminance, Source},
    verboser::{Message, Verboser},
    Float,
};

/// Everything a host keeps between user actions: the loaded image, the
/// current run and the line shown by playback.
pub struct Session<S> {
    source: Option<Source<S>>,
    algorithm: Option<Algorithm<S>>,
    cursor: usize,
    style: StrokeStyle<S>,
}

impl<S: Float> Default for Session<S> {
    fn default() -> Self {
        Self {
            source: None,
            algorithm: None,
            cursor: 0,
            style: StrokeStyle::default(),
        }
    }
}

impl<S: Float> Session<S>
where
    usize: AsPrimitive<S>,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the image, dropping any previous run.
    ///
    /// `raw` must already be masked to the circle the pins will sit on.
    pub fn load_image(&mut self, raw: Luminance<S>, contrast: S, verboser: &mut impl Verboser) {
        self.reset();
        verboser.verbose(Message::Preprocessing);
        self.source = Some(Source::new(raw, Contrast::new(contrast)));
    }

    /// Updates the preview. A run already started keeps its own buffer.
    pub fn set_contrast(&mut self, contrast: S, verboser: &mut impl Verboser) {
        if let Some(source) = self.source.as_mut() {
            verboser.verbose(Message::Preprocessing);
            source.set_contrast(Contrast::new(contrast));
        }
    }

    /// The darkness buffer for the current contrast, as the algorithm sees it.
    pub fn preview(&self) -> Option<&Luminance<S>> {
        self.source.as_ref().map(Source::processed)
    }

    pub fn source(&self) -> Option<&Source<S>> {
        self.source.as_ref()
    }

    /// Drops the current run, if any, and prepares a new one.
    pub fn start(
        &mut self,
        config: RunConfig<S>,
        verboser: &mut impl Verboser,
    ) -> Result<&mut Algorithm<S>, Error> {
        self.reset();
        let source = self.source.as_mut().ok_or(Error::NoInputImage)?;
        config.validate().map_err(algorithm::Error::from)?;
        source.set_contrast(config.contrast());
        let algorithm = Algorithm::from_source(config, source, verboser)?;
        Ok(self.algorithm.insert(algorithm))
    }

    /// Runs the started computation to its end and moves playback to its last line.
    pub fn compute(
        &mut self,
        verboser: &mut impl Verboser,
        should_stop: impl FnMut() -> bool,
    ) -> Result<Outcome, Error> {
        let algorithm = self.algorithm.as_mut().ok_or(Error::NotStarted)?;
        let outcome = algorithm.run(verboser, should_stop);
        self.cursor = algorithm.history().len();
        Ok(outcome)
    }

    pub fn reset(&mut self) {
        self.algorithm = None;
        self.cursor = 0;
    }
}

impl<S: Float> Session<S> {
    pub fn algorithm(&self) -> Option<&Algorithm<S>> {
        self.algorithm.as_ref()
    }

    pub fn algorithm_mut(&mut self) -> Option<&mut Algorithm<S>> {
        self.algorithm.as_mut()
    }

    pub fn history(&self) -> &[Chord] {
        self.algorithm
            .as_ref()
            .map(|algorithm| &algorithm.history()[..])
            .unwrap_or(&[])
    }

    pub fn set_style(&mut self, style: StrokeStyle<S>) {
        self.style = style;
    }

    /// Line shown by playback.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Moves playback to `line`, clamped to the drawn lines.
    pub fn seek(&mut self, line: usize) -> usize {
        self.cursor = line.min(self.history().len());
        self.cursor
    }

    pub fn previous_line(&mut self) -> usize {
        self.seek(self.cursor.saturating_sub(1))
    }

    pub fn next_line(&mut self) -> usize {
        self.seek(self.cursor.saturating_add(1))
    }

    pub fn scene(&self) -> Option<Scene<S>> {
        self.algorithm
            .as_ref()
            .map(|algorithm| algorithm.scene(self.cursor, self.style))
    }

    /// `"<line>: Pin <a> → Pin <b>"` for the line shown by playback, `"-"` if none.
    pub fn line_info(&self) -> String {
        match self.cursor.checked_sub(1).and_then(|index| self.history().get(index)) {
            Some(chord) => format!("{}: {}", self.cursor, chord),
            None => String::from("-"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("An image must be loaded before computing")]
    NoInputImage,
    #[error("No computation has been started")]
    NotStarted,
    #[error(transparent)]
    Algorithm(#[from] algorithm::Error),
}
