pub enum Message {
    PlacingPin(usize),
    Preprocessing,
    /// Lines already drawn out of the line budget.
    Computing(usize, usize),
}

pub trait Verboser {
    fn verbose(&mut self, message: Message);
}

pub struct Silent;

impl Verboser for Silent {
    fn verbose(&mut self, _: Message) {}
}
