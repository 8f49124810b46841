use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::coords::Heading;
use crate::target::Target;

/// Which way a directional preposition points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bearing {
    Compass(Heading),
    /// Eighths of a clockwise turn from whatever the subject is facing.
    Relative(i32),
}

impl Bearing {
    pub fn resolve(self, facing: Option<Heading>) -> Option<Heading> {
        match self {
            Bearing::Compass(h) => Some(h),
            Bearing::Relative(turn) => facing.map(|f| f.rotated(turn)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preposition {
    pub name: String,
    pub bearing: Option<Bearing>,
    pub accepts_target: bool,
    pub requires_target: bool,
    pub accepts_amount: bool,
    pub requires_amount: bool,
    pub accepts_unit: bool,
    pub requires_unit: bool,
    /// Registering this preposition adds it to the DEFAULT switch table.
    pub switches: bool,
}

impl Preposition {
    pub fn new(name: &str) -> Self {
        Preposition {
            name: name.to_uppercase(),
            bearing: None,
            accepts_target: false,
            requires_target: false,
            accepts_amount: false,
            requires_amount: false,
            accepts_unit: false,
            requires_unit: false,
            switches: false,
        }
    }

    /// A switching preposition that takes an optional `<amount> <unit>`.
    pub fn directional(name: &str, bearing: Bearing) -> Self {
        let mut p = Preposition::new(name).switching().measured();
        p.bearing = Some(bearing);
        p
    }

    pub fn switching(mut self) -> Self {
        self.switches = true;
        self
    }

    pub fn measured(mut self) -> Self {
        self.accepts_amount = true;
        self.accepts_unit = true;
        self
    }

    pub fn targeted(mut self, required: bool) -> Self {
        self.accepts_target = true;
        self.requires_target = required;
        self
    }
}

/// One parsed use of a preposition.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepositionalPhrase {
    pub preposition: Rc<Preposition>,
    pub targets: Vec<Target>,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    /// Conversion factor of `unit`, 1 when no unit was given.
    pub unit_factor: f64,
    /// Set once every requirement of the preposition is met.
    pub active: bool,
}

impl PrepositionalPhrase {
    pub fn new(preposition: Rc<Preposition>) -> Self {
        let mut phrase = PrepositionalPhrase {
            preposition,
            targets: Vec::new(),
            amount: None,
            unit: None,
            unit_factor: 1.0,
            active: false,
        };
        phrase.refresh();
        phrase
    }

    pub fn name(&self) -> &str {
        &self.preposition.name
    }

    pub fn set_unit(&mut self, unit: &str, factor: f64) {
        self.unit = Some(unit.to_owned());
        self.unit_factor = factor;
        self.refresh();
    }

    pub fn set_amount(&mut self, amount: f64) {
        self.amount = Some(amount);
        self.refresh();
    }

    pub fn add_targets(&mut self, targets: impl IntoIterator<Item = Target>) {
        self.targets.extend(targets);
        self.refresh();
    }

    fn refresh(&mut self) {
        let p = &self.preposition;
        self.active = (!p.requires_target || !self.targets.is_empty())
            && (!p.requires_amount || self.amount.is_some())
            && (!p.requires_unit || self.unit.is_some());
    }

    /// `amount × unit factor`, with a bare preposition counting as 1.
    pub fn extent(&self) -> f64 {
        self.amount.unwrap_or(1.0) * self.unit_factor
    }

    /// Whole grid steps covered by this phrase.
    pub fn distance(&self) -> i32 {
        self.extent().round() as i32
    }

    pub fn bearing(&self) -> Option<Bearing> {
        self.preposition.bearing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn north() -> Rc<Preposition> {
        Rc::new(Preposition::directional("NORTH", Bearing::Compass(Heading::North)))
    }

    #[test]
    fn extent_is_amount_times_unit_factor() {
        let mut phrase = PrepositionalPhrase::new(north());
        phrase.set_amount(3.0);
        phrase.set_unit("STEPS", 1.0);
        assert_eq!(phrase.extent(), 3.0);

        let mut timed = PrepositionalPhrase::new(north());
        timed.set_amount(0.5);
        timed.set_unit("SECONDS", 60.0);
        assert_eq!(timed.extent(), 30.0);
    }

    #[test]
    fn bare_direction_has_extent_one() {
        let phrase = PrepositionalPhrase::new(north());
        assert_eq!(phrase.extent(), 1.0);
        assert_eq!(phrase.distance(), 1);
        assert!(phrase.active);
    }

    #[test]
    fn required_target_gates_activity() {
        let away = Rc::new(Preposition::new("AWAY").switching().targeted(true));
        let mut phrase = PrepositionalPhrase::new(away);
        assert!(!phrase.active);
        phrase.add_targets([Target::Fixed(crate::coords::Coords::new(1, 1))]);
        assert!(phrase.active);
    }

    #[test]
    fn relative_bearings_need_a_facing() {
        let backward = Bearing::Relative(4);
        assert_eq!(backward.resolve(Some(Heading::East)), Some(Heading::West));
        assert_eq!(backward.resolve(None), None);
    }
}
