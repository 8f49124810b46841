use super::{Bearing, GrammarRegistry, Preposition, Speech};
use crate::coords::Heading;
use crate::host::Host;
use crate::verbs;

/// Frames per second assumed by the SECOND unit until a config says otherwise.
pub const DEFAULT_FRAMES_PER_SECOND: f64 = 60.0;

const COMPASS: [(&str, Heading); 12] = [
    ("NORTH", Heading::North),
    ("NORTHEAST", Heading::NorthEast),
    ("EAST", Heading::East),
    ("SOUTHEAST", Heading::SouthEast),
    ("SOUTH", Heading::South),
    ("SOUTHWEST", Heading::SouthWest),
    ("WEST", Heading::West),
    ("NORTHWEST", Heading::NorthWest),
    ("UP", Heading::North),
    ("DOWN", Heading::South),
    ("LEFT", Heading::West),
    ("RIGHT", Heading::East),
];

const UNITS: [(&str, f64); 12] = [
    ("STEP", 1.0),
    ("STEPS", 1.0),
    ("TILE", 1.0),
    ("TILES", 1.0),
    ("SPACE", 1.0),
    ("SPACES", 1.0),
    ("FRAME", 1.0),
    ("FRAMES", 1.0),
    ("TICK", 1.0),
    ("TICKS", 1.0),
    ("TIME", 1.0),
    ("TIMES", 1.0),
];

const SWITCHES: [(&str, Speech); 10] = [
    ("TO", Speech::Target),
    ("WITH", Speech::With),
    ("WHEN", Speech::Condition),
    ("UNTIL", Speech::Condition),
    ("IF", Speech::Condition),
    ("FOR", Speech::Duration),
    ("AFTER", Speech::Delay),
    ("REPEAT", Speech::Repeat),
    ("THEN", Speech::End),
    ("WHILE", Speech::EndAsync),
];

const FILLERS: [(Speech, &str); 8] = [
    (Speech::Verb, "TO"),
    (Speech::Default, "THE"),
    (Speech::Default, "AN"),
    (Speech::Default, "AND"),
    (Speech::Preposition, "FROM"),
    (Speech::Preposition, "THE"),
    (Speech::Preposition, "OF"),
    (Speech::Target, "THE"),
];

impl GrammarRegistry {
    /// The stock vocabulary: MOVE, FACE, WAIT, HALT and DEFINE, compass and
    /// relative directions, distance and time units, and the PLAYER and
    /// SELF special targets.
    pub fn standard() -> Self {
        let mut grammar = GrammarRegistry::new();

        for verb in verbs::standard() {
            grammar.define_verb(verb);
        }

        for (name, heading) in COMPASS {
            grammar.define_preposition(Preposition::directional(name, Bearing::Compass(heading)));
        }
        grammar.define_preposition(Preposition::directional("FORWARD", Bearing::Relative(0)));
        grammar.define_preposition(Preposition::directional("BACKWARD", Bearing::Relative(4)));
        grammar.define_preposition(Preposition::new("AWAY").switching().measured().targeted(true));

        for (name, factor) in UNITS {
            grammar.define_unit(name, factor);
        }
        grammar.define_seconds(DEFAULT_FRAMES_PER_SECOND);

        for (word, next) in SWITCHES {
            grammar.define_switch(Speech::Default, word, next);
        }
        for (state, word) in FILLERS {
            grammar.define_filler(state, word);
        }

        grammar.define_special_target("PLAYER", |host: &dyn Host| {
            host.player().into_iter().collect()
        });
        grammar.define_special_target("SELF", |host: &dyn Host| {
            host.current().into_iter().collect()
        });
        grammar.define_special_target("THIS", |host: &dyn Host| {
            host.current().into_iter().collect()
        });

        grammar
    }

    /// (Re)define SECOND and SECONDS as `frames_per_second` frames.
    pub fn define_seconds(&mut self, frames_per_second: f64) {
        self.define_unit("SECOND", frames_per_second);
        self.define_unit("SECONDS", frames_per_second);
    }
}
