//! Things a direction can point at.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::coords::{Coords, Heading};
use crate::grammar::{Bearing, PrepositionalPhrase};
use crate::host::Host;
use crate::scene::{ActorId, SceneState};

/// A fixed cell, a live actor, or one of those shifted by a phrase.
///
/// Actor targets hold only a scene handle. Their position is looked up on
/// every query, so a target never goes stale while its actor walks around,
/// and a handle from a torn-down scene simply stops resolving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Fixed(Coords),
    Actor(ActorId),
    Offset {
        base: Box<Target>,
        bearing: Bearing,
        distance: i32,
    },
}

impl Target {
    pub fn coords(&self, scene: &SceneState, host: &dyn Host) -> Option<Coords> {
        match self {
            Target::Fixed(c) => Some(*c),
            Target::Actor(id) => host.position(scene.actor(*id)?.entity),
            Target::Offset {
                base,
                bearing,
                distance,
            } => {
                let origin = base.coords(scene, host)?;
                let heading = bearing.resolve(base.facing(scene, host))?;
                Some(origin.shifted(heading, *distance))
            }
        }
    }

    pub fn facing(&self, scene: &SceneState, host: &dyn Host) -> Option<Heading> {
        match self {
            Target::Fixed(_) => None,
            Target::Actor(id) => host.facing(scene.actor(*id)?.entity),
            Target::Offset { base, .. } => base.facing(scene, host),
        }
    }

    /// The actor behind this target, looking through offsets.
    pub fn actor(&self) -> Option<ActorId> {
        match self {
            Target::Fixed(_) => None,
            Target::Actor(id) => Some(*id),
            Target::Offset { base, .. } => base.actor(),
        }
    }

    pub fn is_actor(&self) -> bool {
        matches!(self, Target::Actor(_))
    }

    /// Shift this target by a directional phrase.
    ///
    /// Always yields a new target; the receiver is left untouched. Phrases
    /// without a bearing (or with a zero extent) leave the target as it is,
    /// which shows up as `Cow::Borrowed`.
    pub fn preposition(&self, phrase: &PrepositionalPhrase) -> Cow<'_, Target> {
        self.preposition_facing(phrase, None)
    }

    /// Like [`Target::preposition`], but relative bearings are resolved
    /// against `facing` now instead of against the base's facing later.
    pub fn preposition_facing(
        &self,
        phrase: &PrepositionalPhrase,
        facing: Option<Heading>,
    ) -> Cow<'_, Target> {
        let Some(bearing) = phrase.bearing() else {
            return Cow::Borrowed(self);
        };
        let distance = phrase.distance();
        if distance == 0 {
            return Cow::Borrowed(self);
        }
        let bearing = match bearing.resolve(facing) {
            Some(h) => Bearing::Compass(h),
            None => bearing,
        };
        Cow::Owned(Target::Offset {
            base: Box::new(self.clone()),
            bearing,
            distance,
        })
    }

    pub fn describe(&self, scene: &SceneState) -> String {
        match self {
            Target::Fixed(c) => c.to_string(),
            Target::Actor(id) => scene
                .actor(*id)
                .map(|a| a.name.clone())
                .unwrap_or_else(|| "<gone>".to_string()),
            Target::Offset {
                base,
                bearing,
                distance,
            } => {
                let way = match bearing {
                    Bearing::Compass(h) => h.to_string(),
                    Bearing::Relative(0) => "FORWARD".to_string(),
                    Bearing::Relative(4) => "BACKWARD".to_string(),
                    Bearing::Relative(turn) => format!("TURN {}", turn),
                };
                format!("{} {} OF {}", distance, way, base.describe(scene))
            }
        }
    }
}
