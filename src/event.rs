use std::convert::From;

use serde::{Deserialize, Serialize};

use crate::particle::{Particle, ParticleRecord};

#[derive(Clone, PartialEq, PartialOrd, Debug)]
pub struct Event {
    pub weight: f64,
    pub out: Vec<Particle>,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            weight: 1.,
            out: Vec::new(),
        }
    }
}

/// An event as stored on disk: weight and outgoing particles
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct EventRecord {
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub particles: Vec<ParticleRecord>,
}

fn default_weight() -> f64 {
    1.
}

impl From<EventRecord> for Event {
    fn from(event: EventRecord) -> Self {
        let out = event.particles.into_iter().map(Particle::from).collect();
        Event {
            weight: event.weight,
            out,
        }
    }
}
