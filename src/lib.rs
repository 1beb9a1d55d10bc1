#![warn(clippy::all, rust_2018_idioms)]

pub mod analysis;
pub mod angularity;
pub mod clustering;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod geometry;
pub mod histogram;
pub mod import;
pub mod jet;
pub mod particle;
pub mod selection;
pub mod softdrop;

pub use analysis::{Analysis, EventOutcome, Results, RunInfo};
pub use angularity::angularity;
pub use config::{AnalysisConfig, Preset};
pub use event::Event;
pub use jet::Jet;
pub use particle::Particle;
pub use selection::JetSelector;
pub use softdrop::SoftDrop;
