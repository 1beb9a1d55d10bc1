use std::ops::Range;

use crate::jet::Jet;

/// Kinematic jet acceptance
///
/// A jet clustered with radius `R` is accepted if it lies fully inside the
/// detector, i.e. `|η| < η_max - R`, and its transverse momentum is in the
/// requested window.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JetSelector {
    pub eta_max: f64,
}

impl JetSelector {
    pub fn new(eta_max: f64) -> Self {
        Self { eta_max }
    }

    /// Largest accepted jet pseudorapidity for the given radius
    pub fn eta_limit(&self, radius: f64) -> f64 {
        self.eta_max - radius
    }

    pub fn accepts(&self, jet: &Jet, radius: f64, pt: &Range<f64>) -> bool {
        jet.abs_eta() < self.eta_limit(radius) && pt.contains(&jet.pt)
    }

    pub fn select<'a, I>(
        &'a self,
        jets: I,
        radius: f64,
        pt: Range<f64>,
    ) -> impl Iterator<Item = &'a Jet> + 'a
    where
        I: IntoIterator<Item = &'a Jet>,
        I::IntoIter: 'a,
    {
        jets.into_iter()
            .filter(move |jet| self.accepts(jet, radius, &pt))
    }
}
