use crate::particle::{self, Particle};

/// A clustered jet together with its constituents
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Jet {
    pub p: [f64; 4],
    pub pt: f64,
    pub eta: f64,
    pub y: f64,
    pub phi: f64,
    pub constituents: Vec<Particle>,
}

impl Jet {
    /// E-scheme jet: the four-momentum is the sum over all constituents
    pub fn from_constituents(constituents: Vec<Particle>) -> Self {
        let mut p = [0.; 4];
        for c in &constituents {
            for (p, c) in p.iter_mut().zip(c.p.iter()) {
                *p += c;
            }
        }
        Jet {
            p,
            pt: particle::pt(&p),
            eta: particle::eta(&p),
            y: particle::y(&p),
            phi: particle::phi(&p),
            constituents,
        }
    }

    /// Jet with an externally determined massless axis
    pub fn with_axis(
        pt: f64,
        eta: f64,
        phi: f64,
        constituents: Vec<Particle>,
    ) -> Self {
        let p = [
            pt * eta.cosh(),
            pt * phi.cos(),
            pt * phi.sin(),
            pt * eta.sinh(),
        ];
        Jet {
            p,
            pt,
            eta,
            y: eta,
            phi,
            constituents,
        }
    }

    pub fn abs_eta(&self) -> f64 {
        self.eta.abs()
    }

    /// Jet axis as `(eta, phi)`
    pub fn axis(&self) -> (f64, f64) {
        (self.eta, self.phi)
    }
}

/// Sort jets by descending transverse momentum
pub fn sort_by_pt(jets: &mut [Jet]) {
    jets.sort_by(|a, b| b.pt.total_cmp(&a.pt));
}
