use particle_id::gauge_bosons::W_plus;
use particle_id::hadrons::HADRONS;
use particle_id::ParticleID;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
pub struct Particle {
    pub id: ParticleID,
    pub p: [f64; 4],
    pub y: f64,
    pub eta: f64,
    pub phi: f64,
    pub pt: f64,
}

impl Particle {
    pub fn new(id: ParticleID, p: [f64; 4]) -> Self {
        Particle {
            id,
            p,
            y: y(&p),
            eta: eta(&p),
            phi: phi(&p),
            pt: pt(&p),
        }
    }

    /// Massless particle with the given transverse momentum and direction
    pub fn from_pt_eta_phi(id: ParticleID, pt: f64, eta: f64, phi: f64) -> Self {
        let p = [
            pt * eta.cosh(),
            pt * phi.cos(),
            pt * phi.sin(),
            pt * eta.sinh(),
        ];
        Particle {
            id,
            p,
            y: eta,
            eta,
            phi,
            pt,
        }
    }

    pub fn is_charged(&self) -> bool {
        is_charged(self.id)
    }

    pub fn is_visible(&self) -> bool {
        !is_neutrino(self.id)
    }
}

/// On-disk particle record: PDG id and four-momentum `[E, px, py, pz]`
#[derive(Copy, Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct ParticleRecord {
    pub id: ParticleID,
    pub p: [f64; 4],
}

impl From<ParticleRecord> for Particle {
    fn from(record: ParticleRecord) -> Self {
        Particle::new(record.id, record.p)
    }
}

pub fn is_neutrino(id: ParticleID) -> bool {
    id.is_neutrino() || id.is_anti_neutrino()
}

pub fn is_charged(id: ParticleID) -> bool {
    if id.is_charged_lepton() || id.is_charged_anti_lepton() {
        return true;
    }
    let id = id.abs();
    id.is_quark() || id == W_plus || (HADRONS.contains(&id) && three_charge(id) != 0)
}

/// Three times the electric charge of a hadron from its quark content
///
/// Follows the PDG numbering scheme, where the digits `nq1 nq2 nq3` in
/// front of the spin digit encode the quarks.
fn three_charge(id: ParticleID) -> i32 {
    // d u s c b t, other digits do not denote quarks
    const QUARK_CHARGE: [i32; 10] = [0, -1, 2, -1, 2, -1, 2, 0, 0, 0];
    let abs_id = id.id().abs();
    let digit = |n: u32| (abs_id / 10_i32.pow(n) % 10) as usize;
    let (nq1, nq2, nq3) = (digit(3), digit(2), digit(1));
    let charge = if nq1 == 0 {
        // down-type quark in second place means it is the antiquark
        if nq2 % 2 == 1 {
            QUARK_CHARGE[nq3] - QUARK_CHARGE[nq2]
        } else {
            QUARK_CHARGE[nq2] - QUARK_CHARGE[nq3]
        }
    } else {
        QUARK_CHARGE[nq1] + QUARK_CHARGE[nq2] + QUARK_CHARGE[nq3]
    };
    charge * id.id().signum()
}

pub(crate) fn y(p: &[f64; 4]) -> f64 {
    (p[3] / p[0]).atanh()
}

pub(crate) fn eta(p: &[f64; 4]) -> f64 {
    let abs_p = (pt2(p) + p[3] * p[3]).sqrt();
    (p[3] / abs_p).atanh()
}

pub(crate) fn phi(p: &[f64; 4]) -> f64 {
    p[2].atan2(p[1])
}

pub(crate) fn pt2(p: &[f64; 4]) -> f64 {
    p[1] * p[1] + p[2] * p[2]
}

pub(crate) fn pt(p: &[f64; 4]) -> f64 {
    pt2(p).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pi_plus() -> ParticleID {
        ParticleID::new(211)
    }

    #[test]
    fn massless_kinematics() {
        let p = Particle::from_pt_eta_phi(pi_plus(), 10., 0.5, 1.2);
        let q = Particle::new(pi_plus(), p.p);
        assert_relative_eq!(q.pt, 10., max_relative = 1e-12);
        assert_relative_eq!(q.eta, 0.5, max_relative = 1e-12);
        assert_relative_eq!(q.y, 0.5, max_relative = 1e-12);
        assert_relative_eq!(q.phi, 1.2, max_relative = 1e-12);
    }

    #[test]
    fn rapidity_differs_from_pseudorapidity_for_massive() {
        let p = Particle::new(pi_plus(), [10., 3., 0., 5.]);
        assert!(p.y < p.eta);
    }

    #[test]
    fn final_state_classes() {
        assert!(is_charged(pi_plus()));
        assert!(is_charged(ParticleID::new(-11)));
        assert!(!is_charged(ParticleID::new(22)));
        assert!(!is_charged(ParticleID::new(111)));
        assert!(is_neutrino(ParticleID::new(-14)));
        assert!(!is_neutrino(ParticleID::new(13)));
    }

    #[test]
    fn hadron_charges() {
        let charge = |id| three_charge(ParticleID::new(id)) / 3;
        assert_eq!(charge(211), 1);
        assert_eq!(charge(-211), -1);
        assert_eq!(charge(321), 1);
        assert_eq!(charge(311), 0);
        assert_eq!(charge(130), 0);
        assert_eq!(charge(310), 0);
        assert_eq!(charge(411), 1);
        assert_eq!(charge(521), 1);
        assert_eq!(charge(2212), 1);
        assert_eq!(charge(-2212), -1);
        assert_eq!(charge(2112), 0);
        assert_eq!(charge(3312), -1);
        assert_eq!(charge(3334), -1);
        assert_eq!(charge(4122), 1);

        for id in [321, -321, 2212, -3312, 3334, 4122] {
            assert!(is_charged(ParticleID::new(id)), "{id}");
        }
        for id in [2112, 3122, 130, 310, 421, 22, 21, 12] {
            assert!(!is_charged(ParticleID::new(id)), "{id}");
        }
        assert!(is_charged(ParticleID::new(-24)));
        assert!(is_charged(ParticleID::new(13)));
    }
}
