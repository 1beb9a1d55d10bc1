use log::trace;
use serde::{Deserialize, Serialize};

use crate::clustering::{ClusterTree, JetAlgorithm};
use crate::jet::Jet;

/// Soft-drop grooming on a Cambridge/Aachen declustering tree
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SoftDrop {
    pub z_cut: f64,
    pub beta: f64,
}

impl Default for SoftDrop {
    fn default() -> Self {
        Self {
            z_cut: 0.2,
            beta: 0.,
        }
    }
}

impl SoftDrop {
    pub fn new(z_cut: f64, beta: f64) -> Self {
        Self { z_cut, beta }
    }

    /// The soft-drop condition for a single splitting
    pub fn passes(&self, pt1: f64, pt2: f64, delta_r: f64, r0: f64) -> bool {
        let z = pt1.min(pt2) / (pt1 + pt2);
        z > self.z_cut * (delta_r / r0).powf(self.beta)
    }

    /// Groom a jet that was clustered with radius `radius`
    ///
    /// The constituents are reclustered with the Cambridge/Aachen
    /// algorithm and the hardest resulting jet is declustered until the
    /// first splitting that passes the soft-drop condition. Returns
    /// `None` if reclustering does not yield any jet.
    pub fn groom(&self, jet: &Jet, radius: f64) -> Option<Jet> {
        let tree = ClusterTree::new(
            &jet.constituents,
            JetAlgorithm::CambridgeAachen,
            radius,
        );
        let Some(root) = tree.hardest_node() else {
            trace!("reclustering yields no jets");
            return None;
        };
        let groomed = self.decluster(&tree, root, radius);
        Some(tree.jet(groomed))
    }

    fn decluster(&self, tree: &ClusterTree, mut node: usize, r0: f64) -> usize {
        while let Some([a, b]) = tree.node(node).parents {
            let pt_a = tree.node(a).pt();
            let pt_b = tree.node(b).pt();
            let delta_r = tree.delta_r(a, b);
            if self.passes(pt_a, pt_b, delta_r, r0) {
                trace!("splitting {a} + {b} passes soft drop");
                break;
            }
            node = if pt_a >= pt_b { a } else { b };
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Particle;
    use approx::assert_relative_eq;
    use particle_id::ParticleID;

    fn pi_plus() -> ParticleID {
        ParticleID::new(211)
    }

    fn jet(constituents: &[(f64, f64, f64)]) -> Jet {
        Jet::from_constituents(
            constituents
                .iter()
                .map(|&(pt, eta, phi)| Particle::from_pt_eta_phi(pi_plus(), pt, eta, phi))
                .collect(),
        )
    }

    #[test]
    fn removes_soft_wide_angle_branch() {
        // hard two-prong core plus soft wide-angle radiation
        let jet = jet(&[(30., 0., 0.), (20., 0.05, 0.), (2., 0.3, 0.1)]);
        let groomed = SoftDrop::default().groom(&jet, 0.4).unwrap();
        assert_eq!(groomed.constituents.len(), 2);
        assert_relative_eq!(groomed.pt, 50., max_relative = 1e-9);
    }

    #[test]
    fn keeps_balanced_jet() {
        let jet = jet(&[(30., 0., 0.), (20., 0.2, 0.), (10., -0.1, 0.1)]);
        let groomed = SoftDrop::default().groom(&jet, 0.4).unwrap();
        assert_eq!(groomed.constituents.len(), 3);
    }

    #[test]
    fn no_constituents() {
        assert!(SoftDrop::default().groom(&Jet::default(), 0.4).is_none());
    }

    #[test]
    fn zero_z_cut_keeps_everything() {
        let jet = jet(&[(30., 0., 0.), (0.5, 0.1, 0.), (0.1, 0., 0.2)]);
        let groomed = SoftDrop::new(0., 0.).groom(&jet, 0.4).unwrap();
        assert_eq!(groomed.constituents.len(), 3);
        assert_relative_eq!(groomed.pt, jet.pt, max_relative = 1e-12);
    }

    #[test]
    fn large_z_cut_leaves_hardest_prong() {
        let jet = jet(&[(30., 0., 0.), (20., 0.05, 0.), (10., 0.2, 0.1)]);
        let groomed = SoftDrop::new(1., 0.).groom(&jet, 0.4).unwrap();
        assert_eq!(groomed.constituents.len(), 1);
        assert_relative_eq!(groomed.pt, 30., max_relative = 1e-12);
    }

    #[test]
    fn angular_exponent() {
        let sd = SoftDrop::new(0.1, 1.);
        // z = 0.1 against 0.1 * (0.2 / 0.4)
        assert!(sd.passes(9., 1., 0.2, 0.4));
        assert!(!sd.passes(9., 1., 0.4, 0.4));
    }
}
