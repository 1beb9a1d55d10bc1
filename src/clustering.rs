use std::collections::HashMap;

use jetty::{
    anti_kt_f, cambridge_aachen_f, kt_f, ClusterHistory, ClusterStep, PseudoJet,
};
use log::trace;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::jet::{sort_by_pt, Jet};
use crate::particle::Particle;

#[derive(
    Display,
    EnumIter,
    EnumString,
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Deserialize,
    Serialize,
)]
pub enum JetAlgorithm {
    #[default]
    #[strum(to_string = "anti-kt", serialize = "antikt", serialize = "anti_kt")]
    AntiKt,
    #[strum(to_string = "kt")]
    Kt,
    #[strum(
        to_string = "Cambridge/Aachen",
        serialize = "cambridge-aachen",
        serialize = "ca"
    )]
    CambridgeAachen,
}

impl JetAlgorithm {
    /// Exponent of the transverse momentum in the generalised kt measure
    pub fn exponent(&self) -> i32 {
        match self {
            JetAlgorithm::AntiKt => -1,
            JetAlgorithm::CambridgeAachen => 0,
            JetAlgorithm::Kt => 1,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct JetDefinition {
    pub algorithm: JetAlgorithm,
    pub radius: f64,
    pub min_pt: f64,
}

impl JetDefinition {
    /// Inclusive jets with `pt > min_pt`, hardest first
    pub fn cluster(&self, particles: &[Particle]) -> Vec<Jet> {
        ClusterTree::new(particles, self.algorithm, self.radius)
            .inclusive_jets(self.min_pt)
    }
}

fn history(
    partons: Vec<PseudoJet>,
    algorithm: JetAlgorithm,
    r: f64,
) -> ClusterHistory<'static> {
    match algorithm {
        JetAlgorithm::AntiKt => ClusterHistory::new(partons, anti_kt_f(r)),
        JetAlgorithm::CambridgeAachen => {
            ClusterHistory::new(partons, cambridge_aachen_f(r))
        }
        JetAlgorithm::Kt => ClusterHistory::new(partons, kt_f(r)),
    }
}

fn take(
    alive: &mut HashMap<PseudoJet, Vec<usize>>,
    pseudojet: &PseudoJet,
) -> Option<usize> {
    alive.get_mut(pseudojet).and_then(|nodes| nodes.pop())
}

/// A (pseudo)jet appearing somewhere in the clustering history
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Node {
    pub pseudojet: PseudoJet,
    /// The two nodes merged into this one, `None` for input particles
    pub parents: Option<[usize; 2]>,
    particle: Option<usize>,
}

impl Node {
    pub fn pt(&self) -> f64 {
        self.pseudojet.pt().into()
    }

    pub fn rap(&self) -> f64 {
        self.pseudojet.rap().into()
    }
}

/// The clustering history of a set of particles as a binary tree
///
/// Every `Combine` step of the jetty cluster history becomes a node
/// pointing to the two nodes it was built from, every `Jet` step marks
/// an inclusive jet.
#[derive(Clone, Debug)]
pub struct ClusterTree {
    particles: Vec<Particle>,
    nodes: Vec<Node>,
    inclusive: Vec<usize>,
    algorithm: JetAlgorithm,
    radius: f64,
}

impl ClusterTree {
    /// Cluster all particles with a well-defined rapidity and nonzero pt
    pub fn new(
        particles: &[Particle],
        algorithm: JetAlgorithm,
        radius: f64,
    ) -> Self {
        let particles: Vec<_> = particles
            .iter()
            .filter(|p| p.pt > 0. && p.p[0] > p.p[3].abs())
            .copied()
            .collect();
        let mut nodes = Vec::with_capacity(2 * particles.len());
        // pseudojets are not unique, so keep a stack of nodes for each
        let mut alive: HashMap<PseudoJet, Vec<usize>> = HashMap::new();
        let partons = Vec::from_iter(particles.iter().enumerate().map(|(n, p)| {
            let pseudojet = PseudoJet::from(p.p);
            alive.entry(pseudojet).or_default().push(nodes.len());
            nodes.push(Node {
                pseudojet,
                parents: None,
                particle: Some(n),
            });
            pseudojet
        }));
        let mut inclusive = Vec::new();
        for step in history(partons, algorithm, radius) {
            match step {
                ClusterStep::Jet(jet) => match take(&mut alive, &jet) {
                    Some(idx) => inclusive.push(idx),
                    None => trace!("no node for jet {jet:?}"),
                },
                ClusterStep::Combine([a, b]) => {
                    let (Some(ia), Some(ib)) =
                        (take(&mut alive, &a), take(&mut alive, &b))
                    else {
                        trace!("no nodes for combination of {a:?} and {b:?}");
                        continue;
                    };
                    trace!("merging nodes {ia} and {ib} into {}", nodes.len());
                    let pseudojet = a + b;
                    alive.entry(pseudojet).or_default().push(nodes.len());
                    nodes.push(Node {
                        pseudojet,
                        parents: Some([ia, ib]),
                        particle: None,
                    });
                }
            }
        }
        Self {
            particles,
            nodes,
            inclusive,
            algorithm,
            radius,
        }
    }

    /// Distance of two nodes in the rapidity-azimuth plane
    pub fn delta_r(&self, a: usize, b: usize) -> f64 {
        self.nodes[a]
            .pseudojet
            .delta_r(&self.nodes[b].pseudojet)
            .into()
    }

    pub fn algorithm(&self) -> JetAlgorithm {
        self.algorithm
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    /// Nodes that were not merged any further
    pub fn inclusive_nodes(&self) -> &[usize] {
        &self.inclusive
    }

    /// Input particles that were combined into the given node
    pub fn constituents(&self, idx: usize) -> Vec<Particle> {
        let mut res = Vec::new();
        let mut todo = vec![idx];
        while let Some(idx) = todo.pop() {
            let node = &self.nodes[idx];
            if let Some(p) = node.particle {
                res.push(self.particles[p]);
            }
            if let Some([a, b]) = node.parents {
                todo.push(b);
                todo.push(a);
            }
        }
        res
    }

    pub fn jet(&self, idx: usize) -> Jet {
        Jet::from_constituents(self.constituents(idx))
    }

    /// Inclusive jets with `pt > min_pt`, hardest first
    pub fn inclusive_jets(&self, min_pt: f64) -> Vec<Jet> {
        let mut jets: Vec<_> = self
            .inclusive
            .iter()
            .filter(|&&idx| self.nodes[idx].pt() > min_pt)
            .map(|&idx| self.jet(idx))
            .collect();
        sort_by_pt(&mut jets);
        jets
    }

    /// Index of the hardest inclusive node
    pub fn hardest_node(&self) -> Option<usize> {
        self.inclusive
            .iter()
            .copied()
            .max_by(|&a, &b| self.nodes[a].pt().total_cmp(&self.nodes[b].pt()))
    }
}
