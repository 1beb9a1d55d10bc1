//! Per-event histogram filling and end-of-run aggregation
use std::f64::consts::PI;

use log::{debug, info, trace};
use serde::Serialize;

use crate::angularity::angularity;
use crate::clustering::{JetAlgorithm, JetDefinition};
use crate::config::{
    AnalysisConfig, ConfigKey, ConfigSpace, Normalisation, Observable, Series,
    PB_PER_MB,
};
use crate::error::{AnalysisError, ConfigError};
use crate::event::Event;
use crate::histogram::{divide, Histo1D, Scatter2D};
use crate::jet::Jet;
use crate::selection::JetSelector;

/// Run-level information only known after all events are generated
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RunInfo {
    /// Total cross section in pb
    pub cross_section: f64,
    /// Sum of the weights of all generated events, including vetoed ones
    pub sum_of_weights: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    Accepted,
    /// No candidate jet for any radius, nothing was filled
    Vetoed,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EventStats {
    pub accepted: u64,
    pub vetoed: u64,
    pub sum_w_accepted: f64,
    pub sum_w_vetoed: f64,
}

impl EventStats {
    fn add(&mut self, other: &EventStats) {
        self.accepted += other.accepted;
        self.vetoed += other.vetoed;
        self.sum_w_accepted += other.sum_w_accepted;
        self.sum_w_vetoed += other.sum_w_vetoed;
    }
}

#[derive(Clone, Debug, PartialEq)]
struct HistoBook {
    /// Indexed by `ConfigSpace::index`
    primary: Vec<Histo1D>,
    /// Auxiliary spectra that only serve as ratio inputs
    support: Vec<Histo1D>,
}

/// Final histograms and ratios of a run
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Results {
    pub histos: Vec<Histo1D>,
    pub ratios: Vec<Scatter2D>,
}

impl Results {
    pub fn histo(&self, path: &str) -> Option<&Histo1D> {
        self.histos.iter().find(|h| h.path == path)
    }

    pub fn ratio(&self, path: &str) -> Option<&Scatter2D> {
        self.ratios.iter().find(|r| r.path == path)
    }
}

/// Accumulates the observables of one measurement over a run
#[derive(Clone, Debug, PartialEq)]
pub struct Analysis {
    config: AnalysisConfig,
    space: ConfigSpace,
    selector: JetSelector,
    book: HistoBook,
    stats: EventStats,
}

impl Analysis {
    pub fn new(config: AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let space = config.config_space();
        let primary = space
            .keys()
            .iter()
            .map(|key| {
                let path = config.histo_path(key);
                let edges = match &config.observable {
                    Observable::JetPt { spectra, .. } => spectra[key.radius].edges.clone(),
                    Observable::Angularity { edges, .. } => edges.clone(),
                };
                Histo1D::new(path, edges)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let support = match &config.observable {
            Observable::JetPt { support, .. } => support
                .iter()
                .enumerate()
                .map(|(n, s)| Histo1D::new(config.support_path(n, s), s.edges.clone()))
                .collect::<Result<Vec<_>, _>>()?,
            Observable::Angularity { .. } => Vec::new(),
        };
        debug!(
            "{}: booked {} histograms and {} auxiliary spectra",
            config.name,
            primary.len(),
            support.len()
        );
        Ok(Self {
            selector: JetSelector::new(config.eta_max),
            config,
            space,
            book: HistoBook { primary, support },
            stats: EventStats::default(),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn stats(&self) -> &EventStats {
        &self.stats
    }

    /// The histogram for a configuration
    ///
    /// # Panics
    ///
    /// Panics if the key is not part of the configuration space.
    pub fn histo(&self, key: &ConfigKey) -> &Histo1D {
        &self.book.primary[self.space.index(key)]
    }

    /// Anti-kt jet definitions for all configured radii
    pub fn jet_definitions(&self) -> Vec<JetDefinition> {
        self.config
            .radii
            .iter()
            .map(|&radius| JetDefinition {
                algorithm: JetAlgorithm::AntiKt,
                radius,
                min_pt: self.config.jet_min_pt,
            })
            .collect()
    }

    /// Select final-state particles, cluster them and analyse the jets
    pub fn analyze_event(&mut self, event: &Event) -> EventOutcome {
        let particles = self.config.final_state.select(&event.out);
        trace!("{} final-state particles", particles.len());
        let jets: Vec<_> = self
            .jet_definitions()
            .iter()
            .map(|jet_def| jet_def.cluster(&particles))
            .collect();
        self.analyze(&jets, event.weight)
    }

    /// Fill all observables for one event
    ///
    /// `jets` holds the clustered jets for each configured radius, in
    /// the order of the configured radii.
    ///
    /// # Panics
    ///
    /// Panics if the number of jet collections does not match the
    /// number of radii.
    pub fn analyze(&mut self, jets: &[Vec<Jet>], weight: f64) -> EventOutcome {
        assert_eq!(
            jets.len(),
            self.config.radii.len(),
            "need one jet collection per radius"
        );
        let min_pt = self.config.jet_min_pt;
        if jets.iter().flatten().all(|jet| jet.pt <= min_pt) {
            trace!("no candidate jets, vetoing event");
            self.stats.vetoed += 1;
            self.stats.sum_w_vetoed += weight;
            return EventOutcome::Vetoed;
        }
        self.stats.accepted += 1;
        self.stats.sum_w_accepted += weight;
        match &self.config.observable {
            Observable::JetPt { .. } => self.fill_spectra(jets, weight),
            Observable::Angularity { .. } => self.fill_angularities(jets, weight),
        }
        EventOutcome::Accepted
    }

    fn fill_spectra(&mut self, jets: &[Vec<Jet>], weight: f64) {
        let Observable::JetPt {
            spectra, support, ..
        } = &self.config.observable
        else {
            unreachable!()
        };
        let min_pt = self.config.jet_min_pt;
        for (r_idx, (&radius, spectrum)) in
            self.config.radii.iter().zip(spectra).enumerate()
        {
            let key = ConfigKey {
                radius: r_idx,
                alpha: None,
                pt_bin: None,
                groomed: false,
            };
            let histo = &mut self.book.primary[self.space.index(&key)];
            let candidates = candidates(&jets[r_idx], min_pt);
            let window = spectrum.pt_min..spectrum.pt_max;
            for jet in self.selector.select(candidates, radius, window) {
                histo.fill(jet.pt, weight);
            }
        }
        for (support, histo) in support.iter().zip(self.book.support.iter_mut()) {
            let radius = self.config.radii[support.radius];
            let candidates = candidates(&jets[support.radius], min_pt);
            let window = support.pt_min..support.pt_max;
            for jet in self.selector.select(candidates, radius, window) {
                histo.fill(jet.pt, weight);
            }
        }
    }

    fn fill_angularities(&mut self, jets: &[Vec<Jet>], weight: f64) {
        let Observable::Angularity {
            alphas,
            pt_bins,
            soft_drop,
            ..
        } = &self.config.observable
        else {
            unreachable!()
        };
        let min_pt = self.config.jet_min_pt;
        for (r_idx, &radius) in self.config.radii.iter().enumerate() {
            for (pt_bin, window) in pt_bins.windows(2).enumerate() {
                let candidates = candidates(&jets[r_idx], min_pt);
                let window = window[0]..window[1];
                for jet in self.selector.select(candidates, radius, window) {
                    let groomed = soft_drop.as_ref().and_then(|sd| sd.groom(jet, radius));
                    for (a_idx, &alpha) in alphas.iter().enumerate() {
                        let mut key = ConfigKey {
                            radius: r_idx,
                            alpha: Some(a_idx),
                            pt_bin: Some(pt_bin),
                            groomed: false,
                        };
                        let lambda = angularity(jet, radius, alpha);
                        self.book.primary[self.space.index(&key)].fill(lambda, weight);
                        if let Some(groomed) = &groomed {
                            key.groomed = true;
                            let lambda = angularity(groomed, radius, alpha);
                            self.book.primary[self.space.index(&key)].fill(lambda, weight);
                        }
                    }
                }
            }
        }
    }

    /// Add the accumulated histograms of an independent event stream
    pub fn merge(&mut self, other: &Analysis) -> Result<(), AnalysisError> {
        if self.config != other.config {
            return Err(AnalysisError::Incompatible(
                self.config.name.clone(),
                other.config.name.clone(),
            ));
        }
        let ours = self.book.primary.iter_mut().chain(self.book.support.iter_mut());
        let theirs = other.book.primary.iter().chain(other.book.support.iter());
        for (histo, other) in ours.zip(theirs) {
            histo.merge(other)?;
        }
        self.stats.add(&other.stats);
        Ok(())
    }

    /// Normalise all histograms and construct ratios
    pub fn finalize(self, run: &RunInfo) -> Result<Results, AnalysisError> {
        let Self {
            config,
            space,
            book,
            stats,
            ..
        } = self;
        let HistoBook {
            mut primary,
            mut support,
        } = book;
        info!(
            "{}: {} events accepted (sum of weights {}), {} vetoed (sum of weights {})",
            config.name,
            stats.accepted,
            stats.sum_w_accepted,
            stats.vetoed,
            stats.sum_w_vetoed
        );
        match config.normalisation {
            Normalisation::CrossSection => {
                info!(
                    "Cross section = {} pb, sum of weights = {}",
                    run.cross_section, run.sum_of_weights
                );
                if !(run.sum_of_weights > 0.) {
                    return Err(AnalysisError::SumOfWeights(run.sum_of_weights));
                }
                let norm = run.cross_section / (PB_PER_MB * run.sum_of_weights * 2. * PI);
                let acceptance = |radius: f64| 2. * (config.eta_max - radius);
                for key in space.keys() {
                    let radius = config.radii[key.radius];
                    let factor = norm / acceptance(radius);
                    debug!("Scaling {} by {factor}", config.histo_path(&key));
                    primary[space.index(&key)].scale(factor);
                }
                if let Observable::JetPt { support: defs, .. } = &config.observable {
                    for (def, histo) in defs.iter().zip(support.iter_mut()) {
                        let radius = config.radii[def.radius];
                        histo.scale(norm / acceptance(radius));
                    }
                }
            }
            Normalisation::Unit => {
                for histo in primary.iter_mut().chain(support.iter_mut()) {
                    histo.normalize(1.);
                }
            }
        }
        let mut ratios = Vec::new();
        if let Observable::JetPt {
            support: defs,
            ratios: ratio_defs,
            ..
        } = &config.observable
        {
            let series = |s: Series| match s {
                Series::Spectrum(radius) => {
                    let key = ConfigKey {
                        radius,
                        alpha: None,
                        pt_bin: None,
                        groomed: false,
                    };
                    &primary[space.index(&key)]
                }
                Series::Support(idx) => &support[idx],
            };
            for def in ratio_defs {
                let path = config.ratio_path(def, defs);
                debug!("Constructing ratio {path}");
                let ratio = divide(path, series(def.numerator), series(def.denominator))?;
                ratios.push(ratio);
            }
        }
        Ok(Results {
            histos: primary,
            ratios,
        })
    }
}

fn candidates(jets: &[Jet], min_pt: f64) -> impl Iterator<Item = &Jet> {
    jets.iter().filter(move |jet| jet.pt > min_pt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Naming, Preset, SpectrumDef};
    use crate::particle::Particle;
    use crate::softdrop::SoftDrop;
    use approx::assert_relative_eq;
    use particle_id::ParticleID;

    fn pi_plus() -> ParticleID {
        ParticleID::new(211)
    }

    fn particle(pt: f64, eta: f64, phi: f64) -> Particle {
        Particle::from_pt_eta_phi(pi_plus(), pt, eta, phi)
    }

    fn angularity_config(soft_drop: Option<SoftDrop>) -> AnalysisConfig {
        AnalysisConfig {
            name: "TEST".to_owned(),
            eta_max: 0.9,
            final_state: Default::default(),
            radii: vec![0.2],
            jet_min_pt: 20.,
            observable: Observable::Angularity {
                alphas: vec![1.],
                pt_bins: vec![20., 100.],
                edges: vec![0., 0.5, 1.],
                soft_drop,
            },
            normalisation: Normalisation::Unit,
            naming: Naming::Descriptive,
        }
    }

    fn key(groomed: bool) -> ConfigKey {
        ConfigKey {
            radius: 0,
            alpha: Some(0),
            pt_bin: Some(0),
            groomed,
        }
    }

    #[test]
    fn single_jet_angularity() {
        let mut analysis = Analysis::new(angularity_config(None)).unwrap();
        let jet = Jet::with_axis(
            50.,
            0.,
            0.,
            vec![particle(25., 0.1, 0.), particle(25., 0., 0.2)],
        );
        let outcome = analysis.analyze(&[vec![jet]], 1.);
        assert_eq!(outcome, EventOutcome::Accepted);
        let h = analysis.histo(&key(false));
        assert_eq!(h.entries(), 1);
        // λ = 0.75
        assert_eq!(h.bins()[1].sumw, 1.);
    }

    #[test]
    fn vetoed_event_fills_nothing() {
        let mut analysis = Analysis::new(angularity_config(Some(SoftDrop::default()))).unwrap();
        let soft = Jet::with_axis(10., 0., 0., vec![particle(10., 0., 0.)]);
        assert_eq!(analysis.analyze(&[vec![soft]], 1.), EventOutcome::Vetoed);
        assert_eq!(analysis.analyze(&[vec![]], 1.), EventOutcome::Vetoed);
        assert_eq!(analysis.stats().vetoed, 2);
        assert_eq!(analysis.histo(&key(false)).entries(), 0);
        assert_eq!(analysis.histo(&key(true)).entries(), 0);
    }

    #[test]
    fn groomed_and_ungroomed_fills() {
        let mut analysis = Analysis::new(angularity_config(Some(SoftDrop::default()))).unwrap();
        let jet = Jet::from_constituents(vec![
            particle(30., 0., 0.),
            particle(20., 0.05, 0.),
            particle(2., 0.15, 0.1),
        ]);
        analysis.analyze(&[vec![jet]], 2.);
        assert_eq!(analysis.histo(&key(false)).entries(), 1);
        assert_eq!(analysis.histo(&key(true)).entries(), 1);
        assert_eq!(analysis.histo(&key(true)).integral(true), 2.);
        let results = analysis.finalize(&RunInfo {
            cross_section: 1.,
            sum_of_weights: 2.,
        })
        .unwrap();
        for h in &results.histos {
            assert_relative_eq!(h.integral(true), 1.);
        }
        assert!(results.ratios.is_empty());
    }

    #[test]
    fn rejected_by_acceptance() {
        let mut config = angularity_config(None);
        config.radii = vec![0.4];
        let mut analysis = Analysis::new(config).unwrap();
        let jet = Jet::with_axis(50., 0.75, 0., vec![particle(50., 0.75, 0.)]);
        assert_eq!(analysis.analyze(&[vec![jet]], 1.), EventOutcome::Accepted);
        assert_eq!(analysis.histo(&key(false)).entries(), 0);
    }

    #[test]
    fn cross_section_scaling() {
        let config = AnalysisConfig {
            name: "TEST".to_owned(),
            eta_max: 0.7,
            final_state: Default::default(),
            radii: vec![0.2, 0.4],
            jet_min_pt: 20.,
            observable: Observable::JetPt {
                spectra: vec![
                    SpectrumDef {
                        pt_min: 20.,
                        pt_max: 100.,
                        edges: vec![20., 60., 100.],
                    };
                    2
                ],
                support: vec![],
                ratios: vec![crate::config::RatioDef {
                    numerator: Series::Spectrum(0),
                    denominator: Series::Spectrum(1),
                    table: None,
                }],
            },
            normalisation: Normalisation::CrossSection,
            naming: Naming::Descriptive,
        };
        let mut analysis = Analysis::new(config).unwrap();
        let jet = |pt| Jet::with_axis(pt, 0., 0., vec![particle(pt, 0., 0.)]);
        analysis.analyze(&[vec![jet(30.), jet(70.)], vec![jet(30.)]], 1.);
        let run = RunInfo {
            cross_section: 2. * PB_PER_MB,
            sum_of_weights: 4.,
        };
        let results = analysis.finalize(&run).unwrap();
        let r02 = results.histo("/TEST/jetsR02").unwrap();
        let norm = 2. / (4. * 2. * PI);
        assert_relative_eq!(r02.bins()[0].sumw, norm / (2. * 0.5), max_relative = 1e-12);
        let r04 = results.histo("/TEST/jetsR04").unwrap();
        assert_relative_eq!(r04.bins()[0].sumw, norm / (2. * 0.3), max_relative = 1e-12);
        let ratio = results.ratio("/TEST/jetsRatioR02R04").unwrap();
        assert_relative_eq!(ratio.points[0].y.unwrap(), 0.3 / 0.5, max_relative = 1e-12);
        assert_eq!(ratio.points[1].y, None);
    }

    #[test]
    fn zero_sum_of_weights() {
        let analysis = Analysis::new(Preset::JetSpectra2020.config()).unwrap();
        let run = RunInfo {
            cross_section: 1.,
            sum_of_weights: 0.,
        };
        assert_eq!(analysis.finalize(&run), Err(AnalysisError::SumOfWeights(0.)));
    }

    #[test]
    fn merge_streams() {
        let jet = Jet::with_axis(50., 0., 0., vec![particle(50., 0., 0.1)]);
        let mut a = Analysis::new(angularity_config(None)).unwrap();
        let mut b = a.clone();
        a.analyze(&[vec![jet.clone()]], 1.);
        b.analyze(&[vec![jet]], 1.);
        b.analyze(&[vec![]], 1.);
        a.merge(&b).unwrap();
        assert_eq!(a.histo(&key(false)).entries(), 2);
        assert_eq!(a.stats().accepted, 2);
        assert_eq!(a.stats().vetoed, 1);

        let other = Analysis::new(Preset::Angularity2021.config()).unwrap();
        assert!(a.merge(&other).is_err());
    }

    #[test]
    #[should_panic]
    fn wrong_number_of_jet_collections() {
        let mut analysis = Analysis::new(angularity_config(None)).unwrap();
        analysis.analyze(&[vec![], vec![]], 1.);
    }
}
