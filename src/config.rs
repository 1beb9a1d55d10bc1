//! Declarative analysis setup
//!
//! Every measurement is described by an [`AnalysisConfig`]. The histograms
//! it books are enumerated by [`ConfigKey`]s which a [`ConfigSpace`]
//! resolves to dense indices.
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::ConfigError;
use crate::histogram::uniform_edges;
use crate::particle::Particle;
use crate::softdrop::SoftDrop;

/// Conversion factor from picobarn to millibarn
pub const PB_PER_MB: f64 = 1e9;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AnalysisConfig {
    pub name: String,
    /// Detector acceptance in pseudorapidity for jets
    pub eta_max: f64,
    #[serde(default)]
    pub final_state: FinalStateConfig,
    /// Jet radius parameters
    pub radii: Vec<f64>,
    /// Minimum transverse momentum of candidate jets
    pub jet_min_pt: f64,
    pub observable: Observable,
    pub normalisation: Normalisation,
    #[serde(default)]
    pub naming: Naming,
}

/// Particles entering jet clustering
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FinalStateConfig {
    pub eta_max: f64,
    #[serde(default)]
    pub charged_only: bool,
}

impl FinalStateConfig {
    pub fn accepts(&self, particle: &Particle) -> bool {
        particle.is_visible()
            && particle.eta.abs() < self.eta_max
            && (!self.charged_only || particle.is_charged())
    }

    pub fn select(&self, particles: &[Particle]) -> Vec<Particle> {
        particles
            .iter()
            .filter(|p| self.accepts(p))
            .copied()
            .collect()
    }
}

impl Default for FinalStateConfig {
    fn default() -> Self {
        Self {
            eta_max: 0.9,
            charged_only: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Observable {
    /// Inclusive jet transverse momentum spectra
    JetPt {
        /// One spectrum per jet radius
        spectra: Vec<SpectrumDef>,
        /// Auxiliary spectra used only as ratio inputs
        #[serde(default)]
        support: Vec<SupportDef>,
        #[serde(default)]
        ratios: Vec<RatioDef>,
    },
    /// Jet angularities, optionally also after soft-drop grooming
    Angularity {
        alphas: Vec<f64>,
        /// Edges of the contiguous jet momentum bins
        pt_bins: Vec<f64>,
        /// Histogram bin edges for the angularity
        edges: Vec<f64>,
        #[serde(default)]
        soft_drop: Option<SoftDrop>,
    },
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SpectrumDef {
    pub pt_min: f64,
    pub pt_max: f64,
    pub edges: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SupportDef {
    /// Index into the jet radii
    pub radius: usize,
    pub pt_min: f64,
    pub pt_max: f64,
    pub edges: Vec<f64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Series {
    /// Primary spectrum for the jet radius with this index
    Spectrum(usize),
    /// Auxiliary spectrum with this index
    Support(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RatioDef {
    pub numerator: Series,
    pub denominator: Series,
    #[serde(default)]
    pub table: Option<u32>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Normalisation {
    /// Differential cross section in mb, corrected for the jet acceptance
    CrossSection,
    /// Unit area per histogram
    Unit,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Naming {
    #[default]
    Descriptive,
    /// HEPData table names `dNN-x01-y01`
    Hepdata,
}

/// Identifies one output histogram
///
/// Indices refer to the enumerated lists of the analysis configuration.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize,
)]
pub struct ConfigKey {
    pub radius: usize,
    pub alpha: Option<usize>,
    pub pt_bin: Option<usize>,
    pub groomed: bool,
}

/// The Cartesian product of all configuration parameters
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConfigSpace {
    n_radii: usize,
    n_alphas: Option<usize>,
    n_pt_bins: Option<usize>,
    groomed: bool,
}

impl ConfigSpace {
    pub fn len(&self) -> usize {
        self.n_radii
            * self.n_alphas.unwrap_or(1)
            * self.n_pt_bins.unwrap_or(1)
            * self.n_groomed()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn n_groomed(&self) -> usize {
        if self.groomed {
            2
        } else {
            1
        }
    }

    /// Dense storage index of a configuration
    ///
    /// # Panics
    ///
    /// Panics if the key does not belong to this configuration space.
    pub fn index(&self, key: &ConfigKey) -> usize {
        assert!(
            key.radius < self.n_radii,
            "radius index {} out of range",
            key.radius
        );
        let alpha = sub_index(key.alpha, self.n_alphas, "shape exponent");
        let pt_bin = sub_index(key.pt_bin, self.n_pt_bins, "momentum bin");
        assert!(
            self.groomed || !key.groomed,
            "no groomed observables configured"
        );
        let idx = key.radius * self.n_alphas.unwrap_or(1) + alpha;
        let idx = idx * self.n_pt_bins.unwrap_or(1) + pt_bin;
        idx * self.n_groomed() + key.groomed as usize
    }

    /// All keys in storage order
    pub fn keys(&self) -> Vec<ConfigKey> {
        let alphas = sub_range(self.n_alphas);
        let pt_bins = sub_range(self.n_pt_bins);
        let groomed: &[bool] = if self.groomed {
            &[false, true]
        } else {
            &[false]
        };
        let mut keys = Vec::with_capacity(self.len());
        for radius in 0..self.n_radii {
            for &alpha in &alphas {
                for &pt_bin in &pt_bins {
                    for &groomed in groomed {
                        keys.push(ConfigKey {
                            radius,
                            alpha,
                            pt_bin,
                            groomed,
                        })
                    }
                }
            }
        }
        keys
    }
}

fn sub_index(idx: Option<usize>, n: Option<usize>, what: &str) -> usize {
    match (idx, n) {
        (None, None) => 0,
        (Some(idx), Some(n)) if idx < n => idx,
        (idx, n) => panic!("invalid {what} index {idx:?} for {n:?} entries"),
    }
}

fn sub_range(n: Option<usize>) -> Vec<Option<usize>> {
    match n {
        Some(n) => (0..n).map(Some).collect(),
        None => vec![None],
    }
}

impl AnalysisConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {path:?}"))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn config_space(&self) -> ConfigSpace {
        match &self.observable {
            Observable::JetPt { .. } => ConfigSpace {
                n_radii: self.radii.len(),
                n_alphas: None,
                n_pt_bins: None,
                groomed: false,
            },
            Observable::Angularity {
                alphas,
                pt_bins,
                soft_drop,
                ..
            } => ConfigSpace {
                n_radii: self.radii.len(),
                n_alphas: Some(alphas.len()),
                n_pt_bins: Some(pt_bins.len().saturating_sub(1)),
                groomed: soft_drop.is_some(),
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.jet_min_pt >= 0.) {
            return Err(ConfigError::InvalidMomentumCut(self.jet_min_pt));
        }
        for &r in &self.radii {
            if !(r > 0. && r < self.eta_max) {
                return Err(ConfigError::InvalidRadius(r, self.eta_max));
            }
        }
        match &self.observable {
            Observable::JetPt {
                spectra,
                support,
                ratios,
            } => {
                if spectra.len() != self.radii.len() {
                    return Err(ConfigError::SpectrumCount {
                        expected: self.radii.len(),
                        found: spectra.len(),
                    });
                }
                for (n, s) in spectra.iter().enumerate() {
                    check_edges(&format!("spectrum {n}"), &s.edges)?;
                }
                for (n, s) in support.iter().enumerate() {
                    let context = format!("support spectrum {n}");
                    check_edges(&context, &s.edges)?;
                    check_index("radius", s.radius, self.radii.len(), &context)?;
                }
                for ratio in ratios {
                    let context = format!("ratio {ratio:?}");
                    for series in [ratio.numerator, ratio.denominator] {
                        match series {
                            Series::Spectrum(idx) => {
                                check_index("radius", idx, self.radii.len(), &context)?
                            }
                            Series::Support(idx) => {
                                check_index("support", idx, support.len(), &context)?
                            }
                        }
                    }
                    let edges = |series: Series| match series {
                        Series::Spectrum(idx) => &spectra[idx].edges,
                        Series::Support(idx) => &support[idx].edges,
                    };
                    if edges(ratio.numerator) != edges(ratio.denominator) {
                        return Err(ConfigError::RatioBinning(context));
                    }
                    if self.naming == Naming::Hepdata && ratio.table.is_none() {
                        return Err(ConfigError::MissingTable(context));
                    }
                }
            }
            Observable::Angularity {
                alphas,
                pt_bins,
                edges,
                ..
            } => {
                for &alpha in alphas {
                    if !(alpha >= 0.) {
                        return Err(ConfigError::InvalidExponent(alpha));
                    }
                }
                check_edges("jet momentum bins", pt_bins)?;
                check_edges("angularity", edges)?;
            }
        }
        let mut paths = HashSet::new();
        for path in self.output_paths() {
            if !paths.insert(path.clone()) {
                return Err(ConfigError::DuplicatePath(path));
            }
        }
        Ok(())
    }

    /// Paths of all booked histograms, auxiliary spectra and ratios
    pub fn output_paths(&self) -> Vec<String> {
        let mut paths = Vec::from_iter(
            self.config_space().keys().iter().map(|key| self.histo_path(key)),
        );
        if let Observable::JetPt { support, ratios, .. } = &self.observable {
            paths.extend(
                support
                    .iter()
                    .enumerate()
                    .map(|(idx, s)| self.support_path(idx, s)),
            );
            paths.extend(ratios.iter().map(|r| self.ratio_path(r, support)));
        }
        paths
    }

    /// Output path of the histogram for the given configuration
    pub fn histo_path(&self, key: &ConfigKey) -> String {
        let name = match (&self.observable, self.naming) {
            (Observable::JetPt { .. }, Naming::Hepdata) => {
                hepdata_name(key.radius as u32 + 1)
            }
            (Observable::JetPt { .. }, Naming::Descriptive) => {
                format!("jetsR{}", radius_label(self.radii[key.radius]))
            }
            (Observable::Angularity { alphas, pt_bins, .. }, Naming::Hepdata) => {
                let n_alphas = alphas.len();
                let n_pt_bins = pt_bins.len() - 1;
                let alpha = key.alpha.unwrap_or_default();
                let pt_bin = key.pt_bin.unwrap_or_default();
                let mut idx = 2 * n_alphas * n_pt_bins * key.radius
                    + 2 * n_alphas * pt_bin
                    + alpha
                    + 1;
                if key.groomed {
                    idx += n_alphas;
                }
                hepdata_name(idx as u32)
            }
            (Observable::Angularity { alphas, .. }, Naming::Descriptive) => {
                let alpha = alphas[key.alpha.unwrap_or_default()];
                let mut name = format!(
                    "ang_R{}_alpha{}_pt{}",
                    self.radii[key.radius],
                    alpha,
                    key.pt_bin.unwrap_or_default()
                );
                if key.groomed {
                    name += "_SD";
                }
                name
            }
        };
        format!("/{}/{name}", self.name)
    }

    pub fn support_path(&self, idx: usize, support: &SupportDef) -> String {
        format!(
            "/{}/_jetsR{}_ratio_binning_{idx}",
            self.name,
            radius_label(self.radii[support.radius])
        )
    }

    pub fn ratio_path(&self, ratio: &RatioDef, support: &[SupportDef]) -> String {
        let name = match (self.naming, ratio.table) {
            (Naming::Hepdata, Some(table)) => hepdata_name(table),
            _ => {
                let radius = |series: Series| match series {
                    Series::Spectrum(idx) => self.radii[idx],
                    Series::Support(idx) => self.radii[support[idx].radius],
                };
                format!(
                    "jetsRatioR{}R{}",
                    radius_label(radius(ratio.numerator)),
                    radius_label(radius(ratio.denominator))
                )
            }
        };
        format!("/{}/{name}", self.name)
    }
}

fn check_edges(context: &str, edges: &[f64]) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBinning {
        path: context.to_owned(),
        reason: reason.to_owned(),
    };
    if edges.len() < 2 {
        return Err(invalid("need at least two bin edges"));
    }
    if edges.windows(2).any(|w| !(w[0] < w[1])) {
        return Err(invalid("bin edges must be strictly increasing"));
    }
    Ok(())
}

fn check_index(
    kind: &'static str,
    idx: usize,
    len: usize,
    context: &str,
) -> Result<(), ConfigError> {
    if idx < len {
        Ok(())
    } else {
        Err(ConfigError::UnknownIndex {
            kind,
            idx,
            context: context.to_owned(),
        })
    }
}

fn hepdata_name(table: u32) -> String {
    format!("d{table:02}-x01-y01")
}

/// Radius in units of 0.1, e.g. "04" for R = 0.4
///
/// Radii that are not a multiple of 0.1 are written out, e.g. "0p25".
fn radius_label(r: f64) -> String {
    let tenths = 10. * r;
    if (tenths - tenths.round()).abs() < 1e-9 {
        format!("{:02}", tenths.round() as u32)
    } else {
        r.to_string().replace('.', "p")
    }
}

#[derive(
    Display, EnumString, EnumIter, Copy, Clone, Debug, PartialEq, Eq, Hash,
)]
pub enum Preset {
    /// Inclusive jet spectra and their ratios for R = 0.1 to 0.6
    #[strum(serialize = "alice-2020-jet-spectra")]
    JetSpectra2020,
    /// Ungroomed angularities in a single momentum bin
    #[strum(serialize = "alice-2020-angularity")]
    Angularity2020,
    /// Ungroomed and groomed angularities in four momentum bins
    #[strum(serialize = "alice-2021-angularity")]
    Angularity2021,
    /// As above, with the binning and naming of the published tables
    #[strum(serialize = "alice-2021-angularity-hepdata")]
    Angularity2021Hepdata,
}

impl Preset {
    pub fn config(&self) -> AnalysisConfig {
        PRESETS[self].clone()
    }
}

const ALPHAS: [f64; 4] = [1.0, 1.5, 2.0, 3.0];

lazy_static! {
    static ref PRESETS: HashMap<Preset, AnalysisConfig> =
        Preset::iter().map(|p| (p, build_preset(p))).collect();
}

fn build_preset(preset: Preset) -> AnalysisConfig {
    use Preset::*;
    match preset {
        JetSpectra2020 => jet_spectra_2020(),
        Angularity2020 => AnalysisConfig {
            name: "ALICE_2020_angularity".to_owned(),
            eta_max: 0.9,
            final_state: FinalStateConfig {
                eta_max: 0.9,
                charged_only: true,
            },
            radii: vec![0.2, 0.4],
            jet_min_pt: 5.,
            observable: Observable::Angularity {
                alphas: ALPHAS.to_vec(),
                pt_bins: vec![5., 40.],
                edges: uniform_edges(20, 0., 1.),
                soft_drop: None,
            },
            normalisation: Normalisation::Unit,
            naming: Naming::Descriptive,
        },
        Angularity2021 => AnalysisConfig {
            name: "ALICE_2021_angularity".to_owned(),
            eta_max: 0.9,
            final_state: FinalStateConfig {
                eta_max: 0.9,
                charged_only: true,
            },
            radii: vec![0.2, 0.4],
            jet_min_pt: 20.,
            observable: Observable::Angularity {
                alphas: ALPHAS.to_vec(),
                pt_bins: vec![20., 40., 60., 80., 100.],
                edges: uniform_edges(20, 0., 1.),
                soft_drop: Some(SoftDrop::default()),
            },
            normalisation: Normalisation::Unit,
            naming: Naming::Descriptive,
        },
        Angularity2021Hepdata => AnalysisConfig {
            name: "ALICE_2021_I1891385".to_owned(),
            radii: vec![0.4, 0.2],
            naming: Naming::Hepdata,
            ..build_preset(Angularity2021)
        },
    }
}

fn jet_spectra_2020() -> AnalysisConfig {
    const RATIO_EDGES: [f64; 8] = [20., 30., 40., 50., 60., 70., 80., 100.];
    let spectrum = SpectrumDef {
        pt_min: 20.,
        pt_max: 140.,
        edges: vec![
            20., 25., 30., 35., 40., 45., 50., 60., 70., 80., 100., 120., 140.,
        ],
    };
    let ratio_binning = SpectrumDef {
        pt_min: 20.,
        pt_max: 100.,
        edges: RATIO_EDGES.to_vec(),
    };
    let mut spectra = vec![spectrum; 5];
    spectra.push(ratio_binning);
    let support = [0, 1]
        .into_iter()
        .map(|radius| SupportDef {
            radius,
            pt_min: 20.,
            pt_max: 100.,
            edges: RATIO_EDGES.to_vec(),
        })
        .collect();
    use Series::*;
    let ratio = |numerator, denominator, table| RatioDef {
        numerator,
        denominator,
        table: Some(table),
    };
    let ratios = vec![
        ratio(Spectrum(1), Spectrum(2), 18),
        ratio(Spectrum(1), Spectrum(3), 19),
        ratio(Spectrum(1), Spectrum(4), 20),
        ratio(Support(1), Spectrum(5), 21),
        ratio(Spectrum(0), Spectrum(1), 13),
        ratio(Spectrum(0), Spectrum(2), 14),
        ratio(Spectrum(0), Spectrum(3), 15),
        ratio(Spectrum(0), Spectrum(4), 16),
        ratio(Support(0), Spectrum(5), 17),
    ];
    AnalysisConfig {
        name: "ALICE_2020_I1755387".to_owned(),
        eta_max: 0.7,
        final_state: FinalStateConfig::default(),
        radii: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
        jet_min_pt: 20.,
        observable: Observable::JetPt {
            spectra,
            support,
            ratios,
        },
        normalisation: Normalisation::CrossSection,
        naming: Naming::Hepdata,
    }
}
