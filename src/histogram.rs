//! Weighted one-dimensional histograms and derived scatter plots
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, ConfigError};

/// Accumulated weights in a single bin
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Bin {
    pub sumw: f64,
    pub sumw2: f64,
    pub sumwx: f64,
    pub sumwx2: f64,
    pub entries: u64,
}

impl Bin {
    fn fill(&mut self, x: f64, w: f64) {
        self.sumw += w;
        self.sumw2 += w * w;
        self.sumwx += w * x;
        self.sumwx2 += w * x * x;
        self.entries += 1;
    }

    fn scale(&mut self, factor: f64) {
        self.sumw *= factor;
        self.sumw2 *= factor * factor;
        self.sumwx *= factor;
        self.sumwx2 *= factor;
    }

    fn add(&mut self, other: &Bin) {
        self.sumw += other.sumw;
        self.sumw2 += other.sumw2;
        self.sumwx += other.sumwx;
        self.sumwx2 += other.sumwx2;
        self.entries += other.entries;
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Histo1D {
    pub path: String,
    edges: Vec<f64>,
    bins: Vec<Bin>,
    underflow: Bin,
    overflow: Bin,
}

impl Histo1D {
    /// Histogram with the given bin edges (sorted, length = bins + 1)
    pub fn new(path: impl Into<String>, edges: Vec<f64>) -> Result<Self, ConfigError> {
        let path = path.into();
        if edges.len() < 2 {
            return Err(ConfigError::InvalidBinning {
                path,
                reason: format!("need at least two bin edges, got {}", edges.len()),
            });
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(ConfigError::InvalidBinning {
                path,
                reason: "bin edges must be finite".to_owned(),
            });
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::InvalidBinning {
                path,
                reason: "bin edges must be strictly increasing".to_owned(),
            });
        }
        let bins = vec![Bin::default(); edges.len() - 1];
        Ok(Self {
            path,
            edges,
            bins,
            underflow: Bin::default(),
            overflow: Bin::default(),
        })
    }

    pub fn uniform(
        path: impl Into<String>,
        n_bins: usize,
        min: f64,
        max: f64,
    ) -> Result<Self, ConfigError> {
        let edges = uniform_edges(n_bins, min, max);
        Self::new(path, edges)
    }

    pub fn fill(&mut self, x: f64, w: f64) {
        let idx = self.edges.partition_point(|e| *e <= x);
        if idx == 0 {
            self.underflow.fill(x, w)
        } else if idx == self.edges.len() {
            self.overflow.fill(x, w)
        } else {
            self.bins[idx - 1].fill(x, w)
        }
    }

    pub fn scale(&mut self, factor: f64) {
        for bin in self.bins.iter_mut() {
            bin.scale(factor)
        }
        self.underflow.scale(factor);
        self.overflow.scale(factor);
    }

    /// Sum of weights, optionally including under- and overflow
    pub fn integral(&self, include_flows: bool) -> f64 {
        let inner: f64 = self.bins.iter().map(|b| b.sumw).sum();
        if include_flows {
            inner + self.underflow.sumw + self.overflow.sumw
        } else {
            inner
        }
    }

    /// Rescale such that the integral including flows equals `norm`
    ///
    /// Returns `false` and leaves the histogram untouched if the
    /// integral vanishes.
    pub fn normalize(&mut self, norm: f64) -> bool {
        let integral = self.integral(true);
        if integral == 0. {
            warn!("Cannot normalise {}: integral is zero", self.path);
            return false;
        }
        self.scale(norm / integral);
        true
    }

    pub fn merge(&mut self, other: &Histo1D) -> Result<(), AnalysisError> {
        if self.edges != other.edges {
            return Err(AnalysisError::BinningMismatch(
                self.path.clone(),
                other.path.clone(),
            ));
        }
        for (bin, other) in self.bins.iter_mut().zip(other.bins.iter()) {
            bin.add(other)
        }
        self.underflow.add(&other.underflow);
        self.overflow.add(&other.overflow);
        Ok(())
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn underflow(&self) -> &Bin {
        &self.underflow
    }

    pub fn overflow(&self) -> &Bin {
        &self.overflow
    }

    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn entries(&self) -> u64 {
        self.bins
            .iter()
            .chain([&self.underflow, &self.overflow])
            .map(|b| b.entries)
            .sum()
    }

    pub fn width(&self, bin: usize) -> f64 {
        self.edges[bin + 1] - self.edges[bin]
    }

    pub fn mid(&self, bin: usize) -> f64 {
        0.5 * (self.edges[bin + 1] + self.edges[bin])
    }

    /// Differential bin contents: sum of weights over bin width
    pub fn heights(&self) -> Vec<f64> {
        (0..self.n_bins())
            .map(|n| self.bins[n].sumw / self.width(n))
            .collect()
    }

    pub fn height_errs(&self) -> Vec<f64> {
        (0..self.n_bins())
            .map(|n| self.bins[n].sumw2.sqrt() / self.width(n))
            .collect()
    }
}

pub fn uniform_edges(n_bins: usize, min: f64, max: f64) -> Vec<f64> {
    let step = (max - min) / n_bins as f64;
    (0..=n_bins)
        .map(|n| if n == n_bins { max } else { min + n as f64 * step })
        .collect()
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Point2D {
    pub x: f64,
    pub ex: f64,
    /// `None` if the value is undefined, e.g. for a vanishing denominator
    pub y: Option<f64>,
    pub ey: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Scatter2D {
    pub path: String,
    pub points: Vec<Point2D>,
}

/// Bin-wise ratio of the differential contents of two histograms
///
/// Statistical uncertainties are added in quadrature as relative errors
/// of independent quantities.
pub fn divide(
    path: impl Into<String>,
    num: &Histo1D,
    den: &Histo1D,
) -> Result<Scatter2D, AnalysisError> {
    if num.edges != den.edges {
        return Err(AnalysisError::BinningMismatch(
            num.path.clone(),
            den.path.clone(),
        ));
    }
    let hnum = num.heights();
    let num_err = num.height_errs();
    let hden = den.heights();
    let den_err = den.height_errs();
    let points = (0..num.n_bins())
        .map(|n| {
            let (y, ey) = ratio(hnum[n], num_err[n], hden[n], den_err[n]).unzip();
            Point2D {
                x: num.mid(n),
                ex: 0.5 * num.width(n),
                y,
                ey,
            }
        })
        .collect();
    Ok(Scatter2D {
        path: path.into(),
        points,
    })
}

fn ratio(num: f64, num_err: f64, den: f64, den_err: f64) -> Option<(f64, f64)> {
    if den == 0. || (num == 0. && num_err != 0.) {
        return None;
    }
    let y = num / den;
    let rel_num = if num_err != 0. { num_err / num } else { 0. };
    let rel_den = if den_err != 0. { den_err / den } else { 0. };
    let ey = y.abs() * rel_num.hypot(rel_den);
    Some((y, ey))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn invalid_binning() {
        assert!(Histo1D::new("/h", vec![1.]).is_err());
        assert!(Histo1D::new("/h", vec![0., 2., 1.]).is_err());
        assert!(Histo1D::new("/h", vec![0., 1., 1.]).is_err());
        assert!(Histo1D::new("/h", vec![0., f64::INFINITY]).is_err());
    }

    #[test]
    fn fill_and_flows() {
        let mut h = Histo1D::new("/h", vec![0., 1., 2., 4.]).unwrap();
        h.fill(-1., 1.);
        h.fill(0., 2.);
        h.fill(1.5, 1.);
        h.fill(3.9, 0.5);
        h.fill(4., 1.);
        assert_eq!(h.underflow().sumw, 1.);
        assert_eq!(h.overflow().sumw, 1.);
        let sumw: Vec<_> = h.bins().iter().map(|b| b.sumw).collect();
        assert_eq!(sumw, [2., 1., 0.5]);
        assert_eq!(h.bins()[0].sumw2, 4.);
        assert_eq!(h.entries(), 5);
        assert_eq!(h.integral(false), 3.5);
        assert_eq!(h.integral(true), 5.5);
        assert_eq!(h.heights(), [2., 1., 0.25]);
    }

    #[test]
    fn uniform_binning() {
        let h = Histo1D::uniform("/h", 20, 0., 1.).unwrap();
        assert_eq!(h.n_bins(), 20);
        assert_eq!(h.edges()[20], 1.);
        assert_relative_eq!(h.width(7), 0.05, max_relative = 1e-12);
    }

    #[test]
    fn scale_errors() {
        let mut h = Histo1D::new("/h", vec![0., 1.]).unwrap();
        h.fill(0.5, 2.);
        h.scale(3.);
        assert_eq!(h.bins()[0].sumw, 6.);
        assert_eq!(h.bins()[0].sumw2, 36.);
    }

    #[test]
    fn normalise_empty() {
        let mut h = Histo1D::new("/h", vec![0., 1.]).unwrap();
        assert!(!h.normalize(1.));
        assert_eq!(h.integral(true), 0.);
    }

    #[test]
    fn merge_streams() {
        let mut a = Histo1D::new("/h", vec![0., 1., 2.]).unwrap();
        let mut b = a.clone();
        a.fill(0.5, 1.);
        b.fill(0.5, 2.);
        b.fill(1.5, 1.);
        a.merge(&b).unwrap();
        assert_eq!(a.bins()[0].sumw, 3.);
        assert_eq!(a.bins()[0].sumw2, 5.);
        assert_eq!(a.bins()[1].entries, 1);
        let c = Histo1D::new("/c", vec![0., 2.]).unwrap();
        assert!(a.merge(&c).is_err());
    }

    #[test]
    fn ratio_errors() {
        let mut num = Histo1D::new("/num", vec![0., 1., 2., 3.]).unwrap();
        let mut den = Histo1D::new("/den", vec![0., 1., 2., 3.]).unwrap();
        for _ in 0..4 {
            num.fill(0.5, 1.);
        }
        for _ in 0..16 {
            den.fill(0.5, 1.);
        }
        den.fill(1.5, 1.);
        let r = divide("/ratio", &num, &den).unwrap();
        assert_eq!(r.points.len(), 3);
        let p = r.points[0];
        assert_eq!(p.x, 0.5);
        assert_eq!(p.ex, 0.5);
        assert_relative_eq!(p.y.unwrap(), 0.25);
        let expected = 0.25 * (0.5f64.powi(2) + 0.25f64.powi(2)).sqrt();
        assert_relative_eq!(p.ey.unwrap(), expected, max_relative = 1e-12);
        // empty numerator over filled denominator
        assert_eq!(r.points[1].y, Some(0.));
        // both empty
        assert_eq!(r.points[2].y, None);
        assert_eq!(r.points[2].ey, None);
    }

    #[test]
    fn ratio_binning_mismatch() {
        let num = Histo1D::new("/num", vec![0., 1., 2.]).unwrap();
        let den = Histo1D::new("/den", vec![0., 1., 3.]).unwrap();
        assert!(matches!(
            divide("/ratio", &num, &den),
            Err(AnalysisError::BinningMismatch(_, _))
        ));
    }

    proptest! {
        #[test]
        fn normalised_sum_is_one(
            values in proptest::collection::vec((0.0f64..1.0, 0.01f64..10.), 1..50)
        ) {
            let mut h = Histo1D::uniform("/h", 20, 0., 1.).unwrap();
            for (x, w) in values {
                h.fill(x, w);
            }
            prop_assert!(h.normalize(1.));
            prop_assert!((h.integral(false) - 1.).abs() < 1e-12);
        }

        #[test]
        fn self_ratio_is_one(
            values in proptest::collection::vec(0.0f64..10.0, 0..30)
        ) {
            let mut h = Histo1D::uniform("/h", 10, 0., 10.).unwrap();
            for x in values {
                h.fill(x, 1.);
            }
            let r = divide("/r", &h, &h).unwrap();
            for (point, bin) in r.points.iter().zip(h.bins()) {
                if bin.sumw != 0. {
                    prop_assert!((point.y.unwrap() - 1.).abs() < 1e-12);
                } else {
                    prop_assert!(point.y.is_none());
                }
            }
        }
    }
}
