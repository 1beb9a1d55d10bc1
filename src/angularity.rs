use crate::geometry::delta_r;
use crate::jet::Jet;

/// Generalised angularity
///
/// λ = Σ_i pT_i (ΔR(i, jet) / R)^α / pT_jet, where ΔR is measured in
/// pseudorapidity and azimuth relative to the jet axis.
///
/// # Panics
///
/// Panics if the jet has vanishing transverse momentum.
pub fn angularity(jet: &Jet, radius: f64, alpha: f64) -> f64 {
    assert!(
        jet.pt > 0.,
        "angularity of a jet with transverse momentum {}",
        jet.pt
    );
    let axis = jet.axis();
    jet.constituents
        .iter()
        .map(|c| c.pt * (delta_r((c.eta, c.phi), axis) / radius).powf(alpha))
        .sum::<f64>()
        / jet.pt
}
