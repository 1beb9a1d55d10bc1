//! Distances in the (pseudo)rapidity-azimuth plane
use num_traits::{Float, FloatConst};

/// Signed azimuthal difference `phi1 - phi2` folded into (-π, π]
pub fn delta_phi<T: Float + FloatConst>(phi1: T, phi2: T) -> T {
    let two_pi = T::PI() + T::PI();
    let mut dphi = (phi1 - phi2) % two_pi;
    if dphi > T::PI() {
        dphi = dphi - two_pi;
    } else if dphi <= -T::PI() {
        dphi = dphi + two_pi;
    }
    dphi
}

pub fn delta_r2<T: Float + FloatConst>(a: (T, T), b: (T, T)) -> T {
    let deta = a.0 - b.0;
    let dphi = delta_phi(a.1, b.1);
    deta * deta + dphi * dphi
}

/// Euclidean separation of two directions given as `(eta, phi)`
pub fn delta_r<T: Float + FloatConst>(a: (T, T), b: (T, T)) -> T {
    delta_r2(a, b).sqrt()
}
