//! Gauss-Legendre quadrature points and weights

/// A single quadrature point with weight
#[derive(Debug, Clone, Copy)]
pub struct QuadraturePoint {
    /// Reference coordinate
    pub xi: f64,
    /// Integration weight
    pub weight: f64,
}

impl QuadraturePoint {
    pub fn new(xi: f64, weight: f64) -> Self {
        Self { xi, weight }
    }
}

/// 1D Gauss-Legendre quadrature on [-1, 1]
///
/// An n-point rule integrates polynomials of degree 2n-1 exactly.
///
/// # Panics
///
/// Panics for `points` outside 1..=4.
pub fn gauss_legendre_1d(points: usize) -> Vec<QuadraturePoint> {
    match points {
        1 => vec![QuadraturePoint::new(0.0, 2.0)],
        2 => {
            let x = 1.0 / 3.0_f64.sqrt();
            vec![QuadraturePoint::new(-x, 1.0), QuadraturePoint::new(x, 1.0)]
        }
        3 => {
            let x = (3.0 / 5.0_f64).sqrt();
            vec![
                QuadraturePoint::new(-x, 5.0 / 9.0),
                QuadraturePoint::new(0.0, 8.0 / 9.0),
                QuadraturePoint::new(x, 5.0 / 9.0),
            ]
        }
        4 => {
            let a = (3.0 / 7.0 - 2.0 / 7.0 * (6.0 / 5.0_f64).sqrt()).sqrt();
            let b = (3.0 / 7.0 + 2.0 / 7.0 * (6.0 / 5.0_f64).sqrt()).sqrt();
            let wa = (18.0 + 30.0_f64.sqrt()) / 36.0;
            let wb = (18.0 - 30.0_f64.sqrt()) / 36.0;
            vec![
                QuadraturePoint::new(-b, wb),
                QuadraturePoint::new(-a, wa),
                QuadraturePoint::new(a, wa),
                QuadraturePoint::new(b, wb),
            ]
        }
        _ => panic!("Gauss-Legendre rule with {} points not available", points),
    }
}

/// 1D Gauss-Legendre quadrature mapped to [0, 1]
pub fn gauss_legendre_unit(points: usize) -> Vec<QuadraturePoint> {
    gauss_legendre_1d(points)
        .into_iter()
        .map(|qp| QuadraturePoint::new(0.5 * (qp.xi + 1.0), 0.5 * qp.weight))
        .collect()
}
