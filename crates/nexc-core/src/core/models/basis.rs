use nalgebra::Point3;
use std::f64::consts::PI;

/// Fixed slot count for primitive exponents/coefficients in the reference
/// file format; shorter contractions are zero-padded on disk.
pub const MAX_PRIMITIVES: usize = 16;

/// Default screening tolerance applied when a file does not override it.
pub const DEFAULT_SHELL_TOLERANCE: f64 = 1e-10;

/// A contracted Gaussian shell.
///
/// `coefficients` are stored fully normalized (libint convention), i.e. the
/// values that multiply primitive Gaussians directly at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub struct Shell {
    pub l: u32,
    pub pure: bool,
    pub exponents: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub origin: Point3<f64>,
    tolerance: f64,
    cutoff_radius: f64,
}

impl Shell {
    pub fn new(
        l: u32,
        pure: bool,
        exponents: Vec<f64>,
        coefficients: Vec<f64>,
        origin: Point3<f64>,
    ) -> Self {
        let mut shell = Self {
            l,
            pure,
            exponents,
            coefficients,
            origin,
            tolerance: DEFAULT_SHELL_TOLERANCE,
            cutoff_radius: f64::INFINITY,
        };
        shell.set_tolerance(DEFAULT_SHELL_TOLERANCE);
        shell
    }

    /// Number of basis functions this shell contributes.
    pub fn num_functions(&self) -> usize {
        if self.pure {
            (2 * self.l + 1) as usize
        } else {
            ((self.l + 1) * (self.l + 2) / 2) as usize
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Radius beyond which the slowest-decaying primitive drops below the
    /// screening tolerance.
    pub fn cutoff_radius(&self) -> f64 {
        self.cutoff_radius
    }

    /// Update the screening tolerance and the derived cutoff radius.
    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
        let alpha_min = self
            .exponents
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        self.cutoff_radius = if tolerance > 0.0 && alpha_min.is_finite() && alpha_min > 0.0 {
            (-tolerance.ln() / alpha_min).sqrt()
        } else {
            f64::INFINITY
        };
    }
}

/// A basis set: shells in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasisSet {
    shells: Vec<Shell>,
}

impl BasisSet {
    pub fn new(shells: Vec<Shell>) -> Self {
        Self { shells }
    }

    pub fn shells(&self) -> &[Shell] {
        &self.shells
    }

    pub fn len(&self) -> usize {
        self.shells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shells.is_empty()
    }

    /// Total number of basis functions over all shells.
    pub fn num_functions(&self) -> usize {
        self.shells.iter().map(Shell::num_functions).sum()
    }

    /// Apply one screening tolerance to every shell.
    pub fn set_shell_tolerance(&mut self, tolerance: f64) {
        for shell in &mut self.shells {
            shell.set_tolerance(tolerance);
        }
    }
}

fn double_factorial(n: i64) -> f64 {
    // (-1)!! = 1 by convention.
    let mut acc = 1.0;
    let mut k = n;
    while k > 1 {
        acc *= k as f64;
        k -= 2;
    }
    acc
}

/// Normalize contraction coefficients in the libint convention for angular
/// momentum `l`: primitives are individually normalized, then the contracted
/// function is scaled to unit self-overlap.
pub fn normalize_contraction(l: u32, exponents: &[f64], coefficients: &[f64]) -> Vec<f64> {
    let sqrt_pi_cubed = PI.powf(1.5);
    let df = double_factorial(2 * l as i64 - 1);
    let l_f = l as f64;

    let primitive_norm: Vec<f64> = exponents
        .iter()
        .map(|&a| {
            let two_a = 2.0 * a;
            (2.0_f64.powf(l_f) * two_a.powf(l_f + 1.5) / (sqrt_pi_cubed * df)).sqrt()
        })
        .collect();

    let scaled: Vec<f64> = coefficients
        .iter()
        .zip(&primitive_norm)
        .map(|(&c, &n)| c * n)
        .collect();

    let mut self_overlap = 0.0;
    for (i, &a) in exponents.iter().enumerate() {
        for (j, &b) in exponents.iter().enumerate() {
            let gamma = a + b;
            let pair = df * sqrt_pi_cubed / (2.0_f64.powf(l_f) * gamma.powf(l_f + 1.5));
            self_overlap += scaled[i] * scaled[j] * pair;
        }
    }

    let scale = 1.0 / self_overlap.sqrt();
    scaled.into_iter().map(|c| c * scale).collect()
}
