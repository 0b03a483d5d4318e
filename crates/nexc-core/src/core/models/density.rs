use ndarray::Array2;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DensityError {
    #[error("density block is not square: {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("density blocks disagree in shape: scalar {scalar}x{scalar}, z {z}x{z}")]
    ShapeMismatch { scalar: usize, z: usize },
}

/// The (scalar, z) density-matrix pair of an unrestricted calculation:
/// `scalar = P_alpha + P_beta`, `z = P_alpha - P_beta`.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityPair {
    scalar: Array2<f64>,
    z: Array2<f64>,
}

impl DensityPair {
    pub fn new(scalar: Array2<f64>, z: Array2<f64>) -> Result<Self, DensityError> {
        for block in [&scalar, &z] {
            let (rows, cols) = block.dim();
            if rows != cols {
                return Err(DensityError::NotSquare { rows, cols });
            }
        }
        if scalar.dim().0 != z.dim().0 {
            return Err(DensityError::ShapeMismatch {
                scalar: scalar.dim().0,
                z: z.dim().0,
            });
        }
        Ok(Self { scalar, z })
    }

    /// Basis dimension of both blocks.
    pub fn dim(&self) -> usize {
        self.scalar.dim().0
    }

    pub fn scalar(&self) -> &Array2<f64> {
        &self.scalar
    }

    pub fn z(&self) -> &Array2<f64> {
        &self.z
    }

    /// Spin-channel blocks `(P_alpha, P_beta)`.
    pub fn spin_channels(&self) -> (Array2<f64>, Array2<f64>) {
        let alpha = (&self.scalar + &self.z) * 0.5;
        let beta = (&self.scalar - &self.z) * 0.5;
        (alpha, beta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn rejects_non_square_blocks() {
        let scalar = Array2::zeros((2, 3));
        let z = Array2::zeros((2, 2));
        assert!(matches!(
            DensityPair::new(scalar, z),
            Err(DensityError::NotSquare { rows: 2, cols: 3 })
        ));
    }

    #[test]
    fn rejects_mismatched_blocks() {
        let scalar = Array2::zeros((2, 2));
        let z = Array2::zeros((3, 3));
        assert!(matches!(
            DensityPair::new(scalar, z),
            Err(DensityError::ShapeMismatch { scalar: 2, z: 3 })
        ));
    }

    fn max_abs_diff(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn spin_channels_recombine_to_inputs() {
        let scalar = array![[1.0, 0.2], [0.2, 0.8]];
        let z = array![[0.4, 0.0], [0.0, -0.2]];
        let pair = DensityPair::new(scalar.clone(), z.clone()).unwrap();
        let (alpha, beta) = pair.spin_channels();
        let sum = &alpha + &beta;
        let diff = &alpha - &beta;
        assert!(max_abs_diff(&sum, &scalar) < 1e-12);
        assert!(max_abs_diff(&diff, &z) < 1e-12);
    }
}
