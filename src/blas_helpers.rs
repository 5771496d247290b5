//! Small dense vector helpers shared by the iterative solvers

use crate::traits::Scalar;
use ndarray::Array1;

/// Compute inner product (x, y) = Σ x_i * y_i
#[inline]
pub fn inner_product<S: Scalar>(x: &Array1<S>, y: &Array1<S>) -> S {
    assert_eq!(
        x.len(),
        y.len(),
        "Vector lengths must match for inner product"
    );
    x.iter().zip(y.iter()).map(|(&xi, &yi)| xi * yi).sum()
}

/// Compute vector 2-norm: ||x||_2 = sqrt(Σ x_i²)
#[inline]
pub fn vector_norm<S: Scalar>(x: &Array1<S>) -> S {
    x.iter().map(|&xi| xi * xi).sum::<S>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_inner_product() {
        let x = array![1.0_f64, 2.0, 3.0];
        let y = array![4.0_f64, -5.0, 6.0];
        assert_relative_eq!(inner_product(&x, &y), 12.0);
    }

    #[test]
    fn test_vector_norm() {
        let x = array![3.0_f64, 4.0];
        assert_relative_eq!(vector_norm(&x), 5.0);
    }
}
