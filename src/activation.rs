use crate::Matrix;
use ndarray::Axis;

/// Max input clipping value to prevent overflow in the exp function
const INPUT_CLIP_MAX: f64 = 500.0;

/// Min input clipping value to prevent overflow in the exp function
const INPUT_CLIP_MIN: f64 = -500.0;

/// Applies the logistic sigmoid `1 / (1 + exp(-x))` elementwise.
///
/// Inputs are clipped to \[-500, 500\] before exponentiating so that large
/// negative values cannot overflow `exp(-x)`.
///
/// # Parameters
///
/// * `x` - Pre-activation values
///
/// # Returns
///
/// * `Matrix` - A new matrix with values in (0, 1)
pub fn sigmoid(x: &Matrix) -> Matrix {
    x.mapv(|v| {
        let clipped = v.clamp(INPUT_CLIP_MIN, INPUT_CLIP_MAX);
        1.0 / (1.0 + (-clipped).exp())
    })
}

/// Applies the hyperbolic tangent elementwise.
pub fn tanh(x: &Matrix) -> Matrix {
    x.mapv(f64::tanh)
}

/// Derivative of tanh expressed through its output.
///
/// `y` must already be tanh-activated: the result is `1 - y^2`, the derivative
/// with respect to the pre-activation value that produced `y`.
pub fn tanh_derivative(y: &Matrix) -> Matrix {
    y.mapv(|a| 1.0 - a * a)
}

/// Derivative of the sigmoid expressed through its output: `y * (1 - y)`.
pub fn sigmoid_derivative(y: &Matrix) -> Matrix {
    y.mapv(|a| a * (1.0 - a))
}

/// Row-wise softmax with max subtraction.
///
/// For each row: softmax(x_i) = exp(x_i - max(x)) / sum_j(exp(x_j - max(x))).
/// Subtracting the row maximum keeps every exponent at or below zero, so rows
/// with very large finite values still normalise to 1.
///
/// # Parameters
///
/// * `x` - Logits with shape \[batch, classes\]
///
/// # Returns
///
/// * `Matrix` - Probability distributions with the same shape as `x`
pub fn softmax(x: &Matrix) -> Matrix {
    let mut out = x.clone();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max_val = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        row.mapv_inplace(|v| (v - max_val).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    out
}
