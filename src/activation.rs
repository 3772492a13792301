//! Activation functions for NEAT networks.
//!
//! The classic NEAT squashing function is a logistic curve with slope 4.9,
//! steep enough to be near-linear around zero and saturated by |x| = 1.

use serde::{Deserialize, Serialize};

/// Slope of [`Activation::SteepSigmoid`].
pub const STEEP_SIGMOID_SLOPE: f32 = 4.9;

/// Activation function applied to every non-input node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Activation {
    /// Steep logistic: f(x) = 1 / (1 + e^(-4.9x))
    #[default]
    SteepSigmoid,
    /// Sigmoid: f(x) = 1 / (1 + e^(-x))
    Sigmoid,
    /// Hyperbolic tangent: f(x) = tanh(x)
    Tanh,
    /// Rectified Linear Unit: f(x) = max(0, x)
    ReLU,
    /// Identity function: f(x) = x
    Identity,
}

impl Activation {
    /// All available activation functions.
    pub const ALL: [Self; 5] = [
        Self::SteepSigmoid,
        Self::Sigmoid,
        Self::Tanh,
        Self::ReLU,
        Self::Identity,
    ];

    /// Apply this activation function to an input value.
    ///
    /// NaN propagates. Infinite inputs saturate where the function is bounded.
    #[inline]
    #[must_use]
    pub fn apply(self, x: f32) -> f32 {
        if x.is_nan() {
            return f32::NAN;
        }

        match self {
            Self::SteepSigmoid => logistic(STEEP_SIGMOID_SLOPE * x),
            Self::Sigmoid => logistic(x),
            Self::Tanh => {
                if x.is_infinite() {
                    return x.signum();
                }
                x.tanh()
            }
            Self::ReLU => x.max(0.0),
            Self::Identity => x,
        }
    }

    /// The (min, max) range of values this function can produce.
    #[must_use]
    pub const fn output_range(self) -> (f32, f32) {
        match self {
            Self::SteepSigmoid | Self::Sigmoid => (0.0, 1.0),
            Self::Tanh => (-1.0, 1.0),
            Self::ReLU => (0.0, f32::INFINITY),
            Self::Identity => (f32::NEG_INFINITY, f32::INFINITY),
        }
    }
}

#[inline]
fn logistic(x: f32) -> f32 {
    if x == f32::INFINITY {
        return 1.0;
    }
    if x == f32::NEG_INFINITY {
        return 0.0;
    }
    // exp overflows f32 past ~88
    let clamped = x.clamp(-88.0, 88.0);
    1.0 / (1.0 + (-clamped).exp())
}
