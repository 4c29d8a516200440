//! Activation functions as `(f, df)` pairs.
//!
//! An [`Operation`] couples a scalar function with its derivative; when no
//! analytic derivative exists the derivative falls back to a
//! central-difference estimate. [`Activation`] names the built-in set and is
//! serde-serializable so callers can persist a network topology by name.

use neurogen_math::calculus;
use serde::{Deserialize, Serialize};

/// Immutable `(f, df)` pair over `f64`.
#[derive(Clone, Copy)]
pub struct Operation {
    f: fn(f64) -> f64,
    df: Option<fn(f64) -> f64>,
}

impl Operation {
    /// An operation whose derivative is estimated numerically.
    #[must_use]
    pub fn new(f: fn(f64) -> f64) -> Self {
        Self { f, df: None }
    }

    /// An operation with an analytic derivative.
    #[must_use]
    pub fn with_derivative(f: fn(f64) -> f64, df: fn(f64) -> f64) -> Self {
        Self { f, df: Some(df) }
    }

    #[must_use]
    pub fn apply(&self, x: f64) -> f64 {
        (self.f)(x)
    }

    /// Analytic derivative when available, central-difference estimate
    /// otherwise.
    #[must_use]
    pub fn derivative(&self, x: f64) -> f64 {
        match self.df {
            Some(df) => df(x),
            None => calculus::derivative(self.f, x),
        }
    }
}

/// Named activation functions shared by a whole layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Activation {
    #[default]
    Identity,
    BinaryStep,
    Sigmoid,
    Tanh,
    Relu,
    LeakyRelu,
    ElliotSig,
    Swish,
    Sqnl,
    Gelu,
}

impl Activation {
    /// The `(f, df)` pair for this activation.
    #[must_use]
    pub fn operation(self) -> Operation {
        match self {
            Self::Identity => Operation::with_derivative(identity, identity_df),
            Self::BinaryStep => Operation::with_derivative(binary_step, binary_step_df),
            Self::Sigmoid => Operation::with_derivative(sigmoid, sigmoid_df),
            Self::Tanh => Operation::with_derivative(tanh, tanh_df),
            Self::Relu => Operation::with_derivative(relu, relu_df),
            Self::LeakyRelu => Operation::with_derivative(leaky_relu, leaky_relu_df),
            Self::ElliotSig => Operation::with_derivative(elliot_sig, elliot_sig_df),
            Self::Swish => Operation::with_derivative(swish, swish_df),
            Self::Sqnl => Operation::with_derivative(sqnl, sqnl_df),
            // No closed-form derivative; numeric fallback.
            Self::Gelu => Operation::new(gelu),
        }
    }

    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        self.operation().apply(x)
    }

    #[must_use]
    pub fn derivative(self, x: f64) -> f64 {
        self.operation().derivative(x)
    }
}

fn identity(x: f64) -> f64 {
    x
}

fn identity_df(_x: f64) -> f64 {
    1.0
}

fn binary_step(x: f64) -> f64 {
    if x < 0.0 {
        0.0
    } else {
        1.0
    }
}

fn binary_step_df(_x: f64) -> f64 {
    0.0
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn sigmoid_df(x: f64) -> f64 {
    let s = sigmoid(x);
    s * (1.0 - s)
}

fn tanh(x: f64) -> f64 {
    x.tanh()
}

fn tanh_df(x: f64) -> f64 {
    1.0 - x.tanh().powi(2)
}

fn relu(x: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else {
        x
    }
}

fn relu_df(x: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else {
        1.0
    }
}

fn leaky_relu(x: f64) -> f64 {
    if x < 0.0 {
        0.01 * x
    } else {
        x
    }
}

fn leaky_relu_df(x: f64) -> f64 {
    if x < 0.0 {
        0.01
    } else {
        1.0
    }
}

/// Softsign.
fn elliot_sig(x: f64) -> f64 {
    x / (1.0 + x.abs())
}

fn elliot_sig_df(x: f64) -> f64 {
    1.0 / (1.0 + x.abs()).powi(2)
}

fn swish(x: f64) -> f64 {
    x * sigmoid(x)
}

fn swish_df(x: f64) -> f64 {
    swish(x) + sigmoid(x) * (1.0 - swish(x))
}

/// Square nonlinearity, saturating outside [-2, 2].
fn sqnl(x: f64) -> f64 {
    if x > 2.0 {
        1.0
    } else if x > 0.0 {
        x - (x * x) / 4.0
    } else if x >= -2.0 {
        x + (x * x) / 4.0
    } else {
        -1.0
    }
}

fn sqnl_df(x: f64) -> f64 {
    if (0.0..=2.0).contains(&x) {
        1.0 - x / 2.0
    } else if (-2.0..0.0).contains(&x) {
        1.0 + x / 2.0
    } else {
        0.0
    }
}

/// Gaussian error linear unit, erf integrated numerically.
fn gelu(x: f64) -> f64 {
    0.5 * x * (1.0 + calculus::erf(x / std::f64::consts::SQRT_2))
}
