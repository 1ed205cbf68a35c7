// TTC distribution catalog
//
//  Copyright (C) 2019-2023 MALR contributors.
//
//  This file is part of MALR.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Time-to-compromise probability distributions.
//!
//! A TTC function in MAL source is just a name and a list of numbers,
//!   e.g. `Exponential(0.1)`.
//! This module is the catalog of names that are understood,
//!   the number of parameters each expects,
//!   and the range each parameter must fall within.
//!
//! Distributions come in two flavors:
//!
//!   - _Parametric_ distributions
//!       ([`Bernoulli`](DistributionKind::Bernoulli),
//!       [`Exponential`](DistributionKind::Exponential),
//!       and so on)
//!       take a fixed number of parameters; and
//!   - _Combination_ distributions take no parameters.
//!     These are either constants
//!       ([`Enabled`](DistributionKind::Enabled),
//!       [`Zero`](DistributionKind::Zero),
//!       etc.)
//!       or named macros that expand into a canonical parametric
//!       distribution,
//!         possibly gated by a Bernoulli trial
//!         (see [`Distribution::expand`]).
//!
//! Validation errors are [`DistributionError`]s whose [`Display`]
//!   rendering is the exact diagnostic text;
//!     the caller attaches a span.

use std::{
    error::Error,
    fmt::{self, Display},
};

/// Every distribution name understood by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionKind {
    Bernoulli,
    Binomial,
    Exponential,
    Gamma,
    LogNormal,
    Pareto,
    TruncatedNormal,
    Uniform,
    Enabled,
    Disabled,
    Zero,
    Infinity,
    EasyAndCertain,
    EasyAndUncertain,
    HardAndCertain,
    HardAndUncertain,
    VeryHardAndCertain,
    VeryHardAndUncertain,
}

impl DistributionKind {
    /// Look up a distribution by the name written in source.
    ///
    /// The older `*ButCertain`/`*ButUncertain` spellings of the macro
    ///   combinations are accepted as aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        use DistributionKind::*;

        Some(match name {
            "Bernoulli" => Bernoulli,
            "Binomial" => Binomial,
            "Exponential" => Exponential,
            "Gamma" => Gamma,
            "LogNormal" => LogNormal,
            "Pareto" => Pareto,
            "TruncatedNormal" => TruncatedNormal,
            "Uniform" => Uniform,
            "Enabled" => Enabled,
            "Disabled" => Disabled,
            "Zero" => Zero,
            "Infinity" => Infinity,
            "EasyAndCertain" => EasyAndCertain,
            "EasyAndUncertain" | "EasyButUncertain" => EasyAndUncertain,
            "HardAndCertain" | "HardButCertain" => HardAndCertain,
            "HardAndUncertain" => HardAndUncertain,
            "VeryHardAndCertain" | "VeryHardButCertain" => VeryHardAndCertain,
            "VeryHardAndUncertain" => VeryHardAndUncertain,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        use DistributionKind::*;

        match self {
            Bernoulli => "Bernoulli",
            Binomial => "Binomial",
            Exponential => "Exponential",
            Gamma => "Gamma",
            LogNormal => "LogNormal",
            Pareto => "Pareto",
            TruncatedNormal => "TruncatedNormal",
            Uniform => "Uniform",
            Enabled => "Enabled",
            Disabled => "Disabled",
            Zero => "Zero",
            Infinity => "Infinity",
            EasyAndCertain => "EasyAndCertain",
            EasyAndUncertain => "EasyAndUncertain",
            HardAndCertain => "HardAndCertain",
            HardAndUncertain => "HardAndUncertain",
            VeryHardAndCertain => "VeryHardAndCertain",
            VeryHardAndUncertain => "VeryHardAndUncertain",
        }
    }

    /// Names of the parameters expected by this distribution,
    ///   in order.
    ///
    /// Combination distributions expect none.
    pub fn params(self) -> &'static [&'static str] {
        use DistributionKind::*;

        match self {
            Bernoulli => &["probability"],
            Binomial => &["trials", "probability"],
            Exponential => &["lambda"],
            Gamma => &["shape", "scale"],
            LogNormal | TruncatedNormal => &["mean", "standardDeviation"],
            Pareto => &["min", "shape"],
            Uniform => &["min", "max"],
            _ => &[],
        }
    }

    /// Whether this distribution takes no parameters.
    pub fn is_combination(self) -> bool {
        self.params().is_empty()
    }

    /// Whether this distribution is a Bernoulli trial,
    ///   either directly or as a macro whose entire expansion is one.
    ///
    /// The value of such a distribution is a success probability,
    ///   not a time,
    ///   so it has no meaning as the operand of a subtraction,
    ///     division,
    ///     or exponentiation.
    pub fn is_bernoulli_family(self) -> bool {
        matches!(self, Self::Bernoulli | Self::EasyAndUncertain)
    }

    /// Whether this distribution may be used as the TTC of a defense.
    pub fn is_defense_compatible(self) -> bool {
        matches!(self, Self::Enabled | Self::Disabled | Self::Bernoulli)
    }

    /// Whether this distribution is one of the constant on/off values.
    pub fn is_toggle(self) -> bool {
        matches!(self, Self::Enabled | Self::Disabled)
    }

    /// Range constraints on individual parameters.
    ///
    /// Each entry is the index of the constrained parameter and the
    ///   constraint it must satisfy.
    fn constraints(self) -> &'static [(usize, Constraint)] {
        use Constraint::*;
        use DistributionKind::*;

        match self {
            Bernoulli => &[(0, Probability)],
            Binomial => &[(1, Probability)],
            Exponential => &[(0, Positive("lambda"))],
            Gamma => &[(0, Positive("shape")), (1, Positive("scale"))],
            LogNormal | TruncatedNormal => &[(1, Positive("standardDeviation"))],
            Pareto => &[(0, Positive("min")), (1, Positive("shape"))],
            _ => &[],
        }
    }
}

impl Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Permitted range of a single distribution parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// `0 <= probability <= 1`
    Probability,
    /// `name > 0`
    Positive(&'static str),
}

impl Constraint {
    fn holds(self, x: f64) -> bool {
        match self {
            Self::Probability => (0.0..=1.0).contains(&x),
            Self::Positive(_) => x > 0.0,
        }
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Probability => write!(f, "0 <= probability <= 1"),
            Self::Positive(name) => write!(f, "{name} > 0"),
        }
    }
}

/// A validated distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distribution {
    Bernoulli { probability: f64 },
    Binomial { trials: f64, probability: f64 },
    Exponential { lambda: f64 },
    Gamma { shape: f64, scale: f64 },
    LogNormal { mean: f64, std_dev: f64 },
    Pareto { min: f64, shape: f64 },
    TruncatedNormal { mean: f64, std_dev: f64 },
    Uniform { min: f64, max: f64 },
    Enabled,
    Disabled,
    Zero,
    Infinity,
    EasyAndCertain,
    EasyAndUncertain,
    HardAndCertain,
    HardAndUncertain,
    VeryHardAndCertain,
    VeryHardAndUncertain,
}

/// Canonical form of a distribution after macro expansion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expansion {
    /// The distribution stands on its own.
    Single(Distribution),

    /// The distribution only applies if a Bernoulli trial with the given
    ///   success probability succeeds;
    ///     otherwise the step is never compromised.
    Gated { probability: f64, then: Distribution },
}

impl Distribution {
    /// Validate a distribution by name and parameters.
    pub fn new(name: &str, params: &[f64]) -> Result<Self, DistributionError> {
        let kind = DistributionKind::from_name(name)
            .ok_or_else(|| DistributionError::Unsupported(name.into()))?;

        Self::from_kind(kind, params)
    }

    /// Validate the parameters of an already identified distribution.
    pub fn from_kind(
        kind: DistributionKind,
        params: &[f64],
    ) -> Result<Self, DistributionError> {
        use DistributionKind as K;

        if params.len() != kind.params().len() {
            return Err(DistributionError::Arity(kind));
        }

        for &(i, constraint) in kind.constraints() {
            if !constraint.holds(params[i]) {
                return Err(DistributionError::Range {
                    kind,
                    constraint,
                    value: params[i],
                });
            }
        }

        Ok(match (kind, params) {
            (K::Bernoulli, &[probability]) => Self::Bernoulli { probability },
            (K::Binomial, &[trials, probability]) => Self::Binomial {
                trials: trials.round(),
                probability,
            },
            (K::Exponential, &[lambda]) => Self::Exponential { lambda },
            (K::Gamma, &[shape, scale]) => Self::Gamma { shape, scale },
            (K::LogNormal, &[mean, std_dev]) => Self::LogNormal { mean, std_dev },
            (K::Pareto, &[min, shape]) => Self::Pareto { min, shape },
            (K::TruncatedNormal, &[mean, std_dev]) => {
                Self::TruncatedNormal { mean, std_dev }
            }
            (K::Uniform, &[min, max]) if min <= max => Self::Uniform { min, max },
            (K::Uniform, &[min, max]) => {
                return Err(DistributionError::Order { min, max })
            }
            (K::Enabled, _) => Self::Enabled,
            (K::Disabled, _) => Self::Disabled,
            (K::Zero, _) => Self::Zero,
            (K::Infinity, _) => Self::Infinity,
            (K::EasyAndCertain, _) => Self::EasyAndCertain,
            (K::EasyAndUncertain, _) => Self::EasyAndUncertain,
            (K::HardAndCertain, _) => Self::HardAndCertain,
            (K::HardAndUncertain, _) => Self::HardAndUncertain,
            (K::VeryHardAndCertain, _) => Self::VeryHardAndCertain,
            (K::VeryHardAndUncertain, _) => Self::VeryHardAndUncertain,

            // Arity was checked above.
            (_, _) => return Err(DistributionError::Arity(kind)),
        })
    }

    pub fn kind(&self) -> DistributionKind {
        use DistributionKind as K;

        match self {
            Self::Bernoulli { .. } => K::Bernoulli,
            Self::Binomial { .. } => K::Binomial,
            Self::Exponential { .. } => K::Exponential,
            Self::Gamma { .. } => K::Gamma,
            Self::LogNormal { .. } => K::LogNormal,
            Self::Pareto { .. } => K::Pareto,
            Self::TruncatedNormal { .. } => K::TruncatedNormal,
            Self::Uniform { .. } => K::Uniform,
            Self::Enabled => K::Enabled,
            Self::Disabled => K::Disabled,
            Self::Zero => K::Zero,
            Self::Infinity => K::Infinity,
            Self::EasyAndCertain => K::EasyAndCertain,
            Self::EasyAndUncertain => K::EasyAndUncertain,
            Self::HardAndCertain => K::HardAndCertain,
            Self::HardAndUncertain => K::HardAndUncertain,
            Self::VeryHardAndCertain => K::VeryHardAndCertain,
            Self::VeryHardAndUncertain => K::VeryHardAndUncertain,
        }
    }

    /// Expand macro combinations into their canonical distribution.
    ///
    /// Every other distribution expands to itself.
    pub fn expand(&self) -> Expansion {
        use Distribution::*;

        const COIN: f64 = 0.5;

        match *self {
            EasyAndCertain => Expansion::Single(Exponential { lambda: 1.0 }),
            EasyAndUncertain => Expansion::Single(Bernoulli { probability: COIN }),
            HardAndCertain => Expansion::Single(Exponential { lambda: 0.1 }),
            HardAndUncertain => Expansion::Gated {
                probability: COIN,
                then: Exponential { lambda: 0.1 },
            },
            VeryHardAndCertain => Expansion::Single(Exponential { lambda: 0.01 }),
            VeryHardAndUncertain => Expansion::Gated {
                probability: COIN,
                then: Exponential { lambda: 0.01 },
            },
            other => Expansion::Single(other),
        }
    }

    /// Expected value of the distribution.
    ///
    /// Distributions without a finite mean yield [`f64::INFINITY`].
    /// For Bernoulli-gated macros this is the product of the gate
    ///   probability and the mean of the gated distribution.
    pub fn mean(&self) -> f64 {
        use Distribution::*;

        match *self {
            Bernoulli { probability } => probability,
            Binomial { trials, probability } => trials * probability,
            Exponential { lambda } => 1.0 / lambda,
            Gamma { shape, scale } => shape * scale,
            LogNormal { mean, std_dev } => (mean + std_dev.powi(2) / 2.0).exp(),
            Pareto { shape, .. } if shape <= 1.0 => f64::INFINITY,
            Pareto { min, shape } => shape * min / (shape - 1.0),
            TruncatedNormal { mean, .. } => mean,
            Uniform { min, max } => (min + max) / 2.0,
            Enabled => 1.0,
            Disabled | Zero => 0.0,
            Infinity => f64::INFINITY,
            _ => match self.expand() {
                Expansion::Single(dist) => dist.mean(),
                Expansion::Gated { probability, then } => {
                    probability * then.mean()
                }
            },
        }
    }
}

impl Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Distribution::*;

        let name = self.kind().name();

        match *self {
            Bernoulli { probability } => {
                write!(f, "{name}({})", Num(probability))
            }
            Binomial { trials, probability } => {
                write!(f, "{name}({}, {})", Num(trials), Num(probability))
            }
            Exponential { lambda } => write!(f, "{name}({})", Num(lambda)),
            Gamma { shape: a, scale: b }
            | LogNormal { mean: a, std_dev: b }
            | Pareto { min: a, shape: b }
            | TruncatedNormal { mean: a, std_dev: b }
            | Uniform { min: a, max: b } => {
                write!(f, "{name}({}, {})", Num(a), Num(b))
            }
            _ => f.write_str(name),
        }
    }
}

/// Render a parameter the way MAL tooling has always rendered them:
///   integral values keep a trailing `.0`
///     (`0.0`, `5.0`),
///   others use the shortest round-trip representation
///     (`1.1`).
#[derive(Debug, Clone, Copy)]
pub struct Num(pub f64);

impl Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let Self(x) = *self;

        if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e7 {
            write!(f, "{x:.1}")
        } else {
            write!(f, "{x}")
        }
    }
}

/// A distribution could not be constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum DistributionError {
    /// The name does not identify any known distribution.
    Unsupported(String),

    /// Wrong number of parameters.
    Arity(DistributionKind),

    /// A parameter falls outside of its permitted range.
    Range {
        kind: DistributionKind,
        constraint: Constraint,
        value: f64,
    },

    /// The bounds of a uniform distribution are reversed.
    Order { min: f64, max: f64 },
}

impl Display for DistributionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use DistributionError::*;

        match self {
            Unsupported(name) => {
                write!(f, "Distribution '{name}' is not supported")
            }
            Arity(kind) if kind.is_combination() => write!(
                f,
                "Expected exactly zero parameters, for combination distributions"
            ),
            Arity(kind) => {
                let params = kind.params();
                let count = match params.len() {
                    1 => "one parameter",
                    2 => "two parameters",
                    _ => "zero parameters",
                };

                write!(
                    f,
                    "Expected exactly {count} ({}), for {kind} distribution",
                    params.join(", "),
                )
            }
            Range {
                kind,
                constraint,
                value,
            } => write!(
                f,
                "{} is not in valid range '{constraint}', for {kind} distribution",
                Num(*value),
            ),
            Order { min, max } => write!(
                f,
                "({}, {}) does not meet requirement 'min <= max', \
                   for Uniform distribution",
                Num(*min),
                Num(*max),
            ),
        }
    }
}

impl Error for DistributionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}
