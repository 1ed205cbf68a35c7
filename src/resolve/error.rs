// Resolution errors
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

//! Errors produced while resolving a syntax tree into a [`Model`].
//!
//! [`Model`]: crate::model::Model

use std::{
    error::Error,
    fmt::{self, Display},
};

use crate::{
    diagnose::{Annotate, AnnotatedSpan, Diagnostic},
    span::Span,
};

/// Terminal failure of resolution.
///
/// By the time this error is returned,
///   every problem has already been recorded in the
///   [`Diagnostics`](crate::diagnose::Diagnostics) provided by the caller;
///     this error only summarizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// One or more error-level diagnostics were recorded.
    SemanticErrors(usize),
}

impl Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::SemanticErrors(_) => write!(f, "There were semantic errors"),
        }
    }
}

impl Error for CompileError {}

/// An error lowering a step expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// A field name could not be found in the effective field set of the
    ///   asset in context.
    ///
    /// If a variable of the same name is visible,
    ///   it is provided as a hint along with the position of its
    ///   declaration.
    FieldNotDefined {
        span: Span,
        field: String,
        asset: String,
        variable: Option<Span>,
    },

    /// A called variable could not be found in the effective variable set
    ///   of the asset in context.
    ///
    /// If a field of the same name is visible,
    ///   its position is provided as a hint.
    VariableNotDefined {
        span: Span,
        variable: String,
        asset: String,
        field: Option<Span>,
    },

    /// A variable refers to itself,
    ///   either directly or through other variables.
    ///
    /// The path begins and ends with the same variable.
    VariableCycle {
        span: Span,
        variable: String,
        path: Vec<String>,
    },

    /// A type filter names an asset that does not exist.
    AssetNotDefined { span: Span, asset: String },

    /// A type filter names an asset unrelated to the filtered type.
    NotSubType {
        span: Span,
        target: String,
        filter: String,
    },

    /// A transitive expression does not lead back to the type it starts
    ///   from.
    NotTransitive {
        span: Span,
        prev: String,
        target: String,
    },

    /// Operands of a set operation share no super-asset.
    NoCommonAncestor { span: Span, lhs: String, rhs: String },

    /// A reaches expression does not end in an attack step.
    NotAttackStep(Span),

    /// The final name of a reaches expression is neither an attack step
    ///   nor a field of the asset in context.
    StepNotDefined {
        span: Span,
        step: String,
        asset: String,
    },
}

impl ExprError {
    pub fn span(&self) -> &Span {
        use ExprError::*;

        match self {
            FieldNotDefined { span, .. }
            | VariableNotDefined { span, .. }
            | VariableCycle { span, .. }
            | AssetNotDefined { span, .. }
            | NotSubType { span, .. }
            | NotTransitive { span, .. }
            | NoCommonAncestor { span, .. }
            | NotAttackStep(span)
            | StepNotDefined { span, .. } => span,
        }
    }
}

impl Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ExprError::*;

        match self {
            FieldNotDefined {
                field,
                asset,
                variable,
                ..
            } => {
                write!(f, "Field '{field}' not defined for asset '{asset}'")?;

                match variable {
                    Some(at) => write!(
                        f,
                        ", did you mean the variable '{field}()' defined at {at}"
                    ),
                    None => Ok(()),
                }
            }

            VariableNotDefined {
                variable,
                asset,
                field,
                ..
            } => {
                write!(
                    f,
                    "Variable '{variable}' not defined for asset '{asset}'"
                )?;

                match field {
                    Some(at) => write!(
                        f,
                        ", did you mean the field '{variable}' defined at {at}"
                    ),
                    None => Ok(()),
                }
            }

            VariableCycle { variable, path, .. } => write!(
                f,
                "Variable '{variable}' contains cycle '{}'",
                path.join(" -> ")
            ),

            AssetNotDefined { asset, .. } => {
                write!(f, "Asset '{asset}' not defined")
            }

            NotSubType { target, filter, .. } => {
                write!(f, "Asset '{target}' cannot be of type '{filter}'")
            }

            NotTransitive { prev, target, .. } => {
                write!(f, "Previous asset '{prev}' is not of type '{target}'")
            }

            NoCommonAncestor { lhs, rhs, .. } => {
                write!(f, "Types '{lhs}' and '{rhs}' have no common ancestor")
            }

            NotAttackStep(_) => write!(f, "Last step is not attack step"),

            StepNotDefined { step, asset, .. } => write!(
                f,
                "Attack step '{step}' not defined for asset '{asset}'"
            ),
        }
    }
}

impl Error for ExprError {}

impl Diagnostic for ExprError {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        vec![self.span().error(self.to_string())]
    }
}
