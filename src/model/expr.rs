// Resolved step expressions
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

//! Typed step expressions.
//!
//! A [`StepExpr`] is a navigation through the asset graph annotated with
//!   four asset endpoints:
//!
//!   - `sub_src` is the asset the expression is evaluated from;
//!   - `src` is the asset on which the first element is declared,
//!       which may be a super-asset of `sub_src`;
//!   - `target` is the declared type of the result; and
//!   - `sub_target` is the type the result is narrowed to.
//!
//! `sub_target` differs from `target` only when a `[T]` type filter
//!   narrows the result;
//!     the filter itself is not a node of the tree.
//!
//! Every expression can be [reversed](StepExpr::reverse),
//!   which is how incoming edges
//!     ([`AttackStep::parent_steps`](super::AttackStep::parent_steps))
//!   and reverse variables are derived.

use std::fmt::{self, Display};

use super::{AssetId, FieldId, Model, StepId};

#[derive(Debug, Clone, PartialEq)]
pub struct StepExpr {
    pub(crate) src: AssetId,
    pub(crate) sub_src: AssetId,
    pub(crate) target: AssetId,
    pub(crate) sub_target: AssetId,
    pub(crate) kind: StepExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepExprKind {
    /// Navigate an association.
    Field(FieldId),
    /// `l.r`
    Collect(Box<StepExpr>, Box<StepExpr>),
    /// `(e)*`
    Transitive(Box<StepExpr>),
    /// `l \/ r`
    Union(Box<StepExpr>, Box<StepExpr>),
    /// `l /\ r`
    Intersection(Box<StepExpr>, Box<StepExpr>),
    /// `l - r`
    Difference(Box<StepExpr>, Box<StepExpr>),
    /// `e[T]`,
    ///   where `T` is the `sub_target` of this node.
    SubType(Box<StepExpr>),
    /// Reference to an attack step of the asset in context.
    AttackStep(StepId),
    /// Use of a variable,
    ///   carrying a copy of its resolved body.
    Call {
        name: String,
        /// Asset declaring the variable.
        asset: AssetId,
        /// Whether this is a use of the reverse form of the variable.
        reverse: bool,
        body: Box<StepExpr>,
    },
}

impl StepExpr {
    pub(crate) fn new(
        kind: StepExprKind,
        src: AssetId,
        sub_src: AssetId,
        target: AssetId,
        sub_target: AssetId,
    ) -> Self {
        Self {
            src,
            sub_src,
            target,
            sub_target,
            kind,
        }
    }

    pub fn kind(&self) -> &StepExprKind {
        &self.kind
    }

    pub fn src(&self) -> AssetId {
        self.src
    }

    pub fn sub_src(&self) -> AssetId {
        self.sub_src
    }

    pub fn target(&self) -> AssetId {
        self.target
    }

    pub fn sub_target(&self) -> AssetId {
        self.sub_target
    }

    /// Attack step at the end of the expression,
    ///   if any.
    pub fn target_step(&self) -> Option<StepId> {
        match &self.kind {
            StepExprKind::AttackStep(step) => Some(*step),
            StepExprKind::Collect(_, rhs) => rhs.target_step(),
            _ => None,
        }
    }

    /// Expression navigating from the `sub_target` of this expression
    ///   back to its `sub_src`.
    ///
    /// Reversal is an involution on expressions that do not reference
    ///   attack steps.
    /// A bare attack step reference reverses to itself with its endpoints
    ///   swapped;
    ///     use [`Self::reverse_reaches`] for reaches.
    pub fn reverse(&self, model: &Model) -> Self {
        self.reversed(model, None)
    }

    fn reversed(&self, model: &Model, src: Option<AssetId>) -> Self {
        use StepExprKind::*;

        let rev = |e: &StepExpr, src| Box::new(e.reversed(model, src));
        let narrowed = Some(self.sub_target);

        let kind = match &self.kind {
            Field(field) => Field(model.field(*field).reverse),
            Collect(lhs, rhs) => Collect(rev(rhs, None), rev(lhs, None)),
            Transitive(inner) => Transitive(rev(inner, None)),
            Union(lhs, rhs) => Union(rev(rhs, narrowed), rev(lhs, narrowed)),
            Intersection(lhs, rhs) => {
                Intersection(rev(rhs, narrowed), rev(lhs, narrowed))
            }
            Difference(lhs, rhs) => {
                Difference(rev(rhs, narrowed), rev(lhs, narrowed))
            }

            // The filter is absorbed into the endpoints of the reversed
            //   inner expression,
            //     which now starts from the narrowed type.
            SubType(inner) => {
                let mut reversed = inner.reversed(model, src);
                reversed.sub_src = self.sub_target;
                return reversed;
            }

            AttackStep(step) => AttackStep(*step),
            Call {
                name,
                asset,
                reverse,
                body,
            } => Call {
                name: name.clone(),
                asset: *asset,
                reverse: !reverse,
                body: rev(body, None),
            },
        };

        let default_src = match &self.kind {
            Transitive(_) | Call { .. } => self.sub_target,
            _ => self.target,
        };

        Self {
            src: src.unwrap_or(default_src),
            sub_src: self.sub_target,
            target: self.src,
            sub_target: self.sub_src,
            kind,
        }
    }

    /// Derive the parent step expression for a reaches expression of the
    ///   attack step `origin`.
    ///
    /// The result is evaluated from the asset of the reached step and
    ///   leads back to `origin`.
    /// Returns [`None`] if this expression does not end in an attack
    ///   step.
    pub fn reverse_reaches(&self, model: &Model, origin: StepId) -> Option<Self> {
        let origin_asset = model.step(origin).asset;
        let (path, terminal) = self.split_terminal()?;

        let origin_ref = |context| {
            Self::new(
                StepExprKind::AttackStep(origin),
                origin_asset,
                context,
                origin_asset,
                context,
            )
        };

        Some(match path {
            None => origin_ref(terminal.sub_src),
            Some(path) => {
                let reversed = path.reverse(model);
                let context = reversed.sub_target;
                let step = origin_ref(context);

                Self::new(
                    StepExprKind::Collect(Box::new(reversed), Box::new(step)),
                    terminal.sub_src,
                    terminal.sub_src,
                    origin_asset,
                    context,
                )
            }
        })
    }

    /// Split an expression into the navigation leading to its terminal
    ///   attack step and that step.
    fn split_terminal(&self) -> Option<(Option<Self>, &Self)> {
        match &self.kind {
            StepExprKind::AttackStep(_) => Some((None, self)),
            StepExprKind::Collect(lhs, rhs) => {
                let (rest, terminal) = rhs.split_terminal()?;

                let path = match rest {
                    None => (**lhs).clone(),
                    Some(rest) => Self::new(
                        StepExprKind::Collect(lhs.clone(), Box::new(rest.clone())),
                        self.src,
                        self.sub_src,
                        rest.target,
                        rest.sub_target,
                    ),
                };

                Some((Some(path), terminal))
            }
            _ => None,
        }
    }

    /// Invoke `f` for every field navigated by this expression,
    ///   including those within variable bodies.
    pub fn for_each_field<F: FnMut(FieldId)>(&self, f: &mut F) {
        use StepExprKind::*;

        match &self.kind {
            Field(field) => f(*field),
            Collect(lhs, rhs)
            | Union(lhs, rhs)
            | Intersection(lhs, rhs)
            | Difference(lhs, rhs) => {
                lhs.for_each_field(f);
                rhs.for_each_field(f);
            }
            Transitive(inner) | SubType(inner) => inner.for_each_field(f),
            Call { body, .. } => body.for_each_field(f),
            AttackStep(_) => (),
        }
    }

    /// Invoke `f` with the declaring asset and name of every variable
    ///   called by this expression,
    ///     including calls made from within the bodies of called
    ///     variables.
    pub fn for_each_call<F: FnMut(AssetId, &str)>(&self, f: &mut F) {
        use StepExprKind::*;

        match &self.kind {
            Collect(lhs, rhs)
            | Union(lhs, rhs)
            | Intersection(lhs, rhs)
            | Difference(lhs, rhs) => {
                lhs.for_each_call(f);
                rhs.for_each_call(f);
            }
            Transitive(inner) | SubType(inner) => inner.for_each_call(f),
            Call {
                name, asset, body, ..
            } => {
                f(*asset, name);
                body.for_each_call(f);
            }
            Field(_) | AttackStep(_) => (),
        }
    }

    pub fn display<'a>(&'a self, model: &'a Model) -> ExprDisplay<'a> {
        ExprDisplay { model, expr: self }
    }
}

/// Renders a [`StepExpr`] in MAL surface syntax.
///
/// See [`StepExpr::display`].
pub struct ExprDisplay<'a> {
    model: &'a Model,
    expr: &'a StepExpr,
}

impl<'a> ExprDisplay<'a> {
    fn of(&self, expr: &'a StepExpr) -> Self {
        Self {
            model: self.model,
            expr,
        }
    }
}

impl<'a> Display for ExprDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use StepExprKind::*;

        let model = self.model;

        match &self.expr.kind {
            Field(field) => write!(f, "{}", model.field(*field).name),
            Collect(lhs, rhs) => write!(f, "{}.{}", self.of(lhs), self.of(rhs)),
            Transitive(inner) => write!(f, "({})*", self.of(inner)),
            Union(lhs, rhs) => {
                write!(f, "({} \\/ {})", self.of(lhs), self.of(rhs))
            }
            Intersection(lhs, rhs) => {
                write!(f, "({} /\\ {})", self.of(lhs), self.of(rhs))
            }
            Difference(lhs, rhs) => {
                write!(f, "({} - {})", self.of(lhs), self.of(rhs))
            }
            SubType(inner) => write!(
                f,
                "{}[{}]",
                self.of(inner),
                model.asset(self.expr.sub_target).name
            ),
            AttackStep(step) => write!(f, "{}", model.step(*step).name),
            Call { name, reverse, .. } => match reverse {
                true => {
                    write!(f, "{}{name}()", crate::global::REVERSE_PREFIX)
                }
                false => write!(f, "{name}()"),
            },
        }
    }
}
