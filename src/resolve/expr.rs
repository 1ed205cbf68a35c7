// Step expression lowering
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

//! Lowering of syntactic step expressions into typed [`StepExpr`]s.
//!
//! Every expression is lowered relative to a _context_ asset:
//!   the asset from which navigation begins.
//! Names are looked up in the effective sets of the context,
//!   and each node's target becomes the context of its successor.
//!
//! Lowering returns [`None`] after reporting an error;
//!   the caller abandons the enclosing expression without reporting
//!   again.
//! Operands of set operators are both lowered even if the first fails so
//!   that independent mistakes are reported together.
//!
//! Variables
//! =========
//! A variable is lowered once,
//!   in the asset that declares it,
//!   the first time it is needed;
//!     every call site then carries a copy of the memoized body.
//! A variable that is needed while it is itself being lowered refers to
//!   itself and is reported as a cycle,
//!     at the declaration of the variable that starts the cycle.

use fxhash::FxHashMap;

use super::{error::ExprError, names::Names};
use crate::{
    ast::{self, Expr},
    diagnose::Diagnostics,
    model::{AssetId, Model, StepExpr, StepExprKind},
    span::Span,
};

/// Key of a variable:
///   its declaring asset and name.
pub(super) type VarKey = (AssetId, String);

enum VarState {
    /// Currently being lowered;
    ///   encountering this state again indicates a cycle.
    Lowering,
    Lowered(Option<StepExpr>),
}

pub(super) struct Lowering<'m, 'a> {
    model: &'m Model,
    names: &'m Names<'a>,
    vars: FxHashMap<VarKey, VarState>,

    /// Names of the variables currently being lowered and the spans of
    ///   their declarations,
    ///     outermost first.
    stack: Vec<(String, Span)>,
}

impl<'m, 'a> Lowering<'m, 'a> {
    pub fn new(model: &'m Model, names: &'m Names<'a>) -> Self {
        Self {
            model,
            names,
            vars: FxHashMap::default(),
            stack: Vec::new(),
        }
    }

    /// Lower the body of the variable `name` declared by `asset`,
    ///   or retrieve it if it has already been lowered.
    pub fn variable(
        &mut self,
        asset: AssetId,
        var: &ast::Variable,
        diagnostics: &mut Diagnostics,
    ) -> Option<StepExpr> {
        let key = (asset, var.name.name.clone());

        match self.vars.get(&key) {
            Some(VarState::Lowered(body)) => return body.clone(),
            Some(VarState::Lowering) => return None,
            None => (),
        }

        self.vars.insert(key.clone(), VarState::Lowering);
        self.stack
            .push((var.name.name.clone(), var.name.span.clone()));

        let body = self.expr(&var.expr, asset, diagnostics);

        self.stack.pop();
        self.vars.insert(key, VarState::Lowered(body.clone()));

        body
    }

    /// Lower an expression yielding a set of assets.
    pub fn expr(
        &mut self,
        expr: &Expr,
        ctx: AssetId,
        diagnostics: &mut Diagnostics,
    ) -> Option<StepExpr> {
        let result = self.lower(expr, ctx, diagnostics);

        #[cfg(feature = "resolve-trace")]
        if let Some(lowered) = &result {
            tracing::trace!(
                context = self.model.asset(ctx).name(),
                expr = %lowered.display(self.model),
                "lowered expression",
            );
        }

        result
    }

    fn lower(
        &mut self,
        expr: &Expr,
        ctx: AssetId,
        diagnostics: &mut Diagnostics,
    ) -> Option<StepExpr> {
        let model = self.model;

        match expr {
            Expr::Id(ident) => self.field(ident, ctx, diagnostics),
            Expr::Call(ident) => self.call(ident, ctx, diagnostics),

            Expr::Collect(_, lhs, rhs) => {
                let lhs = self.expr(lhs, ctx, diagnostics)?;
                let rhs = self.expr(rhs, lhs.sub_target, diagnostics)?;

                Some(collect(ctx, lhs, rhs))
            }

            Expr::Transitive(span, inner) => {
                let inner = self.expr(inner, ctx, diagnostics)?;

                if !model.is_subtype(ctx, inner.target) {
                    report(
                        diagnostics,
                        ExprError::NotTransitive {
                            span: span.clone(),
                            prev: model.asset(ctx).name().into(),
                            target: model.asset(inner.target).name().into(),
                        },
                    );
                    return None;
                }

                let (target, sub_target) = (inner.target, inner.sub_target);
                Some(StepExpr::new(
                    StepExprKind::Transitive(Box::new(inner)),
                    ctx,
                    ctx,
                    target,
                    sub_target,
                ))
            }

            Expr::SubType(span, inner, ty) => {
                let inner = self.expr(inner, ctx, diagnostics)?;

                let Some(sub) = model.asset_id(ty.as_str()) else {
                    report(
                        diagnostics,
                        ExprError::AssetNotDefined {
                            span: ty.span.clone(),
                            asset: ty.name.clone(),
                        },
                    );
                    return None;
                };

                if model.least_upper_bound(sub, inner.target).is_none() {
                    report(
                        diagnostics,
                        ExprError::NotSubType {
                            span: span.clone(),
                            target: model.asset(inner.target).name().into(),
                            filter: ty.name.clone(),
                        },
                    );
                    return None;
                }

                let (src, sub_src, target) =
                    (inner.src, inner.sub_src, inner.sub_target);
                Some(StepExpr::new(
                    StepExprKind::SubType(Box::new(inner)),
                    src,
                    sub_src,
                    target,
                    sub,
                ))
            }

            Expr::Union(span, lhs, rhs)
            | Expr::Intersection(span, lhs, rhs)
            | Expr::Difference(span, lhs, rhs) => {
                let lhs = self.expr(lhs, ctx, diagnostics);
                let rhs = self.expr(rhs, ctx, diagnostics);
                let (lhs, rhs) = (lhs?, rhs?);

                let Some(lub) =
                    model.least_upper_bound(lhs.sub_target, rhs.sub_target)
                else {
                    report(
                        diagnostics,
                        ExprError::NoCommonAncestor {
                            span: span.clone(),
                            lhs: model.asset(lhs.sub_target).name().into(),
                            rhs: model.asset(rhs.sub_target).name().into(),
                        },
                    );
                    return None;
                };

                let (lhs, rhs) = (Box::new(lhs), Box::new(rhs));
                let kind = match expr {
                    Expr::Union(..) => StepExprKind::Union(lhs, rhs),
                    Expr::Intersection(..) => {
                        StepExprKind::Intersection(lhs, rhs)
                    }
                    _ => StepExprKind::Difference(lhs, rhs),
                };

                Some(StepExpr::new(kind, ctx, ctx, lub, lub))
            }
        }
    }

    /// Lower an expression that must end in an attack step.
    pub fn reaches(
        &mut self,
        expr: &Expr,
        ctx: AssetId,
        diagnostics: &mut Diagnostics,
    ) -> Option<StepExpr> {
        let model = self.model;

        match expr {
            Expr::Id(ident) => {
                let name = ident.as_str();

                if let Some(step) = model.effective_step(ctx, name) {
                    let asset = model.step(step).asset();

                    return Some(StepExpr::new(
                        StepExprKind::AttackStep(step),
                        asset,
                        ctx,
                        asset,
                        ctx,
                    ));
                }

                let err = match model.effective_field(ctx, name) {
                    Some(_) => ExprError::NotAttackStep(ident.span.clone()),
                    None => ExprError::StepNotDefined {
                        span: ident.span.clone(),
                        step: name.into(),
                        asset: model.asset(ctx).name().into(),
                    },
                };

                report(diagnostics, err);
                None
            }

            Expr::Collect(_, lhs, rhs) => {
                let lhs = self.expr(lhs, ctx, diagnostics)?;
                let rhs = self.reaches(rhs, lhs.sub_target, diagnostics)?;

                Some(collect(ctx, lhs, rhs))
            }

            _ => {
                report(diagnostics, ExprError::NotAttackStep(expr.span().clone()));
                None
            }
        }
    }

    fn field(
        &mut self,
        ident: &ast::Ident,
        ctx: AssetId,
        diagnostics: &mut Diagnostics,
    ) -> Option<StepExpr> {
        let model = self.model;

        match model.effective_field(ctx, ident.as_str()) {
            Some(id) => {
                let field = model.field(id);

                Some(StepExpr::new(
                    StepExprKind::Field(id),
                    field.asset(),
                    ctx,
                    field.target(),
                    field.target(),
                ))
            }
            None => {
                let variable = self
                    .names
                    .effective_variable(model, ctx, ident.as_str())
                    .map(|(_, var)| var.name.span.clone());

                report(
                    diagnostics,
                    ExprError::FieldNotDefined {
                        span: ident.span.clone(),
                        field: ident.name.clone(),
                        asset: model.asset(ctx).name().into(),
                        variable,
                    },
                );
                None
            }
        }
    }

    fn call(
        &mut self,
        ident: &ast::Ident,
        ctx: AssetId,
        diagnostics: &mut Diagnostics,
    ) -> Option<StepExpr> {
        let model = self.model;
        let name = ident.as_str();

        let Some((asset, var)) = self.names.effective_variable(model, ctx, name)
        else {
            let field = model
                .effective_field(ctx, name)
                .map(|id| model.field(id).span().clone());

            report(
                diagnostics,
                ExprError::VariableNotDefined {
                    span: ident.span.clone(),
                    variable: name.into(),
                    asset: model.asset(ctx).name().into(),
                    field,
                },
            );
            return None;
        };

        if let Some(VarState::Lowering) = self.vars.get(&(asset, name.into())) {
            let start = self
                .stack
                .iter()
                .rposition(|(v, _)| v == name)
                .unwrap_or(0);

            let cycle = &self.stack[start..];
            let span = cycle
                .first()
                .map_or_else(|| ident.span.clone(), |(_, span)| span.clone());

            let mut path = cycle.iter().map(|(v, _)| v.clone()).collect::<Vec<_>>();
            path.push(name.into());

            report(
                diagnostics,
                ExprError::VariableCycle {
                    span,
                    variable: name.into(),
                    path,
                },
            );
            return None;
        }

        let body = self.variable(asset, var, diagnostics)?;
        let (src, target, sub_target) = (body.src, body.target, body.sub_target);

        Some(StepExpr::new(
            StepExprKind::Call {
                name: name.into(),
                asset,
                reverse: false,
                body: Box::new(body),
            },
            src,
            ctx,
            target,
            sub_target,
        ))
    }
}

fn collect(ctx: AssetId, lhs: StepExpr, rhs: StepExpr) -> StepExpr {
    let (target, sub_target) = (rhs.target, rhs.sub_target);

    StepExpr::new(
        StepExprKind::Collect(Box::new(lhs), Box::new(rhs)),
        ctx,
        ctx,
        target,
        sub_target,
    )
}

fn report(diagnostics: &mut Diagnostics, err: ExprError) {
    diagnostics.report_diagnostic(&err);
}

#[cfg(test)]
mod test;
