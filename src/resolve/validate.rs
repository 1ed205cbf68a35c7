// Model validation
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

//! Checks requiring the fully assembled model.
//!
//! This is the final phase of resolution.
//! Besides reporting,
//!   it resolves the TTC of each attack step into a
//!   [`model::TtcExpr`](TtcExpr),
//!     since whether a distribution is permitted depends on the kind of
//!     the step and on where the distribution appears within the
//!     expression.

use fixedbitset::FixedBitSet;
use fxhash::FxHashSet;

use super::{expr::VarKey, names::Names};
use crate::{
    ast::{self, AttackStepType},
    diagnose::Diagnostics,
    dist::{Distribution, DistributionKind},
    model::{Model, StepExpr, StepId, TtcExpr},
};

pub(super) fn validate(
    names: &Names,
    model: &mut Model,
    diagnostics: &mut Diagnostics,
) {
    #[cfg(feature = "resolve-trace")]
    let _span = tracing::debug_span!("validate").entered();

    check_cia(names, model, diagnostics);
    resolve_ttc(names, model, diagnostics);
    check_unused_variables(names, model, diagnostics);
    check_unused_associations(model, diagnostics);
}

/// Expressions evaluated by attack steps:
///   every `requires` and `reaches`.
///
/// Variable bodies are reachable only through the calls within these.
fn step_exprs(model: &Model) -> impl Iterator<Item = &StepExpr> {
    model
        .steps
        .iter()
        .flat_map(|step| step.requires().iter().chain(step.reaches()))
}

/// Every declared attack step with its declaration,
///   by asset in declaration order.
fn declared_steps<'n, 'a>(
    names: &'n Names<'a>,
    model: &'n Model,
) -> impl Iterator<Item = (StepId, &'a ast::AttackStep)> + 'n {
    model
        .assets()
        .flat_map(|asset| asset.steps())
        .map(move |id| (id, names.step(id)))
}

fn check_cia(names: &Names, model: &Model, diagnostics: &mut Diagnostics) {
    use AttackStepType::*;

    for (id, decl) in declared_steps(names, model) {
        let Some(letters) = &decl.cia else {
            continue;
        };

        if matches!(decl.kind, Defense | Exist | NotExist) {
            diagnostics.error(
                &decl.name.span,
                "Defenses cannot have CIA classifications",
            );
        }

        let mut seen = Vec::with_capacity(letters.len());

        for letter in letters {
            if seen.contains(letter) {
                let step = model.step(id);

                diagnostics.warning(
                    &decl.name.span,
                    format!(
                        "Attack step {}.{} contains duplicate classification {{{letter}}}",
                        model.asset(step.asset()).name(),
                        step.name(),
                    ),
                );
            } else {
                seen.push(*letter);
            }
        }
    }
}

fn resolve_ttc(names: &Names, model: &mut Model, diagnostics: &mut Diagnostics) {
    use AttackStepType::*;

    let mut resolved = Vec::new();

    for (id, decl) in declared_steps(names, model) {
        let Some(ttc) = &decl.ttc else {
            continue;
        };

        let lowered = match decl.kind {
            Defense => defense_ttc(model, id, decl, ttc, diagnostics),
            Any | All => attack_ttc(ttc, false, diagnostics),

            // Existence steps never have a TTC;
            //   this has already been reported.
            Exist | NotExist => None,
        };

        if let Some(lowered) = lowered {
            resolved.push((id, lowered));
        }
    }

    for (id, ttc) in resolved {
        model.step_mut(id).ttc = Some(ttc);
    }
}

/// A defense is either on,
///   off,
///   or on with some probability.
///
/// Anything but a single distribution is an advanced expression.
/// Of the distributions,
///   only those a defense may take are validated further;
///     every other name is rejected outright,
///       whether or not it is a known distribution.
fn defense_ttc(
    model: &Model,
    id: StepId,
    decl: &ast::AttackStep,
    ttc: &ast::TtcExpr,
    diagnostics: &mut Diagnostics,
) -> Option<TtcExpr> {
    let step = model.step(id);
    let qualified = format!("{}.{}", model.asset(step.asset()).name(), step.name());

    let ast::TtcExpr::Function(func) = ttc else {
        diagnostics.error(
            &decl.span,
            format!("Defense {qualified} may not have advanced TTC expressions"),
        );
        return None;
    };

    match DistributionKind::from_name(func.name.as_str()) {
        Some(kind) if kind.is_defense_compatible() => {
            distribution(func, diagnostics).map(TtcExpr::Distribution)
        }
        _ => {
            diagnostics.error(
                &decl.span,
                format!(
                    "Defense {qualified} may only have 'Enabled', 'Disabled', \
                        or 'Bernoulli(p)' as TTC"
                ),
            );
            None
        }
    }
}

/// Lower the TTC of an ANY or ALL step.
///
/// `restricted` is set beneath any subtraction,
///   division,
///   or exponentiation,
///     where Bernoulli trials are meaningless.
fn attack_ttc(
    expr: &ast::TtcExpr,
    restricted: bool,
    diagnostics: &mut Diagnostics,
) -> Option<TtcExpr> {
    use ast::TtcExpr as T;

    match expr {
        T::Add(lhs, rhs) => binary(lhs, rhs, restricted, TtcExpr::Add, diagnostics),
        T::Mul(lhs, rhs) => binary(lhs, rhs, restricted, TtcExpr::Mul, diagnostics),
        T::Sub(lhs, rhs) => binary(lhs, rhs, true, TtcExpr::Sub, diagnostics),
        T::Div(lhs, rhs) => binary(lhs, rhs, true, TtcExpr::Div, diagnostics),
        T::Pow(lhs, rhs) => binary(lhs, rhs, true, TtcExpr::Pow, diagnostics),

        T::Number(n) => Some(TtcExpr::Number(*n)),

        T::Function(func) => {
            let kind = DistributionKind::from_name(func.name.as_str());

            if kind.map_or(false, DistributionKind::is_toggle) {
                diagnostics.error(
                    &func.span,
                    "Distributions 'Enabled' or 'Disabled' may not be used as \
                        TTC values in '&' and '|' attack steps",
                );
                return None;
            }

            let permitted =
                !(restricted && kind.map_or(false, DistributionKind::is_bernoulli_family));

            if !permitted {
                diagnostics.error(
                    &func.span,
                    format!(
                        "TTC distribution '{}' is not available in subtraction, \
                            division or exponential expressions.",
                        func.name,
                    ),
                );
            }

            distribution(func, diagnostics)
                .filter(|_| permitted)
                .map(TtcExpr::Distribution)
        }
    }
}

fn binary(
    lhs: &ast::TtcExpr,
    rhs: &ast::TtcExpr,
    restricted: bool,
    op: fn(Box<TtcExpr>, Box<TtcExpr>) -> TtcExpr,
    diagnostics: &mut Diagnostics,
) -> Option<TtcExpr> {
    let lhs = attack_ttc(lhs, restricted, diagnostics);
    let rhs = attack_ttc(rhs, restricted, diagnostics);

    Some(op(Box::new(lhs?), Box::new(rhs?)))
}

fn distribution(
    func: &ast::TtcFunc,
    diagnostics: &mut Diagnostics,
) -> Option<Distribution> {
    Distribution::new(func.name.as_str(), &func.params)
        .map_err(|e| diagnostics.error(&func.span, e.to_string()))
        .ok()
}

/// A variable is used if some attack step calls it,
///   either directly or through the body of another variable that is
///   itself used.
fn check_unused_variables(
    names: &Names,
    model: &Model,
    diagnostics: &mut Diagnostics,
) {
    let mut used = FxHashSet::<VarKey>::default();

    for expr in step_exprs(model) {
        expr.for_each_call(&mut |asset, name| {
            used.insert((asset, name.into()));
        });
    }

    for asset in model.assets() {
        for var in names.variables(asset.id()) {
            let key = (asset.id(), var.name.name.clone());

            if !used.contains(&key) {
                diagnostics.warning(
                    &var.name.span,
                    format!("Variable '{}' is never used", var.name),
                );
            }
        }
    }
}

/// An association is used if either of its fields is navigated by an
///   attack step,
///     including through the bodies of the variables it calls.
fn check_unused_associations(model: &Model, diagnostics: &mut Diagnostics) {
    let mut used = FixedBitSet::with_capacity(model.fields.len());

    for expr in step_exprs(model) {
        expr.for_each_field(&mut |field| used.insert(field.index()));
    }

    for link in model.links() {
        if used.contains(link.left().index()) || used.contains(link.right().index()) {
            continue;
        }

        let (left, right) = (model.field(link.left()), model.field(link.right()));

        diagnostics.warning(
            link.span(),
            format!(
                "Association '{} [{}] <-- {} --> {} [{}]' is never used",
                model.asset(left.asset()).name(),
                right.name(),
                link.name(),
                model.asset(right.asset()).name(),
                left.name(),
            ),
        );
    }
}
