// Resolution of a MAL syntax tree into a language model
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

//! Semantic analysis and assembly of a [`Model`].
//!
//! Resolution runs in phases,
//!   each of which depends on everything before it:
//!
//!   1. [Names](names):
//!        defines,
//!        categories,
//!        assets and their inheritance,
//!        attack steps,
//!        associations,
//!        and variables are declared and checked.
//!   2. [Expressions](expr):
//!        for each asset in super-before-sub order,
//!          its variables and then the `requires` and `reaches` of its
//!          attack steps are lowered into typed [`StepExpr`]s.
//!   3. Parent steps:
//!        every `reaches` is reversed onto the step it reaches.
//!        This happens only once every forward expression exists.
//!   4. [Validation](validate):
//!        CIA,
//!        TTC,
//!        and unused declarations.
//!
//! Every phase reports into the caller's [`Diagnostics`] and continues
//!   past errors where it can.
//! Only a broken inheritance hierarchy stops resolution early.
//! If any error was recorded by the end,
//!   the model is discarded and [`CompileError`] is returned.
//!
//! [`StepExpr`]: crate::model::StepExpr

mod error;
mod expr;
mod inherit;
mod names;
mod validate;

pub use error::{CompileError, ExprError};

use self::{expr::Lowering, names::Names};
use crate::{
    ast::Ast,
    diagnose::{Diagnostics, LineReporter, Reporter},
    global,
    model::{self, AssetId, Model, Variable},
};

/// Resolve `ast` into a [`Model`],
///   reporting every problem to `diagnostics`.
///
/// Warnings do not prevent a model from being produced.
pub fn resolve(
    ast: &Ast,
    diagnostics: &mut Diagnostics,
) -> Result<Model, CompileError> {
    #[cfg(feature = "resolve-trace")]
    let _span = tracing::debug_span!("resolve").entered();

    let mut model = Model::new();

    let Some(names) = names::resolve_names(ast, &mut model, diagnostics) else {
        return Err(fail(diagnostics));
    };

    assemble(&names, &mut model, diagnostics);
    derive_parent_steps(&names.order, &mut model);
    validate::validate(&names, &mut model, diagnostics);

    tracing::debug!(
        errors = diagnostics.error_count(),
        warnings = diagnostics.warning_count(),
        "resolution complete",
    );

    match diagnostics.has_errors() {
        true => Err(fail(diagnostics)),
        false => Ok(model),
    }
}

/// Resolve `ast`,
///   rendering all diagnostics to standard error.
///
/// This is the entry point used by the compiler frontend.
/// Diagnostics are rendered with [`LineReporter`] under the
///   [`global::ANALYZER_PHASE`] phase,
///     followed by a final error line if resolution failed.
pub fn compile(ast: &Ast) -> Result<Model, CompileError> {
    let mut diagnostics = Diagnostics::new(global::ANALYZER_PHASE);
    let result = resolve(ast, &mut diagnostics);

    let reporter = LineReporter::new();

    // Render into a single buffer so lines are not interleaved with
    //   other output.
    let mut out = reporter.render(&diagnostics).to_string();
    if let Err(e) = &result {
        out.push_str(&reporter.render_failure(diagnostics.phase(), e).to_string());
    }

    eprint!("{out}");

    result
}

fn fail(diagnostics: &Diagnostics) -> CompileError {
    CompileError::SemanticErrors(diagnostics.error_count())
}

/// Lower every variable and attack step expression into `model`.
fn assemble(names: &Names, model: &mut Model, diagnostics: &mut Diagnostics) {
    #[cfg(feature = "resolve-trace")]
    let _span = tracing::debug_span!("assemble").entered();

    let mut variables = Vec::new();
    let mut steps = Vec::new();

    let mut lowering = Lowering::new(model, names);

    for &asset in &names.order {
        for var in names.variables(asset) {
            if let Some(body) = lowering.variable(asset, var, diagnostics) {
                variables.push((asset, var, body));
            }
        }

        for step in model.asset(asset).steps() {
            let decl = names.step(step);
            let mut requires = Vec::new();
            let mut reaches = Vec::new();

            for expr in decl.requires.iter().flat_map(|r| &r.exprs) {
                requires.extend(lowering.expr(expr, asset, diagnostics));
            }

            for expr in decl.reaches.iter().flat_map(|r| &r.exprs) {
                reaches.extend(lowering.reaches(expr, asset, diagnostics));
            }

            steps.push((step, requires, reaches));
        }
    }

    tracing::debug!(
        variables = variables.len(),
        steps = steps.len(),
        "assembled expressions",
    );

    for (id, requires, reaches) in steps {
        let step = model.step_mut(id);
        step.requires = requires;
        step.reaches = reaches;
    }

    for (asset, var, body) in variables {
        declare_variable(model, asset, var, body);
    }
}

/// Declare a lowered variable and its reverse.
///
/// The reverse is declared on the asset its body leads to,
///   from which it navigates back to `asset`.
fn declare_variable(
    model: &mut Model,
    asset: AssetId,
    var: &crate::ast::Variable,
    body: model::StepExpr,
) {
    let name = var.name.name.clone();
    let reverse_key = model::call_name(model, &name, asset, true);
    let reverse_asset = body.sub_target();

    let reverse = Variable {
        name: name.clone(),
        asset,
        span: var.name.span.clone(),
        reverse: true,
        body: body.reverse(model),
    };

    model.asset_mut(asset).variables.insert(
        name.clone(),
        Variable {
            name,
            asset,
            span: var.name.span.clone(),
            reverse: false,
            body,
        },
    );

    model
        .asset_mut(reverse_asset)
        .reverse_variables
        .insert(reverse_key, reverse);
}

/// Derive the parent steps of every attack step from the reaches of all
///   others.
fn derive_parent_steps(order: &[AssetId], model: &mut Model) {
    let mut parents = Vec::new();

    for &asset in order {
        for origin in model.asset(asset).steps() {
            for reaches in model.step(origin).reaches() {
                let target = reaches.target_step();
                let parent = reaches.reverse_reaches(model, origin);

                if let (Some(target), Some(parent)) = (target, parent) {
                    parents.push((target, parent));
                }
            }
        }
    }

    tracing::debug!(parents = parents.len(), "derived parent steps");

    for (target, parent) in parents {
        model.step_mut(target).parent_steps.push(parent);
    }
}
