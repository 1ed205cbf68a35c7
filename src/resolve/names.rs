// Name resolution
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

//! Declaration of every named entity of the model.
//!
//! This phase populates the [`Model`] arena with categories,
//!   assets,
//!   attack steps,
//!   and associations,
//!     reporting duplicates,
//!     dangling references,
//!     and inheritance problems along the way.
//! Step expressions are not touched;
//!   see [`super::expr`].
//!
//! Checks run in a fixed order and report in that order.
//! Resolution cannot continue past a dangling `extends` or an inheritance
//!   cycle,
//!     since every later check depends on a total super-before-sub order
//!     of assets;
//!       [`resolve_names`] returns [`None`] in that case.
//!
//! An entity that fails a check is not declared.
//! Later references to it are reported as undefined,
//!   which matches what the author would see after deleting the offending
//!   declaration.

use fxhash::FxHashMap;

use super::inherit::Hierarchy;
use crate::{
    ast::{self, AttackStepType, Ast, MetaKey, MultiplicityUnit},
    diagnose::Diagnostics,
    global,
    model::{
        AssetId, AttackStep, AttackStepKind, CategoryId, Cia, FieldDecl, Meta,
        Model, Multiplicity, NameTable, StepId,
    },
    span::Span,
};

/// Declarations backing the entities of a [`Model`].
///
/// Later phases need the syntax of each asset and attack step
///   (expressions, TTC, variables),
///   which the model does not retain.
pub(super) struct Names<'a> {
    /// Assets in super-before-sub order.
    pub order: Vec<AssetId>,

    /// Indexed by [`AssetId`].
    assets: Vec<&'a ast::Asset>,

    /// Indexed by [`StepId`].
    steps: Vec<&'a ast::AttackStep>,

    /// Variables declared by each asset,
    ///   indexed by [`AssetId`].
    variables: Vec<NameTable<&'a ast::Variable>>,
}

impl<'a> Names<'a> {
    pub fn step(&self, id: StepId) -> &'a ast::AttackStep {
        self.steps[id.index()]
    }

    /// Variables declared by the given asset,
    ///   excluding any rejected as duplicates.
    pub fn variables(
        &self,
        asset: AssetId,
    ) -> impl Iterator<Item = &'a ast::Variable> + '_ {
        self.variables[asset.index()].values().copied()
    }

    /// Variable visible from `asset` along with the asset declaring it.
    pub fn effective_variable(
        &self,
        model: &Model,
        asset: AssetId,
        name: &str,
    ) -> Option<(AssetId, &'a ast::Variable)> {
        model.super_chain(asset).find_map(|a| {
            self.variables[a.index()].get(name).map(|&var| (a, var))
        })
    }
}

/// Declare every named entity of `ast` in `model`.
///
/// Returns [`None`] if the inheritance hierarchy is broken,
///   in which case no attack steps,
///   fields,
///   or variables have been declared.
pub(super) fn resolve_names<'a>(
    ast: &'a Ast,
    model: &mut Model,
    diagnostics: &mut Diagnostics,
) -> Option<Names<'a>> {
    #[cfg(feature = "resolve-trace")]
    let _span = tracing::debug_span!("names").entered();

    check_defines(ast, model, diagnostics);

    let categories = merge_categories(ast, model, diagnostics);
    let assets = declare_assets(ast, &categories, model, diagnostics);
    check_metadata(ast, &categories, &assets, model, diagnostics);

    if !link_super_assets(&assets, model, diagnostics) {
        return None;
    }

    let hierarchy = Hierarchy::build(model);
    if hierarchy.has_cycles() {
        report_cycles(&hierarchy, model, diagnostics);
        return None;
    }

    check_abstract(model, diagnostics);

    let mut names = Names {
        order: hierarchy.order,
        variables: assets.iter().map(|_| NameTable::default()).collect(),
        assets,
        steps: Vec::new(),
    };

    declare_steps(&mut names, model, diagnostics);

    let links = check_associations(ast, model, diagnostics);
    declare_fields(links, &names.order, model, diagnostics);

    declare_variables(&mut names, model, diagnostics);

    tracing::debug!(
        assets = model.assets.len(),
        steps = model.steps.len(),
        links = model.links.len(),
        "declared names",
    );

    Some(names)
}

fn check_defines(ast: &Ast, model: &mut Model, diagnostics: &mut Diagnostics) {
    let mut seen = FxHashMap::<&str, &ast::Define>::default();

    for define in &ast.defines {
        let key = define.key.as_str();

        match seen.get(key) {
            Some(prev) => diagnostics.error(
                &define.span,
                format!("Define '{key}' previously defined at {}", prev.span),
            ),
            None => {
                seen.insert(key, define);
                model.add_define(key, &define.value);
            }
        }
    }

    for key in global::REQUIRED_DEFINES {
        if !seen.contains_key(key) {
            diagnostics
                .error_global(format!("Missing required define '#{key}: \"\"'"));
        }
    }

    if let Some(id) = seen.get(global::DEFINE_ID) {
        if id.value.trim().is_empty() {
            diagnostics.error(
                &id.span,
                format!("Define '{}' cannot be empty", global::DEFINE_ID),
            );
        }
    }

    if let Some(version) = seen.get(global::DEFINE_VERSION) {
        if !is_plain_semver(&version.value) {
            diagnostics.error(
                &version.span,
                format!(
                    "Define '{}' must be valid semantic versioning without \
                        pre-release identifier and build metadata",
                    global::DEFINE_VERSION,
                ),
            );
        }
    }
}

/// `MAJOR.MINOR.PATCH` with no suffix.
fn is_plain_semver(version: &str) -> bool {
    let parts = version.split('.').collect::<Vec<_>>();

    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

/// Declare categories,
///   merging blocks of the same name.
///
/// Returns the category of each block of `ast`,
///   in order.
fn merge_categories(
    ast: &Ast,
    model: &mut Model,
    diagnostics: &mut Diagnostics,
) -> Vec<CategoryId> {
    let mut populated = FxHashMap::<CategoryId, bool>::default();

    let ids = ast
        .categories
        .iter()
        .map(|cat| {
            let id = model.add_category(cat.name.as_str(), &cat.name.span);
            let has_content = !cat.assets.is_empty() || !cat.meta.is_empty();
            *populated.entry(id).or_default() |= has_content;
            id
        })
        .collect();

    for (i, category) in model.categories().enumerate() {
        let id = CategoryId::from_index(i);

        if !populated.get(&id).copied().unwrap_or(false) {
            diagnostics.warning(
                category.span(),
                format!(
                    "Category '{}' contains no assets or metadata",
                    category.name()
                ),
            );
        }
    }

    ids
}

/// Declare assets in order,
///   rejecting duplicate names.
///
/// The returned declarations are indexed by [`AssetId`].
fn declare_assets<'a>(
    ast: &'a Ast,
    categories: &[CategoryId],
    model: &mut Model,
    diagnostics: &mut Diagnostics,
) -> Vec<&'a ast::Asset> {
    let mut decls = Vec::new();

    for (cat, &cat_id) in ast.categories.iter().zip(categories) {
        for asset in &cat.assets {
            let name = asset.name.as_str();

            match model.asset_by_name(name) {
                Some(prev) => diagnostics.error(
                    &asset.name.span,
                    format!(
                        "Asset '{name}' previously defined at {}",
                        prev.span()
                    ),
                ),
                None => {
                    model.add_asset(
                        name,
                        &asset.name.span,
                        asset.is_abstract,
                        cat_id,
                    );
                    decls.push(asset);
                }
            }
        }
    }

    decls
}

/// Report each metadata key given more than once,
///   returning the first value of every key.
fn check_meta<'m>(
    metas: impl IntoIterator<Item = &'m ast::Meta>,
    diagnostics: &mut Diagnostics,
) -> Meta {
    let mut seen = FxHashMap::<MetaKey, &Span>::default();
    let mut folded = Meta::default();

    for meta in metas {
        match seen.get(&meta.key) {
            Some(prev) => diagnostics.error(
                &meta.span,
                format!(
                    "Metadata '{}' previously defined at {prev}",
                    meta.key
                ),
            ),
            None => {
                seen.insert(meta.key, &meta.span);
                folded.set(meta.key, &meta.value);
            }
        }
    }

    folded
}

/// The first value of every metadata key.
pub(super) fn fold_meta<'m>(metas: impl IntoIterator<Item = &'m ast::Meta>) -> Meta {
    metas.into_iter().fold(Meta::default(), |mut folded, meta| {
        folded.set(meta.key, &meta.value);
        folded
    })
}

fn check_metadata(
    ast: &Ast,
    categories: &[CategoryId],
    assets: &[&ast::Asset],
    model: &mut Model,
    diagnostics: &mut Diagnostics,
) {
    for i in 0..model.categories.len() {
        let id = CategoryId::from_index(i);

        let metas = ast
            .categories
            .iter()
            .zip(categories)
            .filter(|(_, cat)| **cat == id)
            .flat_map(|(block, _)| &block.meta);

        model.category_mut(id).meta = check_meta(metas, diagnostics);
    }

    for (i, asset) in assets.iter().enumerate() {
        model.asset_mut(AssetId::from_index(i)).meta =
            check_meta(&asset.meta, diagnostics);

        for step in &asset.attack_steps {
            check_meta(&step.meta, diagnostics);
        }
    }

    for assoc in &ast.associations {
        check_meta(&assoc.meta, diagnostics);
    }
}

/// Resolve the `extends` clause of every asset.
///
/// Returns `false` if any super-asset does not exist.
fn link_super_assets(
    assets: &[&ast::Asset],
    model: &mut Model,
    diagnostics: &mut Diagnostics,
) -> bool {
    let mut linked = true;

    for (i, asset) in assets.iter().enumerate() {
        let Some(parent) = &asset.parent else {
            continue;
        };

        match model.asset_id(parent.as_str()) {
            Some(sup) => {
                model.asset_mut(AssetId::from_index(i)).super_asset = Some(sup)
            }
            None => {
                diagnostics
                    .error(&parent.span, format!("Asset '{parent}' not defined"));
                linked = false;
            }
        }
    }

    linked
}

/// One error per cycle member,
///   in declaration order,
///   each listing the cycle starting from that member.
fn report_cycles(
    hierarchy: &Hierarchy,
    model: &Model,
    diagnostics: &mut Diagnostics,
) {
    let mut members = hierarchy
        .cycles
        .iter()
        .flat_map(|cycle| (0..cycle.len()).map(move |start| (cycle, start)))
        .collect::<Vec<_>>();

    members.sort_by_key(|&(cycle, start)| cycle[start]);

    for (cycle, start) in members {
        let member = model.asset(cycle[start]);

        let path = cycle[start..]
            .iter()
            .chain(&cycle[..=start])
            .map(|&id| model.asset(id).name())
            .collect::<Vec<_>>()
            .join(" -> ");

        diagnostics.error(
            member.span(),
            format!(
                "Asset '{}' extends in loop '{path}'",
                member.name()
            ),
        );
    }
}

fn check_abstract(model: &Model, diagnostics: &mut Diagnostics) {
    for asset in model.assets().filter(|a| a.is_abstract()) {
        let extended = model
            .assets()
            .any(|sub| sub.super_asset() == Some(asset.id()));

        if !extended {
            diagnostics.warning(
                asset.span(),
                format!(
                    "Asset '{}' is abstract but never extended to",
                    asset.name()
                ),
            );
        }
    }
}

fn declare_steps<'a>(
    names: &mut Names<'a>,
    model: &mut Model,
    diagnostics: &mut Diagnostics,
) {
    for asset_id in names.order.clone() {
        let asset = names.assets[asset_id.index()];
        let asset_name = asset.name.as_str();

        for step in &asset.attack_steps {
            let name = step.name.as_str();

            if name.to_lowercase() == asset_name.to_lowercase() {
                diagnostics.error(
                    &step.name.span,
                    format!(
                        "Attack step '{name}' shares name with asset \
                            '{asset_name}' defined at {}",
                        asset.name.span,
                    ),
                );
            }

            if let Some(prev) = model.asset(asset_id).step(name) {
                diagnostics.error(
                    &step.name.span,
                    format!(
                        "Attack step '{name}' previously defined at {}",
                        model.step(prev).span()
                    ),
                );
                continue;
            }

            let overrides = model
                .asset(asset_id)
                .super_asset()
                .and_then(|sup| model.effective_step(sup, name));

            match (overrides, &step.reaches) {
                (Some(prev), _) => {
                    let prev_kind = names.steps[prev.index()].kind;

                    if prev_kind != step.kind {
                        diagnostics.error(
                            &step.name.span,
                            format!(
                                "Cannot override attack step '{name}' \
                                    previously defined at {} with different \
                                    type '{}' =/= '{prev_kind}'",
                                model.step(prev).span(),
                                step.kind,
                            ),
                        );
                        continue;
                    }
                }

                (None, Some(reaches)) if reaches.inherits => {
                    diagnostics.error(
                        &reaches.span,
                        format!(
                            "Cannot inherit attack step '{name}' without \
                                previous definition"
                        ),
                    );
                    continue;
                }

                (None, _) => (),
            }

            check_requires(step, diagnostics);

            model.add_step(AttackStep {
                id: StepId::from_index(0),
                name: name.into(),
                span: step.name.span.clone(),
                asset: asset_id,
                kind: step_kind(step),
                tags: step.tags.iter().map(|t| t.name.clone()).collect(),
                cia: step.cia.as_deref().map(fold_cia),
                ttc: None,
                meta: fold_meta(&step.meta),
                overrides,
                inherits_reaches: step
                    .reaches
                    .as_ref()
                    .map_or(false, |r| r.inherits),
                requires: Vec::new(),
                reaches: Vec::new(),
                parent_steps: Vec::new(),
            });

            names.steps.push(step);
        }
    }
}

/// Existence steps must have preconditions but no TTC,
///   and only they and defenses may have preconditions at all.
fn check_requires(step: &ast::AttackStep, diagnostics: &mut Diagnostics) {
    use AttackStepType::*;

    match (step.kind, &step.requires) {
        (Exist | NotExist, requires) => {
            if step.ttc.is_some() {
                diagnostics.error(
                    &step.span,
                    format!(
                        "Attack step of type '{}' must not have TTC",
                        step.kind
                    ),
                );
            }

            if requires.is_none() {
                diagnostics.error(
                    &step.span,
                    format!(
                        "Attack step of type '{}' must have require '<-'",
                        step.kind
                    ),
                );
            }
        }

        (Any | All, Some(requires)) => diagnostics.error(
            &requires.span,
            "Require '<-' may only be defined for attack step type \
                exist 'E', not-exist '!E' or defense '#'",
        ),

        (Any | All | Defense, _) => (),
    }
}

fn step_kind(step: &ast::AttackStep) -> AttackStepKind {
    match (step.kind, &step.requires) {
        (AttackStepType::Any, _) => AttackStepKind::Any,
        (AttackStepType::All, _) => AttackStepKind::All,
        (AttackStepType::Defense, None) => AttackStepKind::Defense,
        (AttackStepType::Defense, Some(_)) => AttackStepKind::ConditionalDefense,
        (AttackStepType::Exist, _) => AttackStepKind::Exist,
        (AttackStepType::NotExist, _) => AttackStepKind::NotExist,
    }
}

fn fold_cia(letters: &[ast::Cia]) -> Cia {
    letters.iter().fold(Cia::default(), |mut cia, letter| {
        match letter {
            ast::Cia::C => cia.confidentiality = true,
            ast::Cia::I => cia.integrity = true,
            ast::Cia::A => cia.availability = true,
        }
        cia
    })
}

/// Name of one side of an association.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Role {
    name: String,
    span: Span,
}

impl From<&ast::Ident> for Role {
    fn from(ident: &ast::Ident) -> Self {
        Self {
            name: ident.name.clone(),
            span: ident.span.clone(),
        }
    }
}

/// An association whose endpoints and multiplicities are valid but whose
///   fields have not yet been checked.
struct PendingLink<'a> {
    assoc: &'a ast::Association,
    left: AssetId,
    right: AssetId,
    left_mult: Multiplicity,
    right_mult: Multiplicity,
    /// Role of the left asset,
    ///   naming the field declared on the right asset.
    left_role: Role,
    /// Role of the right asset,
    ///   naming the field declared on the left asset.
    right_role: Role,
}

fn check_associations<'a>(
    ast: &'a Ast,
    model: &Model,
    diagnostics: &mut Diagnostics,
) -> Vec<PendingLink<'a>> {
    let mut seen = FxHashMap::<(String, String, String), Span>::default();
    let mut links = Vec::new();

    for assoc in &ast.associations {
        let left = model.asset_id(assoc.left_asset.as_str());
        if left.is_none() {
            diagnostics.error(
                &assoc.left_asset.span,
                format!("Left asset '{}' is not defined", assoc.left_asset),
            );
        }

        let right = model.asset_id(assoc.right_asset.as_str());
        if right.is_none() {
            diagnostics.error(
                &assoc.right_asset.span,
                format!("Right asset '{}' is not defined", assoc.right_asset),
            );
        }

        let left_mult = multiplicity(&assoc.left_mult, diagnostics);
        let right_mult = multiplicity(&assoc.right_mult, diagnostics);
        let (left_role, right_role) = roles(assoc);

        let key = (
            assoc.link.name.clone(),
            left_role.name.clone(),
            right_role.name.clone(),
        );

        if let Some(prev) = seen.get(&key) {
            diagnostics.error(
                &assoc.link.span,
                format!(
                    "Association '{}' with fields '{}' and '{}' previously \
                        defined at {prev}",
                    assoc.link, left_role.name, right_role.name,
                ),
            );
            continue;
        }
        seen.insert(key, assoc.link.span.clone());

        if let (Some(left), Some(right), Some(left_mult), Some(right_mult)) =
            (left, right, left_mult, right_mult)
        {
            links.push(PendingLink {
                assoc,
                left,
                right,
                left_mult,
                right_mult,
                left_role,
                right_role,
            });
        }
    }

    links
}

fn multiplicity(
    mult: &ast::Multiplicity,
    diagnostics: &mut Diagnostics,
) -> Option<Multiplicity> {
    use MultiplicityUnit::{Number, Star};

    match (mult.min, mult.max) {
        (Number(0), Some(Number(1))) => Some(Multiplicity::ZERO_OR_ONE),
        (Number(0), Some(Star)) | (Star, None) => {
            Some(Multiplicity::ZERO_OR_MORE)
        }
        (Number(1), Some(Number(1)) | None) => Some(Multiplicity::ONE),
        (Number(1), Some(Star)) => Some(Multiplicity::ONE_OR_MORE),
        _ => {
            diagnostics
                .error(&mult.span, format!("Invalid multiplicity '{mult}'"));
            None
        }
    }
}

/// Role names of an association,
///   generating any that were omitted.
///
/// An omitted role is named after the link and the opposite role.
/// If both are omitted,
///   the right role takes the name of the right asset.
fn roles(assoc: &ast::Association) -> (Role, Role) {
    let generated = |other: &str| Role {
        name: format!("{}{}{other}", global::REVERSE_PREFIX, assoc.link),
        span: assoc.span.clone(),
    };

    match (&assoc.left_field, &assoc.right_field) {
        (Some(left), Some(right)) => (left.into(), right.into()),
        (Some(left), None) => (left.into(), generated(&left.name)),
        (None, Some(right)) => (generated(&right.name), right.into()),
        (None, None) => {
            let right = Role {
                name: lower_first(assoc.right_asset.as_str()),
                span: assoc.span.clone(),
            };

            (generated(&right.name), right)
        }
    }
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Check the fields contributed by each association and declare the
///   associations whose fields are all valid.
fn declare_fields(
    links: Vec<PendingLink>,
    order: &[AssetId],
    model: &mut Model,
    diagnostics: &mut Diagnostics,
) {
    let mut declared = model
        .assets()
        .map(|_| FxHashMap::<String, Span>::default())
        .collect::<Vec<_>>();
    let mut rejected = vec![false; links.len()];

    for &asset in order {
        for (i, link) in links.iter().enumerate() {
            // A field is named by the role of the asset it leads to.
            let sides = [
                (link.left == asset).then_some(&link.right_role),
                (link.right == asset).then_some(&link.left_role),
            ];

            for role in sides.into_iter().flatten() {
                if let Some(step) = model.effective_step(asset, &role.name) {
                    diagnostics.error(
                        &role.span,
                        format!(
                            "Field '{}' previously defined as attack step at {}",
                            role.name,
                            model.step(step).span(),
                        ),
                    );
                    rejected[i] = true;
                    continue;
                }

                let prev = model
                    .super_chain(asset)
                    .find_map(|a| declared[a.index()].get(&role.name));

                match prev {
                    Some(prev) => {
                        diagnostics.error(
                            &role.span,
                            format!(
                                "Field {}.{} previously defined at {prev}",
                                model.asset(asset).name(),
                                role.name,
                            ),
                        );
                        rejected[i] = true;
                    }
                    None => {
                        declared[asset.index()]
                            .insert(role.name.clone(), role.span.clone());
                    }
                }
            }
        }
    }

    for (link, _) in links.into_iter().zip(rejected).filter(|(_, r)| !r) {
        let assoc = link.assoc;

        model.add_link(
            assoc.link.as_str(),
            &assoc.span,
            fold_meta(&assoc.meta),
            FieldDecl {
                name: link.right_role.name,
                span: link.right_role.span,
                asset: link.left,
                target: link.right,
                multiplicity: link.right_mult,
            },
            FieldDecl {
                name: link.left_role.name,
                span: link.left_role.span,
                asset: link.right,
                target: link.left,
                multiplicity: link.left_mult,
            },
        );
    }
}

fn declare_variables<'a>(
    names: &mut Names<'a>,
    model: &Model,
    diagnostics: &mut Diagnostics,
) {
    for asset in names.order.clone() {
        let decl = names.assets[asset.index()];

        for var in &decl.variables {
            let name = var.name.as_str();

            match names.effective_variable(model, asset, name) {
                Some((_, prev)) => diagnostics.error(
                    &var.name.span,
                    format!(
                        "Variable '{name}' previously defined at {}",
                        prev.name.span
                    ),
                ),
                None => names.variables[asset.index()].insert(name.into(), var),
            }
        }
    }
}
