// Resolved MAL language model
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

//! Resolved language model.
//!
//! The [`Model`] is the output of [`crate::resolve`] and the input of the
//!   code generators.
//! It is an arena:
//!   every [`Category`],
//!   [`Asset`],
//!   [`AttackStep`],
//!   [`Field`],
//!   and [`Link`] is owned by the model and referenced everywhere else by
//!   a small [`Copy`] identifier
//!     ([`AssetId`],
//!     [`StepId`],
//!     etc.).
//! Super-assets,
//!   categories,
//!   reverse fields,
//!   and the attack steps referenced by step expressions are all
//!   identifiers into the same arena,
//!     so the model contains no reference cycles even though the language
//!     it describes is full of them.
//!
//! An identifier is only meaningful for the model that issued it.
//! Lookups by identifier index directly into the arena and will panic if
//!   given an identifier from another model.
//!
//! The model is immutable once resolution completes;
//!   all mutation is `pub(crate)` and performed by the resolver.
//!
//! Inheritance
//! ===========
//! Each asset stores only what it declares.
//! _Effective_ sets,
//!   which merge in everything inherited from super-assets,
//!   are computed by queries on the [`Model`] such as
//!   [`Model::effective_steps`] and [`Model::effective_field`].
//! An attack step that overrides an inherited step of the same name
//!   replaces it in the effective set.

mod expr;

pub use expr::{ExprDisplay, StepExpr, StepExprKind};

use fxhash::FxHashMap;
use std::fmt::{self, Display};

use crate::{
    ast::MetaKey,
    dist::Distribution,
    global::{ModelIdSize, NonZeroModelIdSize},
    span::Span,
};

macro_rules! model_id {
    ($($(#[$attr:meta])* $name:ident,)*) => {$(
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(NonZeroModelIdSize);

        impl $name {
            /// Identifier of the `i`th entity of this kind.
            pub(crate) fn from_index(i: usize) -> Self {
                let i = ModelIdSize::try_from(i).unwrap_or(ModelIdSize::MAX);
                Self(NonZeroModelIdSize::MIN.saturating_add(i))
            }

            /// Position of the entity within its arena.
            pub fn index(self) -> usize {
                (self.0.get() - 1) as usize
            }
        }

        assert_eq_size!(Option<$name>, $name);
    )*};
}

model_id! {
    /// Identifier of a [`Category`] within a [`Model`].
    CategoryId,
    /// Identifier of an [`Asset`] within a [`Model`].
    AssetId,
    /// Identifier of an [`AttackStep`] within a [`Model`].
    StepId,
    /// Identifier of a [`Field`] within a [`Model`].
    FieldId,
    /// Identifier of a [`Link`] within a [`Model`].
    LinkId,
}

/// Values keyed by name,
///   iterated in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct NameTable<T> {
    entries: Vec<(String, T)>,
    index: FxHashMap<String, usize>,
}

impl<T> Default for NameTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<T> NameTable<T> {
    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a value,
    ///   replacing any existing value of the same name in place.
    pub(crate) fn insert(&mut self, name: String, value: T) {
        match self.index.get(&name) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }
}

/// Free-form documentation attached to a model entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    pub(crate) info: Option<String>,
    pub(crate) assumptions: Option<String>,
    pub(crate) rationale: Option<String>,
}

impl Meta {
    pub fn get(&self, key: MetaKey) -> Option<&str> {
        match key {
            MetaKey::Info => self.info.as_deref(),
            MetaKey::Assumptions => self.assumptions.as_deref(),
            MetaKey::Rationale => self.rationale.as_deref(),
        }
    }

    pub fn info(&self) -> Option<&str> {
        self.get(MetaKey::Info)
    }

    pub fn assumptions(&self) -> Option<&str> {
        self.get(MetaKey::Assumptions)
    }

    pub fn rationale(&self) -> Option<&str> {
        self.get(MetaKey::Rationale)
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_none()
            && self.assumptions.is_none()
            && self.rationale.is_none()
    }

    /// Set the value of a key,
    ///   keeping the first value if the key is already present.
    pub(crate) fn set(&mut self, key: MetaKey, value: &str) {
        let slot = match key {
            MetaKey::Info => &mut self.info,
            MetaKey::Assumptions => &mut self.assumptions,
            MetaKey::Rationale => &mut self.rationale,
        };

        slot.get_or_insert_with(|| value.into());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub(crate) name: String,
    pub(crate) span: Span,
    pub(crate) meta: Meta,
    pub(crate) assets: Vec<AssetId>,
}

impl Category {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the first block declaring this category.
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Assets of every block of this category,
    ///   in declaration order.
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub(crate) id: AssetId,
    pub(crate) name: String,
    pub(crate) span: Span,
    pub(crate) is_abstract: bool,
    pub(crate) super_asset: Option<AssetId>,
    pub(crate) category: CategoryId,
    pub(crate) meta: Meta,
    pub(crate) steps: NameTable<StepId>,
    pub(crate) fields: NameTable<FieldId>,
    pub(crate) variables: NameTable<Variable>,
    pub(crate) reverse_variables: NameTable<Variable>,
}

impl Asset {
    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn super_asset(&self) -> Option<AssetId> {
        self.super_asset
    }

    pub fn category(&self) -> CategoryId {
        self.category
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Attack step declared by this asset
    ///   (not inherited).
    pub fn step(&self, name: &str) -> Option<StepId> {
        self.steps.get(name).copied()
    }

    /// Attack steps declared by this asset,
    ///   in declaration order.
    pub fn steps(&self) -> impl Iterator<Item = StepId> + '_ {
        self.steps.values().copied()
    }

    /// Field declared on this asset by an association
    ///   (not inherited).
    pub fn field(&self, name: &str) -> Option<FieldId> {
        self.fields.get(name).copied()
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.fields.values().copied()
    }

    /// Variable declared by this asset
    ///   (not inherited).
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    /// Reverse forms of variables whose bodies lead to this asset,
    ///   keyed by [`Variable::call_name`].
    pub fn reverse_variables(&self) -> impl Iterator<Item = &Variable> {
        self.reverse_variables.values()
    }

    pub fn reverse_variable(&self, call_name: &str) -> Option<&Variable> {
        self.reverse_variables.get(call_name)
    }
}

/// Resolved kind of an attack step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackStepKind {
    Any,
    All,
    Defense,
    /// A defense whose effect depends on the existence of other assets
    ///   (a defense with a `requires` clause).
    ConditionalDefense,
    Exist,
    NotExist,
}

impl AttackStepKind {
    pub fn is_defense(self) -> bool {
        matches!(self, Self::Defense | Self::ConditionalDefense)
    }

    pub fn is_existence(self) -> bool {
        matches!(self, Self::Exist | Self::NotExist)
    }
}

impl Display for AttackStepKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Any => write!(f, "ANY"),
            Self::All => write!(f, "ALL"),
            Self::Defense => write!(f, "DEFENSE"),
            Self::ConditionalDefense => write!(f, "CONDITIONAL_DEFENSE"),
            Self::Exist => write!(f, "EXIST"),
            Self::NotExist => write!(f, "NOTEXIST"),
        }
    }
}

/// Impact of compromising an attack step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Cia {
    pub confidentiality: bool,
    pub integrity: bool,
    pub availability: bool,
}

impl Display for Cia {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let letters = [
            (self.confidentiality, "C"),
            (self.integrity, "I"),
            (self.availability, "A"),
        ]
        .into_iter()
        .filter_map(|(set, l)| set.then_some(l))
        .collect::<Vec<_>>();

        write!(f, "{{{}}}", letters.join(", "))
    }
}

/// Resolved time-to-compromise expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TtcExpr {
    Add(Box<TtcExpr>, Box<TtcExpr>),
    Sub(Box<TtcExpr>, Box<TtcExpr>),
    Mul(Box<TtcExpr>, Box<TtcExpr>),
    Div(Box<TtcExpr>, Box<TtcExpr>),
    Pow(Box<TtcExpr>, Box<TtcExpr>),
    Number(f64),
    Distribution(Distribution),
}

impl TtcExpr {
    /// Expected value of the expression,
    ///   substituting the mean of each distribution.
    pub fn mean(&self) -> f64 {
        use TtcExpr::*;

        match self {
            Add(l, r) => l.mean() + r.mean(),
            Sub(l, r) => l.mean() - r.mean(),
            Mul(l, r) => l.mean() * r.mean(),
            Div(l, r) => l.mean() / r.mean(),
            Pow(l, r) => l.mean().powf(r.mean()),
            Number(n) => *n,
            Distribution(d) => d.mean(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttackStep {
    pub(crate) id: StepId,
    pub(crate) name: String,
    pub(crate) span: Span,
    pub(crate) asset: AssetId,
    pub(crate) kind: AttackStepKind,
    pub(crate) tags: Vec<String>,
    pub(crate) cia: Option<Cia>,
    pub(crate) ttc: Option<TtcExpr>,
    pub(crate) meta: Meta,
    pub(crate) overrides: Option<StepId>,
    pub(crate) inherits_reaches: bool,
    pub(crate) requires: Vec<StepExpr>,
    pub(crate) reaches: Vec<StepExpr>,
    pub(crate) parent_steps: Vec<StepExpr>,
}

impl AttackStep {
    pub fn id(&self) -> StepId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Asset declaring this step.
    pub fn asset(&self) -> AssetId {
        self.asset
    }

    pub fn kind(&self) -> AttackStepKind {
        self.kind
    }

    pub fn is_defense(&self) -> bool {
        self.kind.is_defense()
    }

    pub fn is_conditional_defense(&self) -> bool {
        self.kind == AttackStepKind::ConditionalDefense
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Hidden steps are omitted from generated documentation and user
    ///   interfaces.
    pub fn is_hidden(&self) -> bool {
        self.has_tag("hidden")
    }

    pub fn is_debug(&self) -> bool {
        self.has_tag("debug")
    }

    pub fn cia(&self) -> Option<Cia> {
        self.cia
    }

    pub fn ttc(&self) -> Option<&TtcExpr> {
        self.ttc.as_ref()
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Inherited step of the same name that this step replaces.
    pub fn overrides(&self) -> Option<StepId> {
        self.overrides
    }

    /// Whether this step extends
    ///   (`+>`)
    ///   rather than replaces
    ///   (`->`)
    ///   the reaches of the step it overrides.
    pub fn inherits_reaches(&self) -> bool {
        self.inherits_reaches
    }

    pub fn requires(&self) -> &[StepExpr] {
        &self.requires
    }

    /// Reaches declared by this step alone;
    ///   see [`Model::effective_reaches`].
    pub fn reaches(&self) -> &[StepExpr] {
        &self.reaches
    }

    /// Incoming edges derived from the reaches of other steps.
    pub fn parent_steps(&self) -> &[StepExpr] {
        &self.parent_steps
    }
}

/// Bounds on the number of assets a [`Field`] may refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Multiplicity {
    pub min: u32,
    /// [`None`] if unbounded.
    pub max: Option<u32>,
}

impl Multiplicity {
    pub const ZERO_OR_ONE: Self = Self::new(0, Some(1));
    pub const ZERO_OR_MORE: Self = Self::new(0, None);
    pub const ONE: Self = Self::new(1, Some(1));
    pub const ONE_OR_MORE: Self = Self::new(1, None);

    const fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }
}

impl Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..*", self.min),
        }
    }
}

/// One endpoint of an association.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub(crate) id: FieldId,
    pub(crate) name: String,
    pub(crate) span: Span,
    pub(crate) asset: AssetId,
    pub(crate) target: AssetId,
    pub(crate) multiplicity: Multiplicity,
    pub(crate) link: LinkId,
    pub(crate) reverse: FieldId,
}

impl Field {
    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the role name in the association,
    ///   or of the association itself if the name was generated.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Asset on which this field is declared.
    pub fn asset(&self) -> AssetId {
        self.asset
    }

    /// Asset reached by following this field.
    pub fn target(&self) -> AssetId {
        self.target
    }

    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    pub fn link(&self) -> LinkId {
        self.link
    }

    /// The field on [`Self::target`] leading back to [`Self::asset`].
    pub fn reverse(&self) -> FieldId {
        self.reverse
    }
}

/// A resolved association:
///   a pair of mutually reverse [`Field`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub(crate) id: LinkId,
    pub(crate) name: String,
    pub(crate) span: Span,
    pub(crate) left: FieldId,
    pub(crate) right: FieldId,
    pub(crate) meta: Meta,
}

impl Link {
    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Field declared on the left asset of the association.
    pub fn left(&self) -> FieldId {
        self.left
    }

    /// Field declared on the right asset of the association.
    pub fn right(&self) -> FieldId {
        self.right
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }
}

/// A named step expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub(crate) name: String,
    pub(crate) asset: AssetId,
    pub(crate) span: Span,
    pub(crate) reverse: bool,
    pub(crate) body: StepExpr,
}

impl Variable {
    /// Name as declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Asset declaring the variable.
    ///
    /// For a reverse variable,
    ///   this is the asset declaring the variable it was derived from.
    pub fn asset(&self) -> AssetId {
        self.asset
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Whether this is the derived reverse form of a declared variable.
    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub fn body(&self) -> &StepExpr {
        &self.body
    }

    /// Name unique across the model,
    ///   suitable for generated code:
    ///     the variable name followed by the name of its declaring asset,
    ///     prefixed with `reverse` for reverse variables.
    pub fn call_name(&self, model: &Model) -> String {
        call_name(model, &self.name, self.asset, self.reverse)
    }
}

pub(crate) fn call_name(
    model: &Model,
    name: &str,
    asset: AssetId,
    reverse: bool,
) -> String {
    let prefix = if reverse { crate::global::REVERSE_PREFIX } else { "" };
    format!("{prefix}{name}{}", model.asset(asset).name)
}

/// `#key: "value"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Define {
    pub(crate) key: String,
    pub(crate) value: String,
}

impl Define {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A fully resolved MAL language.
///
/// See the [module-level documentation](self) for more information.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub(crate) categories: Vec<Category>,
    pub(crate) assets: Vec<Asset>,
    pub(crate) steps: Vec<AttackStep>,
    pub(crate) fields: Vec<Field>,
    pub(crate) links: Vec<Link>,
    pub(crate) defines: Vec<Define>,
    asset_names: FxHashMap<String, AssetId>,
    category_names: FxHashMap<String, CategoryId>,
}

impl Model {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Categories in order of first declaration.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn category(&self, id: CategoryId) -> &Category {
        &self.categories[id.index()]
    }

    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.category_names.get(name).map(|&id| self.category(id))
    }

    /// Assets in declaration order.
    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    pub fn asset(&self, id: AssetId) -> &Asset {
        &self.assets[id.index()]
    }

    pub fn asset_id(&self, name: &str) -> Option<AssetId> {
        self.asset_names.get(name).copied()
    }

    pub fn asset_by_name(&self, name: &str) -> Option<&Asset> {
        self.asset_id(name).map(|id| self.asset(id))
    }

    pub fn step(&self, id: StepId) -> &AttackStep {
        &self.steps[id.index()]
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.index()]
    }

    /// Associations in declaration order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.index()]
    }

    /// Defines in declaration order.
    pub fn defines(&self) -> impl Iterator<Item = &Define> {
        self.defines.iter()
    }

    pub fn define(&self, key: &str) -> Option<&str> {
        self.defines
            .iter()
            .find(|d| d.key == key)
            .map(|d| d.value.as_str())
    }

    /// The given asset followed by each of its super-assets,
    ///   nearest first.
    pub fn super_chain(&self, asset: AssetId) -> SuperChain {
        SuperChain {
            model: self,
            next: Some(asset),
        }
    }

    /// Whether `sub` is `sup` or inherits from it.
    pub fn is_subtype(&self, sub: AssetId, sup: AssetId) -> bool {
        self.super_chain(sub).any(|a| a == sup)
    }

    /// Nearest asset of which both `a` and `b` are subtypes.
    pub fn least_upper_bound(&self, a: AssetId, b: AssetId) -> Option<AssetId> {
        self.super_chain(a).find(|&sup| self.is_subtype(b, sup))
    }

    /// Attack step visible from the given asset by name,
    ///   whether declared or inherited.
    pub fn effective_step(&self, asset: AssetId, name: &str) -> Option<StepId> {
        self.super_chain(asset)
            .find_map(|a| self.asset(a).step(name))
    }

    /// Every attack step visible from the given asset,
    ///   inherited steps first in the order of their declaration.
    ///
    /// An overriding step takes the position of the step it overrides.
    pub fn effective_steps(&self, asset: AssetId) -> Vec<StepId> {
        self.effective(asset, |a| &a.steps)
    }

    pub fn effective_field(&self, asset: AssetId, name: &str) -> Option<FieldId> {
        self.super_chain(asset)
            .find_map(|a| self.asset(a).field(name))
    }

    /// Every field visible from the given asset,
    ///   inherited fields first.
    pub fn effective_fields(&self, asset: AssetId) -> Vec<FieldId> {
        self.effective(asset, |a| &a.fields)
    }

    pub fn effective_variable(
        &self,
        asset: AssetId,
        name: &str,
    ) -> Option<&Variable> {
        self.super_chain(asset)
            .find_map(|a| self.asset(a).variable(name))
    }

    fn effective<T: Copy>(
        &self,
        asset: AssetId,
        table: impl Fn(&Asset) -> &NameTable<T>,
    ) -> Vec<T> {
        let mut chain = self.super_chain(asset).collect::<Vec<_>>();
        chain.reverse();

        let mut merged = NameTable::default();
        for a in chain {
            for (name, &value) in table(self.asset(a)).iter() {
                merged.insert(name.into(), value);
            }
        }

        merged.values().copied().collect()
    }

    /// Reaches of a step including,
    ///   for steps declared with `+>`,
    ///   those of the step it overrides.
    ///
    /// Inherited reaches come first.
    pub fn effective_reaches(&self, step: StepId) -> Vec<&StepExpr> {
        let step = self.step(step);

        let mut reaches = match (step.inherits_reaches, step.overrides) {
            (true, Some(parent)) => self.effective_reaches(parent),
            _ => Vec::new(),
        };

        reaches.extend(step.reaches.iter());
        reaches
    }

    pub(crate) fn add_category(&mut self, name: &str, span: &Span) -> CategoryId {
        if let Some(&id) = self.category_names.get(name) {
            return id;
        }

        let id = CategoryId::from_index(self.categories.len());
        self.categories.push(Category {
            name: name.into(),
            span: span.clone(),
            meta: Meta::default(),
            assets: Vec::new(),
        });
        self.category_names.insert(name.into(), id);

        id
    }

    pub(crate) fn category_mut(&mut self, id: CategoryId) -> &mut Category {
        &mut self.categories[id.index()]
    }

    pub(crate) fn add_asset(
        &mut self,
        name: &str,
        span: &Span,
        is_abstract: bool,
        category: CategoryId,
    ) -> AssetId {
        let id = AssetId::from_index(self.assets.len());

        self.assets.push(Asset {
            id,
            name: name.into(),
            span: span.clone(),
            is_abstract,
            super_asset: None,
            category,
            meta: Meta::default(),
            steps: NameTable::default(),
            fields: NameTable::default(),
            variables: NameTable::default(),
            reverse_variables: NameTable::default(),
        });
        self.asset_names.insert(name.into(), id);
        self.category_mut(category).assets.push(id);

        id
    }

    pub(crate) fn asset_mut(&mut self, id: AssetId) -> &mut Asset {
        &mut self.assets[id.index()]
    }

    /// Add an attack step to the arena and to its declaring asset.
    ///
    /// The identifier of the provided step is ignored and replaced.
    pub(crate) fn add_step(&mut self, mut step: AttackStep) -> StepId {
        let id = StepId::from_index(self.steps.len());
        step.id = id;

        self.asset_mut(step.asset).steps.insert(step.name.clone(), id);
        self.steps.push(step);

        id
    }

    pub(crate) fn step_mut(&mut self, id: StepId) -> &mut AttackStep {
        &mut self.steps[id.index()]
    }

    /// Add an association as a [`Link`] and its two [`Field`]s.
    ///
    /// `left` is the field declared on the left asset
    ///   (leading to the right asset)
    ///   and `right` the field declared on the right asset.
    pub(crate) fn add_link(
        &mut self,
        name: &str,
        span: &Span,
        meta: Meta,
        left: FieldDecl,
        right: FieldDecl,
    ) -> LinkId {
        let link = LinkId::from_index(self.links.len());
        let left_id = FieldId::from_index(self.fields.len());
        let right_id = FieldId::from_index(self.fields.len() + 1);

        for (id, decl, reverse) in
            [(left_id, left, right_id), (right_id, right, left_id)]
        {
            self.asset_mut(decl.asset)
                .fields
                .insert(decl.name.clone(), id);

            self.fields.push(Field {
                id,
                name: decl.name,
                span: decl.span,
                asset: decl.asset,
                target: decl.target,
                multiplicity: decl.multiplicity,
                link,
                reverse,
            });
        }

        self.links.push(Link {
            id: link,
            name: name.into(),
            span: span.clone(),
            left: left_id,
            right: right_id,
            meta,
        });

        link
    }

    pub(crate) fn add_define(&mut self, key: &str, value: &str) {
        self.defines.push(Define {
            key: key.into(),
            value: value.into(),
        })
    }
}

/// Declaration of one side of an association.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldDecl {
    pub name: String,
    pub span: Span,
    pub asset: AssetId,
    pub target: AssetId,
    pub multiplicity: Multiplicity,
}

/// Iterator over an asset and its super-assets.
///
/// See [`Model::super_chain`].
pub struct SuperChain<'a> {
    model: &'a Model,
    next: Option<AssetId>,
}

impl<'a> Iterator for SuperChain<'a> {
    type Item = AssetId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.model.asset(current).super_asset;

        Some(current)
    }
}

#[cfg(test)]
mod test;
