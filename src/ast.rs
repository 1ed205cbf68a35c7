// MAL syntax tree
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

//! Syntax tree of a MAL specification.
//!
//! This is the input contract of the resolver.
//! Lexing,
//!   parsing,
//!   and flattening of `include`d files happen elsewhere;
//!     by the time a tree reaches this crate,
//!       every file has been merged into a single [`Ast`] and each node
//!       carries the [`Span`] of the file it was written in.
//!
//! The tree is purely syntactic:
//!   names are unresolved strings,
//!   multiplicities are raw tokens,
//!   and TTC functions are unvalidated names with parameter lists.
//! Nothing here is checked until [`crate::resolve`] runs.

use std::fmt::{self, Display};

use crate::span::Span;

/// A complete, include-flattened MAL specification.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ast {
    pub categories: Vec<Category>,
    pub associations: Vec<Association>,
    pub defines: Vec<Define>,
}

/// An identifier and the position at which it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub span: Span,
    pub name: String,
}

impl Ident {
    pub fn new<S: Into<String>>(span: Span, name: S) -> Self {
        Self {
            span,
            name: name.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// `#key: "value"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Define {
    pub span: Span,
    pub key: Ident,
    pub value: String,
}

/// Key of a metadata entry.
///
/// MAL recognizes only a small fixed set of metadata keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKey {
    Info,
    Assumptions,
    Rationale,
}

impl Display for MetaKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Assumptions => write!(f, "assumptions"),
            Self::Rationale => write!(f, "rationale"),
        }
    }
}

/// `key: "value"` attached to a category, asset, attack step or
///   association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub span: Span,
    pub key: MetaKey,
    pub value: String,
}

/// `category Name { ... }`
///
/// Multiple blocks of the same name are merged during resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub span: Span,
    pub name: Ident,
    pub meta: Vec<Meta>,
    pub assets: Vec<Asset>,
}

/// `[abstract] asset Name [extends Parent] { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub span: Span,
    pub is_abstract: bool,
    pub name: Ident,
    pub parent: Option<Ident>,
    pub meta: Vec<Meta>,
    pub attack_steps: Vec<AttackStep>,
    pub variables: Vec<Variable>,
}

/// Declared kind of an attack step.
///
/// The resolved model distinguishes an additional conditional defense
///   kind;
///     see [`crate::model::AttackStepKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackStepType {
    /// `|`
    Any,
    /// `&`
    All,
    /// `#`
    Defense,
    /// `E`
    Exist,
    /// `!E`
    NotExist,
}

impl Display for AttackStepType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Any => write!(f, "ANY"),
            Self::All => write!(f, "ALL"),
            Self::Defense => write!(f, "DEFENSE"),
            Self::Exist => write!(f, "EXIST"),
            Self::NotExist => write!(f, "NOTEXIST"),
        }
    }
}

/// A single letter of a `{C, I, A}` classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cia {
    C,
    I,
    A,
}

impl Display for Cia {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::C => write!(f, "C"),
            Self::I => write!(f, "I"),
            Self::A => write!(f, "A"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttackStep {
    pub span: Span,
    pub kind: AttackStepType,
    pub name: Ident,
    pub tags: Vec<Ident>,
    /// Classification as written,
    ///   including any duplicate letters.
    ///
    /// [`None`] if the step carries no `{...}` block at all,
    ///   which is distinct from an empty block.
    pub cia: Option<Vec<Cia>>,
    pub ttc: Option<TtcExpr>,
    pub meta: Vec<Meta>,
    pub requires: Option<Requires>,
    pub reaches: Option<Reaches>,
}

/// `<- expr, expr, ...`
#[derive(Debug, Clone, PartialEq)]
pub struct Requires {
    pub span: Span,
    pub exprs: Vec<Expr>,
}

/// `-> expr, ...` or `+> expr, ...`
#[derive(Debug, Clone, PartialEq)]
pub struct Reaches {
    pub span: Span,
    /// Whether this step extends the reaches of the step it overrides
    ///   (`+>`) rather than replacing them (`->`).
    pub inherits: bool,
    pub exprs: Vec<Expr>,
}

/// `let name = expr`
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub span: Span,
    pub name: Ident,
    pub expr: Expr,
}

/// Time-to-compromise expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TtcExpr {
    Add(Box<TtcExpr>, Box<TtcExpr>),
    Sub(Box<TtcExpr>, Box<TtcExpr>),
    Mul(Box<TtcExpr>, Box<TtcExpr>),
    Div(Box<TtcExpr>, Box<TtcExpr>),
    Pow(Box<TtcExpr>, Box<TtcExpr>),
    Number(f64),
    Function(TtcFunc),
}

/// A distribution by name,
///   e.g. `Bernoulli(0.5)` or `EasyAndCertain`.
#[derive(Debug, Clone, PartialEq)]
pub struct TtcFunc {
    pub span: Span,
    pub name: Ident,
    pub params: Vec<f64>,
}

impl TtcExpr {
    pub fn func<S: Into<String>>(span: Span, name: S, params: Vec<f64>) -> Self {
        Self::Function(TtcFunc {
            name: Ident::new(span.clone(), name),
            span,
            params,
        })
    }

    pub fn add(lhs: Self, rhs: Self) -> Self {
        Self::Add(Box::new(lhs), Box::new(rhs))
    }

    pub fn sub(lhs: Self, rhs: Self) -> Self {
        Self::Sub(Box::new(lhs), Box::new(rhs))
    }

    pub fn mul(lhs: Self, rhs: Self) -> Self {
        Self::Mul(Box::new(lhs), Box::new(rhs))
    }

    pub fn div(lhs: Self, rhs: Self) -> Self {
        Self::Div(Box::new(lhs), Box::new(rhs))
    }

    pub fn pow(lhs: Self, rhs: Self) -> Self {
        Self::Pow(Box::new(lhs), Box::new(rhs))
    }
}

/// A step expression as written.
///
/// Binary nodes carry the span of their left-hand side,
///   which is where diagnostics about the whole expression point.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `a \/ b`
    Union(Span, Box<Expr>, Box<Expr>),
    /// `a /\ b`
    Intersection(Span, Box<Expr>, Box<Expr>),
    /// `a - b`
    Difference(Span, Box<Expr>, Box<Expr>),
    /// `a.b`
    Collect(Span, Box<Expr>, Box<Expr>),
    /// `a*`
    Transitive(Span, Box<Expr>),
    /// `a[T]`
    SubType(Span, Box<Expr>, Ident),
    /// A field or attack step name.
    Id(Ident),
    /// `v()`
    Call(Ident),
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Self::Union(span, ..)
            | Self::Intersection(span, ..)
            | Self::Difference(span, ..)
            | Self::Collect(span, ..)
            | Self::Transitive(span, ..)
            | Self::SubType(span, ..) => span,
            Self::Id(ident) | Self::Call(ident) => &ident.span,
        }
    }

    pub fn id<S: Into<String>>(span: Span, name: S) -> Self {
        Self::Id(Ident::new(span, name))
    }

    pub fn call<S: Into<String>>(span: Span, name: S) -> Self {
        Self::Call(Ident::new(span, name))
    }

    pub fn collect(lhs: Self, rhs: Self) -> Self {
        Self::Collect(lhs.span().clone(), Box::new(lhs), Box::new(rhs))
    }

    pub fn union(lhs: Self, rhs: Self) -> Self {
        Self::Union(lhs.span().clone(), Box::new(lhs), Box::new(rhs))
    }

    pub fn intersection(lhs: Self, rhs: Self) -> Self {
        Self::Intersection(lhs.span().clone(), Box::new(lhs), Box::new(rhs))
    }

    pub fn difference(lhs: Self, rhs: Self) -> Self {
        Self::Difference(lhs.span().clone(), Box::new(lhs), Box::new(rhs))
    }

    pub fn transitive(inner: Self) -> Self {
        Self::Transitive(inner.span().clone(), Box::new(inner))
    }

    pub fn sub_type(inner: Self, ty: Ident) -> Self {
        Self::SubType(inner.span().clone(), Box::new(inner), ty)
    }
}

/// A single multiplicity bound as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiplicityUnit {
    Number(u32),
    Star,
}

impl Display for MultiplicityUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Star => write!(f, "*"),
        }
    }
}

/// `min..max` or a single bound,
///   as written.
///
/// Only a handful of combinations are meaningful;
///   validation happens during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multiplicity {
    pub span: Span,
    pub min: MultiplicityUnit,
    pub max: Option<MultiplicityUnit>,
}

impl Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}", self.min),
        }
    }
}

/// `Left [leftField] lm <-- Link --> rm [rightField] Right`
///
/// `left_field` names the role of `Left` as seen from `Right`:
///   it becomes a field of `Right`,
///     and `right_field` becomes a field of `Left`.
/// Omitted field names are generated during resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Association {
    pub span: Span,
    pub left_asset: Ident,
    pub left_field: Option<Ident>,
    pub left_mult: Multiplicity,
    pub link: Ident,
    pub right_mult: Multiplicity,
    pub right_field: Option<Ident>,
    pub right_asset: Ident,
    pub meta: Vec<Meta>,
}
