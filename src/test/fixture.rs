// Syntax tree fixtures
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

//! Terse construction of syntax trees for tests.
//!
//! Every node is placed on a caller-provided line of
//!   [`DUMMY_FILE`](crate::span::dummy::DUMMY_FILE) so that positions in
//!   rendered diagnostics are predictable.
//! Builders take ownership and return the modified node so that they
//!   compose:
//!
//! ```ignore
//! asset(2, "A").extends(3, "B").steps(vec![step(4, Any, "x")])
//! ```

use crate::{
    ast::*,
    diagnose::{Diagnostics, LineReporter, Reporter},
    global,
    model::Model,
    resolve::{resolve, CompileError},
    span::{dummy::line, Span},
};

pub fn ident(ln: u32, name: &str) -> Ident {
    Ident::new(line(ln), name)
}

/// A complete specification with valid required defines.
pub fn spec(categories: Vec<Category>, associations: Vec<Association>) -> Ast {
    Ast {
        categories,
        associations,
        defines: vec![
            define(100, global::DEFINE_ID, "org.example"),
            define(101, global::DEFINE_VERSION, "1.0.0"),
        ],
    }
}

pub fn define(ln: u32, key: &str, value: &str) -> Define {
    Define {
        span: line(ln),
        key: ident(ln, key),
        value: value.into(),
    }
}

pub fn category(ln: u32, name: &str, assets: Vec<Asset>) -> Category {
    Category {
        span: line(ln),
        name: ident(ln, name),
        meta: vec![],
        assets,
    }
}

pub fn meta(ln: u32, key: MetaKey, value: &str) -> Meta {
    Meta {
        span: line(ln),
        key,
        value: value.into(),
    }
}

pub fn asset(ln: u32, name: &str) -> Asset {
    Asset {
        span: line(ln),
        is_abstract: false,
        name: ident(ln, name),
        parent: None,
        meta: vec![],
        attack_steps: vec![],
        variables: vec![],
    }
}

pub fn abstract_asset(ln: u32, name: &str) -> Asset {
    Asset {
        is_abstract: true,
        ..asset(ln, name)
    }
}

impl Asset {
    pub fn extends(self, ln: u32, parent: &str) -> Self {
        Self {
            parent: Some(ident(ln, parent)),
            ..self
        }
    }

    pub fn steps(self, attack_steps: Vec<AttackStep>) -> Self {
        Self {
            attack_steps,
            ..self
        }
    }

    pub fn variables(self, variables: Vec<Variable>) -> Self {
        Self { variables, ..self }
    }
}

pub fn step(ln: u32, kind: AttackStepType, name: &str) -> AttackStep {
    AttackStep {
        span: line(ln),
        kind,
        name: ident(ln, name),
        tags: vec![],
        cia: None,
        ttc: None,
        meta: vec![],
        requires: None,
        reaches: None,
    }
}

impl AttackStep {
    /// `-> exprs`
    pub fn reaches(self, ln: u32, exprs: Vec<Expr>) -> Self {
        Self {
            reaches: Some(Reaches {
                span: line(ln),
                inherits: false,
                exprs,
            }),
            ..self
        }
    }

    /// `+> exprs`
    pub fn inherits(self, ln: u32, exprs: Vec<Expr>) -> Self {
        Self {
            reaches: Some(Reaches {
                span: line(ln),
                inherits: true,
                exprs,
            }),
            ..self
        }
    }

    /// `<- exprs`
    pub fn requires(self, ln: u32, exprs: Vec<Expr>) -> Self {
        Self {
            requires: Some(Requires {
                span: line(ln),
                exprs,
            }),
            ..self
        }
    }

    pub fn ttc(self, ttc: TtcExpr) -> Self {
        Self {
            ttc: Some(ttc),
            ..self
        }
    }

    pub fn cia(self, letters: Vec<Cia>) -> Self {
        Self {
            cia: Some(letters),
            ..self
        }
    }

    pub fn tags(self, ln: u32, tags: &[&str]) -> Self {
        Self {
            tags: tags.iter().map(|t| ident(ln, t)).collect(),
            ..self
        }
    }
}

pub fn variable(ln: u32, name: &str, expr: Expr) -> Variable {
    Variable {
        span: line(ln),
        name: ident(ln, name),
        expr,
    }
}

/// A distribution on the given line.
pub fn func(ln: u32, name: &str, params: &[f64]) -> TtcExpr {
    TtcExpr::func(line(ln), name, params.to_vec())
}

pub fn id(ln: u32, name: &str) -> Expr {
    Expr::id(line(ln), name)
}

pub fn call(ln: u32, name: &str) -> Expr {
    Expr::call(line(ln), name)
}

/// `a.b.c`,
///   grouped to the left as the parser does.
pub fn path(ln: u32, names: &[&str]) -> Expr {
    let mut names = names.iter();
    let first = names.next().map(|n| id(ln, n)).unwrap_or(id(ln, ""));

    names.fold(first, |lhs, n| Expr::collect(lhs, id(ln, n)))
}

/// A multiplicity as written,
///   e.g. `"0..*"` or `"1"`.
pub fn mult(ln: u32, text: &str) -> Multiplicity {
    let unit = |s: &str| match s {
        "*" => MultiplicityUnit::Star,
        n => MultiplicityUnit::Number(n.parse().unwrap()),
    };

    let (min, max) = match text.split_once("..") {
        Some((min, max)) => (unit(min), Some(unit(max))),
        None => (unit(text), None),
    };

    Multiplicity {
        span: line(ln),
        min,
        max,
    }
}

/// `left [left_field] 0..* <-- link --> 0..* [right_field] right`
pub fn assoc(
    ln: u32,
    left: &str,
    left_field: &str,
    link: &str,
    right_field: &str,
    right: &str,
) -> Association {
    Association {
        span: line(ln),
        left_asset: ident(ln, left),
        left_field: Some(ident(ln, left_field)),
        left_mult: mult(ln, "0..*"),
        link: ident(ln, link),
        right_mult: mult(ln, "0..*"),
        right_field: Some(ident(ln, right_field)),
        right_asset: ident(ln, right),
        meta: vec![],
    }
}

/// Resolve `ast` with a fresh collector.
pub fn run(ast: &Ast) -> (Result<Model, CompileError>, Diagnostics) {
    let mut diagnostics = Diagnostics::new(global::ANALYZER_PHASE);
    let result = resolve(ast, &mut diagnostics);

    (result, diagnostics)
}

/// Rendered diagnostic lines,
///   as a user would see them.
pub fn lines(diagnostics: &Diagnostics) -> Vec<String> {
    LineReporter::new()
        .render(diagnostics)
        .to_string()
        .lines()
        .map(String::from)
        .collect()
}

/// Resolve `ast`,
///   which must succeed,
///   returning the model and rendered warnings.
pub fn resolved(ast: &Ast) -> (Model, Vec<String>) {
    let (result, diagnostics) = run(ast);

    match result {
        Ok(model) => (model, lines(&diagnostics)),
        Err(e) => panic!("{e}:\n{}", lines(&diagnostics).join("\n")),
    }
}

/// Resolve `ast`,
///   which must fail,
///   returning rendered diagnostics.
pub fn failed(ast: &Ast) -> Vec<String> {
    let (result, diagnostics) = run(ast);

    match result {
        Ok(_) => panic!(
            "expected resolution to fail:\n{}",
            lines(&diagnostics).join("\n")
        ),
        Err(CompileError::SemanticErrors(n)) => {
            assert_eq!(n, diagnostics.error_count());
            lines(&diagnostics)
        }
    }
}

/// `[ANALYZER ERROR] <test.mal:ln:1> msg`
pub fn error_at(ln: u32, msg: &str) -> String {
    format!("[ANALYZER ERROR] {} {msg}", line(ln))
}

/// `[ANALYZER WARNING] <test.mal:ln:1> msg`
pub fn warning_at(ln: u32, msg: &str) -> String {
    format!("[ANALYZER WARNING] {} {msg}", line(ln))
}

/// The rendered position of a line.
pub fn at(ln: u32) -> Span {
    line(ln)
}
