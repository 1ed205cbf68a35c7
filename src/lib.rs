// MAL Resolver (MALR)
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

//! Semantic core of the Meta Attack Language (MAL) compiler.
//!
//! This crate takes the syntax tree of a MAL specification
//!   ([`ast::Ast`])
//!   and either produces a fully resolved, immutable language model
//!   ([`model::Model`])
//!   or reports why it cannot.
//! Lexing,
//!   parsing,
//!   include resolution,
//!   and code generation are the responsibility of other tools.
//!
//! The entry points are [`resolve::resolve`],
//!   which reports into a caller-provided [`diagnose::Diagnostics`],
//!   and [`resolve::compile`],
//!   which renders diagnostics to standard error in the format expected
//!   by MAL tooling.
//!
//! Logging
//! =======
//! Progress through resolution is emitted as [`tracing`] events at the
//!   `debug` level and individual diagnostics at the `trace` level.
//! This crate never installs a subscriber.
//! The `resolve-trace` feature additionally wraps each phase in a span.

// We build docs for private items.
#![allow(rustdoc::private_intra_doc_links)]

pub mod global;

#[macro_use]
extern crate static_assertions;

pub mod ast;
pub mod diagnose;
pub mod dist;
pub mod model;
pub mod resolve;
pub mod span;

pub use resolve::{compile, resolve, CompileError};

#[cfg(test)]
pub mod test;
