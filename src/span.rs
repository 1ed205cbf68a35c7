// Source positions
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

//! Source positions for diagnostic reporting.
//!
//! A [`Span`] identifies a single point within a source file by its line
//!   and column.
//! MAL sources are small and diagnostics only ever point at the start of
//!   a construct,
//!     so unlike a byte-interval span there is no length to track.
//!
//! The file is identified by a [`Context`].
//! Include resolution has already taken place by the time a syntax tree
//!   reaches this crate,
//!     so the context of each span is the file the construct was
//!     originally written in,
//!       not the file that was compiled.
//!
//! Spans render as `<file:line:col>`,
//!   which is the format expected by every consumer of analyzer output.

use std::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
    sync::Arc,
};

/// The source file from which a [`Span`] originates.
///
/// Contexts are cheap to clone.
/// Contexts created from a `'static` string
///   (see [`Context::st`])
///   may be used in `const` contexts,
///     which is convenient for tests.
#[derive(Debug, Clone)]
pub struct Context(Path);

#[derive(Debug, Clone)]
enum Path {
    Static(&'static str),
    Shared(Arc<str>),
}

impl Context {
    /// Create a context from an arbitrary path.
    pub fn new<P: Into<Arc<str>>>(path: P) -> Self {
        Self(Path::Shared(path.into()))
    }

    /// Create a context from a static path.
    pub const fn st(path: &'static str) -> Self {
        Self(Path::Static(path))
    }

    /// The path of the source file as provided by the parser.
    pub fn as_str(&self) -> &str {
        match &self.0 {
            Path::Static(s) => s,
            Path::Shared(s) => s,
        }
    }

    /// Produce a [`Span`] at the given line and column of this context.
    pub fn span(&self, line: u32, col: u32) -> Span {
        Span::new(self.clone(), line, col)
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Context {}

impl Hash for Context {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl From<&str> for Context {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Context {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A position within a source [`Context`].
///
/// Lines and columns are 1-indexed,
///   as reported by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    ctx: Context,
    line: u32,
    col: u32,
}

impl Span {
    pub fn new<C: Into<Context>>(ctx: C, line: u32, col: u32) -> Self {
        Self {
            ctx: ctx.into(),
            line,
            col,
        }
    }

    /// Create a span within a static context.
    ///
    /// This is a `const` function and is primarily intended for fixed
    ///   spans in tests;
    ///     see [`dummy`].
    pub const fn st(path: &'static str, line: u32, col: u32) -> Self {
        Self {
            ctx: Context::st(path),
            line,
            col,
        }
    }

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn col(&self) -> u32 {
        self.col
    }
}

impl From<&Span> for Span {
    fn from(span: &Span) -> Self {
        span.clone()
    }
}

impl Display for Span {
    /// Render the span as `<file:line:col>`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}:{}:{}>", self.ctx, self.line, self.col)
    }
}

/// Dummy spans for testing.
///
/// Each span lies on its own line of the same dummy file so that
///   positions in rendered messages are distinct and predictable.
#[cfg(test)]
pub mod dummy {
    use super::{Context, Span};

    /// Name of the file containing every dummy span.
    pub const DUMMY_FILE: &str = "test.mal";

    pub const DUMMY_CONTEXT: Context = Context::st(DUMMY_FILE);

    pub const S1: Span = Span::st(DUMMY_FILE, 1, 1);
    pub const S2: Span = Span::st(DUMMY_FILE, 2, 1);
    pub const S3: Span = Span::st(DUMMY_FILE, 3, 1);
    pub const S4: Span = Span::st(DUMMY_FILE, 4, 1);
    pub const S5: Span = Span::st(DUMMY_FILE, 5, 1);
    pub const S6: Span = Span::st(DUMMY_FILE, 6, 1);
    pub const S7: Span = Span::st(DUMMY_FILE, 7, 1);
    pub const S8: Span = Span::st(DUMMY_FILE, 8, 1);
    pub const S9: Span = Span::st(DUMMY_FILE, 9, 1);

    /// A span on an arbitrary line of the dummy file.
    pub const fn line(n: u32) -> Span {
        Span::st(DUMMY_FILE, n, 1)
    }
}
