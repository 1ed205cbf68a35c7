// Diagnostic system
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

//! Diagnostic system for error reporting.
//!
//! Semantic analysis does not stop at the first problem it encounters.
//! Every check reports into a [`Diagnostics`] collector that is passed
//!   explicitly through each phase,
//!     and the caller decides what to do with the result once all phases
//!     have run
//!       (see [`Diagnostics::has_errors`]).
//! There is no global logger.
//!
//! Messages are kept in the order in which they were reported,
//!   which is the order in which checks are performed and not
//!   necessarily the order of their positions in the source.
//!
//! Rendering is the responsibility of a [`Reporter`];
//!   see [`LineReporter`] for the line-oriented format consumed by MAL
//!   tooling.

mod report;

pub use report::{Failure, LineReporter, Report, Reporter};

use std::{
    borrow::Cow,
    error::Error,
    fmt::{self, Display},
};

use crate::span::Span;

/// Diagnostic report.
///
/// This describes an error condition or other special event using a
///   series of [`Span`]s to describe the source,
///     cause,
///     and circumstances around an event.
pub trait Diagnostic: Error + Sized {
    /// Produce a series of [`AnnotatedSpan`]s describing the source and
    ///   circumstances of the diagnostic event.
    fn describe(&self) -> Vec<AnnotatedSpan>;
}

/// Diagnostic severity level.
///
/// Lower levels are more severe.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
#[repr(u8)]
pub enum Level {
    /// A user-resolvable error.
    ///
    /// Any error prevents the resolved model from being produced.
    Error = 1,

    /// A suspicious construct that does not prevent the model from being
    ///   produced.
    Warning,
}

impl Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "ERROR"),
            Level::Warning => write!(f, "WARNING"),
        }
    }
}

/// A label associated with a [`Span`].
///
/// See [`AnnotatedSpan`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Label<'a>(Cow<'a, str>);

impl<'a> Label<'a> {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'a> Display for Label<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<'a> From<String> for Label<'a> {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}

impl<'a> From<&'a str> for Label<'a> {
    fn from(s: &'a str) -> Self {
        Self(Cow::Borrowed(s))
    }
}

/// A span with an associated severity level and label.
///
/// This is the unit of reporting:
///   checks produce annotated spans using [`Annotate`] and hand them to
///   [`Diagnostics::report`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AnnotatedSpan<'l>(Span, Level, Label<'l>);

impl<'l> AnnotatedSpan<'l> {
    pub fn span(&self) -> &Span {
        &self.0
    }

    pub fn level(&self) -> Level {
        self.1
    }

    pub fn label(&self) -> &Label<'l> {
        &self.2
    }
}

pub trait Annotate: Sized {
    /// Annotate a [`Span`] with a severity [`Level`] and a [`Label`].
    ///
    /// You may wish to use one of the more specific methods that provide a
    ///   more pleasant interface.
    fn annotate<'l>(self, level: Level, label: Label<'l>) -> AnnotatedSpan<'l>;

    /// Annotate a span with an error message.
    ///
    /// (This is not named `err` since it does not return an [`Err`].)
    fn error<'l, L: Into<Label<'l>>>(self, label: L) -> AnnotatedSpan<'l> {
        self.annotate(Level::Error, label.into())
    }

    /// Annotate a span with a warning message.
    fn warning<'l, L: Into<Label<'l>>>(self, label: L) -> AnnotatedSpan<'l> {
        self.annotate(Level::Warning, label.into())
    }
}

impl<S: Into<Span>> Annotate for S {
    fn annotate<'l>(self, level: Level, label: Label<'l>) -> AnnotatedSpan<'l> {
        AnnotatedSpan(self.into(), level, label)
    }
}

/// A single recorded diagnostic.
///
/// Messages without a span describe problems with the model as a whole,
///   such as a missing required define.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Message {
    level: Level,
    span: Option<Span>,
    text: String,
}

impl Message {
    pub fn level(&self) -> Level {
        self.level
    }

    pub fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl<'l> From<AnnotatedSpan<'l>> for Message {
    fn from(AnnotatedSpan(span, level, label): AnnotatedSpan<'l>) -> Self {
        Self {
            level,
            span: Some(span),
            text: label.0.into_owned(),
        }
    }
}

/// Accumulator of diagnostics produced during a single compilation phase.
///
/// The collector is owned by the caller and threaded by mutable reference
///   through every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    phase: &'static str,
    messages: Vec<Message>,
}

impl Diagnostics {
    /// Create an empty collector for the named phase.
    ///
    /// The phase name prefixes every rendered line
    ///   (e.g. `[ANALYZER ERROR]`).
    pub fn new(phase: &'static str) -> Self {
        Self {
            phase,
            messages: Vec::new(),
        }
    }

    pub fn phase(&self) -> &'static str {
        self.phase
    }

    /// Record a positioned diagnostic.
    pub fn report<'l>(&mut self, annotated: AnnotatedSpan<'l>) {
        tracing::trace!(
            level = %annotated.level(),
            span = %annotated.span(),
            "{}",
            annotated.label(),
        );

        self.messages.push(annotated.into());
    }

    /// Record every annotation describing a [`Diagnostic`].
    pub fn report_diagnostic<D: Diagnostic>(&mut self, diag: &D) {
        for annotated in diag.describe() {
            self.report(annotated);
        }
    }

    /// Record a positioned error.
    pub fn error<S: Into<Span>, M: Into<String>>(&mut self, span: S, msg: M) {
        let msg: String = msg.into();
        self.report(span.error(msg))
    }

    /// Record a positioned warning.
    pub fn warning<S: Into<Span>, M: Into<String>>(&mut self, span: S, msg: M) {
        let msg: String = msg.into();
        self.report(span.warning(msg))
    }

    /// Record an error that does not pertain to any one position.
    pub fn error_global<M: Into<String>>(&mut self, msg: M) {
        self.messages.push(Message {
            level: Level::Error,
            span: None,
            text: msg.into(),
        })
    }

    /// Whether any error-level diagnostic has been recorded.
    ///
    /// Warnings alone never make a phase fail.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.count(Level::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Level::Warning)
    }

    fn count(&self, level: Level) -> usize {
        self.messages.iter().filter(|m| m.level == level).count()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Recorded messages in the order they were reported.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod test;
