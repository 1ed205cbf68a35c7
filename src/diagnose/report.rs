// Diagnostic system rendering
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

//! Rendering of diagnostic information.

// NB: `write!` together with `\n` is preferred to `writeln!` so that there
//   is only a single sequence of characters to search for while tracking
//   down newlines,
//     rather than using both.

use super::{Diagnostics, Level, Message};
use std::{
    error::Error,
    fmt::{self, Display},
};

pub trait Reporter {
    /// Render all diagnostics recorded by a phase.
    ///
    /// The provided [`Report`] implements [`Display`].
    ///
    /// Please be mindful of where this report is being rendered to.
    /// If rendering to standard error alongside other output,
    ///   it is a good idea to render the entire report into a buffer
    ///   before writing,
    ///     otherwise lines may become interleaved.
    ///
    /// This method does not return [`Result`] and should never fail.
    fn render<'d>(&self, diagnostics: &'d Diagnostics) -> Report<'d>;

    /// Render the terminal failure of a phase.
    ///
    /// This is the final line printed after all recorded diagnostics when
    ///   a phase could not produce its output.
    fn render_failure<'d, E: Error>(
        &self,
        phase: &'d str,
        err: &'d E,
    ) -> Failure<'d, E> {
        Failure { phase, err }
    }
}

/// Render diagnostics one per line in the format
///   `[PHASE LEVEL] <file:line:col> message`.
///
/// This format is parsed by editors and test harnesses and must be
///   reproduced exactly.
/// Messages without a position omit the position token entirely
///   (`[PHASE LEVEL] message`).
#[derive(Debug, Default, Clone, Copy)]
pub struct LineReporter;

impl LineReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for LineReporter {
    fn render<'d>(&self, diagnostics: &'d Diagnostics) -> Report<'d> {
        Report {
            phase: diagnostics.phase(),
            messages: diagnostics.iter().collect(),
        }
    }
}

/// Rendered diagnostics of a single phase.
#[derive(Debug)]
pub struct Report<'d> {
    phase: &'d str,
    messages: Vec<&'d Message>,
}

impl<'d> Report<'d> {
    /// Highest severity of any message in this report.
    pub fn level(&self) -> Option<Level> {
        self.messages.iter().map(|m| m.level()).min()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<'d> Display for Report<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.messages.iter().try_for_each(|msg| {
            Line(self.phase, msg).fmt(f)?;
            write!(f, "\n")
        })
    }
}

/// A single rendered line without its trailing newline.
struct Line<'d>(&'d str, &'d Message);

impl<'d> Display for Line<'d> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(phase, msg) = self;

        match msg.span() {
            Some(span) => {
                write!(f, "[{phase} {}] {span} {}", msg.level(), msg.text())
            }
            None => write!(f, "[{phase} {}] {}", msg.level(), msg.text()),
        }
    }
}

/// Terminal failure line of a phase.
///
/// See [`Reporter::render_failure`].
#[derive(Debug)]
pub struct Failure<'d, E: Error> {
    phase: &'d str,
    err: &'d E,
}

impl<'d, E: Error> Display for Failure<'d, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}] {}\n", self.phase, Level::Error, self.err)
    }
}
