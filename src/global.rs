// Global constants across the entirety of MALR
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

//! System-wide static configuration.
//!
//! This module provides a system-wide configuration.
//! Subsystems should reference these values rather than defining their own
//!   and risk incompatibilities with the code generators and other tools
//!   that consume analyzer output.
//!
//! By convention,
//!   import this entire module rather than individual members and reference
//!   them as `global::foo` to emphasize their nature and risk.

use std::num;

/// Name of the semantic analysis phase as it appears in rendered
///   diagnostics
///     (`[ANALYZER ERROR] ...`).
pub const ANALYZER_PHASE: &str = "ANALYZER";

/// Defines that every model must provide.
///
/// Code generators derive package names and version metadata from
///   these.
pub const REQUIRED_DEFINES: [&str; 2] = [DEFINE_ID, DEFINE_VERSION];

/// Key of the define identifying the language.
pub const DEFINE_ID: &str = "id";

/// Key of the define holding the language version.
///
/// The value must be of the form `MAJOR.MINOR.PATCH`.
pub const DEFINE_VERSION: &str = "version";

/// Prefix of every generated reverse name.
///
/// This applies to association fields whose name was omitted and to the
///   reverse form of user variables.
pub const REVERSE_PREFIX: &str = "reverse";

/// A size capable of representing every entity of a single kind
///   (assets, attack steps, fields, links)
///   within a model.
pub type ModelIdSize = u32;

/// A non-zero equivalent of [`ModelIdSize`].
pub type NonZeroModelIdSize = num::NonZeroU32;
