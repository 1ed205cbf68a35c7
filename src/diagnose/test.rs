// Diagnostic system tests
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

use super::*;
use crate::span::dummy::*;

#[test]
fn keeps_messages_in_reporting_order() {
    let mut sut = Diagnostics::new("ANALYZER");

    sut.error(S3, "third line first");
    sut.warning(&S1, "first line second");
    sut.error_global("global last");

    let texts = sut.iter().map(Message::text).collect::<Vec<_>>();
    assert_eq!(
        vec!["third line first", "first line second", "global last"],
        texts
    );

    assert_eq!(Some(&S3), sut.iter().next().and_then(Message::span));
    assert_eq!(None, sut.iter().last().and_then(Message::span));
}

#[test]
fn warnings_alone_are_not_fatal() {
    let mut sut = Diagnostics::new("ANALYZER");
    assert!(!sut.has_errors());

    sut.warning(S1, "suspicious");
    sut.warning(S2, "also suspicious");
    assert!(!sut.has_errors());
    assert_eq!(2, sut.warning_count());

    sut.error(S3, "broken");
    assert!(sut.has_errors());
    assert_eq!(1, sut.error_count());
    assert_eq!(3, sut.len());
}

#[test]
fn report_accepts_annotated_spans() {
    let mut sut = Diagnostics::new("ANALYZER");
    let name = "A";

    sut.report(S4.error(format!("Asset '{name}' not defined")));
    sut.report(S5.warning("borrowed label"));

    let levels = sut.iter().map(Message::level).collect::<Vec<_>>();
    assert_eq!(vec![Level::Error, Level::Warning], levels);
    assert_eq!("Asset 'A' not defined", sut.iter().next().unwrap().text());
}

#[test]
fn errors_are_more_severe_than_warnings() {
    assert!(Level::Error < Level::Warning);
}
