// Tests for step expression lowering
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
use crate::{
    ast::{Ast, AttackStepType::*},
    test::fixture::*,
};

/// ```text
/// Network [networks] <-- On --> [hosts] Host      (line 20)
/// Host [hosts] <-- Stores --> [data] Data         (line 21)
/// Server extends Host
/// Laptop
/// ```
///
/// `host` is declared on line 3 and `Server` on line 4 with `server`
///   as its steps.
fn net(host: ast::Asset, server: Vec<ast::AttackStep>) -> Ast {
    spec(
        vec![category(
            1,
            "System",
            vec![
                asset(2, "Network").steps(vec![step(2, Any, "access")]),
                host,
                asset(4, "Server").extends(4, "Host").steps(server),
                asset(5, "Data").steps(vec![step(5, Any, "read")]),
                asset(6, "Laptop").steps(vec![step(6, Any, "compromise")]),
            ],
        )],
        vec![
            assoc(20, "Network", "networks", "On", "hosts", "Host"),
            assoc(21, "Host", "hosts", "Stores", "data", "Data"),
        ],
    )
}

fn host() -> ast::Asset {
    asset(3, "Host")
}

/// Host with a single step `x` reaching `exprs`.
fn host_reaching(exprs: Vec<Expr>) -> Ast {
    net(host().steps(vec![step(3, Any, "x").reaches(3, exprs)]), vec![])
}

/// Rendered errors,
///   omitting warnings.
fn errors(ast: &Ast) -> Vec<String> {
    failed(ast)
        .into_iter()
        .filter(|line| line.contains("ERROR"))
        .collect()
}

/// The reaches of `asset.step`,
///   rendered.
fn reaches_of(model: &Model, asset: &str, step: &str) -> Vec<String> {
    let asset = model.asset_by_name(asset).unwrap();
    let step = model.step(asset.step(step).unwrap());

    step.reaches()
        .iter()
        .map(|r| r.display(model).to_string())
        .collect()
}

#[test]
fn field_not_defined() {
    let ast = host_reaching(vec![path(11, &["nothing", "access"])]);

    assert_eq!(
        vec![error_at(11, "Field 'nothing' not defined for asset 'Host'")],
        errors(&ast),
    );
}

#[test]
fn field_not_defined_hints_variable() {
    let ast = net(
        host()
            .variables(vec![variable(10, "nets", id(10, "networks"))])
            .steps(vec![step(3, Any, "x").reaches(11, vec![path(11, &["nets", "access"])])]),
        vec![],
    );

    assert_eq!(
        vec![error_at(
            11,
            "Field 'nets' not defined for asset 'Host', did you mean the \
                variable 'nets()' defined at <test.mal:10:1>"
        )],
        errors(&ast),
    );
}

#[test]
fn variable_not_defined_hints_field() {
    let ast = host_reaching(vec![Expr::collect(
        call(11, "networks"),
        id(11, "access"),
    )]);

    assert_eq!(
        vec![error_at(
            11,
            "Variable 'networks' not defined for asset 'Host', did you mean \
                the field 'networks' defined at <test.mal:20:1>"
        )],
        errors(&ast),
    );
}

#[test]
fn variable_not_defined() {
    let ast = host_reaching(vec![Expr::collect(call(11, "ghost"), id(11, "access"))]);

    assert_eq!(
        vec![error_at(11, "Variable 'ghost' not defined for asset 'Host'")],
        errors(&ast),
    );
}

#[test]
fn variable_cycles() {
    let ast = net(
        host().variables(vec![
            variable(10, "v", call(10, "w")),
            variable(11, "w", call(11, "v")),
            variable(12, "u", call(12, "u")),
        ]),
        vec![],
    );

    // Each cycle is reported once,
    //   at the declaration of the variable it starts from.
    assert_eq!(
        vec![
            error_at(10, "Variable 'v' contains cycle 'v -> w -> v'"),
            error_at(12, "Variable 'u' contains cycle 'u -> u'"),
        ],
        errors(&ast),
    );
}

#[test]
fn cycle_through_call_site_reported_once() {
    let ast = net(
        host()
            .variables(vec![
                variable(
                    10,
                    "v",
                    Expr::collect(path(10, &["networks", "hosts"]), call(10, "w")),
                ),
                variable(
                    11,
                    "w",
                    Expr::collect(path(11, &["data", "hosts"]), call(11, "v")),
                ),
            ])
            .steps(vec![
                step(3, Any, "x")
                    .reaches(12, vec![Expr::collect(call(12, "v"), id(12, "x"))]),
            ]),
        vec![],
    );

    assert_eq!(
        vec![error_at(10, "Variable 'v' contains cycle 'v -> w -> v'")],
        errors(&ast),
    );
}

#[test]
fn variable_call_uses_declaring_asset() {
    let ast = net(
        host()
            .variables(vec![variable(10, "nets", id(10, "networks"))])
            .steps(vec![
                step(3, Any, "x").reaches(11, vec![path(11, &["data", "read"])]),
            ]),
        vec![step(4, Any, "escalate").reaches(12, vec![Expr::collect(
            call(12, "nets"),
            id(12, "access"),
        )])],
    );

    let (model, warnings) = resolved(&ast);
    assert!(
        warnings.iter().all(|w| !w.contains("Variable")),
        "{warnings:?}"
    );

    assert_eq!(vec!["nets().access"], reaches_of(&model, "Server", "escalate"));

    let server = model.asset_id("Server").unwrap();
    let host = model.asset_id("Host").unwrap();
    let step = model.step(model.effective_step(server, "escalate").unwrap());
    let reaches = &step.reaches()[0];

    match reaches.kind() {
        StepExprKind::Collect(call, _) => {
            assert_eq!(host, call.src());
            assert_eq!(server, call.sub_src());

            match call.kind() {
                StepExprKind::Call { name, asset, reverse, .. } => {
                    assert_eq!("nets", name.as_str());
                    assert_eq!(host, *asset);
                    assert!(!reverse);
                }
                other => panic!("expected call, got {other:?}"),
            }
        }
        other => panic!("expected collect, got {other:?}"),
    }
}

#[test]
fn type_filter() {
    let filtered = |ln, ty: &str, step: &str| {
        Expr::collect(
            Expr::sub_type(path(ln, &["networks", "hosts"]), ident(ln, ty)),
            id(ln, step),
        )
    };

    let ast = host_reaching(vec![
        filtered(13, "Laptop", "compromise"),
        filtered(14, "Ghost", "compromise"),
    ]);

    assert_eq!(
        vec![
            error_at(13, "Asset 'Host' cannot be of type 'Laptop'"),
            error_at(14, "Asset 'Ghost' not defined"),
        ],
        errors(&ast),
    );

    let ast = net(
        host().steps(vec![
            step(3, Any, "x").reaches(15, vec![filtered(15, "Server", "escalate")]),
        ]),
        vec![step(4, Any, "escalate")],
    );

    let (model, _) = resolved(&ast);
    assert_eq!(
        vec!["networks.hosts[Server].escalate"],
        reaches_of(&model, "Host", "x"),
    );
}

#[test]
fn transitive_must_return_to_context() {
    let ast = host_reaching(vec![
        Expr::collect(Expr::transitive(id(16, "networks")), id(16, "access")),
        Expr::collect(
            Expr::transitive(path(17, &["networks", "hosts"])),
            id(17, "x"),
        ),
    ]);

    assert_eq!(
        vec![error_at(16, "Previous asset 'Host' is not of type 'Network'")],
        errors(&ast),
    );
}

#[test]
fn transitive_closure() {
    let ast = host_reaching(vec![Expr::collect(
        Expr::transitive(path(17, &["networks", "hosts"])),
        id(17, "x"),
    )]);

    let (model, _) = resolved(&ast);
    assert_eq!(vec!["(networks.hosts)*.x"], reaches_of(&model, "Host", "x"));
}

#[test]
fn set_operands_need_common_ancestor() {
    let ast = host_reaching(vec![
        Expr::collect(
            Expr::union(id(18, "networks"), id(18, "data")),
            id(18, "read"),
        ),
        Expr::collect(
            Expr::intersection(id(19, "nope1"), id(19, "nope2")),
            id(19, "read"),
        ),
    ]);

    assert_eq!(
        vec![
            error_at(18, "Types 'Network' and 'Data' have no common ancestor"),
            error_at(19, "Field 'nope1' not defined for asset 'Host'"),
            error_at(19, "Field 'nope2' not defined for asset 'Host'"),
        ],
        errors(&ast),
    );
}

#[test]
fn set_operators() {
    let ast = host_reaching(vec![
        Expr::collect(
            Expr::union(id(18, "data"), path(18, &["networks", "hosts", "data"])),
            id(18, "read"),
        ),
        Expr::collect(
            Expr::difference(
                path(19, &["networks", "hosts"]),
                Expr::sub_type(path(19, &["networks", "hosts"]), ident(19, "Server")),
            ),
            id(19, "x"),
        ),
    ]);

    let (model, _) = resolved(&ast);

    assert_eq!(
        vec![
            "(data \\/ networks.hosts.data).read",
            "(networks.hosts - networks.hosts[Server]).x",
        ],
        reaches_of(&model, "Host", "x"),
    );
}

#[test]
fn reaches_must_end_in_attack_step() {
    let ast = host_reaching(vec![
        id(19, "networks"),
        path(20, &["networks", "nope"]),
        id(21, "nothing"),
        Expr::union(path(22, &["networks", "access"]), path(22, &["networks", "access"])),
    ]);

    assert_eq!(
        vec![
            error_at(19, "Last step is not attack step"),
            error_at(20, "Attack step 'nope' not defined for asset 'Network'"),
            error_at(21, "Attack step 'nothing' not defined for asset 'Host'"),
            error_at(22, "Last step is not attack step"),
        ],
        errors(&ast),
    );
}

#[test]
fn requires_are_lowered() {
    let ast = net(
        host().steps(vec![
            step(3, Defense, "guarded").requires(9, vec![id(9, "data")]),
            step(3, Exist, "connected").requires(9, vec![path(9, &["networks", "hosts"])]),
        ]),
        vec![],
    );

    let (model, _) = resolved(&ast);

    let host = model.asset_by_name("Host").unwrap();
    let requires = |name: &str| {
        model
            .step(host.step(name).unwrap())
            .requires()
            .iter()
            .map(|r| r.display(&model).to_string())
            .collect::<Vec<_>>()
    };

    assert_eq!(vec!["data"], requires("guarded"));
    assert_eq!(vec!["networks.hosts"], requires("connected"));
}
