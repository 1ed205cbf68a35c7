// Tests for the language model
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

/// `Animal <- Dog <- Puppy`,
///   `Animal <- Cat`,
///   and an unrelated `Rock`.
struct Zoo {
    model: Model,
    animal: AssetId,
    dog: AssetId,
    puppy: AssetId,
    cat: AssetId,
    rock: AssetId,
}

impl Zoo {
    fn new() -> Self {
        let mut model = Model::new();
        let cat_id = model.add_category("Things", &S1);

        let mut add = |name, span: &Span, sup: Option<AssetId>| {
            let id = model.add_asset(name, span, false, cat_id);
            model.asset_mut(id).super_asset = sup;
            id
        };

        let animal = add("Animal", &S2, None);
        let dog = add("Dog", &S3, Some(animal));
        let puppy = add("Puppy", &S4, Some(dog));
        let cat = add("Cat", &S5, Some(animal));
        let rock = add("Rock", &S6, None);

        Self {
            model,
            animal,
            dog,
            puppy,
            cat,
            rock,
        }
    }

    fn step(&mut self, asset: AssetId, name: &str, span: Span) -> StepId {
        let overrides = self
            .model
            .asset(asset)
            .super_asset()
            .and_then(|sup| self.model.effective_step(sup, name));

        self.model.add_step(AttackStep {
            id: StepId::from_index(0),
            name: name.into(),
            span,
            asset,
            kind: AttackStepKind::Any,
            tags: vec![],
            cia: None,
            ttc: None,
            meta: Meta::default(),
            overrides,
            inherits_reaches: false,
            requires: vec![],
            reaches: vec![],
            parent_steps: vec![],
        })
    }

    /// Bare reference to `step` from its own asset.
    fn step_ref(&self, step: StepId) -> StepExpr {
        let asset = self.model.step(step).asset();

        StepExpr::new(StepExprKind::AttackStep(step), asset, asset, asset, asset)
    }
}

#[test]
fn ids_are_zero_indexed() {
    assert_eq!(0, AssetId::from_index(0).index());
    assert_eq!(41, StepId::from_index(41).index());
    assert_ne!(FieldId::from_index(1), FieldId::from_index(2));
}

#[test]
fn super_chain_nearest_first() {
    let zoo = Zoo::new();

    assert_eq!(
        vec![zoo.puppy, zoo.dog, zoo.animal],
        zoo.model.super_chain(zoo.puppy).collect::<Vec<_>>(),
    );
    assert_eq!(
        vec![zoo.rock],
        zoo.model.super_chain(zoo.rock).collect::<Vec<_>>(),
    );
}

#[test]
fn subtyping_is_reflexive_and_follows_extends() {
    let Zoo {
        model,
        animal,
        dog,
        puppy,
        rock,
        ..
    } = Zoo::new();

    assert!(model.is_subtype(puppy, animal));
    assert!(model.is_subtype(dog, dog));
    assert!(!model.is_subtype(animal, puppy));
    assert!(!model.is_subtype(rock, animal));
}

#[test]
fn least_upper_bound_is_nearest_common_ancestor() {
    let Zoo {
        model,
        animal,
        dog,
        puppy,
        cat,
        rock,
    } = Zoo::new();

    assert_eq!(Some(animal), model.least_upper_bound(puppy, cat));
    assert_eq!(Some(animal), model.least_upper_bound(cat, puppy));
    assert_eq!(Some(dog), model.least_upper_bound(dog, puppy));
    assert_eq!(Some(dog), model.least_upper_bound(puppy, dog));
    assert_eq!(None, model.least_upper_bound(rock, dog));
}

#[test]
fn lookup_by_name() {
    let zoo = Zoo::new();

    assert_eq!(Some(zoo.cat), zoo.model.asset_id("Cat"));
    assert_eq!(None, zoo.model.asset_id("cat"));
    assert_eq!("Dog", zoo.model.asset_by_name("Dog").unwrap().name());

    let things = zoo.model.category_by_name("Things").unwrap();
    assert_eq!(
        &[zoo.animal, zoo.dog, zoo.puppy, zoo.cat, zoo.rock],
        things.assets(),
    );
}

#[test]
fn categories_merge_by_name() {
    let mut model = Model::new();

    let a = model.add_category("System", &S1);
    let b = model.add_category("Other", &S2);
    let c = model.add_category("System", &S3);

    assert_eq!(a, c);
    assert_ne!(a, b);
    assert_eq!(2, model.categories().count());

    // The first block determines the position.
    assert_eq!(&S1, model.category(a).span());
}

#[test]
fn effective_steps_inherited_first() {
    let mut zoo = Zoo::new();

    let a = zoo.step(zoo.animal, "a", S1);
    let b = zoo.step(zoo.animal, "b", S2);
    let c = zoo.step(zoo.dog, "c", S3);
    let b_dog = zoo.step(zoo.dog, "b", S4);

    // The override takes the position of `b`,
    //   not its position of declaration.
    assert_eq!(vec![a, b_dog, c], zoo.model.effective_steps(zoo.puppy));
    assert_eq!(vec![a, b], zoo.model.effective_steps(zoo.cat));

    assert_eq!(Some(b), zoo.model.step(b_dog).overrides());
    assert_eq!(Some(b_dog), zoo.model.effective_step(zoo.puppy, "b"));
    assert_eq!(Some(b), zoo.model.effective_step(zoo.cat, "b"));
    assert_eq!(None, zoo.model.effective_step(zoo.rock, "a"));

    // Declared steps only.
    assert_eq!(
        vec![c, b_dog],
        zoo.model.asset(zoo.dog).steps().collect::<Vec<_>>()
    );
}

#[test]
fn effective_reaches_with_inheritance() {
    let mut zoo = Zoo::new();

    let x = zoo.step(zoo.animal, "x", S1);
    let y = zoo.step(zoo.animal, "y", S2);
    let attack = zoo.step(zoo.animal, "attack", S3);
    let extended = zoo.step(zoo.dog, "attack", S4);
    let replaced = zoo.step(zoo.cat, "attack", S5);

    let (to_x, to_y) = (zoo.step_ref(x), zoo.step_ref(y));

    zoo.model.step_mut(attack).reaches = vec![to_x.clone()];

    let dog_step = zoo.model.step_mut(extended);
    dog_step.inherits_reaches = true;
    dog_step.reaches = vec![to_y.clone()];

    zoo.model.step_mut(replaced).reaches = vec![to_y.clone()];

    assert_eq!(vec![&to_x, &to_y], zoo.model.effective_reaches(extended));
    assert_eq!(vec![&to_y], zoo.model.effective_reaches(replaced));
    assert_eq!(vec![&to_y], zoo.model.step(extended).reaches().iter().collect::<Vec<_>>());
}

#[test]
fn link_fields_are_mutually_reverse() {
    let mut zoo = Zoo::new();

    let link = zoo.model.add_link(
        "Sits",
        &S7,
        Meta::default(),
        FieldDecl {
            name: "rocks".into(),
            span: S8,
            asset: zoo.dog,
            target: zoo.rock,
            multiplicity: Multiplicity::ZERO_OR_MORE,
        },
        FieldDecl {
            name: "dog".into(),
            span: S9,
            asset: zoo.rock,
            target: zoo.dog,
            multiplicity: Multiplicity::ONE,
        },
    );

    let link = zoo.model.link(link);
    let (left, right) = (zoo.model.field(link.left()), zoo.model.field(link.right()));

    assert_eq!("Sits", link.name());
    assert_eq!("rocks", left.name());
    assert_eq!(zoo.dog, left.asset());
    assert_eq!(zoo.rock, left.target());
    assert_eq!(right.id(), left.reverse());
    assert_eq!(left.id(), right.reverse());
    assert_eq!(Multiplicity::ONE, right.multiplicity());

    assert_eq!(Some(left.id()), zoo.model.effective_field(zoo.puppy, "rocks"));
    assert_eq!(None, zoo.model.effective_field(zoo.animal, "rocks"));
    assert_eq!(vec![right.id()], zoo.model.effective_fields(zoo.rock));
}

#[test]
fn name_table_replaces_in_place() {
    let mut table = NameTable::default();

    table.insert("a".into(), 1);
    table.insert("b".into(), 2);
    table.insert("a".into(), 3);

    assert_eq!(2, table.len());
    assert_eq!(Some(&3), table.get("a"));
    assert_eq!(vec![("a", &3), ("b", &2)], table.iter().collect::<Vec<_>>());

    if let Some(b) = table.get_mut("b") {
        *b = 4;
    }
    assert_eq!(vec![&3, &4], table.values().collect::<Vec<_>>());
    assert!(!table.contains("c"));
}

#[test]
fn meta_keeps_first_value() {
    let mut meta = Meta::default();
    assert!(meta.is_empty());

    meta.set(MetaKey::Info, "first");
    meta.set(MetaKey::Info, "second");
    meta.set(MetaKey::Rationale, "because");

    assert_eq!(Some("first"), meta.info());
    assert_eq!(None, meta.assumptions());
    assert_eq!(Some("because"), meta.get(MetaKey::Rationale));
}

#[test]
fn cia_display() {
    let cia = Cia {
        confidentiality: true,
        integrity: false,
        availability: true,
    };

    assert_eq!("{C, A}", cia.to_string());
    assert_eq!("{}", Cia::default().to_string());
}

#[test]
fn multiplicity_display() {
    assert_eq!("0..1", Multiplicity::ZERO_OR_ONE.to_string());
    assert_eq!("0..*", Multiplicity::ZERO_OR_MORE.to_string());
    assert_eq!("1..1", Multiplicity::ONE.to_string());
    assert_eq!("1..*", Multiplicity::ONE_OR_MORE.to_string());
}

#[test]
fn step_kind_display() {
    assert_eq!("CONDITIONAL_DEFENSE", AttackStepKind::ConditionalDefense.to_string());
    assert!(AttackStepKind::ConditionalDefense.is_defense());
    assert!(AttackStepKind::NotExist.is_existence());
    assert!(!AttackStepKind::All.is_defense());
}

#[test]
fn ttc_mean() {
    let ttc = TtcExpr::Add(
        Box::new(TtcExpr::Number(2.0)),
        Box::new(TtcExpr::Mul(
            Box::new(TtcExpr::Number(3.0)),
            Box::new(TtcExpr::Distribution(Distribution::Exponential {
                lambda: 0.5,
            })),
        )),
    );

    assert_eq!(8.0, ttc.mean());
}

#[test]
fn variable_call_names() {
    let zoo = Zoo::new();

    assert_eq!("friendsDog", call_name(&zoo.model, "friends", zoo.dog, false));
    assert_eq!(
        "reversefriendsDog",
        call_name(&zoo.model, "friends", zoo.dog, true)
    );
}

#[test]
fn defines_in_order() {
    let mut model = Model::new();

    model.add_define("id", "org.example");
    model.add_define("version", "1.0.0");

    assert_eq!(Some("1.0.0"), model.define("version"));
    assert_eq!(None, model.define("author"));
    assert_eq!(
        vec!["id", "version"],
        model.defines().map(Define::key).collect::<Vec<_>>()
    );
}
