//! Shared fixtures: a small zoo model exercising every field kind.

use alloc::collections::BTreeMap;
use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::graph::{Element, Keyed, ObjectGraph, ObjectId};
use crate::info::{ClassDescriptor, FieldDescriptor, Hint};
use crate::scalar::{EnumCodec, FromStrCodec, Scalar, ScalarError, ScalarRegistry, ScalarType};
use crate::scope::{Describe, TranslationScope};

// -----------------------------------------------------------------------------
// Habitat

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Habitat {
    #[default]
    Savanna,
    Jungle,
    Arctic,
}

impl FromStr for Habitat {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "savanna" => Ok(Habitat::Savanna),
            "jungle" => Ok(Habitat::Jungle),
            "arctic" => Ok(Habitat::Arctic),
            _ => Err("unknown habitat"),
        }
    }
}

impl fmt::Display for Habitat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Habitat::Savanna => "savanna",
            Habitat::Jungle => "jungle",
            Habitat::Arctic => "arctic",
        })
    }
}

impl ScalarType for Habitat {
    const TYPE_NAME: &'static str = "habitat";

    fn from_scalar(value: Scalar) -> Result<Self, ScalarError> {
        match value {
            Scalar::Str(text) => text.parse().map_err(|_| ScalarError::Decode {
                type_name: "habitat",
                text,
                reason: "unknown habitat".into(),
            }),
            other => Err(ScalarError::Mismatch {
                type_name: "habitat",
                found: other.kind_name(),
            }),
        }
    }

    fn to_scalar(&self) -> Scalar {
        Scalar::Str(self.to_string())
    }
}

// -----------------------------------------------------------------------------
// Person

#[derive(Debug, Default)]
pub struct Person {
    pub name: String,
    pub nickname: Option<String>,
    pub friend: Option<ObjectId>,
}

impl Element for Person {}

impl Describe for Person {
    fn describe() -> ClassDescriptor {
        ClassDescriptor::builder::<Person>("person")
            .field(FieldDescriptor::scalar("name", |p: &Person| &p.name, |p: &mut Person| &mut p.name))
            .field(FieldDescriptor::optional_scalar(
                "nickname",
                |p: &Person| &p.nickname,
                |p: &mut Person| &mut p.nickname,
            ))
            .field(FieldDescriptor::composite(
                "friend",
                "person",
                |p: &Person| &p.friend,
                |p: &mut Person| &mut p.friend,
            ))
            .build()
    }
}

// -----------------------------------------------------------------------------
// Animals

/// Fields shared by every animal; never registered on its own.
#[derive(Debug, Default)]
pub struct Animal {
    pub name: String,
    pub age: u32,
    pub friend: Option<ObjectId>,
}

impl Element for Animal {}

impl Describe for Animal {
    fn describe() -> ClassDescriptor {
        ClassDescriptor::builder::<Animal>("animal")
            .field(FieldDescriptor::scalar("name", |a: &Animal| &a.name, |a: &mut Animal| &mut a.name))
            .field(FieldDescriptor::scalar("age", |a: &Animal| &a.age, |a: &mut Animal| &mut a.age))
            .field(FieldDescriptor::composite(
                "friend",
                "person",
                |a: &Animal| &a.friend,
                |a: &mut Animal| &mut a.friend,
            ))
            .build()
    }
}

#[derive(Debug, Default)]
pub struct Cat {
    pub base: Animal,
    pub lives: u8,
}

impl Element for Cat {}

impl Keyed for Cat {
    fn key(&self) -> Scalar {
        Scalar::from(self.base.name.as_str())
    }
}

impl Describe for Cat {
    fn describe() -> ClassDescriptor {
        ClassDescriptor::builder::<Cat>("cat")
            .extends(&Animal::describe(), |c: &Cat| &c.base, |c: &mut Cat| &mut c.base)
            .field(FieldDescriptor::scalar("lives", |c: &Cat| &c.lives, |c: &mut Cat| &mut c.lives))
            .keyed()
            .build()
    }
}

#[derive(Debug, Default)]
pub struct Dog {
    pub base: Animal,
    pub breed: Option<String>,
}

impl Element for Dog {}

impl Keyed for Dog {
    fn key(&self) -> Scalar {
        Scalar::from(self.base.name.as_str())
    }
}

impl Describe for Dog {
    fn describe() -> ClassDescriptor {
        ClassDescriptor::builder::<Dog>("dog")
            .extends(&Animal::describe(), |d: &Dog| &d.base, |d: &mut Dog| &mut d.base)
            .field(
                FieldDescriptor::optional_scalar("breed", |d: &Dog| &d.breed, |d: &mut Dog| &mut d.breed)
                    .hint(Hint::Leaf),
            )
            .keyed()
            .build()
    }
}

// -----------------------------------------------------------------------------
// Zoo

#[derive(Debug, Default)]
pub struct Zoo {
    pub name: String,
    pub founded: u32,
    pub note: String,
    pub habitat: Habitat,
    pub keeper: Option<ObjectId>,
    pub animals: Vec<ObjectId>,
    pub by_name: BTreeMap<String, ObjectId>,
    pub tags: Vec<String>,
    pub staff: Vec<ObjectId>,
    /// Set by the completion hook.
    pub loaded: bool,
}

impl Element for Zoo {
    fn deserialized(&mut self) {
        self.loaded = true;
    }
}

impl Describe for Zoo {
    fn describe() -> ClassDescriptor {
        ClassDescriptor::builder::<Zoo>("zoo")
            .field(FieldDescriptor::scalar("name", |z: &Zoo| &z.name, |z: &mut Zoo| &mut z.name))
            .field(
                FieldDescriptor::scalar("founded", |z: &Zoo| &z.founded, |z: &mut Zoo| &mut z.founded)
                    .hint(Hint::Leaf),
            )
            .field(FieldDescriptor::scalar("note", |z: &Zoo| &z.note, |z: &mut Zoo| &mut z.note).hint(Hint::Text))
            .field(FieldDescriptor::scalar("habitat", |z: &Zoo| &z.habitat, |z: &mut Zoo| &mut z.habitat))
            .field(FieldDescriptor::composite(
                "keeper",
                "person",
                |z: &Zoo| &z.keeper,
                |z: &mut Zoo| &mut z.keeper,
            ))
            .field(
                FieldDescriptor::collection("animals", "animal", |z: &Zoo| &z.animals, |z: &mut Zoo| {
                    &mut z.animals
                })
                .polymorphic(&["cat", "dog"]),
            )
            .field(
                FieldDescriptor::map("by_name", "animal", |z: &Zoo| &z.by_name, |z: &mut Zoo| &mut z.by_name)
                    .polymorphic(&["cat", "dog"])
                    .wrapped("registry"),
            )
            .field(
                FieldDescriptor::scalar_collection("tags", |z: &Zoo| &z.tags, |z: &mut Zoo| &mut z.tags)
                    .element_tag("tag"),
            )
            .field(
                FieldDescriptor::collection("staff", "person", |z: &Zoo| &z.staff, |z: &mut Zoo| &mut z.staff)
                    .element_tag("member"),
            )
            .build()
    }
}

// -----------------------------------------------------------------------------
// Visit

/// Decodes from its name or its value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub fn codec() -> EnumCodec {
        EnumCodec::new("priority")
            .valued("low", "3")
            .valued("normal", "5")
            .valued("high", "7")
    }
}

impl ScalarType for Priority {
    const TYPE_NAME: &'static str = "priority";

    fn from_scalar(value: Scalar) -> Result<Self, ScalarError> {
        match value {
            Scalar::Str(text) => match text.as_str() {
                "low" => Ok(Priority::Low),
                "normal" => Ok(Priority::Normal),
                "high" => Ok(Priority::High),
                _ => Err(ScalarError::Decode {
                    type_name: "priority",
                    text,
                    reason: "unknown priority".into(),
                }),
            },
            other => Err(ScalarError::Mismatch {
                type_name: "priority",
                found: other.kind_name(),
            }),
        }
    }

    fn to_scalar(&self) -> Scalar {
        Scalar::from(match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        })
    }
}

#[derive(Debug, Default)]
pub struct Visit {
    pub opened: NaiveDate,
    pub checked: Option<DateTime<FixedOffset>>,
    pub priority: Priority,
    /// Kept as the variant name of a priority.
    pub urgency: String,
}

impl Element for Visit {}

impl Describe for Visit {
    fn describe() -> ClassDescriptor {
        ClassDescriptor::builder::<Visit>("visit")
            .field(FieldDescriptor::scalar("opened", |v: &Visit| &v.opened, |v: &mut Visit| &mut v.opened))
            .field(FieldDescriptor::optional_scalar(
                "checked",
                |v: &Visit| &v.checked,
                |v: &mut Visit| &mut v.checked,
            ))
            .field(FieldDescriptor::scalar(
                "priority",
                |v: &Visit| &v.priority,
                |v: &mut Visit| &mut v.priority,
            ))
            .field(
                FieldDescriptor::scalar("urgency", |v: &Visit| &v.urgency, |v: &mut Visit| &mut v.urgency)
                    .codec("priority"),
            )
            .build()
    }
}

// -----------------------------------------------------------------------------
// Scope

pub fn zoo_scope() -> TranslationScope {
    let mut scalars = ScalarRegistry::new();
    scalars.register(FromStrCodec::<Habitat>::new());
    scalars.register(Priority::codec());
    TranslationScope::builder("zoo")
        .scalars(scalars)
        .register::<Zoo>()
        .register::<Person>()
        .register::<Cat>()
        .register::<Dog>()
        .register::<Visit>()
        .build()
        .expect("zoo scope is valid")
}

/// Ids of the elements built by [`sample_zoo`].
pub struct Sample {
    pub zoo: ObjectId,
    pub keeper: ObjectId,
    pub tom: ObjectId,
    pub rex: ObjectId,
    pub vet: ObjectId,
}

/// A tree-shaped zoo: every element is reachable along exactly one path.
pub fn sample_zoo(graph: &mut ObjectGraph) -> Sample {
    let keeper = graph.insert(Person {
        name: "Ann".into(),
        nickname: Some("A & \"B\" <x>".into()),
        friend: None,
    });
    let vet = graph.insert(Person {
        name: "Vic".into(),
        ..Person::default()
    });
    let tom = graph.insert(Cat {
        base: Animal {
            name: "Tom".into(),
            age: 3,
            friend: None,
        },
        lives: 9,
    });
    let rex = graph.insert(Dog {
        base: Animal {
            name: "Rex".into(),
            age: 5,
            friend: None,
        },
        breed: Some("boxer".into()),
    });
    let zoo = graph.insert(Zoo {
        name: "City".into(),
        founded: 1900,
        note: "Open daily".into(),
        habitat: Habitat::Jungle,
        keeper: Some(keeper),
        animals: vec![tom, rex],
        by_name: BTreeMap::new(),
        tags: vec!["old".into(), "big".into()],
        staff: vec![vet],
        loaded: false,
    });
    Sample {
        zoo,
        keeper,
        tom,
        rex,
        vet,
    }
}
