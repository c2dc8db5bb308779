//! Property tests for key ordering and index completeness.

use lexdb_core::{keys, Database, EntityDescriptor, Record, Scalar, Schema, ValueKind};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn schema() -> Schema {
    Schema::new(vec![EntityDescriptor::new("Item")
        .with_indexed("rank", ValueKind::Int, "rank")
        .with_indexed("labels", ValueKind::list(ValueKind::Text), "label")
        .with_indexed("active", ValueKind::Bool, "active")])
    .unwrap()
}

#[derive(Debug, Clone)]
struct Item {
    rank: i64,
    labels: Vec<String>,
    active: bool,
}

impl Item {
    fn record(&self) -> Record {
        Record::new()
            .with("rank", self.rank)
            .with("labels", self.labels.clone())
            .with("active", self.active)
    }
}

fn item() -> impl Strategy<Value = Item> {
    (
        -3i64..3,
        prop::collection::vec("[ab/]{0,3}", 0..4),
        any::<bool>(),
    )
        .prop_map(|(rank, labels, active)| Item {
            rank,
            labels,
            active,
        })
}

#[derive(Debug, Clone)]
enum Op {
    Create(Item),
    Update(usize, Item),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        item().prop_map(Op::Create),
        (any::<usize>(), item()).prop_map(|(n, i)| Op::Update(n, i)),
    ]
}

fn hits(db: &Database, index: &str, value: Scalar) -> BTreeSet<i64> {
    db.equal_on("Item", index, value)
        .unwrap()
        .map(|r| r.unwrap().0)
        .collect()
}

proptest! {
    #[test]
    fn primary_keys_sort_by_id(a in any::<i64>(), b in any::<i64>()) {
        let (ka, kb) = (keys::primary_key("E", a), keys::primary_key("E", b));
        prop_assert_eq!(a.cmp(&b), ka.cmp(&kb));
    }

    #[test]
    fn index_keys_sort_by_value_then_id(
        v1 in any::<i64>(), v2 in any::<i64>(), i1 in any::<i64>(), i2 in any::<i64>()
    ) {
        let k1 = keys::index_key("E", "i", &Scalar::Int(v1), i1);
        let k2 = keys::index_key("E", "i", &Scalar::Int(v2), i2);
        prop_assert_eq!((v1, i1).cmp(&(v2, i2)), k1.cmp(&k2));
    }

    #[test]
    fn indexes_match_live_records(ops in prop::collection::vec(op(), 1..24)) {
        let db = Database::open_in_memory(schema()).unwrap();
        let mut live: BTreeMap<i64, Item> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Create(item) => {
                    let id = db.create("Item", &item.record()).unwrap();
                    live.insert(id, item);
                }
                Op::Update(n, item) => {
                    if live.is_empty() {
                        continue;
                    }
                    let id = *live.keys().nth(n % live.len()).unwrap();
                    db.update("Item", id, &item.record()).unwrap();
                    live.insert(id, item);
                }
            }
        }

        for rank in -3i64..3 {
            let expected: BTreeSet<_> =
                live.iter().filter(|(_, i)| i.rank == rank).map(|(id, _)| *id).collect();
            prop_assert_eq!(hits(&db, "rank", rank.into()), expected);
        }
        for active in [false, true] {
            let expected: BTreeSet<_> =
                live.iter().filter(|(_, i)| i.active == active).map(|(id, _)| *id).collect();
            prop_assert_eq!(hits(&db, "active", active.into()), expected);
        }
        let labels: BTreeSet<&String> = live.values().flat_map(|i| &i.labels).collect();
        for label in labels {
            let expected: BTreeSet<_> = live
                .iter()
                .filter(|(_, i)| i.labels.contains(label))
                .map(|(id, _)| *id)
                .collect();
            prop_assert_eq!(hits(&db, "label", label.as_str().into()), expected);
        }

        for (id, item) in &live {
            prop_assert_eq!(db.get("Item", *id).unwrap(), item.record());
        }
        prop_assert!(db.verify("Item").unwrap().is_consistent());
    }
}
