//! Store behavior seen from outside the crate.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use formstate_store::{
    Derived, Observable, PartialStore, Readable, ValueStore, Writable, derived, derived2, toggle,
};
use proptest::prelude::*;

type Values = Rc<BTreeMap<String, String>>;

fn field_store(values: &ValueStore<Values>, name: &'static str) -> PartialStore<Option<String>> {
    let writer = values.clone();
    PartialStore::new(
        derived(values, move |v: &Values| v.get(name).cloned()),
        move |next: Option<String>| {
            writer.update(|current| {
                let mut copy = BTreeMap::clone(current);
                match next.clone() {
                    Some(value) => copy.insert(name.to_string(), value),
                    None => copy.remove(name),
                };
                Rc::new(copy)
            });
        },
    )
}

#[test]
fn field_views_only_notify_for_their_slice() {
    let values: ValueStore<Values> = ValueStore::default();
    let name = field_store(&values, "name");
    let email = field_store(&values, "email");

    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let _name_sub = name.subscribe(move |v| sink.borrow_mut().push(format!("name={v:?}")));
    let sink = Rc::clone(&log);
    let _email_sub = email.subscribe(move |v| sink.borrow_mut().push(format!("email={v:?}")));

    name.set(Some("Ann".into()));
    email.set(Some("a@b.c".into()));

    assert_eq!(
        *log.borrow(),
        vec![
            "name=None",
            "email=None",
            "name=Some(\"Ann\")",
            "email=Some(\"a@b.c\")",
        ]
    );
}

#[test]
fn many_unobserved_views_cost_nothing_until_read() {
    let values: ValueStore<Values> = ValueStore::default();
    let computed = Rc::new(std::cell::Cell::new(0_usize));
    let views: Vec<Derived<usize>> = (0..200)
        .map(|i| {
            let computed = Rc::clone(&computed);
            derived(&values, move |v: &Values| {
                computed.set(computed.get() + 1);
                v.len() + i
            })
        })
        .collect();

    for i in 0..10 {
        values.update(|v| {
            let mut copy = BTreeMap::clone(v);
            copy.insert(format!("f{i}"), String::new());
            Rc::new(copy)
        });
    }
    assert_eq!(computed.get(), 0);
    assert_eq!(views[3].get(), 13);
    assert_eq!(computed.get(), 1);
}

#[test]
fn toggled_sets_feed_derived_any() {
    let touched = ValueStore::default();
    let any = derived(&touched, |set: &Rc<std::collections::BTreeSet<String>>| {
        !set.is_empty()
    });
    assert!(!any.get());
    toggle(&touched, &"name".to_string(), true);
    assert!(any.get());
    toggle(&touched, &"name".to_string(), false);
    assert!(!any.get());
}

fn recorder<T: 'static>() -> (Rc<RefCell<Vec<T>>>, impl Fn(T) + 'static) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |value| sink.borrow_mut().push(value))
}

#[test]
fn diamond_branch_still_notifies_its_own_subscribers() {
    let root = ValueStore::new(1_i32);
    let left = derived(&root, |n: &i32| n * 10);
    let right = derived(&root, |n: &i32| n * 100);
    let sum = derived2(&left, &right, |l: &i32, r: &i32| l + r);

    let (sums, push_sum) = recorder();
    let _sum_sub = sum.subscribe(push_sum);
    let (rights, push_right) = recorder();
    let _right_sub = right.subscribe(push_right);

    // Refreshing `sum` through `left` pulls `right` before its own listener runs.
    root.set(2);
    assert_eq!(*sums.borrow(), vec![110, 220]);
    assert_eq!(*rights.borrow(), vec![100, 200]);
}

#[test]
fn view_read_by_earlier_listener_still_notifies() {
    let root = ValueStore::new(1_i32);
    let view = derived(&root, |n: &i32| n * 10);

    let reader = view.clone();
    let _reader_sub = root.subscribe(move |_| {
        reader.get();
    });
    let (seen, push) = recorder();
    let _view_sub = view.subscribe(push);

    root.set(2);
    root.set(3);
    assert_eq!(*seen.borrow(), vec![10, 20, 30]);
}

#[test]
fn late_subscriber_is_not_told_about_old_changes() {
    let root = ValueStore::new(1_i32);
    let view = derived(&root, |n: &i32| n * 10);
    root.set(2);
    assert_eq!(view.get(), 20);

    let (seen, push) = recorder();
    let _sub = view.subscribe(push);
    root.set(2);
    assert_eq!(*seen.borrow(), vec![20]);
    root.set(4);
    assert_eq!(*seen.borrow(), vec![20, 40]);
}

proptest! {
    #[test]
    fn prop_version_moves_iff_value_changes(writes in proptest::collection::vec(0_u8..4, 0..20)) {
        let store = ValueStore::new(0_u8);
        for value in writes {
            let before = store.version();
            let previous = store.get();
            store.set(value);
            prop_assert_eq!(store.version() != before, previous != value);
        }
    }
}
