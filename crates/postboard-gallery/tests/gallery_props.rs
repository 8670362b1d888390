//! Property tests for the gallery working set
//!
//! Random sequences of user actions must never break key uniqueness, the
//! item ↔ payload pairing, or the ordering contract of reconcile.

use postboard_gallery::{GalleryItem, GalleryReconciler, ItemKey, UploadFile};
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Action {
    Add,
    RemoveNew(usize),
    Toggle(usize),
    Shuffle(Vec<usize>),
    Move(usize, usize),
    BogusReorder,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => Just(Action::Add),
        2 => any::<usize>().prop_map(Action::RemoveNew),
        2 => any::<usize>().prop_map(Action::Toggle),
        2 => proptest::collection::vec(any::<usize>(), 0..16).prop_map(Action::Shuffle),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Action::Move(a, b)),
        1 => Just(Action::BogusReorder),
    ]
}

fn seeded(existing: usize) -> GalleryReconciler {
    let mut g = GalleryReconciler::new();
    g.initialize((0..existing).map(|i| format!("u/p{i}.jpg")));
    g
}

fn sorted_keys(g: &GalleryReconciler) -> Vec<ItemKey> {
    let mut keys = g.keys();
    keys.sort();
    keys
}

/// Apply one action; `counter` hands out unique staged names.
fn apply(g: &mut GalleryReconciler, action: &Action, counter: &mut usize) {
    match action {
        Action::Add => {
            *counter += 1;
            let name = format!("n{counter}.jpg");
            let file = UploadFile::new(name.clone(), "image/jpeg", name.into_bytes());
            g.add_encoded(file, "local://asset").unwrap();
        }
        Action::RemoveNew(i) => {
            if !g.is_empty() {
                let key = g.keys()[i % g.len()].clone();
                g.remove_new(&key);
            }
        }
        Action::Toggle(i) => {
            if !g.is_empty() {
                let path = g.items()[i % g.len()].path().map(str::to_owned);
                if let Some(path) = path {
                    g.toggle_remove_existing(&path);
                }
            }
        }
        Action::Shuffle(seed) => {
            let mut keys = g.keys();
            for (i, s) in seed.iter().enumerate() {
                if keys.len() > 1 {
                    let a = i % keys.len();
                    let b = s % keys.len();
                    keys.swap(a, b);
                }
            }
            let before = sorted_keys(g);
            g.reorder(&keys).unwrap();
            assert_eq!(sorted_keys(g), before);
        }
        Action::Move(from, to) => {
            if !g.is_empty() {
                g.move_item(from % g.len(), to % g.len()).unwrap();
            }
        }
        Action::BogusReorder => {
            let before = g.keys();
            let mut keys = before.clone();
            keys.push(ItemKey::staged("never-added"));
            assert!(g.reorder(&keys).is_err());
            assert_eq!(g.keys(), before);
        }
    }
}

proptest! {
    #[test]
    fn prop_invariants_hold_for_any_action_sequence(
        existing in 0..6usize,
        actions in proptest::collection::vec(action(), 0..40),
    ) {
        let mut g = seeded(existing);
        let mut counter = 0;

        for action in &actions {
            apply(&mut g, action, &mut counter);
            prop_assert!(g.is_consistent());

            let unique: HashSet<_> = g.keys().into_iter().collect();
            prop_assert_eq!(unique.len(), g.len());
        }
    }

    #[test]
    fn prop_reconcile_matches_gallery_order(
        existing in 0..6usize,
        actions in proptest::collection::vec(action(), 0..40),
    ) {
        let mut g = seeded(existing);
        let mut counter = 0;
        for action in &actions {
            apply(&mut g, action, &mut counter);
        }

        let plan = g.reconcile();

        let expected_reorder: Vec<String> = g
            .items()
            .iter()
            .filter_map(GalleryItem::path)
            .filter(|p| !g.is_marked_removed(p))
            .map(str::to_owned)
            .collect();
        prop_assert_eq!(plan.reorder_paths.clone().unwrap_or_default(), expected_reorder);

        let expected_adds: Vec<&str> = g.items().iter().filter_map(GalleryItem::staged_name).collect();
        prop_assert_eq!(plan.add_names(), expected_adds);

        let mut removed: Vec<String> = plan.remove_paths.clone().unwrap_or_default();
        removed.sort();
        let mut marked: Vec<String> = g.marked_paths().map(str::to_owned).collect();
        marked.sort();
        prop_assert_eq!(removed, marked);

        // disjoint: nothing both removed and kept
        let kept: HashSet<_> = plan.reorder_paths.iter().flatten().collect();
        prop_assert!(plan.remove_paths.iter().flatten().all(|p| !kept.contains(p)));
    }

    #[test]
    fn prop_double_toggle_is_identity(
        existing in 1..6usize,
        pick in any::<usize>(),
    ) {
        let mut g = seeded(existing);
        let before = g.reconcile();
        let path = g.items()[pick % existing].path().unwrap().to_owned();

        prop_assert!(g.toggle_remove_existing(&path));
        prop_assert!(g.toggle_remove_existing(&path));
        prop_assert_eq!(g.reconcile(), before);
    }
}

#[test]
fn initialize_twice_equals_once() {
    let mut once = GalleryReconciler::new();
    once.initialize(["A", "B"]);

    let mut twice = GalleryReconciler::new();
    twice.initialize(["A", "B"]);
    twice.initialize(["A", "B"]);

    assert_eq!(once.items(), twice.items());
}
