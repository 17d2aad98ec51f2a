use std::sync::{Arc, Mutex};

use rstest::rstest;
use serde_json::json;

use super::*;

fn model(entities: Vec<Entity>) -> EditModel {
    EditModel::new(entities, &EditConfig::default())
}

fn family() -> Vec<Entity> {
    vec![
        Entity::new("patriarch", 0).with_spouses(["wife1", "wife2"]).with_children(["c"]),
        Entity::new("wife1", 0).with_spouses(["patriarch"]),
        Entity::new("wife2", 0).with_spouses(["patriarch"]),
        Entity::new("c", 1).with_parents(["patriarch"]),
    ]
}

fn lineage() -> Vec<Entity> {
    // root -> mid -> leaf, plus `other` as mid's second parent.
    vec![
        Entity::new("root", 0).with_children(["mid"]),
        Entity::new("other", 0).with_children(["mid"]),
        Entity::new("mid", 1).with_parents(["root", "other"]).with_children(["leaf"]),
        Entity::new("leaf", 2).with_parents(["mid"]),
        Entity::new("stranger", 0),
    ]
}

#[test]
fn add_links_parent_and_child() {
    let mut m = model(vec![Entity::new("p", 0)]);
    m.add(Entity::new("k", 1), Some("p")).unwrap();
    assert_eq!(m.get("p").unwrap().child_ids, vec!["k".to_string()]);
    assert_eq!(m.get("k").unwrap().parent_ids, vec!["p".to_string()]);
    assert!(m.can_undo());
}

#[test]
fn add_rejects_taken_ids() {
    let mut m = model(vec![Entity::new("p", 0)]);
    assert_eq!(
        m.add(Entity::new("p", 3), None),
        Err(EditError::DuplicateId("p".to_string()))
    );
    assert!(m.add_spouse(Entity::new("p", 0), "p").is_err());
    assert_eq!(m.entities().len(), 1);
    assert!(!m.can_undo());
}

#[test]
fn add_with_missing_parent_still_appends() {
    let mut m = model(Vec::new());
    m.add(Entity::new("k", 1), Some("nobody")).unwrap();
    assert!(m.get("k").unwrap().parent_ids.is_empty());
}

#[rstest]
#[case::self_parent("root", "root")]
#[case::direct_child("root", "mid")]
#[case::two_hops("root", "leaf")]
#[case::through_second_parent("other", "leaf")]
fn reparent_rejects_cycles(#[case] entity: &str, #[case] new_parent: &str) {
    let mut m = model(lineage());
    let before = m.snapshot();
    let err = m.reparent(entity, Some(new_parent)).unwrap_err();
    assert!(matches!(err, EditError::Cycle { .. }));
    assert_eq!(m.entities(), before.as_slice());
    assert!(!m.can_undo());
    assert_eq!(m.revision(), 0);
}

#[test]
fn reparent_moves_child_and_sets_generation() {
    let mut m = model(lineage());
    m.reparent("leaf", Some("stranger")).unwrap();
    let leaf = m.get("leaf").unwrap();
    assert_eq!(leaf.parent_ids, vec!["stranger".to_string()]);
    assert_eq!(leaf.generation, 1);
    assert!(m.get("mid").unwrap().child_ids.is_empty());
    assert_eq!(m.get("stranger").unwrap().child_ids, vec!["leaf".to_string()]);
}

#[test]
fn reparent_under_deepest_generation_is_rejected() {
    let mut m = model(vec![
        Entity::new("top", i32::MAX),
        Entity::new("kid", 0),
    ]);
    let before = m.snapshot();
    assert_eq!(
        m.reparent("kid", Some("top")),
        Err(EditError::GenerationOverflow("top".to_string()))
    );
    assert_eq!(m.entities(), before.as_slice());
    assert!(!m.can_undo());
}

#[test]
fn detaching_keeps_generation() {
    let mut m = model(lineage());
    m.reparent("mid", None).unwrap();
    let mid = m.get("mid").unwrap();
    assert!(mid.parent_ids.is_empty());
    assert_eq!(mid.generation, 1);
    assert!(!m.get("root").unwrap().has_child("mid"));
    assert!(!m.get("other").unwrap().has_child("mid"));
}

#[test]
fn reparent_to_unknown_parent_fails_cleanly() {
    let mut m = model(lineage());
    let before = m.snapshot();
    assert_eq!(
        m.reparent("leaf", Some("ghost")),
        Err(EditError::UnknownEntity("ghost".to_string()))
    );
    assert_eq!(m.entities(), before.as_slice());
}

#[test]
fn removal_relinks_children_to_first_spouse() {
    let mut m = model(family());
    m.remove_member("patriarch").unwrap();
    let c = m.get("c").unwrap();
    assert_eq!(c.parent_ids, vec!["wife1".to_string()]);
    assert_eq!(m.get("wife1").unwrap().child_ids, vec!["c".to_string()]);
    for e in m.entities() {
        assert!(!e.has_parent("patriarch"), "{} still lists patriarch as parent", e.id);
        assert!(!e.has_spouse("patriarch"), "{} still lists patriarch as spouse", e.id);
        assert!(!e.has_child("patriarch"));
    }
    assert!(m.get("patriarch").is_none());
}

#[test]
fn removal_event_names_every_changed_record() {
    let events: Arc<Mutex<Vec<ChangeEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let mut m = model(family());
    m.add_listener(move |event| sink.lock().unwrap().push(event.clone()));

    m.remove_member("patriarch").unwrap();
    assert!(m.undo());

    let events = events.lock().unwrap();
    assert_eq!(events[0].kind, ChangeKind::Removed);
    for id in ["patriarch", "wife1", "wife2", "c"] {
        assert!(events[0].ids.iter().any(|e| e == id), "{id} missing from {:?}", events[0].ids);
    }
    assert_eq!(events[1].ids, events[0].ids);
}

#[test]
fn removal_finds_spouse_listed_only_on_the_other_side() {
    let mut m = model(vec![
        Entity::new("dad", 0),
        Entity::new("mum", 0).with_spouses(["dad"]),
        Entity::new("kid", 1).with_parents(["dad"]),
    ]);
    m.remove_member("dad").unwrap();
    assert_eq!(m.get("kid").unwrap().parent_ids, vec!["mum".to_string()]);
    assert!(m.get("mum").unwrap().spouse_ids.is_empty());
}

#[test]
fn removal_does_not_duplicate_existing_co_parent() {
    let mut m = model(vec![
        Entity::new("dad", 0).with_spouses(["mum"]),
        Entity::new("mum", 0).with_spouses(["dad"]).with_children(["kid"]),
        Entity::new("kid", 1).with_parents(["dad", "mum"]),
    ]);
    m.remove_member("dad").unwrap();
    assert_eq!(m.get("kid").unwrap().parent_ids, vec!["mum".to_string()]);
    assert_eq!(m.get("mum").unwrap().child_ids, vec!["kid".to_string()]);
}

#[test]
fn removal_without_spouse_leaves_children_parentless() {
    let mut m = model(lineage());
    m.remove_member("mid").unwrap();
    assert!(m.get("leaf").unwrap().parent_ids.is_empty());
    assert!(m.get("root").unwrap().child_ids.is_empty());
}

#[test]
fn add_spouse_links_both_sides() {
    let mut m = model(vec![Entity::new("a", -1)]);
    m.add_spouse(Entity::new("b", 5).with_spouses(["zzz"]), "a").unwrap();
    let b = m.get("b").unwrap();
    assert_eq!(b.spouse_ids, vec!["a".to_string()]);
    assert_eq!(b.generation, -1);
    assert_eq!(m.get("a").unwrap().spouse_ids, vec!["b".to_string()]);
    assert!(m.add_spouse(Entity::new("c", 0), "ghost").is_err());
}

#[test]
fn attribute_updates_undo_to_exact_previous_values() {
    let mut m = model(vec![Entity::new("a", 0).with_attribute("name", json!("Ann"))]);
    let before = m.snapshot();
    let mut changes = AttributeChanges::new();
    changes.insert("name".to_string(), Some(json!("Anna")));
    changes.insert("born".to_string(), Some(json!(1901)));
    m.update_attributes("a", changes).unwrap();
    assert_eq!(m.get("a").unwrap().attributes["name"], json!("Anna"));

    let mut removal = AttributeChanges::new();
    removal.insert("name".to_string(), None);
    m.update_attributes("a", removal).unwrap();
    assert!(!m.get("a").unwrap().attributes.contains_key("name"));

    assert!(m.undo());
    assert!(m.undo());
    assert_eq!(m.entities(), before.as_slice());
}

#[test]
fn reserved_attribute_keys_are_rejected() {
    let mut m = model(vec![Entity::new("a", 0)]);
    let mut changes = AttributeChanges::new();
    changes.insert("parentIds".to_string(), Some(json!([])));
    assert_eq!(
        m.update_attributes("a", changes),
        Err(EditError::ReservedAttribute("parentIds".to_string()))
    );
}

#[test]
fn undo_restores_exact_state_after_mixed_sequence() {
    let mut m = model(family());
    let before = m.snapshot();

    m.add(Entity::new("gc", 2), Some("c")).unwrap();
    m.add_spouse(Entity::new("c_spouse", 0), "c").unwrap();
    m.reparent("gc", Some("wife2")).unwrap();
    m.remove_member("patriarch").unwrap();
    let mut changes = AttributeChanges::new();
    changes.insert("note".to_string(), Some(json!("x")));
    m.update_attributes("wife1", changes).unwrap();

    for _ in 0..5 {
        assert!(m.undo());
    }
    assert_eq!(m.entities(), before.as_slice());
    assert!(!m.undo());
}

#[test]
fn redo_replays_without_duplicating_history() {
    let mut m = model(family());
    m.remove_member("patriarch").unwrap();
    let after = m.snapshot();
    assert!(m.undo());
    assert!(m.redo());
    assert_eq!(m.entities(), after.as_slice());
    assert_eq!(m.history().undo_len(), 1);
    assert!(!m.can_redo());
    assert!(!m.redo());
}

#[test]
fn redo_keeps_remaining_redo_entries() {
    let mut m = model(vec![Entity::new("a", 0)]);
    m.add(Entity::new("b", 0), None).unwrap();
    m.add(Entity::new("c", 0), None).unwrap();
    assert!(m.undo());
    assert!(m.undo());
    assert!(m.redo());
    assert!(m.can_redo());
    assert!(m.redo());
    assert_eq!(m.entities().len(), 3);
}

#[test]
fn new_edit_clears_redo() {
    let mut m = model(vec![Entity::new("a", 0)]);
    m.add(Entity::new("b", 0), None).unwrap();
    assert!(m.undo());
    m.add(Entity::new("c", 0), None).unwrap();
    assert!(!m.can_redo());
}

#[test]
fn unrecorded_apply_skips_history() {
    let mut m = model(vec![Entity::new("a", 0)]);
    m.apply(
        EditCommand::Add {
            entity: Entity::new("b", 0),
            parent_id: None,
        },
        false,
    )
    .unwrap();
    assert!(!m.can_undo());
    assert_eq!(m.entities().len(), 2);
}

#[test]
fn history_is_bounded() {
    let mut m = EditModel::new(Vec::new(), &EditConfig { max_history_size: 3 });
    for idx in 0..5 {
        m.add(Entity::new(format!("e{idx}"), 0), None).unwrap();
    }
    assert_eq!(m.history().undo_len(), 3);
    while m.undo() {}
    assert_eq!(m.entities().len(), 2);
}

#[test]
fn undo_on_empty_history_is_a_no_op() {
    let mut m = model(family());
    assert!(!m.undo());
    assert!(!m.redo());
    assert_eq!(m.revision(), 0);
}

#[test]
fn listeners_receive_typed_events() {
    let events: Arc<Mutex<Vec<ChangeEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let mut m = model(lineage());
    let id = m.add_listener(move |event| sink.lock().unwrap().push(event.clone()));

    m.reparent("leaf", Some("stranger")).unwrap();
    assert!(m.reparent("stranger", Some("leaf")).is_err());
    m.undo();
    assert!(m.remove_listener(id));
    m.redo();

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, ChangeKind::Reparented);
    assert_eq!(events[0].ids, vec!["leaf", "stranger", "mid"]);
    assert_eq!(events[1].kind, ChangeKind::Undone(EditKind::Reparent));
    assert_eq!(events[1].ids, events[0].ids);
    assert!(events[1].revision > events[0].revision);
    assert_eq!(m.revision(), 3);
}

#[test]
fn replace_all_resets_history() {
    let mut m = model(family());
    m.remove_member("c").unwrap();
    m.replace_all(lineage());
    assert!(!m.can_undo());
    assert_eq!(m.entities().len(), 5);
}
