use pyblocks_core::forest::{Forest, InstanceId, ParamValue, Position};
use pyblocks_core::mutation::{self, Patch};
use pyblocks_core::workspace::{Command, Workspace};
use std::collections::HashSet;

fn add(forest: Forest, block: &str) -> (Forest, InstanceId) {
    mutation::try_insert(&forest, block, Position::new(0.0, forest.len() as f64 * 80.0))
        .expect("known block")
}

fn assert_well_formed(forest: &Forest) {
    forest.validate().expect("forest should stay well formed");
    let mut seen = HashSet::new();
    for (_, block) in forest.walk() {
        assert!(seen.insert(block.id.clone()), "duplicate {}", block.id);
        for child in &block.children {
            assert_eq!(child.parent_id.as_ref(), Some(&block.id));
        }
    }
    for block in forest.blocks() {
        assert!(block.parent_id.is_none());
    }
}

#[test]
fn insert_appends_a_defaulted_top_level_block() {
    let (forest, id) = add(Forest::new(), "while");
    assert_eq!(forest.blocks().len(), 1);
    let block = forest.find(&id).unwrap();
    assert_eq!(block.param("condition"), Some(ParamValue::from("True")));
    assert!(block.parent_id.is_none());
    assert!(!block.collapsed);
}

#[test]
fn unknown_block_insert_leaves_forest_alone() {
    let (forest, _) = add(Forest::new(), "print");
    let after = mutation::insert(&forest, "not-a-block", Position::default());
    assert_eq!(after, forest);
}

#[test]
fn operations_never_modify_their_input() {
    let (forest, id) = add(Forest::new(), "print");
    let snapshot = forest.clone();
    let _ = mutation::update(&forest, &id, &Patch::new().param("message", "changed"));
    let _ = mutation::delete(&forest, &id);
    assert_eq!(forest, snapshot);
}

#[test]
fn update_merges_parameters_and_ignores_undeclared_ones() {
    let (forest, id) = add(Forest::new(), "for");
    let patch = Patch::new()
        .param("variable", "n")
        .param("bogus", "x")
        .position(Position::new(7.0, 9.0));
    let forest = mutation::update(&forest, &id, &patch);
    let block = forest.find(&id).unwrap();
    assert_eq!(block.param_text("variable"), "n");
    assert_eq!(block.param_text("range"), "range(5)");
    assert!(block.param("bogus").is_none());
    assert_eq!(block.position, Position::new(7.0, 9.0));

    assert!(mutation::try_update(&forest, &"missing-1".into(), &patch).is_none());
}

#[test]
fn delete_removes_the_whole_subtree() {
    let forest = Forest::new();
    let (forest, outer) = add(forest, "for");
    let (forest, inner) = add(forest, "if");
    let (forest, leaf) = add(forest, "print");
    let forest = mutation::group(&forest, &inner, &leaf);
    let forest = mutation::group(&forest, &outer, &inner);
    assert_eq!(forest.len(), 3);

    let forest = mutation::delete(&forest, &outer);
    assert!(forest.is_empty());
    assert!(!forest.contains(&leaf));
}

#[test]
fn nested_delete_reaches_deep_blocks() {
    let forest = Forest::new();
    let (forest, outer) = add(forest, "function");
    let (forest, inner) = add(forest, "while");
    let (forest, leaf) = add(forest, "break");
    let forest = mutation::group(&forest, &inner, &leaf);
    let forest = mutation::group(&forest, &outer, &inner);

    let forest = mutation::delete(&forest, &leaf);
    assert_eq!(forest.len(), 2);
    assert!(forest.find(&inner).unwrap().children.is_empty());
    assert_well_formed(&forest);
}

#[test]
fn group_then_ungroup_keeps_every_block_exactly_once() {
    let forest = Forest::new();
    let (forest, func) = add(forest, "function");
    let (forest, stmt) = add(forest, "return");

    let grouped = mutation::group(&forest, &func, &stmt);
    assert_well_formed(&grouped);
    assert_eq!(grouped.blocks().len(), 1);
    assert_eq!(grouped.len(), 2);

    let ungrouped = mutation::ungroup(&grouped, &stmt);
    assert_well_formed(&ungrouped);
    assert_eq!(ungrouped.blocks().len(), 2);
    assert!(ungrouped.find(&stmt).unwrap().parent_id.is_none());
}

#[test]
fn regrouping_moves_a_child_between_parents() {
    let forest = Forest::new();
    let (forest, first) = add(forest, "if");
    let (forest, second) = add(forest, "else");
    let (forest, stmt) = add(forest, "continue");
    let forest = mutation::group(&forest, &first, &stmt);
    let forest = mutation::group(&forest, &second, &stmt);

    assert_well_formed(&forest);
    assert!(forest.find(&first).unwrap().children.is_empty());
    assert_eq!(forest.find(&second).unwrap().children[0].id, stmt);
}

#[test]
fn group_rejects_cycles_self_and_leaf_parents() {
    let forest = Forest::new();
    let (forest, outer) = add(forest, "while");
    let (forest, inner) = add(forest, "if");
    let (forest, leaf) = add(forest, "print");
    let forest = mutation::group(&forest, &outer, &inner);

    assert!(mutation::try_group(&forest, &outer, &outer).is_none());
    assert!(mutation::try_group(&forest, &inner, &outer).is_none());
    assert!(mutation::try_group(&forest, &leaf, &inner).is_none());
    assert!(mutation::try_group(&forest, &"missing-9".into(), &leaf).is_none());
    assert!(mutation::try_group(&forest, &outer, &"missing-9".into()).is_none());
    assert_eq!(mutation::group(&forest, &inner, &outer), forest);
}

#[test]
fn ungroup_of_a_top_level_block_is_a_no_op() {
    let (forest, id) = add(Forest::new(), "print");
    assert!(mutation::try_ungroup(&forest, &id).is_none());
    assert_eq!(mutation::ungroup(&forest, &id).blocks().len(), 1);
}

#[test]
fn workspace_applies_json_commands_in_order() {
    let mut workspace = Workspace::new();
    let commands: Vec<Command> = serde_json::from_str(
        r#"[
            {"op": "insert", "block": "class", "position": {"x": 0, "y": 0}},
            {"op": "insert", "block": "method", "position": {"x": 20, "y": 60}},
            {"op": "group", "parent": "class-1", "child": "method-2"},
            {"op": "update", "id": "class-1", "patch": {"parameters": {"name": "Dog"}}},
            {"op": "delete", "id": "nothing-here"}
        ]"#,
    )
    .unwrap();

    assert_eq!(workspace.apply_all(&commands), 4);
    assert_well_formed(workspace.forest());
    assert_eq!(
        workspace.generate(),
        "class Dog:\n    def __init__(self):\n"
    );
}

#[test]
fn deleting_a_loop_takes_both_children_with_it() {
    let forest = Forest::new();
    let (forest, lp) = add(forest, "for");
    let (forest, a) = add(forest, "print");
    let (forest, b) = add(forest, "print");
    let forest = mutation::group(&forest, &lp, &a);
    let forest = mutation::group(&forest, &lp, &b);
    assert_eq!(forest.find(&lp).unwrap().children.len(), 2);

    let forest = mutation::delete(&forest, &lp);
    assert_eq!(forest.len(), 0);
    assert!(forest.blocks().iter().all(|block| block.id != a && block.id != b));
}
