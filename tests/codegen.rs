use pyblocks_core::codegen::{self, GenerateOptions, EMPTY_PLACEHOLDER};
use pyblocks_core::forest::{Forest, InstanceId, Position};
use pyblocks_core::mutation::{self, Patch};

fn add(forest: Forest, block: &str, x: f64, y: f64) -> (Forest, InstanceId) {
    mutation::try_insert(&forest, block, Position::new(x, y)).expect("known block")
}

fn set(forest: &Forest, id: &InstanceId, name: &str, value: &str) -> Forest {
    mutation::update(forest, id, &Patch::new().param(name, value))
}

#[test]
fn empty_forest_yields_placeholder() {
    assert_eq!(codegen::generate(&Forest::new()), EMPTY_PLACEHOLDER);

    let options = GenerateOptions {
        placeholder: String::new(),
        ..GenerateOptions::default()
    };
    assert_eq!(codegen::generate_with_options(&Forest::new(), &options), "");
}

#[test]
fn buckets_come_out_in_fixed_order_with_blank_separators() {
    let forest = Forest::new();
    let (forest, _) = add(forest, "print", 0.0, 0.0);
    let (forest, _) = add(forest, "function", 0.0, 100.0);
    let (forest, _) = add(forest, "class", 0.0, 200.0);
    let (forest, _) = add(forest, "import", 0.0, 300.0);

    assert_eq!(
        codegen::generate(&forest),
        "import math\n\nclass MyClass:\n\ndef my_function():\n\nprint(\"Hello, World!\")\n"
    );
}

#[test]
fn top_level_order_follows_canvas_position() {
    let forest = Forest::new();
    let (forest, low) = add(forest, "comment", 0.0, 400.0);
    let (forest, right) = add(forest, "comment", 300.0, 100.0);
    let (forest, left) = add(forest, "comment", 10.0, 120.0);
    let forest = set(&forest, &low, "text", "third");
    let forest = set(&forest, &right, "text", "second");
    let forest = set(&forest, &left, "text", "first");

    assert_eq!(codegen::generate(&forest), "# first\n# second\n# third\n");
}

#[test]
fn row_threshold_is_configurable() {
    let forest = Forest::new();
    let (forest, a) = add(forest, "comment", 300.0, 100.0);
    let (forest, b) = add(forest, "comment", 10.0, 120.0);
    let forest = set(&forest, &a, "text", "a");
    let forest = set(&forest, &b, "text", "b");

    let tight = GenerateOptions {
        row_threshold: 10.0,
        ..GenerateOptions::default()
    };
    assert_eq!(codegen::generate_with_options(&forest, &tight), "# a\n# b\n");
    assert_eq!(codegen::generate(&forest), "# b\n# a\n");
}

#[test]
fn children_are_indented_and_collapse_hides_them() {
    let forest = Forest::new();
    let (forest, func) = add(forest, "function", 0.0, 0.0);
    let (forest, cond) = add(forest, "if", 20.0, 50.0);
    let (forest, ret) = add(forest, "return", 40.0, 100.0);
    let forest = set(&forest, &ret, "value", "x");
    let forest = mutation::group(&forest, &cond, &ret);
    let forest = mutation::group(&forest, &func, &cond);

    assert_eq!(
        codegen::generate(&forest),
        "def my_function():\n    if True:\n        return x\n"
    );

    let narrow = GenerateOptions {
        indent_width: 2,
        ..GenerateOptions::default()
    };
    assert_eq!(
        codegen::generate_with_options(&forest, &narrow),
        "def my_function():\n  if True:\n    return x\n"
    );

    let collapsed = mutation::update(&forest, &cond, &Patch::new().collapsed(true));
    assert_eq!(codegen::generate(&collapsed), "def my_function():\n    if True:\n");
}

#[test]
fn import_alias_and_class_base_are_optional_clauses() {
    let forest = Forest::new();
    let (forest, import) = add(forest, "import", 0.0, 0.0);
    let (forest, class) = add(forest, "class", 0.0, 100.0);
    let forest = set(&forest, &import, "library", "numpy");
    let forest = set(&forest, &import, "alias", "np");
    let forest = set(&forest, &class, "name", "Dog");
    let forest = set(&forest, &class, "parent", "Animal");

    assert_eq!(
        codegen::generate(&forest),
        "import numpy as np\n\nclass Dog(Animal):\n"
    );
}

#[test]
fn print_message_is_quoted_unless_already_an_expression() {
    let forest = Forest::new();
    let (forest, plain) = add(forest, "print", 0.0, 0.0);
    let (forest, quoted) = add(forest, "print", 0.0, 100.0);
    let (forest, call) = add(forest, "print", 0.0, 200.0);
    let forest = set(&forest, &plain, "message", "hi");
    let forest = set(&forest, &quoted, "message", "'hi'");
    let forest = set(&forest, &call, "message", "len(x)");

    assert_eq!(
        codegen::generate(&forest),
        "print(\"hi\")\nprint('hi')\nprint(len(x))\n"
    );
}

#[test]
fn dict_template_keeps_its_literal_braces() {
    let (forest, _) = add(Forest::new(), "dict", 0.0, 0.0);
    assert_eq!(
        codegen::generate(&forest),
        "my_dict = {\"key\": \"value\"}\n"
    );
}

#[test]
fn substituted_values_are_not_rescanned() {
    let (forest, id) = add(Forest::new(), "variable", 0.0, 0.0);
    let forest = set(&forest, &id, "value", "{name}");
    assert_eq!(codegen::generate(&forest), "my_var = {name}\n");
}

#[test]
fn generation_is_pure() {
    let forest = Forest::new();
    let (forest, _) = add(forest, "for", 0.0, 0.0);
    let (forest, _) = add(forest, "import", 5.0, 5.0);
    let before = forest.clone();
    let first = codegen::generate(&forest);
    let second = codegen::generate(&forest);
    assert_eq!(first, second);
    assert_eq!(forest, before);
}

#[test]
fn other_import_function_inserted_top_down_emit_import_function_other() {
    let forest = Forest::new();
    let (forest, _) = add(forest, "variable", 0.0, 0.0);
    let (forest, import) = add(forest, "import", 0.0, 100.0);
    let (forest, _) = add(forest, "function", 0.0, 200.0);
    let forest = set(&forest, &import, "alias", "m");

    assert_eq!(
        codegen::generate(&forest),
        "import math as m\n\ndef my_function():\n\nmy_var = 0\n"
    );
}

#[test]
fn output_message_with_parenthesis_is_not_quoted() {
    let (forest, id) = add(Forest::new(), "print", 0.0, 0.0);
    let forest = set(&forest, &id, "message", "f(x)");
    assert_eq!(codegen::generate(&forest), "print(f(x))\n");
}

#[test]
fn cleared_parameter_renders_empty_instead_of_its_default() {
    let (forest, id) = add(Forest::new(), "print", 0.0, 0.0);
    let forest = set(&forest, &id, "message", "");
    assert_eq!(codegen::generate(&forest), "print(\"\")\n");
}
