use crate::forest::ParamValue;
use serde::{Deserialize, Serialize};

/// Coarse structural kind of a block. Drives child ownership and the
/// top-level statement bucket a block is emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Import,
    Variable,
    Output,
    Control,
    Function,
    Class,
    Method,
    Attribute,
    Instantiate,
    MethodCall,
    Input,
    Data,
    Documentation,
    Builtin,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Import => "import",
            BlockKind::Variable => "variable",
            BlockKind::Output => "output",
            BlockKind::Control => "control",
            BlockKind::Function => "function",
            BlockKind::Class => "class",
            BlockKind::Method => "method",
            BlockKind::Attribute => "attribute",
            BlockKind::Instantiate => "instantiate",
            BlockKind::MethodCall => "method_call",
            BlockKind::Input => "input",
            BlockKind::Data => "data",
            BlockKind::Documentation => "documentation",
            BlockKind::Builtin => "builtin",
        }
    }

    pub fn can_own_children(self) -> bool {
        matches!(
            self,
            BlockKind::Control | BlockKind::Function | BlockKind::Class | BlockKind::Method
        )
    }

    pub fn bucket(self) -> Bucket {
        match self {
            BlockKind::Import => Bucket::Imports,
            BlockKind::Class => Bucket::Classes,
            BlockKind::Function => Bucket::Functions,
            _ => Bucket::Other,
        }
    }
}

/// Top-level emission groups, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    Imports,
    Classes,
    Functions,
    Other,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::Imports,
        Bucket::Classes,
        Bucket::Functions,
        Bucket::Other,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Text,
    Number,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: Option<&'static str>,
}

impl ParamSpec {
    const fn text(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Text,
            default: Some(default),
        }
    }

    pub fn default_value(&self) -> Option<ParamValue> {
        self.default.map(|raw| ParamValue::parse(self.kind, raw))
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct BlockDefinition {
    pub id: &'static str,
    pub kind: BlockKind,
    pub category: &'static str,
    pub label: &'static str,
    pub template: &'static str,
    pub parameters: &'static [ParamSpec],
}

impl BlockDefinition {
    pub fn param_spec(&self, name: &str) -> Option<&'static ParamSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn can_own_children(&self) -> bool {
        self.kind.can_own_children()
    }
}

pub struct Catalog {
    definitions: &'static [BlockDefinition],
}

static BUILTIN: Catalog = Catalog {
    definitions: BUILTIN_BLOCKS,
};

impl Catalog {
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    pub fn lookup(&self, id: &str) -> Option<&'static BlockDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn definitions(&self) -> &'static [BlockDefinition] {
        self.definitions
    }

    /// Categories in first-appearance order, as the block library lists them.
    pub fn categories(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = Vec::new();
        for def in self.definitions {
            if !out.contains(&def.category) {
                out.push(def.category);
            }
        }
        out
    }

    pub fn in_category(&self, category: &str) -> Vec<&'static BlockDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.category == category)
            .collect()
    }
}

pub fn lookup(id: &str) -> Option<&'static BlockDefinition> {
    Catalog::builtin().lookup(id)
}

/// Turns a raw parameter value into the text spliced into a template.
pub type ParamFormatter = fn(&str) -> String;

#[derive(Debug, Clone, Copy)]
enum RuleTarget {
    Id(&'static str),
    Kind(BlockKind),
}

struct FormatRule {
    target: RuleTarget,
    param: &'static str,
    format: ParamFormatter,
}

const FORMAT_RULES: &[FormatRule] = &[
    FormatRule {
        target: RuleTarget::Id("import"),
        param: "alias",
        format: format_as_clause,
    },
    FormatRule {
        target: RuleTarget::Kind(BlockKind::Output),
        param: "message",
        format: quote_message,
    },
    FormatRule {
        target: RuleTarget::Id("class"),
        param: "parent",
        format: format_base_class,
    },
    FormatRule {
        target: RuleTarget::Id("except"),
        param: "variable",
        format: format_as_clause,
    },
];

/// Formatter for `param` of `def`, if the block has one. Rules keyed by id
/// win over rules keyed by kind.
pub fn formatter_for(def: &BlockDefinition, param: &str) -> Option<ParamFormatter> {
    let by_id = FORMAT_RULES.iter().find(|rule| {
        rule.param == param && matches!(rule.target, RuleTarget::Id(id) if id == def.id)
    });
    let by_kind = || {
        FORMAT_RULES.iter().find(|rule| {
            rule.param == param && matches!(rule.target, RuleTarget::Kind(kind) if kind == def.kind)
        })
    };
    by_id.or_else(by_kind).map(|rule| rule.format)
}

fn format_as_clause(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(" as {}", trimmed)
    }
}

fn format_base_class(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("({})", trimmed)
    }
}

fn quote_message(value: &str) -> String {
    if value.starts_with('"') || value.starts_with('\'') || value.contains('(') {
        value.to_string()
    } else {
        format!("\"{}\"", value)
    }
}

const NO_PARAMS: &[ParamSpec] = &[];

const BUILTIN_BLOCKS: &[BlockDefinition] = &[
    BlockDefinition {
        id: "import",
        kind: BlockKind::Import,
        category: "Libraries",
        label: "Import Library",
        template: "import {library}{alias}",
        parameters: &[
            ParamSpec::text("library", "math"),
            ParamSpec::text("alias", ""),
        ],
    },
    BlockDefinition {
        id: "variable",
        kind: BlockKind::Variable,
        category: "Variables",
        label: "Create Variable",
        template: "{name} = {value}",
        parameters: &[
            ParamSpec::text("name", "my_var"),
            ParamSpec::text("value", "0"),
        ],
    },
    BlockDefinition {
        id: "print",
        kind: BlockKind::Output,
        category: "Output",
        label: "Print",
        template: "print({message})",
        parameters: &[ParamSpec::text("message", "Hello, World!")],
    },
    BlockDefinition {
        id: "if",
        kind: BlockKind::Control,
        category: "Control",
        label: "If Statement",
        template: "if {condition}:",
        parameters: &[ParamSpec::text("condition", "True")],
    },
    BlockDefinition {
        id: "elif",
        kind: BlockKind::Control,
        category: "Control",
        label: "Elif Statement",
        template: "elif {condition}:",
        parameters: &[ParamSpec::text("condition", "True")],
    },
    BlockDefinition {
        id: "else",
        kind: BlockKind::Control,
        category: "Control",
        label: "Else Statement",
        template: "else:",
        parameters: NO_PARAMS,
    },
    BlockDefinition {
        id: "for",
        kind: BlockKind::Control,
        category: "Control",
        label: "For Loop",
        template: "for {variable} in {range}:",
        parameters: &[
            ParamSpec::text("variable", "i"),
            ParamSpec::text("range", "range(5)"),
        ],
    },
    BlockDefinition {
        id: "while",
        kind: BlockKind::Control,
        category: "Control",
        label: "While Loop",
        template: "while {condition}:",
        parameters: &[ParamSpec::text("condition", "True")],
    },
    BlockDefinition {
        id: "function",
        kind: BlockKind::Function,
        category: "Functions",
        label: "Define Function",
        template: "def {name}({params}):",
        parameters: &[
            ParamSpec::text("name", "my_function"),
            ParamSpec::text("params", ""),
        ],
    },
    BlockDefinition {
        id: "class",
        kind: BlockKind::Class,
        category: "Classes",
        label: "Define Class",
        template: "class {name}{parent}:",
        parameters: &[
            ParamSpec::text("name", "MyClass"),
            ParamSpec::text("parent", ""),
        ],
    },
    BlockDefinition {
        id: "method",
        kind: BlockKind::Method,
        category: "Classes",
        label: "Define Method",
        template: "def {name}({params}):",
        parameters: &[
            ParamSpec::text("name", "__init__"),
            ParamSpec::text("params", "self"),
        ],
    },
    BlockDefinition {
        id: "attribute",
        kind: BlockKind::Attribute,
        category: "Classes",
        label: "Set Attribute",
        template: "{object}.{name} = {value}",
        parameters: &[
            ParamSpec::text("object", "self"),
            ParamSpec::text("name", "attribute"),
            ParamSpec::text("value", "None"),
        ],
    },
    BlockDefinition {
        id: "instantiate",
        kind: BlockKind::Instantiate,
        category: "Classes",
        label: "Create Instance",
        template: "{variable} = {class_name}({args})",
        parameters: &[
            ParamSpec::text("variable", "obj"),
            ParamSpec::text("class_name", "MyClass"),
            ParamSpec::text("args", ""),
        ],
    },
    BlockDefinition {
        id: "method_call",
        kind: BlockKind::MethodCall,
        category: "Classes",
        label: "Call Method",
        template: "{object}.{method}({args})",
        parameters: &[
            ParamSpec::text("object", "obj"),
            ParamSpec::text("method", "method_name"),
            ParamSpec::text("args", ""),
        ],
    },
    BlockDefinition {
        id: "match",
        kind: BlockKind::Control,
        category: "Control",
        label: "Match Statement",
        template: "match {value}:",
        parameters: &[ParamSpec::text("value", "variable")],
    },
    BlockDefinition {
        id: "case",
        kind: BlockKind::Control,
        category: "Control",
        label: "Case",
        template: "case {pattern}:",
        parameters: &[ParamSpec::text("pattern", "1")],
    },
    BlockDefinition {
        id: "case_default",
        kind: BlockKind::Control,
        category: "Control",
        label: "Case Default",
        template: "case _:",
        parameters: NO_PARAMS,
    },
    BlockDefinition {
        id: "try",
        kind: BlockKind::Control,
        category: "Error Handling",
        label: "Try Block",
        template: "try:",
        parameters: NO_PARAMS,
    },
    BlockDefinition {
        id: "except",
        kind: BlockKind::Control,
        category: "Error Handling",
        label: "Except Block",
        template: "except {exception}{variable}:",
        parameters: &[
            ParamSpec::text("exception", "Exception"),
            ParamSpec::text("variable", ""),
        ],
    },
    BlockDefinition {
        id: "finally",
        kind: BlockKind::Control,
        category: "Error Handling",
        label: "Finally Block",
        template: "finally:",
        parameters: NO_PARAMS,
    },
    BlockDefinition {
        id: "raise",
        kind: BlockKind::Control,
        category: "Error Handling",
        label: "Raise Exception",
        template: "raise {exception}",
        parameters: &[ParamSpec::text("exception", "ValueError(\"Error message\")")],
    },
    BlockDefinition {
        id: "return",
        kind: BlockKind::Control,
        category: "Functions",
        label: "Return Value",
        template: "return {value}",
        parameters: &[ParamSpec::text("value", "None")],
    },
    BlockDefinition {
        id: "break",
        kind: BlockKind::Control,
        category: "Control",
        label: "Break Loop",
        template: "break",
        parameters: NO_PARAMS,
    },
    BlockDefinition {
        id: "continue",
        kind: BlockKind::Control,
        category: "Control",
        label: "Continue Loop",
        template: "continue",
        parameters: NO_PARAMS,
    },
    BlockDefinition {
        id: "input",
        kind: BlockKind::Input,
        category: "Input/Output",
        label: "Get Input",
        template: "{variable} = input(\"{prompt}\")",
        parameters: &[
            ParamSpec::text("variable", "user_input"),
            ParamSpec::text("prompt", "Enter value: "),
        ],
    },
    BlockDefinition {
        id: "list",
        kind: BlockKind::Data,
        category: "Data Structures",
        label: "Create List",
        template: "{name} = [{items}]",
        parameters: &[
            ParamSpec::text("name", "my_list"),
            ParamSpec::text("items", "1, 2, 3"),
        ],
    },
    BlockDefinition {
        id: "dict",
        kind: BlockKind::Data,
        category: "Data Structures",
        label: "Create Dictionary",
        template: "{name} = {{items}}",
        parameters: &[
            ParamSpec::text("name", "my_dict"),
            ParamSpec::text("items", "\"key\": \"value\""),
        ],
    },
    BlockDefinition {
        id: "comment",
        kind: BlockKind::Documentation,
        category: "Documentation",
        label: "Add Comment",
        template: "# {text}",
        parameters: &[ParamSpec::text("text", "This is a comment")],
    },
    BlockDefinition {
        id: "len",
        kind: BlockKind::Builtin,
        category: "Built-in Functions",
        label: "Get Length",
        template: "{variable} = len({object})",
        parameters: &[
            ParamSpec::text("variable", "result"),
            ParamSpec::text("object", "my_list"),
        ],
    },
    BlockDefinition {
        id: "range",
        kind: BlockKind::Builtin,
        category: "Built-in Functions",
        label: "Create Range",
        template: "{variable} = range({start}, {stop}, {step})",
        parameters: &[
            ParamSpec::text("variable", "numbers"),
            ParamSpec::text("start", "0"),
            ParamSpec::text("stop", "10"),
            ParamSpec::text("step", "1"),
        ],
    },
];
