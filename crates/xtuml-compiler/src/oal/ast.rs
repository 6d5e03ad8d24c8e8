//! Statement forms of the action language.
//!
//! Expressions stay as source text: they are rewritten token-wise by the
//! expression translator rather than parsed into a tree.

/// `any` / `one` / `many` in a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Any,
    One,
    Many,
}

impl Cardinality {
    pub fn is_many(self) -> bool {
        self == Cardinality::Many
    }
}

/// One `->Class[Rn]` step of a navigation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub class: String,
    pub rel_id: String,
}

/// A call argument, either `name: value` or a bare value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: Option<String>,
    pub value: String,
}

/// Left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignTarget {
    Local(String),
    Attribute { object: String, attribute: String },
}

/// A parsed OAL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Comment(String),

    If { condition: String },
    ElseIf { condition: String },
    Else,
    EndIf,
    ForEach { var: String, collection: String },
    EndFor,
    While { condition: String },
    EndWhile,
    Break,
    Continue,
    Return { value: Option<String> },

    SelectFromInstances {
        cardinality: Cardinality,
        var: String,
        class_ref: String,
        condition: Option<String>,
    },
    SelectRelated {
        cardinality: Cardinality,
        var: String,
        source: String,
        hops: Vec<Hop>,
        condition: Option<String>,
    },
    CreateObject { var: String, class_ref: String },
    DeleteObject { var: String },

    Relate {
        source: String,
        target: String,
        rel_id: String,
        using: Option<String>,
    },
    Unrelate {
        source: String,
        target: String,
        rel_id: String,
        using: Option<String>,
    },
    /// `unrelate a from s->T[R1] across R2`
    UnrelateNavigated {
        source: String,
        nav_source: String,
        nav: Hop,
        rel_id: String,
    },

    Send {
        message: String,
        args: Vec<Argument>,
        target: String,
    },
    CreateEvent {
        var: String,
        key_letters: Option<String>,
        label: String,
        args: Vec<Argument>,
        target: String,
    },
    Generate {
        key_letters: Option<String>,
        event: String,
        args: Vec<Argument>,
        target: String,
    },
    /// `generate evt;` for a previously created event instance.
    GenerateInstance { var: String },

    BridgeCall {
        entity: String,
        operation: String,
        args: Vec<Argument>,
    },
    FunctionCall { name: String, args: Vec<Argument> },
    MethodCall {
        object: String,
        method: String,
        args: Vec<Argument>,
    },
    Assign { target: AssignTarget, value: String },

    Unrecognized(String),
}

impl Statement {
    /// Statements that open an indented block.
    pub fn opens_block(&self) -> bool {
        matches!(
            self,
            Statement::If { .. } | Statement::ForEach { .. } | Statement::While { .. }
        )
    }

    /// Relationship ids this statement depends on.
    pub fn relationship_ids(&self) -> Vec<&str> {
        match self {
            Statement::SelectRelated { hops, .. } => {
                hops.iter().map(|h| h.rel_id.as_str()).collect()
            }
            Statement::Relate { rel_id, .. } | Statement::Unrelate { rel_id, .. } => {
                vec![rel_id.as_str()]
            }
            Statement::UnrelateNavigated { nav, rel_id, .. } => {
                vec![nav.rel_id.as_str(), rel_id.as_str()]
            }
            _ => Vec::new(),
        }
    }
}

/// A statement with its 1-based line number within the action body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub line_no: usize,
    pub text: String,
    pub statement: Statement,
}
