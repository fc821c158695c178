//! Application parameter tree
//!
//! Parameters are named, typed value slots owned by a [`ParameterGroup`]
//! hierarchy. Anything outside the tree (the link engine, the console) only
//! ever holds a [`ParamHandle`], a non-owning reference that goes stale once
//! the owning tree drops the parameter.

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Separator between segments of a fully-qualified parameter path
pub const PATH_SEPARATOR: char = '/';

/// Callback invoked after every write to a parameter
///
/// # Arguments
/// * `path` - Fully-qualified parameter path (e.g., "lights/dimmer")
/// * `value` - Value after the write
pub type ChangeListener = Arc<dyn Fn(&str, &ParamValue) + Send + Sync>;

/// Current value of a parameter, tagged by type
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Bounded floating point value
    Float { min: f32, max: f32, value: f32 },
    /// Bounded integer value
    Int { min: i32, max: i32, value: i32 },
    /// On/off value
    Bool(bool),
    /// Stateless action
    Trigger,
    /// Free text (not linkable)
    Text(String),
}

impl ParamValue {
    /// Type tag of this value
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Float { .. } => ParamKind::Float,
            ParamValue::Int { .. } => ParamKind::Int,
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Trigger => ParamKind::Trigger,
            ParamValue::Text(_) => ParamKind::Text,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float { min, max, value } => write!(f, "{:.3} [{}..{}]", value, min, max),
            ParamValue::Int { min, max, value } => write!(f, "{} [{}..{}]", value, min, max),
            ParamValue::Bool(value) => write!(f, "{}", if *value { "on" } else { "off" }),
            ParamValue::Trigger => write!(f, "(trigger)"),
            ParamValue::Text(value) => write!(f, "\"{}\"", value),
        }
    }
}

/// Parameter type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Float,
    Int,
    Bool,
    Trigger,
    Text,
}

impl ParamKind {
    /// Whether a hardware control can drive parameters of this type
    pub fn is_linkable(self) -> bool {
        matches!(
            self,
            ParamKind::Float | ParamKind::Int | ParamKind::Bool | ParamKind::Trigger
        )
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Float => "float",
            ParamKind::Int => "int",
            ParamKind::Bool => "bool",
            ParamKind::Trigger => "trigger",
            ParamKind::Text => "text",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single named, mutable value slot
pub struct Parameter {
    path: String,
    value: RwLock<ParamValue>,
    /// Bumped on every write and every trigger fire
    revision: AtomicU64,
    fired: AtomicU64,
    listeners: RwLock<Vec<ChangeListener>>,
}

impl Parameter {
    /// Create a free-standing parameter at `path`
    pub fn new(path: impl Into<String>, value: ParamValue) -> Arc<Self> {
        Arc::new(Self {
            path: path.into(),
            value: RwLock::new(value),
            revision: AtomicU64::new(0),
            fired: AtomicU64::new(0),
            listeners: RwLock::new(Vec::new()),
        })
    }

    /// Fully-qualified path through the parameter tree
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment
    pub fn name(&self) -> &str {
        self.path
            .rsplit(PATH_SEPARATOR)
            .next()
            .unwrap_or(&self.path)
    }

    pub fn kind(&self) -> ParamKind {
        self.value.read().kind()
    }

    /// Snapshot of the current value
    pub fn value(&self) -> ParamValue {
        self.value.read().clone()
    }

    /// Number of writes (and trigger fires) so far
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Number of times a trigger parameter has fired
    pub fn fire_count(&self) -> u64 {
        self.fired.load(Ordering::Acquire)
    }

    pub fn as_float(&self) -> Option<f32> {
        match *self.value.read() {
            ParamValue::Float { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match *self.value.read() {
            ParamValue::Int { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self.value.read() {
            ParamValue::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// Register a change listener
    pub fn add_listener(&self, listener: ChangeListener) {
        self.listeners.write().push(listener);
    }

    /// Set a float parameter. Returns false if the parameter is not a float.
    pub fn set_float(&self, new_value: f32) -> bool {
        self.write(|value| match value {
            ParamValue::Float { value, .. } => {
                *value = new_value;
                true
            }
            _ => false,
        })
    }

    /// Set an integer parameter. Returns false if the parameter is not an int.
    pub fn set_int(&self, new_value: i32) -> bool {
        self.write(|value| match value {
            ParamValue::Int { value, .. } => {
                *value = new_value;
                true
            }
            _ => false,
        })
    }

    /// Set a boolean parameter. Returns false if the parameter is not a bool.
    pub fn set_bool(&self, new_value: bool) -> bool {
        self.write(|value| match value {
            ParamValue::Bool(value) => {
                *value = new_value;
                true
            }
            _ => false,
        })
    }

    /// Fire a trigger parameter. Returns false if the parameter is not a trigger.
    pub fn trigger(&self) -> bool {
        let fired = self.write(|value| matches!(value, ParamValue::Trigger));
        if fired {
            self.fired.fetch_add(1, Ordering::AcqRel);
        }
        fired
    }

    /// Non-owning reference to this parameter
    pub fn handle(self: &Arc<Self>) -> ParamHandle {
        ParamHandle {
            path: self.path.clone(),
            target: Arc::downgrade(self),
        }
    }

    /// Apply `update` under the write lock, then notify listeners outside it
    fn write(&self, update: impl FnOnce(&mut ParamValue) -> bool) -> bool {
        let snapshot = {
            let mut value = self.value.write();
            if !update(&mut *value) {
                return false;
            }
            value.clone()
        };

        self.revision.fetch_add(1, Ordering::AcqRel);

        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener(&self.path, &snapshot);
        }
        true
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("path", &self.path)
            .field("value", &*self.value.read())
            .field("revision", &self.revision())
            .finish()
    }
}

/// Non-owning reference to a parameter
///
/// Keeps the path so a binding can still be described (and persisted) after
/// the owner has dropped the parameter.
#[derive(Debug, Clone)]
pub struct ParamHandle {
    path: String,
    target: Weak<Parameter>,
}

impl ParamHandle {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Upgrade to the live parameter, `None` if its owner dropped it
    pub fn get(&self) -> Option<Arc<Parameter>> {
        self.target.upgrade()
    }

    pub fn is_stale(&self) -> bool {
        self.target.strong_count() == 0
    }

    /// Whether both handles point at the same live parameter
    pub fn same_target(&self, other: &ParamHandle) -> bool {
        Weak::ptr_eq(&self.target, &other.target)
    }
}

/// Node of the parameter tree
#[derive(Debug, Clone)]
pub enum ParamNode {
    Parameter(Arc<Parameter>),
    Group(ParameterGroup),
}

impl ParamNode {
    pub fn name(&self) -> &str {
        match self {
            ParamNode::Parameter(param) => param.name(),
            ParamNode::Group(group) => group.name(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            ParamNode::Parameter(param) => param.path(),
            ParamNode::Group(group) => group.path(),
        }
    }
}

/// Hierarchical group of parameters
#[derive(Debug, Clone, Default)]
pub struct ParameterGroup {
    name: String,
    path: String,
    children: Vec<ParamNode>,
}

impl ParameterGroup {
    /// Create an empty root group
    pub fn root() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully-qualified path (empty for the root)
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn children(&self) -> &[ParamNode] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn child_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}{}{}", self.path, PATH_SEPARATOR, name)
        }
    }

    fn add(&mut self, name: &str, value: ParamValue) -> Arc<Parameter> {
        let param = Parameter::new(self.child_path(name), value);
        self.children.push(ParamNode::Parameter(param.clone()));
        param
    }

    pub fn float(&mut self, name: &str, min: f32, max: f32, value: f32) -> Arc<Parameter> {
        self.add(name, ParamValue::Float { min, max, value })
    }

    pub fn int(&mut self, name: &str, min: i32, max: i32, value: i32) -> Arc<Parameter> {
        self.add(name, ParamValue::Int { min, max, value })
    }

    pub fn bool(&mut self, name: &str, value: bool) -> Arc<Parameter> {
        self.add(name, ParamValue::Bool(value))
    }

    pub fn trigger(&mut self, name: &str) -> Arc<Parameter> {
        self.add(name, ParamValue::Trigger)
    }

    pub fn text(&mut self, name: &str, value: &str) -> Arc<Parameter> {
        self.add(name, ParamValue::Text(value.to_string()))
    }

    /// Append a sub-group and return it for further building
    pub fn group(&mut self, name: &str) -> &mut ParameterGroup {
        let group = ParameterGroup {
            name: name.to_string(),
            path: self.child_path(name),
            children: Vec::new(),
        };
        self.children.push(ParamNode::Group(group));
        match self.children.last_mut() {
            Some(ParamNode::Group(group)) => group,
            _ => unreachable!("just pushed a group"),
        }
    }

    /// Remove a direct child by name, dropping the tree's ownership of it
    pub fn remove(&mut self, name: &str) -> Option<ParamNode> {
        let index = self.children.iter().position(|c| c.name() == name)?;
        Some(self.children.remove(index))
    }

    /// Resolve a path relative to this group
    pub fn node(&self, path: &str) -> Option<&ParamNode> {
        let path = path.trim_matches(PATH_SEPARATOR);
        let (head, rest) = match path.split_once(PATH_SEPARATOR) {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        let child = self.children.iter().find(|c| c.name() == head)?;
        match (child, rest) {
            (_, None) => Some(child),
            (ParamNode::Group(group), Some(rest)) => group.node(rest),
            (ParamNode::Parameter(_), Some(_)) => None,
        }
    }

    /// Resolve a parameter by path relative to this group
    pub fn find(&self, path: &str) -> Option<Arc<Parameter>> {
        match self.node(path)? {
            ParamNode::Parameter(param) => Some(param.clone()),
            ParamNode::Group(_) => None,
        }
    }

    /// All parameters, depth-first in declaration order
    pub fn parameters(&self) -> Vec<Arc<Parameter>> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect(&self, out: &mut Vec<Arc<Parameter>>) {
        for child in &self.children {
            match child {
                ParamNode::Parameter(param) => out.push(param.clone()),
                ParamNode::Group(group) => group.collect(out),
            }
        }
    }
}
