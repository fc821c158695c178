//! Learn trigger capability
//!
//! Whatever currently has operator focus (a tree node picked in the console,
//! a widget in a host UI) exposes at most one parameter that a hardware
//! control could be linked to.

use crate::params::{ParamNode, Parameter};
use std::sync::Arc;

/// Something that may expose a linkable parameter
pub trait Linkable {
    /// The parameter a control would drive, if any
    fn as_linkable_parameter(&self) -> Option<Arc<Parameter>>;
}

impl Linkable for Arc<Parameter> {
    fn as_linkable_parameter(&self) -> Option<Arc<Parameter>> {
        Some(self.clone())
    }
}

impl Linkable for ParamNode {
    fn as_linkable_parameter(&self) -> Option<Arc<Parameter>> {
        match self {
            ParamNode::Parameter(param) => Some(param.clone()),
            ParamNode::Group(_) => None,
        }
    }
}
