//! Textual snapshots of call arguments.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Textual snapshot of the arguments a function was called with.
///
/// Only the `Debug` representation of each value is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSnapshot {
    /// Positional arguments, in order.
    #[serde(rename = "args")]
    pub positional: Vec<String>,
    /// Named arguments.
    #[serde(rename = "kwargs")]
    pub named: BTreeMap<String, String>,
}

impl ArgSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn positional(mut self, value: &impl Debug) -> Self {
        self.positional.push(format!("{:?}", value));
        self
    }

    /// Add a named argument.
    pub fn named(mut self, name: impl Into<String>, value: &impl Debug) -> Self {
        self.named.insert(name.into(), format!("{:?}", value));
        self
    }

    /// Check if no arguments were recorded.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Render as `{"args":[...],"kwargs":{...}}`.
    pub fn to_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// Argument lists that can be snapshotted before a traced call.
pub trait CallArgs {
    /// Take a textual snapshot of the arguments.
    fn snapshot(&self) -> ArgSnapshot;
}

impl CallArgs for ArgSnapshot {
    fn snapshot(&self) -> ArgSnapshot {
        self.clone()
    }
}

impl CallArgs for () {
    fn snapshot(&self) -> ArgSnapshot {
        ArgSnapshot::new()
    }
}

macro_rules! impl_call_args_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: Debug),+> CallArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn snapshot(&self) -> ArgSnapshot {
                let ($($name,)+) = self;
                ArgSnapshot::new()$(.positional($name))+
            }
        }
    };
}

impl_call_args_for_tuple!(A);
impl_call_args_for_tuple!(A, B);
impl_call_args_for_tuple!(A, B, C);
impl_call_args_for_tuple!(A, B, C, D);
impl_call_args_for_tuple!(A, B, C, D, E);
impl_call_args_for_tuple!(A, B, C, D, E, F);
impl_call_args_for_tuple!(A, B, C, D, E, F, G);
impl_call_args_for_tuple!(A, B, C, D, E, F, G, H);
