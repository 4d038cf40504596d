use std::{collections::HashMap, fmt, sync::Arc};

use serde_json::Value;
use studio_bridge_protocol as protocol;

use crate::{BridgeError, Result};

pub type FunctionCallback = Arc<dyn Fn(Value) + Send + Sync>;

/// A capability the host may invoke on the guest.
///
/// Only the name, description and parameter schema cross the wire; the
/// callback stays in the guest's registry.
#[derive(Clone)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    /// JSON schema describing the arguments object.
    pub parameters: Value,
    callback: FunctionCallback,
}

impl FunctionDeclaration {
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        callback: F,
    ) -> Self
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            callback: Arc::new(callback),
        }
    }

    pub fn descriptor(&self) -> protocol::FunctionDeclaration {
        protocol::FunctionDeclaration {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

impl fmt::Debug for FunctionDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDeclaration")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("callback", &"<function>")
            .finish()
    }
}

#[derive(Default)]
pub(crate) struct FunctionRegistry {
    callbacks: HashMap<String, FunctionCallback>,
}

impl FunctionRegistry {
    /// Splits declarations into the local registry and the descriptors sent
    /// to the host, keeping declaration order for the latter.
    pub(crate) fn from_declarations(
        declarations: Vec<FunctionDeclaration>,
    ) -> Result<(Self, Vec<protocol::FunctionDeclaration>)> {
        let mut callbacks = HashMap::with_capacity(declarations.len());
        let mut descriptors = Vec::with_capacity(declarations.len());

        for declaration in declarations {
            descriptors.push(declaration.descriptor());
            if callbacks
                .insert(declaration.name.clone(), declaration.callback)
                .is_some()
            {
                return Err(BridgeError::DuplicateFunction(declaration.name));
            }
        }

        Ok((Self { callbacks }, descriptors))
    }

    pub(crate) fn get(&self, name: &str) -> Option<FunctionCallback> {
        self.callbacks.get(name).cloned()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.callbacks.contains_key(name)
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.callbacks.keys()).finish()
    }
}
