//! Process-wide registry of configuration variables keyed by name.

use std::any::{TypeId, type_name};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use tessera_primitives::{ConfigName, Node};
use tracing::{debug, error, info};

use crate::error::{ConfigError, ConfigResult};
use crate::loader::flatten;
use crate::var::{ConfigValue, ConfigVar, ConfigVarBase};

struct Entry {
    var: Arc<dyn ConfigVarBase>,
    value_type: TypeId,
}

impl Entry {
    fn downcast<T: ConfigValue>(&self, name: &str) -> ConfigResult<Arc<ConfigVar<T>>> {
        let mismatch = || ConfigError::TypeMismatch {
            name: name.to_owned(),
            expected: type_name::<T>(),
            actual: self.var.type_name(),
        };
        if self.value_type != TypeId::of::<T>() {
            return Err(mismatch());
        }
        Arc::clone(&self.var)
            .into_any()
            .downcast::<ConfigVar<T>>()
            .map_err(|_| mismatch())
    }
}

/// Resolves `name` against an already locked table.
fn existing<T: ConfigValue>(
    vars: &BTreeMap<String, Entry>,
    name: &str,
) -> Option<ConfigResult<Arc<ConfigVar<T>>>> {
    let entry = vars.get(name)?;
    let found = entry.downcast::<T>(name);
    match &found {
        Ok(_) => debug!(name, "configuration lookup hit existing variable"),
        Err(_) => error!(
            name,
            actual = entry.var.type_name(),
            actual_value = %entry.var.to_text(),
            expected = type_name::<T>(),
            "configuration lookup type mismatch"
        ),
    }
    Some(found)
}

/// Registry that stores configuration variables keyed by name.
///
/// One lock guards the name table; every variable carries its own lock for its
/// value, so updating a variable never blocks lookups of other names.
#[derive(Default)]
pub struct ConfigRegistry {
    vars: RwLock<BTreeMap<String, Entry>>,
}

impl fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vars = self.vars.read().expect("config registry poisoned");
        let names: Vec<_> = vars.keys().cloned().collect();
        f.debug_struct("ConfigRegistry")
            .field("registered", &names)
            .finish()
    }
}

impl ConfigRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry, creating it on first use.
    #[must_use]
    pub fn global() -> &'static ConfigRegistry {
        static GLOBAL: OnceLock<ConfigRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ConfigRegistry::new)
    }

    /// Returns the variable `name`, registering it with `default` if absent.
    ///
    /// Repeated calls with the same name and type return the same handle.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TypeMismatch`] when `name` is registered with a
    /// different value type; the existing variable is left untouched. Returns
    /// [`ConfigError::InvalidName`] when `name` is absent and is not a valid
    /// [`ConfigName`].
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    pub fn lookup<T: ConfigValue>(
        &self,
        name: &str,
        default: T,
        description: &str,
    ) -> ConfigResult<Arc<ConfigVar<T>>> {
        {
            let vars = self.vars.read().expect("config registry poisoned");
            if let Some(found) = existing::<T>(&vars, name) {
                return found;
            }
        }

        let mut vars = self.vars.write().expect("config registry poisoned");
        // Another thread may have registered the name between the two locks.
        if let Some(found) = existing::<T>(&vars, name) {
            return found;
        }

        let config_name = ConfigName::new(name).inspect_err(|err| {
            error!(name, error = %err, "configuration lookup with invalid name");
        })?;
        let var = Arc::new(ConfigVar::new(config_name, default, description));
        vars.insert(
            name.to_owned(),
            Entry {
                var: Arc::clone(&var) as Arc<dyn ConfigVarBase>,
                value_type: TypeId::of::<T>(),
            },
        );
        info!(name, type_name = type_name::<T>(), "registered configuration variable");
        Ok(var)
    }

    /// Returns the variable `name` when it exists with value type `T`.
    ///
    /// Never creates a variable.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn get<T: ConfigValue>(&self, name: &str) -> Option<Arc<ConfigVar<T>>> {
        let vars = self.vars.read().expect("config registry poisoned");
        vars.get(name)?.downcast::<T>(name).ok()
    }

    /// Returns the type-erased variable `name`.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn lookup_base(&self, name: &str) -> Option<Arc<dyn ConfigVarBase>> {
        let vars = self.vars.read().expect("config registry poisoned");
        vars.get(name).map(|entry| Arc::clone(&entry.var))
    }

    /// Applies a document to the registered variables.
    ///
    /// The document is flattened into dotted lower-case paths (see
    /// [`crate::flatten`]). Each path that names a registered variable is fed
    /// to that variable's `from_text`: scalar nodes as their text, other nodes
    /// as their structured text. Paths without a variable are ignored, and a
    /// variable that rejects its text keeps its value without stopping the load.
    ///
    /// Variables are updated one at a time; a concurrent reader may observe some
    /// paths updated and others not.
    ///
    /// Returns the number of variables that accepted their text.
    pub fn load(&self, root: &Node) -> usize {
        let mut applied = 0;
        for (path, node) in flatten(root) {
            let Some(var) = self.lookup_base(&path) else {
                continue;
            };
            if var.from_text(&node.to_text()).is_ok() {
                applied += 1;
            }
        }
        debug!(applied, "configuration document loaded");
        applied
    }

    /// Parses JSON text and applies it with [`ConfigRegistry::load`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Document`] when the text is not a valid document.
    pub fn load_from_text(&self, text: &str) -> ConfigResult<usize> {
        let root = Node::parse_document(text)?;
        Ok(self.load(&root))
    }

    /// Invokes `visitor` once per registered variable, in name order.
    ///
    /// The registry read lock is held for the whole visit; the visitor must not
    /// register new variables.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    pub fn visit<F>(&self, mut visitor: F)
    where
        F: FnMut(&dyn ConfigVarBase),
    {
        let vars = self.vars.read().expect("config registry poisoned");
        for entry in vars.values() {
            visitor(entry.var.as_ref());
        }
    }

    /// Returns the number of registered variables.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.read().expect("config registry poisoned").len()
    }

    /// Returns `true` when no variable is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
