//! Named, typed, change-observable configuration values.

use std::any::{Any, TypeId, type_name};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tessera_primitives::ConfigName;
use tracing::error;

use crate::codec::Codec;
use crate::error::{ConfigError, ConfigResult};

/// Identifier returned by [`ConfigVar::add_listener`].
pub type ListenerId = u64;

/// Change callback invoked with `(old, new)`.
pub type Listener<T> = Arc<dyn Fn(&T, &T) + Send + Sync>;

/// Values that can live inside a [`ConfigVar`].
pub trait ConfigValue: Codec + Clone + PartialEq + Send + Sync + 'static {}

impl<T> ConfigValue for T where T: Codec + Clone + PartialEq + Send + Sync + 'static {}

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

struct VarState<T> {
    value: T,
    listeners: BTreeMap<ListenerId, Listener<T>>,
}

/// A named configuration value with change listeners.
///
/// Reads take a shared lock and return a clone of the value. Writes run in two
/// phases: listeners are notified with `(old, new)` first, then the new value is
/// stored under the write lock. A listener therefore still observes the old value
/// through [`ConfigVar::get_value`], and two racing writers may notify in a
/// different order than they store.
pub struct ConfigVar<T> {
    name: ConfigName,
    description: String,
    state: RwLock<VarState<T>>,
}

impl<T: ConfigValue> ConfigVar<T> {
    /// Creates a detached variable. Registry-owned variables are created through
    /// [`crate::ConfigRegistry::lookup`].
    #[must_use]
    pub fn new(name: ConfigName, value: T, description: impl Into<String>) -> Self {
        Self {
            name,
            description: description.into(),
            state: RwLock::new(VarState {
                value,
                listeners: BTreeMap::new(),
            }),
        }
    }

    /// Returns the variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns a snapshot of the current value.
    ///
    /// # Panics
    ///
    /// Panics if the variable lock is poisoned.
    #[must_use]
    pub fn get_value(&self) -> T {
        self.state.read().expect("config var poisoned").value.clone()
    }

    /// Replaces the value, notifying listeners in registration order.
    ///
    /// Setting a value equal to the current one is a no-op and notifies nobody.
    /// Listeners run on the calling thread and must not call `set_value` on the
    /// same variable.
    ///
    /// # Panics
    ///
    /// Panics if the variable lock is poisoned.
    pub fn set_value(&self, value: T) {
        let (old, listeners) = {
            let state = self.state.read().expect("config var poisoned");
            if state.value == value {
                return;
            }
            let listeners: Vec<_> = state.listeners.values().cloned().collect();
            (state.value.clone(), listeners)
        };

        for listener in &listeners {
            listener(&old, &value);
        }

        self.state.write().expect("config var poisoned").value = value;
    }

    /// Registers a change listener and returns its identifier.
    ///
    /// # Panics
    ///
    /// Panics if the variable lock is poisoned.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        let id = NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed);
        self.state
            .write()
            .expect("config var poisoned")
            .listeners
            .insert(id, Arc::new(listener));
        id
    }

    /// Removes a listener, returning `true` if it was registered.
    ///
    /// # Panics
    ///
    /// Panics if the variable lock is poisoned.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.state
            .write()
            .expect("config var poisoned")
            .listeners
            .remove(&id)
            .is_some()
    }

    /// Removes every listener.
    ///
    /// # Panics
    ///
    /// Panics if the variable lock is poisoned.
    pub fn clear_listeners(&self) {
        self.state
            .write()
            .expect("config var poisoned")
            .listeners
            .clear();
    }

    /// Returns the listener registered under `id`.
    ///
    /// # Panics
    ///
    /// Panics if the variable lock is poisoned.
    #[must_use]
    pub fn listener(&self, id: ListenerId) -> Option<Listener<T>> {
        let state = self.state.read().expect("config var poisoned");
        state.listeners.get(&id).cloned()
    }

    /// Encodes the current value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Encode`] when the value cannot be encoded.
    ///
    /// # Panics
    ///
    /// Panics if the variable lock is poisoned.
    pub fn try_to_text(&self) -> ConfigResult<String> {
        let state = self.state.read().expect("config var poisoned");
        state.value.to_text().map_err(|source| ConfigError::Encode {
            name: self.name().to_owned(),
            source,
        })
    }

    /// Encodes the current value, returning an empty string on failure.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.try_to_text().unwrap_or_else(|err| {
            error!(name = %self.name, type_name = type_name::<T>(), error = %err, "failed to encode configuration value");
            String::new()
        })
    }

    /// Decodes `text` and stores the result through [`ConfigVar::set_value`].
    ///
    /// On failure the current value is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Decode`] when `text` does not decode into `T`.
    pub fn from_text(&self, text: &str) -> ConfigResult<()> {
        match T::from_text(text) {
            Ok(value) => {
                self.set_value(value);
                Ok(())
            }
            Err(source) => {
                error!(name = %self.name, type_name = type_name::<T>(), error = %source, "failed to decode configuration value");
                Err(ConfigError::Decode {
                    name: self.name().to_owned(),
                    source,
                })
            }
        }
    }
}

impl<T> fmt::Debug for ConfigVar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigVar")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("type", &type_name::<T>())
            .finish_non_exhaustive()
    }
}

/// Type-erased view of a [`ConfigVar`], as stored by the registry.
pub trait ConfigVarBase: Send + Sync {
    /// Returns the variable name.
    fn name(&self) -> &str;

    /// Returns the human-readable description.
    fn description(&self) -> &str;

    /// Returns the Rust type name of the value.
    fn type_name(&self) -> &'static str;

    /// Returns the [`TypeId`] of the value.
    fn value_type(&self) -> TypeId;

    /// Encodes the current value, returning an empty string on failure.
    fn to_text(&self) -> String;

    /// Decodes `text` into the current value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Decode`] when `text` does not decode; the
    /// current value is kept.
    fn from_text(&self, text: &str) -> ConfigResult<()>;

    /// Converts the handle for downcasting to the concrete [`ConfigVar`].
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: ConfigValue> ConfigVarBase for ConfigVar<T> {
    fn name(&self) -> &str {
        ConfigVar::name(self)
    }

    fn description(&self) -> &str {
        ConfigVar::description(self)
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn to_text(&self) -> String {
        ConfigVar::to_text(self)
    }

    fn from_text(&self, text: &str) -> ConfigResult<()> {
        ConfigVar::from_text(self, text)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn var<T: ConfigValue>(value: T) -> Arc<ConfigVar<T>> {
        Arc::new(ConfigVar::new(
            ConfigName::new("test.var").unwrap(),
            value,
            "test variable",
        ))
    }

    #[test]
    fn equal_value_notifies_nobody() {
        let v = var(8080);
        let calls = Arc::new(Mutex::new(0));
        let seen = Arc::clone(&calls);
        v.add_listener(move |_, _| *seen.lock().unwrap() += 1);

        v.set_value(8080);
        assert_eq!(*calls.lock().unwrap(), 0);

        v.set_value(9090);
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(v.get_value(), 9090);
    }

    #[test]
    fn listeners_run_in_registration_order_with_old_and_new() {
        let v = var(String::from("a"));
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            v.add_listener(move |old: &String, new: &String| {
                log.lock().unwrap().push(format!("{tag}:{old}->{new}"));
            });
        }

        v.set_value(String::from("b"));
        assert_eq!(
            *log.lock().unwrap(),
            ["first:a->b", "second:a->b", "third:a->b"]
        );
    }

    #[test]
    fn listener_observes_old_value_during_notification() {
        let v = var(1);
        let observed = Arc::new(Mutex::new(None));
        let handle = Arc::clone(&v);
        let slot = Arc::clone(&observed);
        v.add_listener(move |_, _| *slot.lock().unwrap() = Some(handle.get_value()));

        v.set_value(2);
        assert_eq!(*observed.lock().unwrap(), Some(1));
        assert_eq!(v.get_value(), 2);
    }

    #[test]
    fn removed_and_cleared_listeners_stay_silent() {
        let v = var(0_u32);
        let calls = Arc::new(Mutex::new(0));
        let a = {
            let calls = Arc::clone(&calls);
            v.add_listener(move |_, _| *calls.lock().unwrap() += 1)
        };
        let b = {
            let calls = Arc::clone(&calls);
            v.add_listener(move |_, _| *calls.lock().unwrap() += 10)
        };
        assert!(b > a);
        assert!(v.listener(a).is_some());

        assert!(v.remove_listener(a));
        assert!(!v.remove_listener(a));
        v.set_value(1);
        assert_eq!(*calls.lock().unwrap(), 10);

        v.clear_listeners();
        assert!(v.listener(b).is_none());
        v.set_value(2);
        assert_eq!(*calls.lock().unwrap(), 10);
    }

    #[test]
    fn concurrent_writers_and_readers_see_whole_values() {
        const WRITERS: u32 = 4;
        const WRITES: u32 = 200;

        let v = var(vec![0_u32, 0]);
        let notified = Arc::new(Mutex::new(0));
        {
            let notified = Arc::clone(&notified);
            v.add_listener(move |_, _| *notified.lock().unwrap() += 1);
        }

        let writers: Vec<_> = (1..=WRITERS)
            .map(|writer| {
                let v = Arc::clone(&v);
                std::thread::spawn(move || {
                    for n in 1..=WRITES {
                        v.set_value(vec![writer, n]);
                    }
                })
            })
            .collect();
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let v = Arc::clone(&v);
                std::thread::spawn(move || {
                    for _ in 0..WRITES {
                        let value = v.get_value();
                        let [writer, n] = value[..] else {
                            panic!("torn value {value:?}");
                        };
                        assert!(writer <= WRITERS && n <= WRITES);
                        assert_eq!(writer == 0, n == 0);
                    }
                })
            })
            .collect();
        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }

        let last = v.get_value();
        let [writer, n] = last[..] else {
            panic!("torn value {last:?}");
        };
        assert!((1..=WRITERS).contains(&writer));
        assert!((1..=WRITES).contains(&n));
        // Every written value is distinct, so every write notifies once.
        assert_eq!(*notified.lock().unwrap(), WRITERS * WRITES);
    }

    #[test]
    fn from_text_failure_keeps_value() {
        let v = var(vec![1, 2]);
        let err = v.from_text("[1, \"two\"]").expect_err("bad element");
        assert!(matches!(err, ConfigError::Decode { ref name, .. } if name == "test.var"));
        assert_eq!(v.get_value(), vec![1, 2]);

        v.from_text("[3]").unwrap();
        assert_eq!(v.get_value(), vec![3]);
        assert_eq!(v.to_text(), "[3]");
    }

    #[test]
    fn erased_view_reports_metadata() {
        let v: Arc<dyn ConfigVarBase> = var(1.5_f64);
        assert_eq!(v.name(), "test.var");
        assert_eq!(v.description(), "test variable");
        assert_eq!(v.type_name(), "f64");
        assert_eq!(v.value_type(), TypeId::of::<f64>());
        assert_eq!(v.to_text(), "1.5");

        v.from_text("2.5").unwrap();
        let typed = v.into_any().downcast::<ConfigVar<f64>>().unwrap();
        assert!((typed.get_value() - 2.5).abs() < f64::EPSILON);
    }
}
