//! Type id to formatter table.

use core::any::{Any, TypeId, type_name};
use core::hash::Hash;
use std::cell::RefCell;
use std::collections::HashMap as StdHashMap;
use std::rc::Rc;
use std::sync::{Arc, OnceLock};

use hashbrown::HashMap;
use parking_lot::RwLock;

use super::{
    Blittable, BlittableFormatter, CyclicFormatter, Formatter, MapFormatter, NullableFormatter,
    ObjectFormatter, PairFormatter, SharedFormatter, UnionFormatter, VecFormatter, WireObject,
};
use crate::{Result, WireError};

struct Entry {
    type_name: &'static str,
    /// Always an `Arc<dyn Formatter<T>>` for the keyed `T`.
    formatter: Box<dyn Any + Send + Sync>,
}

/// Thread-safe table of formatters keyed by [`TypeId`].
///
/// Lookups take a shared lock and clone an `Arc`; registration takes the
/// exclusive lock. There is no fallback: resolving a type nobody
/// registered fails with [`WireError::NotRegistered`].
///
/// ```
/// use wirecast_core::{ErrorKind, FormatterRegistry};
///
/// let registry = FormatterRegistry::with_builtins();
/// assert!(registry.resolve::<u64>().is_ok());
///
/// struct Unknown;
/// let err = registry.resolve::<Unknown>().err().unwrap();
/// assert_eq!(err.kind(), ErrorKind::NotRegistered);
/// ```
#[derive(Default)]
pub struct FormatterRegistry {
    table: RwLock<HashMap<TypeId, Entry>>,
}

impl FormatterRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in formatters.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        super::builtin::register_all(&registry);
        registry
    }

    /// Process-wide registry, created with the built-ins on first use.
    pub fn global() -> Arc<FormatterRegistry> {
        static GLOBAL: OnceLock<Arc<FormatterRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::with_builtins())))
    }

    /// Register `formatter` for `T`, replacing any previous one.
    pub fn register<T: 'static, F: Formatter<T> + 'static>(&self, formatter: F) {
        self.register_arc::<T>(Arc::new(formatter));
    }

    /// Register a shared formatter for `T`, replacing any previous one.
    pub fn register_arc<T: 'static>(&self, formatter: Arc<dyn Formatter<T>>) {
        tracing::debug!(type_name = type_name::<T>(), "registering formatter");
        self.table.write().insert(TypeId::of::<T>(), Self::entry(formatter));
    }

    fn entry<T: 'static>(formatter: Arc<dyn Formatter<T>>) -> Entry {
        Entry {
            type_name: type_name::<T>(),
            formatter: Box::new(formatter),
        }
    }

    fn downcast<T: 'static>(entry: &Entry) -> Option<Arc<dyn Formatter<T>>> {
        entry.formatter.downcast_ref::<Arc<dyn Formatter<T>>>().cloned()
    }

    /// Formatter for `T`.
    pub fn resolve<T: 'static>(&self) -> Result<Arc<dyn Formatter<T>>> {
        self.table
            .read()
            .get(&TypeId::of::<T>())
            .and_then(Self::downcast::<T>)
            .ok_or(WireError::NotRegistered {
                type_name: type_name::<T>(),
            })
    }

    /// Formatter for `T`, registering the one built by `init` if absent.
    ///
    /// Concurrent callers racing on the same type all observe the single
    /// formatter that won the insertion.
    pub fn get_or_register_with<T: 'static>(
        &self,
        init: impl FnOnce() -> Arc<dyn Formatter<T>>,
    ) -> Arc<dyn Formatter<T>> {
        if let Ok(formatter) = self.resolve::<T>() {
            return formatter;
        }
        let mut table = self.table.write();
        let entry = table.entry(TypeId::of::<T>()).or_insert_with(|| {
            tracing::debug!(type_name = type_name::<T>(), "registering formatter on first use");
            Self::entry(init())
        });
        match Self::downcast::<T>(entry) {
            Some(formatter) => formatter,
            None => unreachable!("entries are keyed by their own type id"),
        }
    }

    /// True if `T` has a formatter.
    pub fn contains<T: 'static>(&self) -> bool {
        self.table.read().contains_key(&TypeId::of::<T>())
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Register a blittable type along with `Vec<T>`, `Option<Vec<T>>` and
    /// `Box<[T]>` on the raw-block path.
    pub fn register_blittable<T: Blittable>(&self) {
        self.register::<T, _>(BlittableFormatter::<T>::new());
        self.register_blittable_collections::<T>();
    }

    pub(crate) fn register_blittable_collections<T: Blittable>(&self) {
        self.register::<Vec<T>, _>(BlittableFormatter::<T>::new());
        self.register::<Option<Vec<T>>, _>(BlittableFormatter::<T>::new());
        self.register::<Box<[T]>, _>(BlittableFormatter::<T>::new());
    }

    /// Register `Vec<T>`, `Option<Vec<T>>` and `Box<[T]>` with one element
    /// formatter call per item.
    pub fn register_collection<T: Default + 'static>(&self) {
        self.register::<Vec<T>, _>(VecFormatter::<T>::new());
        self.register::<Option<Vec<T>>, _>(VecFormatter::<T>::new());
        self.register::<Box<[T]>, _>(VecFormatter::<T>::new());
    }

    /// Register `Option<T>`.
    pub fn register_nullable<T: Default + 'static>(&self) {
        self.register::<Option<T>, _>(NullableFormatter::<T>::new());
    }

    /// Register `HashMap<K, V>`.
    pub fn register_map<K, V>(&self)
    where
        K: Eq + Hash + Default + 'static,
        V: Default + 'static,
    {
        self.register::<StdHashMap<K, V>, _>(MapFormatter::<K, V>::new());
    }

    /// Register the pair `(A, B)`.
    pub fn register_pair<A: Default + 'static, B: Default + 'static>(&self) {
        self.register::<(A, B), _>(PairFormatter::<A, B>::new());
    }

    /// Register `T` and `Option<T>` for a hand-described object.
    pub fn register_object<T: WireObject>(&self) {
        self.register::<T, _>(ObjectFormatter::<T>::new());
        self.register_nullable::<T>();
    }

    /// Register `Option<Rc<T>>` and `Option<Arc<T>>`.
    pub fn register_shared<T: Default + 'static>(&self) {
        self.register::<Option<Rc<T>>, _>(SharedFormatter::<Rc<T>>::new());
        self.register::<Option<Arc<T>>, _>(SharedFormatter::<Arc<T>>::new());
    }

    /// Register `Option<Rc<RefCell<T>>>`, which may form cycles.
    pub fn register_cyclic<T: Default + 'static>(&self) {
        self.register::<Option<Rc<RefCell<T>>>, _>(CyclicFormatter::<T>::new());
    }

    /// Register a union for both `B` and `Option<B>`.
    pub fn register_union<B: 'static>(&self, union: UnionFormatter<B>) {
        self.register::<Option<B>, _>(union.clone());
        self.register::<B, _>(union);
    }
}

impl core::fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let table = self.table.read();
        let mut names: Vec<&str> = table.values().map(|entry| entry.type_name).collect();
        names.sort_unstable();
        f.debug_struct("FormatterRegistry")
            .field("types", &names)
            .finish()
    }
}
