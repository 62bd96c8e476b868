use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A typed piece of application state with a fixed store path.
///
/// Implementors are plain data: the store clones them out on
/// [`read`](crate::StateStore::read) rather than handing out references,
/// so writers never invalidate a reader's view.
pub trait Slice: Any + Send + Sync + Clone {
    /// Store path this slice lives at, e.g. `"auth/state"`.
    const PATH: &'static str;
}

/// A type-erased, reference-counted state value.
///
/// Wraps `Arc<dyn Any + Send + Sync>` for zero-copy sharing across
/// multiple readers. Clone is just an atomic increment.
#[derive(Clone)]
pub struct SliceValue {
    inner: Arc<dyn Any + Send + Sync>,
}

impl SliceValue {
    /// Create a new SliceValue from any `Send + Sync` type.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Try to downcast to a concrete type reference.
    ///
    /// Returns `None` if the stored type doesn't match `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Check if the stored value is of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }
}

impl fmt::Debug for SliceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceValue")
            .field("type_id", &(*self.inner).type_id())
            .finish()
    }
}

/// Unique handle for a subscription, returned by
/// [`StateStore::subscribe`](crate::StateStore::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);
