//! Flux, the OpenLMS client state engine.
//!
//! A path-based state store with pub/sub. The application layer owns all
//! state and logic; front ends (CLI today, anything else later) only
//! observe and render.
//!
//! # Primitives
//!
//! - `put(slice)` / `read::<S>()`: typed access to a slice at its fixed path
//! - `get(path)`: untyped read, Arc zero-copy
//! - `subscribe(prefix)`: observe changes, prefix-matched notifications
//!
//! # Path Addressing
//!
//! All state lives in a flat path namespace with `/` as separator:
//! `auth/state`, `courses/state`, `enrollments/state`, … A slice type pins
//! its own path via [`Slice::PATH`], so readers and writers can never
//! disagree on where a slice lives.
//!
//! # Subscription Matching
//!
//! Subscriptions match by path prefix:
//! - Exact: `auth/state`
//! - Subtree: `auth` matches `auth/state`, `auth/terms`
//! - All: `""` matches everything
//!
//! # Example
//!
//! ```ignore
//! use openlms_flux::{Slice, StateStore};
//!
//! #[derive(Clone)]
//! struct Counter(u32);
//! impl Slice for Counter {
//!     const PATH: &'static str = "demo/counter";
//! }
//!
//! let store = StateStore::new();
//! store.subscribe("demo", |path, _value| println!("{} changed", path));
//! store.put(Counter(1));
//! assert_eq!(store.read::<Counter>().unwrap().0, 1);
//! ```

pub mod slice;
pub mod store;

pub use slice::{Slice, SliceValue, SubscriptionId};
pub use store::{ChangeHandler, StateStore};
