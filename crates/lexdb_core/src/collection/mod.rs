//! Typed collection API.
//!
//! Provides `Collection<T>` for type-safe record storage; `T` converts to
//! and from [`Record`](lexdb_codec::Record) via the [`Entity`] trait.

mod codec;
mod typed;

pub use codec::{field, Entity};
pub use typed::Collection;
