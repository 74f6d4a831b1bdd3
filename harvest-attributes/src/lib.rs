//! Collect types by the attributes they carry.
//!
//! Every struct, enum, union, trait or type alias annotated with a
//! non-builtin attribute or derive becomes a [`TypeFact`]. Library modules
//! cache those facts in their metadata; consumer modules gather them from
//! every referenced module and generate a `TYPES_BY_ATTRIBUTE` lookup table.
//!
//! ```json
//! {
//!   "CollectTypesWithAttributes": {
//!     "attributes": ["serde::Serialize", "Entity"],
//!     "namespace_for_generations": "registry"
//!   }
//! }
//! ```

mod codec;
mod config;
mod fact;
mod generator;
pub mod files;

pub use codec::{CodecError, TypeFactCodec};
pub use config::CollectTypesWithAttributesConfig;
pub use fact::TypeFact;
pub use generator::{BUILTIN_ATTRIBUTES, CollectTypesWithAttributesGenerator};
