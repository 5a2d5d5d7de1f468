//! Filesystem primitives used by the reconciler: durable copy with metadata,
//! recoverable deletion and error enrichment.

mod atomic;
mod copy;
pub mod helpers;
mod io_copy;
mod metadata;
mod space;
mod trash;
mod util;

pub use copy::{copy_with_metadata, CopyOptions};
pub use io_copy::DurabilityMode;
pub use trash::Trash;
pub use util::TEMP_PREFIX;
