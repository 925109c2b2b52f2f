//! ragdb-vector
//!
//! Nearest-neighbor stores behind [`ragdb_core::traits::VectorIndex`]:
//! [`LanceIndex`] persists chunk vectors in a local LanceDB table and
//! [`MemoryIndex`] keeps them in process for tests and throwaway sessions.

pub mod lance;
pub mod memory;
pub mod schema;
pub mod table;

pub use lance::LanceIndex;
pub use memory::{cosine_similarity, MemoryIndex};
