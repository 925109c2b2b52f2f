use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema, TimeUnit};

pub const ID: &str = "id";
pub const SOURCE_NAME: &str = "source_name";
pub const CHUNK_INDEX: &str = "chunk_index";
pub const CONTENT: &str = "content";
pub const INGESTED_AT: &str = "ingested_at";
pub const VECTOR: &str = "vector";

/// Chunk table layout; `dim` fixes the vector column width.
pub fn build_chunks_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(ID, DataType::Utf8, false),
		Field::new(SOURCE_NAME, DataType::Utf8, false),
		Field::new(CHUNK_INDEX, DataType::Int32, false),
		Field::new(CONTENT, DataType::Utf8, false),
		Field::new(INGESTED_AT, DataType::Timestamp(TimeUnit::Millisecond, None), false),
		Field::new(VECTOR, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
