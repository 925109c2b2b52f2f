use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use arrow_array::types::Float32Type;
use arrow_array::{
    FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray,
};
use arrow_schema::Schema;
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use tracing::debug;

use ragdb_core::traits::VectorIndex;
use ragdb_core::types::{ChunkMetadata, IndexMatch, IndexRecord, MetadataFilter};

use crate::schema::{build_chunks_schema, CHUNK_INDEX, CONTENT, SOURCE_NAME};
use crate::table::{ensure_table, open_db, table_exists};

/// Chunk vectors in a local LanceDB table, upserted by record id and
/// searched by cosine distance.
pub struct LanceIndex {
    db: Connection,
    table_name: String,
    dim: usize,
    schema: Arc<Schema>,
}

impl LanceIndex {
    pub async fn open(uri: &str, table_name: &str, dim: usize) -> Result<Self> {
        let width = i32::try_from(dim).context("vector dimension too large")?;
        let schema = build_chunks_schema(width);
        let db = open_db(uri).await?;
        ensure_table(&db, table_name, schema.clone()).await?;
        debug!(uri, table = table_name, dim, "lance index ready");
        Ok(Self { db, table_name: table_name.to_string(), dim, schema })
    }

    pub fn dim(&self) -> usize { self.dim }

    pub async fn count(&self) -> Result<usize> {
        if !table_exists(&self.db, &self.table_name).await? {
            return Ok(0);
        }
        let t = self.db.open_table(&self.table_name).execute().await?;
        Ok(t.count_rows(None).await?)
    }

    fn record_batch(&self, record: &IndexRecord) -> Result<RecordBatch> {
        if record.vector.len() != self.dim {
            return Err(anyhow!("vector has {} dims, index expects {}", record.vector.len(), self.dim));
        }
        let chunk_index = i32::try_from(record.metadata.chunk_index).context("chunk index out of range")?;
        let vectors = vec![Some(record.vector.iter().map(|&x| Some(x)).collect::<Vec<_>>())];
        Ok(RecordBatch::try_new(
            self.schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![record.id.clone()])),
                Arc::new(StringArray::from(vec![record.metadata.source_name.clone()])),
                Arc::new(Int32Array::from(vec![chunk_index])),
                Arc::new(StringArray::from(vec![record.metadata.content.clone()])),
                Arc::new(TimestampMillisecondArray::from(vec![Utc::now().timestamp_millis()])),
                Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, self.dim as i32)),
            ],
        )?)
    }
}

#[async_trait]
impl VectorIndex for LanceIndex {
    async fn upsert(&self, record: IndexRecord) -> Result<()> {
        let rb = self.record_batch(&record)?;
        ensure_table(&self.db, &self.table_name, self.schema.clone()).await?;
        let t = self.db.open_table(&self.table_name).execute().await?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), self.schema.clone()));
        // id is unique: replace on match
        let mut mi = t.merge_insert(&["id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        let _ = mi.execute(reader).await?;
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize, filter: &MetadataFilter) -> Result<Vec<IndexMatch>> {
        if top_k == 0 || !table_exists(&self.db, &self.table_name).await? {
            return Ok(Vec::new());
        }
        let t = self.db.open_table(&self.table_name).execute().await?;
        let mut q = t.vector_search(vector.to_vec())?.distance_type(DistanceType::Cosine).limit(top_k);
        if let Some(source) = &filter.source_name {
            q = q.only_if(format!("{SOURCE_NAME} = '{}'", source.replace('\'', "''")));
        }
        let mut stream = q.execute().await?;
        let mut matches = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            let sources = string_column(&batch, SOURCE_NAME)?;
            let contents = string_column(&batch, CONTENT)?;
            let indices = batch
                .column_by_name(CHUNK_INDEX)
                .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
                .ok_or_else(|| anyhow!("{CHUNK_INDEX} column missing"))?;
            let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>());
            for i in 0..batch.num_rows() {
                let similarity = distances.map_or(0.0, |d| 1.0 - d.value(i));
                matches.push(IndexMatch {
                    metadata: ChunkMetadata {
                        source_name: sources.value(i).to_string(),
                        chunk_index: usize::try_from(indices.value(i)).unwrap_or_default(),
                        content: contents.value(i).to_string(),
                    },
                    similarity,
                });
            }
        }
        matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        matches.truncate(top_k);
        Ok(matches)
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("{name} column missing"))
}
