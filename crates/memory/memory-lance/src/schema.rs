//! Field layout of a memory collection and the conversion between records and Arrow batches.
//!
//! Lance ingests column-oriented data: a batch of records is transposed into one array per
//! metadata field plus a fixed-size-list array holding every embedding.

use std::sync::Arc;

use arrow_array::types::Float32Type;
use arrow_array::{
    Array, ArrayRef, BooleanArray, FixedSizeListArray, Float32Array, RecordBatch, StringArray,
};
use arrow_schema::{ArrowError, DataType, Field, Schema, SchemaRef};
use memory_core::{MemoryRecord, MemoryRecordMetadata};

use crate::DistanceType;

pub const ID: &str = "id";
pub const IS_REFERENCE: &str = "is_reference";
pub const EXTERNAL_SOURCE_NAME: &str = "external_source_name";
pub const DESCRIPTION: &str = "description";
pub const TEXT: &str = "text";
pub const ADDITIONAL_METADATA: &str = "additional_metadata";
pub const EMBEDDING: &str = "embedding";
/// Column appended by Lance to vector search results
pub const DISTANCE: &str = "_distance";

fn vector_type(dimension: usize) -> DataType {
    DataType::FixedSizeList(
        Arc::new(Field::new("item", DataType::Float32, true)),
        dimension as i32,
    )
}

/// Schema of a collection whose embeddings have `dimension` components.
pub fn collection_schema(dimension: usize) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(ID, DataType::Utf8, false),
        Field::new(IS_REFERENCE, DataType::Boolean, false),
        Field::new(EXTERNAL_SOURCE_NAME, DataType::Utf8, false),
        Field::new(DESCRIPTION, DataType::Utf8, false),
        Field::new(TEXT, DataType::Utf8, false),
        Field::new(ADDITIONAL_METADATA, DataType::Utf8, false),
        Field::new(EMBEDDING, vector_type(dimension), true),
    ]))
}

/// Reads the embedding width declared by a collection schema.
pub fn vector_dimension(schema: &Schema) -> Result<usize, ArrowError> {
    let field = schema.field_with_name(EMBEDDING)?;
    match field.data_type() {
        DataType::FixedSizeList(_, n) if *n > 0 => Ok(*n as usize),
        other => Err(ArrowError::SchemaError(format!(
            "column {EMBEDDING} has unexpected type {other:?}"
        ))),
    }
}

/// Transposes records into a columnar batch. Every embedding must have `dimension` components.
pub fn records_to_batch(
    records: &[MemoryRecord],
    dimension: usize,
) -> Result<RecordBatch, ArrowError> {
    if let Some(bad) = records.iter().find(|r| r.embedding.len() != dimension) {
        return Err(ArrowError::InvalidArgumentError(format!(
            "record {} has {} embedding components, expected {}",
            bad.metadata.id,
            bad.embedding.len(),
            dimension
        )));
    }

    let ids = StringArray::from_iter_values(records.iter().map(|r| r.metadata.id.as_str()));
    let is_reference: BooleanArray = records
        .iter()
        .map(|r| Some(r.metadata.is_reference))
        .collect();
    let sources = StringArray::from_iter_values(
        records.iter().map(|r| r.metadata.external_source_name.as_str()),
    );
    let descriptions =
        StringArray::from_iter_values(records.iter().map(|r| r.metadata.description.as_str()));
    let texts = StringArray::from_iter_values(records.iter().map(|r| r.metadata.text.as_str()));
    let additional_metadata = StringArray::from_iter_values(
        records.iter().map(|r| r.metadata.additional_metadata.as_str()),
    );
    let embeddings = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
        records
            .iter()
            .map(|r| Some(r.embedding.iter().copied().map(Some).collect::<Vec<_>>())),
        dimension as i32,
    );

    RecordBatch::try_new(
        collection_schema(dimension),
        vec![
            Arc::new(ids) as ArrayRef,
            Arc::new(is_reference),
            Arc::new(sources),
            Arc::new(descriptions),
            Arc::new(texts),
            Arc::new(additional_metadata),
            Arc::new(embeddings),
        ],
    )
}

fn column<'b, A: Array + 'static>(batch: &'b RecordBatch, name: &str) -> Result<&'b A, ArrowError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| ArrowError::SchemaError(format!("result is missing column {name}")))?
        .as_ref()
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| ArrowError::SchemaError(format!("column {name} has unexpected type")))
}

fn string_value(col: &StringArray, row: usize) -> String {
    if col.is_null(row) {
        String::new()
    } else {
        col.value(row).to_string()
    }
}

/// Decodes every row of a batch back into records. Columns are looked up by name, so the
/// column order returned by Lance does not matter.
pub fn batch_to_records(batch: &RecordBatch) -> Result<Vec<MemoryRecord>, ArrowError> {
    let ids = column::<StringArray>(batch, ID)?;
    let is_reference = column::<BooleanArray>(batch, IS_REFERENCE)?;
    let sources = column::<StringArray>(batch, EXTERNAL_SOURCE_NAME)?;
    let descriptions = column::<StringArray>(batch, DESCRIPTION)?;
    let texts = column::<StringArray>(batch, TEXT)?;
    let additional_metadata = column::<StringArray>(batch, ADDITIONAL_METADATA)?;
    let embeddings = column::<FixedSizeListArray>(batch, EMBEDDING)?;

    (0..batch.num_rows())
        .map(|row| {
            let embedding = if embeddings.is_null(row) {
                Vec::new()
            } else {
                let values = embeddings.value(row);
                values
                    .as_any()
                    .downcast_ref::<Float32Array>()
                    .ok_or_else(|| {
                        ArrowError::SchemaError(format!("{EMBEDDING} values are not Float32"))
                    })?
                    .iter()
                    .map(|x| x.unwrap_or(0.0))
                    .collect()
            };

            Ok(MemoryRecord {
                metadata: MemoryRecordMetadata {
                    id: string_value(ids, row),
                    is_reference: !is_reference.is_null(row) && is_reference.value(row),
                    external_source_name: string_value(sources, row),
                    description: string_value(descriptions, row),
                    text: string_value(texts, row),
                    additional_metadata: string_value(additional_metadata, row),
                },
                embedding,
            })
        })
        .collect()
}

/// Decodes a vector search batch into records paired with relevance scores.
pub fn batch_to_scored(
    batch: &RecordBatch,
    distance_type: DistanceType,
) -> Result<Vec<(MemoryRecord, f64)>, ArrowError> {
    let distances = column::<Float32Array>(batch, DISTANCE)?;
    let records = batch_to_records(batch)?;
    Ok(records
        .into_iter()
        .enumerate()
        .map(|(row, record)| {
            let score = if distances.is_null(row) {
                f64::NAN
            } else {
                distance_type.relevance(distances.value(row))
            };
            (record, score)
        })
        .collect())
}
