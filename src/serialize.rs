use std::collections::HashMap;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{Error, Result};
use crate::core::types::{FieldId, ShortId, StoredFields};
use crate::index::store::{IndexStore, PostingsByField};
use crate::radix::RadixMap;

const CURRENT_VERSION: u32 = 2;

/// On-the-wire shape of a serialized index. Field names are carried rather
/// than relying on position so a dump stays self-describing even if the
/// caller later reorders its declared fields (position is still what's used
/// to rebuild `FieldId`s on load, per `field_ids`' declared order).
#[derive(Serialize, Deserialize)]
struct SerializedIndex<ID: Eq + Hash + Clone> {
    version: u32,
    #[serde(rename = "documentCount")]
    document_count: usize,
    #[serde(rename = "nextId")]
    next_id: u32,
    #[serde(rename = "dirtCount", default)]
    dirt_count: u32,
    #[serde(rename = "fieldIds", default)]
    #[allow(dead_code)]
    field_ids: Vec<String>,
    #[serde(rename = "documentIds")]
    document_ids: HashMap<u32, ID>,
    #[serde(rename = "fieldLength")]
    field_length: HashMap<u32, Vec<u32>>,
    #[serde(rename = "averageFieldLength")]
    average_field_length: Vec<f32>,
    #[serde(rename = "storedFields")]
    stored_fields: HashMap<u32, StoredFields>,
    index: Vec<(String, HashMap<u16, HashMap<u32, u32>>)>,
}

/// Serializes `store` to the version-2 JSON format.
pub fn to_json<ID>(store: &IndexStore<ID>) -> Result<Value>
where
    ID: Eq + Hash + Clone + Serialize,
{
    let document_ids: HashMap<u32, ID> = store
        .live_ids()
        .map(|(short_id, external_id)| (short_id.value(), external_id.clone()))
        .collect();

    let field_length: HashMap<u32, Vec<u32>> = store
        .field_length_rows()
        .iter()
        .map(|(short_id, row)| (short_id.value(), row.clone()))
        .collect();

    let stored_fields: HashMap<u32, StoredFields> = store
        .stored_fields_map()
        .iter()
        .map(|(short_id, fields)| (short_id.value(), fields.clone()))
        .collect();

    let index: Vec<(String, HashMap<u16, HashMap<u32, u32>>)> = store
        .dictionary()
        .iter()
        .into_iter()
        .map(|(term, by_field)| {
            let by_field: HashMap<u16, HashMap<u32, u32>> = by_field
                .iter()
                .map(|(field, docs)| {
                    let docs: HashMap<u32, u32> = docs.iter().map(|(s, &tf)| (s.value(), tf)).collect();
                    (field.value(), docs)
                })
                .collect();
            (term, by_field)
        })
        .collect();

    let serialized = SerializedIndex {
        version: CURRENT_VERSION,
        document_count: store.document_count(),
        next_id: store.next_id(),
        dirt_count: store.dirt_count(),
        field_ids: Vec::new(), // filled in by the caller, which knows field names
        document_ids,
        field_length,
        average_field_length: store.avg_field_lengths().to_vec(),
        stored_fields,
        index,
    };

    Ok(serde_json::to_value(serialized)?)
}

/// Serializes `store` to the version-2 JSON format, recording `field_names`
/// (in declared order) so a future `from_json` can rebuild `FieldId`s
/// without the caller re-supplying its schema out of band.
pub fn to_json_with_fields<ID>(store: &IndexStore<ID>, field_names: &[String]) -> Result<Value>
where
    ID: Eq + Hash + Clone + Serialize,
{
    let mut value = to_json(store)?;
    if let Value::Object(ref mut map) = value {
        map.insert(
            "fieldIds".to_string(),
            serde_json::to_value(field_names.to_vec())?,
        );
    }
    Ok(value)
}

/// Rebuilds an `IndexStore` from a previously serialized dump. Version 1
/// dumps predate per-term dirt accounting; they're accepted with dirt
/// counters reset to zero rather than rejected, since every posting they
/// carry is still well-formed. Any other version is an `IncompatibleVersion`
/// error.
pub fn from_json<ID>(value: Value, field_names: &[String]) -> Result<IndexStore<ID>>
where
    ID: Eq + Hash + Clone + DeserializeOwned,
{
    let version = value
        .get("version")
        .and_then(Value::as_u64)
        .unwrap_or(1) as u32;

    if version != 1 && version != CURRENT_VERSION {
        return Err(Error::incompatible_version(version));
    }

    let serialized: SerializedIndex<ID> = serde_json::from_value(value)?;
    build_store(serialized, field_names, version)
}

fn build_store<ID>(serialized: SerializedIndex<ID>, field_names: &[String], version: u32) -> Result<IndexStore<ID>>
where
    ID: Eq + Hash + Clone,
{
    let num_fields = field_names.len();

    let short_to_id: HashMap<ShortId, ID> = serialized
        .document_ids
        .iter()
        .map(|(&short, id)| (ShortId(short), id.clone()))
        .collect();
    let id_to_short: HashMap<ID, ShortId> = short_to_id.iter().map(|(&s, id)| (id.clone(), s)).collect();

    let field_length: HashMap<ShortId, Vec<u32>> = serialized
        .field_length
        .into_iter()
        .map(|(short, row)| (ShortId(short), row))
        .collect();

    let stored_fields: HashMap<ShortId, StoredFields> = serialized
        .stored_fields
        .into_iter()
        .map(|(short, fields)| (ShortId(short), fields))
        .collect();

    let mut dictionary: RadixMap<PostingsByField> = RadixMap::new();
    for (term, by_field) in serialized.index {
        let mut postings: PostingsByField = HashMap::new();
        for (field, docs) in by_field {
            let docs: HashMap<ShortId, u32> = docs.into_iter().map(|(s, tf)| (ShortId(s), tf)).collect();
            postings.insert(FieldId(field), docs);
        }
        dictionary.set(&term, postings);
    }

    let dirt_count = if version == 1 { 0 } else { serialized.dirt_count };

    Ok(IndexStore::from_raw_parts(
        num_fields,
        serialized.next_id,
        dirt_count,
        id_to_short,
        short_to_id,
        field_length,
        serialized.average_field_length,
        stored_fields,
        dictionary,
    ))
}
