use std::collections::HashMap;
use std::hash::Hash;

use roaring::RoaringBitmap;

use crate::core::error::{Error, Result};
use crate::core::stats::EngineStats;
use crate::core::types::{FieldId, ShortId, StoredFields};
use crate::radix::RadixMap;

/// `fieldId -> (shortId -> termFrequency)`, the value stored per dictionary
/// term.
pub type PostingsByField = HashMap<FieldId, HashMap<ShortId, u32>>;

/// The data model of §3: inverted index, id maps, field-length tables and
/// dirt accounting, behind an API the engine drives one call at a time.
pub struct IndexStore<ID> {
    dictionary: RadixMap<PostingsByField>,
    id_to_short: HashMap<ID, ShortId>,
    short_to_id: HashMap<ShortId, ID>,
    field_length: HashMap<ShortId, Vec<u32>>,
    avg_field_length: Vec<f32>,
    stored_fields: HashMap<ShortId, StoredFields>,
    tombstoned: RoaringBitmap,
    document_count: usize,
    dirt_count: u32,
    next_id: u32,
    num_fields: usize,
}

impl<ID: Eq + Hash + Clone> IndexStore<ID> {
    pub fn new(num_fields: usize) -> Self {
        IndexStore {
            dictionary: RadixMap::new(),
            id_to_short: HashMap::new(),
            short_to_id: HashMap::new(),
            field_length: HashMap::new(),
            avg_field_length: vec![0.0; num_fields],
            stored_fields: HashMap::new(),
            tombstoned: RoaringBitmap::new(),
            document_count: 0,
            dirt_count: 0,
            next_id: 0,
            num_fields,
        }
    }

    /// Rebuilds a store from its serialized parts (see `crate::serialize`).
    /// Bypasses the usual `allocate_short_id`/`add_posting` bookkeeping
    /// since every invariant was already established by whoever produced
    /// the dump; the caller is trusted to pass consistent data.
    ///
    /// A dump taken mid-dirt (between a `discard` and the vacuum that
    /// sweeps it) still carries postings for tombstoned short-ids that
    /// aren't in `short_to_id`. Those short-ids are re-tombstoned here by
    /// scanning `dictionary` for any posting whose short-id has no live
    /// entry, so a subsequent vacuum pass still collects them instead of
    /// treating them as permanently live.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_raw_parts(
        num_fields: usize,
        next_id: u32,
        dirt_count: u32,
        id_to_short: HashMap<ID, ShortId>,
        short_to_id: HashMap<ShortId, ID>,
        field_length: HashMap<ShortId, Vec<u32>>,
        avg_field_length: Vec<f32>,
        stored_fields: HashMap<ShortId, StoredFields>,
        dictionary: RadixMap<PostingsByField>,
    ) -> Self {
        let document_count = short_to_id.len();
        let mut tombstoned = RoaringBitmap::new();
        for (_, by_field) in dictionary.iter() {
            for docs in by_field.values() {
                for &short_id in docs.keys() {
                    if !short_to_id.contains_key(&short_id) {
                        tombstoned.insert(short_id.value());
                    }
                }
            }
        }
        IndexStore {
            dictionary,
            id_to_short,
            short_to_id,
            field_length,
            avg_field_length,
            stored_fields,
            tombstoned,
            document_count,
            dirt_count,
            next_id,
            num_fields,
        }
    }

    pub fn num_fields(&self) -> usize {
        self.num_fields
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub fn avg_field_length(&self, field: FieldId) -> f32 {
        self.avg_field_length[field.value() as usize]
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            document_count: self.document_count,
            dirt_count: self.dirt_count,
            term_count: self.dictionary.len(),
            next_id: self.next_id,
        }
    }

    pub fn dictionary(&self) -> &RadixMap<PostingsByField> {
        &self.dictionary
    }

    pub fn short_id_of(&self, external_id: &ID) -> Option<ShortId> {
        self.id_to_short.get(external_id).copied()
    }

    pub fn external_id_of(&self, short_id: ShortId) -> Option<&ID> {
        self.short_to_id.get(&short_id)
    }

    pub fn is_live(&self, short_id: ShortId) -> bool {
        self.short_to_id.contains_key(&short_id)
    }

    pub fn stored_fields_of(&self, short_id: ShortId) -> Option<&StoredFields> {
        self.stored_fields.get(&short_id)
    }

    pub fn set_stored_fields(&mut self, short_id: ShortId, fields: StoredFields) {
        self.stored_fields.insert(short_id, fields);
    }

    pub fn field_length_of(&self, short_id: ShortId, field: FieldId) -> u32 {
        self.field_length
            .get(&short_id)
            .map(|row| row[field.value() as usize])
            .unwrap_or(0)
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    /// Every `(shortId, externalId)` pair currently live, for serialization.
    pub fn live_ids(&self) -> impl Iterator<Item = (ShortId, &ID)> {
        self.short_to_id.iter().map(|(&s, id)| (s, id))
    }

    pub fn field_length_rows(&self) -> &HashMap<ShortId, Vec<u32>> {
        &self.field_length
    }

    pub fn avg_field_lengths(&self) -> &[f32] {
        &self.avg_field_length
    }

    pub fn stored_fields_map(&self) -> &HashMap<ShortId, StoredFields> {
        &self.stored_fields
    }

    /// Installs both id maps and a zero-filled field-length row for a new
    /// document. Fails if `external_id` is already mapped.
    pub fn allocate_short_id(&mut self, external_id: ID) -> Result<ShortId>
    where
        ID: std::fmt::Debug,
    {
        if self.id_to_short.contains_key(&external_id) {
            return Err(Error::duplicate_id(&external_id as &dyn std::fmt::Debug));
        }
        let short_id = ShortId(self.next_id);
        self.next_id += 1;
        self.id_to_short.insert(external_id.clone(), short_id);
        self.short_to_id.insert(short_id, external_id);
        self.field_length.insert(short_id, vec![0; self.num_fields]);
        self.document_count += 1;
        Ok(short_id)
    }

    pub fn add_posting(&mut self, short_id: ShortId, field: FieldId, term: &str) {
        let by_field = self.dictionary.fetch(term, HashMap::new);
        *by_field.entry(field).or_default().entry(short_id).or_insert(0) += 1;
    }

    /// Decrements (or removes) the posting. Returns whether the posting was
    /// actually present, so callers can surface a `DocumentChanged` warning
    /// on mismatch without failing the call.
    pub fn remove_posting(&mut self, short_id: ShortId, field: FieldId, term: &str) -> bool {
        let found = match self.dictionary.get_mut(term) {
            Some(by_field) => match by_field.get_mut(&field) {
                Some(docs) => match docs.get_mut(&short_id) {
                    Some(freq) => {
                        if *freq <= 1 {
                            docs.remove(&short_id);
                        } else {
                            *freq -= 1;
                        }
                        true
                    }
                    None => false,
                },
                None => false,
            },
            None => false,
        };

        if let Some(by_field) = self.dictionary.get_mut(term) {
            by_field.retain(|_, docs| !docs.is_empty());
            if by_field.is_empty() {
                self.dictionary.delete(term);
            }
        }

        found
    }

    /// Updates `fieldLength[shortId][field]` and incrementally maintains
    /// `avgFieldLength[field]` for a newly-indexed field.
    pub fn record_field_length(&mut self, short_id: ShortId, field: FieldId, length: u32) {
        if let Some(row) = self.field_length.get_mut(&short_id) {
            row[field.value() as usize] = length;
        }
        let n = self.document_count as f32;
        let avg = &mut self.avg_field_length[field.value() as usize];
        *avg += (length as f32 - *avg) / n.max(1.0);
    }

    /// Removes both id maps and the field-length row, folding its lengths
    /// out of the running average before the document count drops. Shared
    /// by `tombstone` (which additionally marks the short-id for vacuum) and
    /// `remove_document` (which does not, since its postings are already
    /// gone synchronously).
    fn retire(&mut self, short_id: ShortId) {
        let n = self.document_count as f32;
        if let Some(row) = self.field_length.get(&short_id) {
            if n > 1.0 {
                for (f, &len) in row.iter().enumerate() {
                    let avg = &mut self.avg_field_length[f];
                    *avg = (*avg * n - len as f32) / (n - 1.0);
                }
            } else {
                self.avg_field_length.iter_mut().for_each(|a| *a = 0.0);
            }
        }
        self.field_length.remove(&short_id);
        self.stored_fields.remove(&short_id);
        if let Some(external_id) = self.short_to_id.remove(&short_id) {
            self.id_to_short.remove(&external_id);
        }
        self.document_count = self.document_count.saturating_sub(1);
    }

    /// Marks the short-id tombstoned pending vacuum; its postings stay in
    /// place so concurrent in-flight search results remain scoreable.
    pub fn tombstone(&mut self, short_id: ShortId) {
        self.retire(short_id);
        self.tombstoned.insert(short_id.value());
        self.dirt_count += 1;
    }

    /// Synchronous full removal: unlike `tombstone`, the caller has already
    /// stripped every posting for this document, so there is nothing left
    /// for vacuum to sweep and the dirt counter is untouched.
    pub fn remove_document(&mut self, short_id: ShortId) {
        self.retire(short_id);
    }

    pub fn dirt_count(&self) -> u32 {
        self.dirt_count
    }

    pub fn dirt_factor(&self) -> f32 {
        self.stats().dirt_factor()
    }

    pub fn term_keys(&self) -> Vec<String> {
        self.dictionary.iter().into_iter().map(|(k, _)| k).collect()
    }

    /// Drops every posting under `term` whose short-id is tombstoned,
    /// cleaning up empty field-maps and, if the term's postings are now
    /// empty entirely, the dictionary entry itself.
    pub fn vacuum_term(&mut self, term: &str) {
        if let Some(by_field) = self.dictionary.get_mut(term) {
            let tombstoned = &self.tombstoned;
            for docs in by_field.values_mut() {
                docs.retain(|short_id, _| !tombstoned.contains(short_id.value()));
            }
            by_field.retain(|_, docs| !docs.is_empty());
            if by_field.is_empty() {
                self.dictionary.delete(term);
            }
        }
    }

    /// Resets dirt accounting and recomputes `avgFieldLength` from scratch,
    /// called once a vacuum pass completes.
    pub fn finish_vacuum(&mut self) {
        self.dirt_count = 0;
        self.tombstoned.clear();
        let mut sums = vec![0f64; self.num_fields];
        for row in self.field_length.values() {
            for (f, &len) in row.iter().enumerate() {
                sums[f] += len as f64;
            }
        }
        if self.document_count == 0 {
            self.avg_field_length = vec![0.0; self.num_fields];
        } else {
            let n = self.document_count as f64;
            self.avg_field_length = sums.iter().map(|s| (s / n) as f32).collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_rejects_duplicate_external_ids() {
        let mut store: IndexStore<u32> = IndexStore::new(2);
        store.allocate_short_id(1).unwrap();
        assert!(store.allocate_short_id(1).is_err());
    }

    #[test]
    fn posting_lifecycle_cleans_up_empty_layers() {
        let mut store: IndexStore<u32> = IndexStore::new(1);
        let id = store.allocate_short_id(1).unwrap();
        let field = FieldId(0);
        store.add_posting(id, field, "whale");
        assert_eq!(store.dictionary().len(), 1);

        assert!(store.remove_posting(id, field, "whale"));
        assert_eq!(store.dictionary().len(), 0);
        assert!(!store.remove_posting(id, field, "whale"));
    }

    #[test]
    fn avg_field_length_tracks_incremental_updates() {
        let mut store: IndexStore<u32> = IndexStore::new(1);
        let a = store.allocate_short_id(1).unwrap();
        store.record_field_length(a, FieldId(0), 10);
        assert_eq!(store.avg_field_length(FieldId(0)), 10.0);

        let b = store.allocate_short_id(2).unwrap();
        store.record_field_length(b, FieldId(0), 20);
        assert_eq!(store.avg_field_length(FieldId(0)), 15.0);
    }

    #[test]
    fn tombstone_then_vacuum_removes_postings() {
        let mut store: IndexStore<u32> = IndexStore::new(1);
        let id = store.allocate_short_id(1).unwrap();
        let field = FieldId(0);
        store.add_posting(id, field, "whale");
        store.record_field_length(id, field, 1);

        store.tombstone(id);
        assert_eq!(store.dirt_count(), 1);
        assert!(!store.is_live(id));
        assert_eq!(store.dictionary().len(), 1);

        for term in store.term_keys() {
            store.vacuum_term(&term);
        }
        store.finish_vacuum();
        assert_eq!(store.dirt_count(), 0);
        assert_eq!(store.dictionary().len(), 0);
    }
}
