pub mod analysis;
pub mod core;
pub mod index;
pub mod query;
pub mod radix;
pub mod search;
pub mod serialize;
pub mod vacuum;

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub use crate::analysis::Hooks;
pub use crate::core::config::{
    AutoVacuumOptions, Bm25Params, CombineWith, EngineOptions, PartialSearchOptions, SearchOptions, Weights,
};
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::stats::EngineStats;
pub use crate::core::types::{FieldId, FieldValue, Hit, LogLevel, ProcessedTerm, ShortId, StoredFields};
pub use crate::query::{Composition, Query};
pub use crate::search::Suggestion;

use crate::core::types::ProcessedTerm as Processed;
use crate::index::store::IndexStore;
use crate::query::QueryEngine;
use crate::vacuum::VacuumScheduler;

const DEFAULT_ASYNC_CHUNK_SIZE: usize = 1000;

/// The public façade: an in-memory, BM25+-ranked full-text index over a
/// host-supplied document type `D`, keyed by an externally meaningful id
/// type `ID`. All indexing and query logic is delegated to `IndexStore` and
/// `QueryEngine`; this type owns the frozen configuration, the host's
/// collaborator hooks, and the lock that serializes mutation against search.
pub struct Engine<D, ID> {
    field_names: Vec<String>,
    store_fields: Vec<String>,
    hooks: Hooks<D, ID>,
    default_search_options: SearchOptions<ID>,
    auto_vacuum: Option<AutoVacuumOptions>,
    max_fuzzy: u8,
    store: Arc<RwLock<IndexStore<ID>>>,
    vacuum: Arc<VacuumScheduler<ID>>,
}

impl<D, ID> Engine<D, ID>
where
    ID: Eq + Hash + Clone + std::fmt::Debug + Send + Sync + 'static,
{
    pub fn new(options: EngineOptions<D, ID>) -> Result<Self> {
        options.validate()?;
        let store = Arc::new(RwLock::new(IndexStore::new(options.fields.len())));
        let vacuum = Arc::new(VacuumScheduler::new(Arc::clone(&store)));
        Ok(Engine {
            field_names: options.fields,
            store_fields: options.store_fields,
            hooks: options.hooks,
            default_search_options: options.search_options,
            auto_vacuum: options.auto_vacuum,
            max_fuzzy: options.max_fuzzy,
            store,
            vacuum,
        })
    }

    pub fn stats(&self) -> EngineStats {
        self.store.read().stats()
    }

    pub fn has(&self, id: &ID) -> bool {
        self.store.read().short_id_of(id).is_some()
    }

    pub fn get_stored_fields(&self, id: &ID) -> Option<StoredFields> {
        let store = self.store.read();
        let short_id = store.short_id_of(id)?;
        store.stored_fields_of(short_id).cloned()
    }

    /// Indexes `doc`. Fails with `MissingId` if `extract_id` returns `None`,
    /// or `DuplicateId` if its id is already present.
    pub fn add(&self, doc: &D) -> Result<()> {
        let external_id = (self.hooks.extract_id)(doc).ok_or_else(Error::missing_id)?;
        let mut store = self.store.write();
        let short_id = store.allocate_short_id(external_id)?;
        self.ingest_fields(&mut store, short_id, doc);
        let stored = self.project_stored_fields(doc);
        store.set_stored_fields(short_id, stored);
        Ok(())
    }

    /// Applies `add` to every document in order, stopping at (and
    /// returning) the first error; documents already added remain indexed.
    pub fn add_all(&self, docs: &[D]) -> Result<()> {
        for doc in docs {
            self.add(doc)?;
        }
        Ok(())
    }

    /// The cooperative variant of `add_all`: yields to the async runtime
    /// every `chunk_size` documents (default 1000) so a long bulk load
    /// doesn't starve other tasks sharing the executor.
    pub async fn add_all_async(&self, docs: &[D], chunk_size: Option<usize>) -> Result<()> {
        let chunk_size = chunk_size.unwrap_or(DEFAULT_ASYNC_CHUNK_SIZE).max(1);
        for (i, doc) in docs.iter().enumerate() {
            self.add(doc)?;
            if (i + 1) % chunk_size == 0 {
                tokio::task::yield_now().await;
            }
        }
        Ok(())
    }

    /// Re-runs extraction/tokenization over `doc` to recover its term set
    /// and synchronously removes every posting it contributed. A term
    /// expected in the index but not found there is surfaced as a
    /// `DocumentChanged` warning through the logger, not an error.
    pub fn remove(&self, doc: &D) -> Result<()> {
        let external_id = (self.hooks.extract_id)(doc).ok_or_else(Error::missing_id)?;
        let mut store = self.store.write();
        let short_id = store
            .short_id_of(&external_id)
            .ok_or_else(|| Error::unknown_id(&external_id))?;

        for (field_index, field_name) in self.field_names.iter().enumerate() {
            let field_id = FieldId(field_index as u16);
            let Some(value) = (self.hooks.extract_field)(doc, field_name) else {
                continue;
            };
            let text = value.as_text();
            let tokens = (self.hooks.tokenize)(&text, Some(field_name));
            for token in &tokens {
                for term in self.process_token(token, Some(field_name)) {
                    if !store.remove_posting(short_id, field_id, &term) {
                        (self.hooks.logger)(
                            LogLevel::Warn,
                            &format!("term '{term}' missing from field '{field_name}' during remove"),
                            Some("version_conflict"),
                        );
                    }
                }
            }
        }

        store.remove_document(short_id);
        Ok(())
    }

    pub fn remove_all(&self, docs: &[D]) -> Result<()> {
        for doc in docs {
            self.remove(doc)?;
        }
        Ok(())
    }

    /// Tombstones `id` without requiring the document body: id maps are
    /// cleared immediately, postings are cleaned lazily by vacuum. Schedules
    /// a vacuum pass when auto-vacuum is enabled and the post-discard dirt
    /// counters cross its thresholds.
    pub fn discard(&self, id: &ID) -> Result<()> {
        let mut store = self.store.write();
        let short_id = store.short_id_of(id).ok_or_else(|| Error::unknown_id(id))?;
        store.tombstone(short_id);
        let (dirt_count, dirt_factor) = (store.dirt_count(), store.dirt_factor());
        drop(store);

        if let Some(auto_vacuum) = self.auto_vacuum {
            if dirt_count >= auto_vacuum.min_dirt_count && dirt_factor >= auto_vacuum.min_dirt_factor {
                self.vacuum.request(auto_vacuum);
            }
        }
        Ok(())
    }

    pub fn discard_all(&self, ids: &[ID]) -> Result<()> {
        for id in ids {
            self.discard(id)?;
        }
        Ok(())
    }

    /// `discard` followed by `add`.
    pub fn replace(&self, id: &ID, doc: &D) -> Result<()> {
        self.discard(id)?;
        self.add(doc)
    }

    /// Evaluates `query` and projects matches into sorted, boosted, filtered
    /// hits. Fails with `MissingField` if `query` or any of its composition
    /// nodes restricts scoring to a field this engine didn't declare. A bare
    /// top-level `Query::Wildcard` bypasses term-combination quality scaling
    /// entirely (see `search::wildcard_hits`).
    pub fn search(&self, query: &Query<ID>, options: Option<&PartialSearchOptions<ID>>) -> Result<Vec<Hit<ID>>> {
        let effective = match options {
            Some(overrides) => self.default_search_options.merge(overrides),
            None => self.default_search_options.clone(),
        };
        query::validate_fields(query, &effective, &self.field_names)?;
        let store = self.store.read();

        if let Query::Wildcard = query {
            return Ok(search::wildcard_hits(&store, &effective));
        }

        let tokenize = &self.hooks.tokenize;
        let process_term = &self.hooks.process_term;
        let engine = QueryEngine::new(&store, &self.field_names, tokenize, process_term, self.max_fuzzy);
        let results = engine.evaluate(query, &effective);
        Ok(search::project(results, &store, &effective))
    }

    /// Convenience over `search` for a plain-text query.
    pub fn search_text(&self, text: &str, options: Option<&PartialSearchOptions<ID>>) -> Result<Vec<Hit<ID>>> {
        self.search(&Query::text(text), options)
    }

    /// Runs a prefix+fuzzy search (both default to enabled unless the
    /// caller's overrides say otherwise) and groups the resulting hits by
    /// the dictionary terms they matched into ranked suggestion phrases.
    pub fn auto_suggest(&self, text: &str, options: Option<&PartialSearchOptions<ID>>) -> Result<Vec<Suggestion>> {
        let mut base = self.default_search_options.clone();
        if base.prefix.is_none() {
            base.prefix = Some(Arc::new(|_: &str, _: usize, _: &[String]| true));
        }
        if base.fuzzy.is_none() {
            base.fuzzy = Some(Arc::new(|_: &str, _: usize, _: &[String]| 0.2));
        }
        let effective = match options {
            Some(overrides) => base.merge(overrides),
            None => base,
        };
        let text_query = Query::text(text);
        query::validate_fields(&text_query, &effective, &self.field_names)?;

        let store = self.store.read();
        let tokenize = &self.hooks.tokenize;
        let process_term = &self.hooks.process_term;
        let engine = QueryEngine::new(&store, &self.field_names, tokenize, process_term, self.max_fuzzy);
        let results = engine.evaluate(&text_query, &effective);
        let hits = search::project(results, &store, &effective);
        Ok(search::group_into_suggestions(&hits))
    }

    /// Schedules (and awaits completion of) a vacuum pass regardless of
    /// dirt thresholds, folding into any pass already in flight.
    pub async fn vacuum(&self) {
        let conditions = AutoVacuumOptions {
            min_dirt_count: 0,
            min_dirt_factor: 0.0,
            ..self.auto_vacuum.unwrap_or_default()
        };
        self.vacuum.run_and_wait(conditions).await;
    }

    fn ingest_fields(&self, store: &mut IndexStore<ID>, short_id: ShortId, doc: &D) {
        for (field_index, field_name) in self.field_names.iter().enumerate() {
            let field_id = FieldId(field_index as u16);
            let Some(value) = (self.hooks.extract_field)(doc, field_name) else {
                continue;
            };
            let text = value.as_text();
            let tokens = (self.hooks.tokenize)(&text, Some(field_name));
            store.record_field_length(short_id, field_id, tokens.len() as u32);
            for token in &tokens {
                for term in self.process_token(token, Some(field_name)) {
                    store.add_posting(short_id, field_id, &term);
                }
            }
        }
    }

    fn process_token(&self, token: &str, field: Option<&str>) -> Vec<String> {
        match (self.hooks.process_term)(token, field) {
            Processed::One(term) => vec![term],
            Processed::Many(terms) => terms,
            Processed::Drop => Vec::new(),
        }
    }

    fn project_stored_fields(&self, doc: &D) -> StoredFields {
        let mut stored = StoredFields::new();
        for field_name in &self.store_fields {
            if let Some(value) = (self.hooks.extract_field)(doc, field_name) {
                stored.insert(field_name.clone(), value);
            }
        }
        stored
    }
}

impl<D, ID> Engine<D, ID>
where
    ID: Eq + Hash + Clone + std::fmt::Debug + Send + Sync + 'static + Serialize,
{
    pub fn to_json(&self) -> Result<Value> {
        let store = self.store.read();
        serialize::to_json_with_fields(&store, &self.field_names)
    }
}

impl<D, ID> Engine<D, ID>
where
    ID: Eq + Hash + Clone + std::fmt::Debug + Send + Sync + 'static + DeserializeOwned,
{
    /// Rebuilds an `Engine` from a previously serialized dump, reusing the
    /// hooks and scoring defaults in `options` but discarding any stats it
    /// carried (construction still validates `options` as usual).
    pub fn from_json(value: Value, options: EngineOptions<D, ID>) -> Result<Self> {
        options.validate()?;
        let store = serialize::from_json(value, &options.fields)?;
        let store = Arc::new(RwLock::new(store));
        let vacuum = Arc::new(VacuumScheduler::new(Arc::clone(&store)));
        Ok(Engine {
            field_names: options.fields,
            store_fields: options.store_fields,
            hooks: options.hooks,
            default_search_options: options.search_options,
            auto_vacuum: options.auto_vacuum,
            max_fuzzy: options.max_fuzzy,
            store,
            vacuum,
        })
    }
}

impl<D, ID> Engine<D, ID>
where
    D: Send + 'static,
    ID: Eq + Hash + Clone + std::fmt::Debug + Send + Sync + 'static + DeserializeOwned,
{
    /// The cooperative variant of `from_json`: offloads the (potentially
    /// large) deserialization and index rebuild to a blocking-pool thread so
    /// it doesn't stall the calling task.
    pub async fn from_json_async(value: Value, options: EngineOptions<D, ID>) -> Result<Self> {
        options.validate()?;
        let fields = options.fields.clone();
        let store = tokio::task::spawn_blocking(move || serialize::from_json(value, &fields))
            .await
            .map_err(|_| Error::new(crate::core::error::ErrorKind::Parse, "index rebuild task panicked"))??;
        let store = Arc::new(RwLock::new(store));
        let vacuum = Arc::new(VacuumScheduler::new(Arc::clone(&store)));
        Ok(Engine {
            field_names: options.fields,
            store_fields: options.store_fields,
            hooks: options.hooks,
            default_search_options: options.search_options,
            auto_vacuum: options.auto_vacuum,
            max_fuzzy: options.max_fuzzy,
            store,
            vacuum,
        })
    }
}
