//! A local lexical database engine for WN-LMF wordnets.
//!
//! Ingests WN-LMF XML documents (downloaded or local), stores them in a
//! SQLite-backed store, and answers word, sense, synset and interlingual
//! queries across any number of installed lexicons.
//!
//! ```no_run
//! use wn_rs::{Config, LexiconFilter, Wordnet};
//!
//! # async fn run() -> wn_rs::Result<()> {
//! let wn = Wordnet::open(Config::default())?;
//! wn.install("oewn:2024", false).await?;
//! for word in wn.words("cat", None, &LexiconFilter::All)? {
//!     println!("{}: {}", word.lexicon, word.entry.lemma.written_form);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod parse;
pub mod progress;
pub mod relations;

pub use config::Config;
pub use data::{ProjectInfo, ProjectSpec};
pub use db::{LexiconInfo, Statistics};
pub use error::{Result, WnError};
pub use export::{ExportFormat, ExportOptions};
pub use models::{
    Definition, Example, Form, IliDefinition, IliEntry, IliStatus, Lemma, LexicalEntry,
    LexicalResource, Lexicon, PartOfSpeech, Pronunciation, Requires, Sense, SenseRelation, Synset,
    SynsetRelation,
};
pub use parse::ParserStrategy;
pub use progress::{ProgressCallback, ProgressUpdate};
pub use relations::{SenseRelType, SynsetRelType};

use log::{debug, warn};
use progress::ProgressReporter;
use rusqlite::Connection;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Which installed lexicons a query fans out over.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LexiconFilter {
    /// Every installed lexicon, in installation order.
    #[default]
    All,
    /// Exactly these lexicons, in the given order. Unknown ids are an error.
    Ids(Vec<String>),
}

impl LexiconFilter {
    /// Parses the textual filter form: `*` (or empty) selects all lexicons,
    /// otherwise a comma-separated id list.
    pub fn parse(filter: &str) -> LexiconFilter {
        let filter = filter.trim();
        if filter.is_empty() || filter == "*" {
            LexiconFilter::All
        } else {
            LexiconFilter::Ids(
                filter
                    .split(',')
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty())
                    .collect(),
            )
        }
    }
}

/// A lexical entry together with the lexicon it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub lexicon: String,
    pub entry: LexicalEntry,
}

/// A sense together with its lexicon and owning entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SenseRef {
    pub lexicon: String,
    pub entry_id: String,
    pub sense: Sense,
}

/// A synset together with the lexicon it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SynsetRef {
    pub lexicon: String,
    pub synset: Synset,
}

/// One open session against one store.
///
/// Cheap to clone; clones share the underlying connections. Writes (`add`,
/// `remove`) go through a dedicated writer connection; queries use a
/// separate reader connection, so under WAL a running ingestion transaction
/// never blocks readers from a consistent snapshot. All blocking SQLite
/// work in the async ingestion paths runs off the runtime via
/// `spawn_blocking`.
#[derive(Clone)]
pub struct Wordnet {
    writer: Arc<Mutex<Connection>>,
    reader: Arc<Mutex<Connection>>,
    config: Config,
    progress: ProgressReporter,
}

impl Wordnet {
    /// Opens (creating if needed) the store described by `config`.
    pub fn open(config: Config) -> Result<Self> {
        let db_path = config.db_path()?;
        let mut writer = db::open_connection(&db_path)?;
        db::initialize_database(&mut writer)?;
        let reader = db::open_connection(&db_path)?;
        Ok(Wordnet {
            writer: Arc::new(Mutex::new(writer)),
            reader: Arc::new(Mutex::new(reader)),
            config,
            progress: progress::no_progress(),
        })
    }

    /// Installs a progress callback observed by downloads, parsing and
    /// ingestion. Returning `false` from the callback cancels the operation.
    pub fn set_progress_callback(&self, callback: ProgressCallback) {
        if let Ok(mut guard) = self.progress.lock() {
            *guard = Some(callback);
        }
    }

    pub fn clear_progress_callback(&self) {
        if let Ok(mut guard) = self.progress.lock() {
            *guard = None;
        }
    }

    fn read(&self) -> Result<MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| WnError::Internal("store mutex poisoned".to_string()))
    }

    fn write(&self) -> Result<MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| WnError::Internal("store mutex poisoned".to_string()))
    }

    // --- Lexicon management ---

    /// Downloads, extracts, parses and stores a project given as
    /// `project[:version]`. Returns the ids of the lexicons added.
    pub async fn install(&self, project: &str, force: bool) -> Result<Vec<String>> {
        let spec = ProjectSpec::parse(project)?;
        let xml_path =
            data::fetch_project(&spec, &self.config, force, self.progress.clone()).await?;
        self.ingest_file(&xml_path, force).await
    }

    /// Parses and stores a local WN-LMF document.
    pub async fn add_lexicon_file(&self, path: &Path, force: bool) -> Result<Vec<String>> {
        self.ingest_file(path, force).await
    }

    async fn ingest_file(&self, path: &Path, force: bool) -> Result<Vec<String>> {
        let options = parse::ParseOptions {
            strict: self.config.strict_parse,
            progress: self.progress.clone(),
        };
        let resource = parse::parse_lmf_file(path, self.config.parser, options).await?;

        let writer = Arc::clone(&self.writer);
        let reporter = self.progress.clone();
        let added = tokio::task::spawn_blocking(move || {
            let mut guard = writer
                .lock()
                .map_err(|_| WnError::Internal("store mutex poisoned".to_string()))?;
            db::add_resource(&mut guard, &resource, force, &reporter)
        })
        .await??;

        for lexicon_id in &added {
            data::retain_source(path, lexicon_id, &self.config)?;
        }
        Ok(added)
    }

    /// Removes an installed lexicon and everything it owns. The interlingual
    /// index is global and unaffected.
    pub fn remove(&self, lexicon_id: &str) -> Result<()> {
        let mut conn = self.write()?;
        db::remove_lexicon(&mut conn, lexicon_id)
    }

    /// All installed lexicons in installation order.
    pub fn lexicons(&self) -> Result<Vec<LexiconInfo>> {
        let conn = self.read()?;
        db::lexicons(&conn)
    }

    pub fn lexicon(&self, lexicon_id: &str) -> Result<Option<LexiconInfo>> {
        let conn = self.read()?;
        db::lexicon(&conn, lexicon_id)
    }

    // --- Word and sense queries ---

    /// Looks up entries by lemma (case-insensitive), optionally filtered by
    /// part of speech, across the filtered lexicons. An unknown lemma is an
    /// empty result, never an error.
    pub fn words(
        &self,
        lemma: &str,
        pos: Option<PartOfSpeech>,
        filter: &LexiconFilter,
    ) -> Result<Vec<Word>> {
        let conn = self.read()?;
        let mut words = Vec::new();
        for lexicon_id in resolve_filter(&conn, filter)? {
            // One broken lexicon must not take down the whole fan-out.
            match words_in_lexicon(&conn, &lexicon_id, lemma, pos) {
                Ok(mut found) => words.append(&mut found),
                Err(e) => warn!("Skipping lexicon '{}' during lookup: {}", lexicon_id, e),
            }
        }
        Ok(words)
    }

    /// Resolves an entry id across the filtered lexicons, first match in
    /// installation order.
    pub fn word(&self, entry_id: &str, filter: &LexiconFilter) -> Result<Option<Word>> {
        let conn = self.read()?;
        for lexicon_id in resolve_filter(&conn, filter)? {
            match db::entry(&conn, &lexicon_id, entry_id) {
                Ok(Some(entry)) => {
                    return Ok(Some(Word {
                        lexicon: lexicon_id,
                        entry,
                    }));
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping lexicon '{}' during lookup: {}", lexicon_id, e),
            }
        }
        Ok(None)
    }

    /// All senses of a lemma across the filtered lexicons, in entry rank
    /// order within each entry.
    pub fn senses(
        &self,
        lemma: &str,
        pos: Option<PartOfSpeech>,
        filter: &LexiconFilter,
    ) -> Result<Vec<SenseRef>> {
        let words = self.words(lemma, pos, filter)?;
        let mut senses = Vec::new();
        for word in words {
            for sense in word.entry.senses {
                senses.push(SenseRef {
                    lexicon: word.lexicon.clone(),
                    entry_id: word.entry.id.clone(),
                    sense,
                });
            }
        }
        Ok(senses)
    }

    /// Resolves a sense id across the filtered lexicons, first match in
    /// installation order.
    pub fn sense(&self, sense_id: &str, filter: &LexiconFilter) -> Result<Option<SenseRef>> {
        let conn = self.read()?;
        for lexicon_id in resolve_filter(&conn, filter)? {
            let found = match db::sense(&conn, &lexicon_id, sense_id) {
                Ok(found) => found,
                Err(e) => {
                    warn!("Skipping lexicon '{}' during lookup: {}", lexicon_id, e);
                    continue;
                }
            };
            if let Some(sense) = found {
                let entry_id = db::entry_id_for_sense(&conn, &lexicon_id, sense_id)?
                    .ok_or_else(|| {
                        WnError::Internal(format!("sense '{sense_id}' has no owning entry"))
                    })?;
                return Ok(Some(SenseRef {
                    lexicon: lexicon_id,
                    entry_id,
                    sense,
                }));
            }
        }
        Ok(None)
    }

    /// The entry owning a sense.
    pub fn entry_id_for_sense(
        &self,
        lexicon_id: &str,
        sense_id: &str,
    ) -> Result<Option<String>> {
        let conn = self.read()?;
        db::entry_id_for_sense(&conn, lexicon_id, sense_id)
    }

    // --- Synset queries ---

    /// Resolves a synset id across the filtered lexicons, first match in
    /// installation order.
    pub fn synset(&self, synset_id: &str, filter: &LexiconFilter) -> Result<Option<SynsetRef>> {
        let conn = self.read()?;
        for lexicon_id in resolve_filter(&conn, filter)? {
            match db::synset(&conn, &lexicon_id, synset_id) {
                Ok(Some(synset)) => {
                    return Ok(Some(SynsetRef {
                        lexicon: lexicon_id,
                        synset,
                    }));
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping lexicon '{}' during lookup: {}", lexicon_id, e),
            }
        }
        Ok(None)
    }

    /// Synsets a lemma belongs to, across the filtered lexicons, deduplicated
    /// per lexicon.
    pub fn synsets(
        &self,
        lemma: &str,
        pos: Option<PartOfSpeech>,
        filter: &LexiconFilter,
    ) -> Result<Vec<SynsetRef>> {
        let conn = self.read()?;
        let mut synsets: Vec<SynsetRef> = Vec::new();
        for lexicon_id in resolve_filter(&conn, filter)? {
            let words = match words_in_lexicon(&conn, &lexicon_id, lemma, pos) {
                Ok(words) => words,
                Err(e) => {
                    warn!("Skipping lexicon '{}' during lookup: {}", lexicon_id, e);
                    continue;
                }
            };
            for word in words {
                for sense in &word.entry.senses {
                    let seen = synsets
                        .iter()
                        .any(|s| s.lexicon == lexicon_id && s.synset.id == sense.synset);
                    if seen {
                        continue;
                    }
                    if let Some(synset) = db::synset(&conn, &lexicon_id, &sense.synset)? {
                        synsets.push(SynsetRef {
                            lexicon: lexicon_id.clone(),
                            synset,
                        });
                    }
                }
            }
        }
        Ok(synsets)
    }

    /// Member senses of a synset, in declared member order.
    pub fn members(&self, lexicon_id: &str, synset_id: &str) -> Result<Vec<Sense>> {
        let conn = self.read()?;
        let mut members = Vec::new();
        for sense_id in db::synset_members(&conn, lexicon_id, synset_id)? {
            match db::sense(&conn, lexicon_id, &sense_id)? {
                Some(sense) => members.push(sense),
                None => warn!(
                    "Member sense '{}' of synset '{}' is not resolvable",
                    sense_id, synset_id
                ),
            }
        }
        Ok(members)
    }

    // --- Relation traversal ---

    /// Synsets related to `synset_id` by `rel_type`, resolving both stored
    /// edges and the derived inverse direction. Relation ids are
    /// lexicon-scoped, so traversal stays within one lexicon; an unknown
    /// source synset yields an empty result like any other read, and targets
    /// in other lexicons are skipped with a log message.
    pub fn related_synsets(
        &self,
        lexicon_id: &str,
        synset_id: &str,
        rel_type: SynsetRelType,
    ) -> Result<Vec<Synset>> {
        let conn = self.read()?;
        let mut related = Vec::new();
        for target_id in db::related_synset_ids(&conn, lexicon_id, synset_id, rel_type)? {
            match db::synset(&conn, lexicon_id, &target_id)? {
                Some(synset) => related.push(synset),
                None => debug!(
                    "Relation target '{}' is outside lexicon '{}'",
                    target_id, lexicon_id
                ),
            }
        }
        Ok(related)
    }

    /// Sense-level relation traversal. An unknown source sense yields an
    /// empty result.
    pub fn related_senses(
        &self,
        lexicon_id: &str,
        sense_id: &str,
        rel_type: SenseRelType,
    ) -> Result<Vec<Sense>> {
        let conn = self.read()?;
        let mut related = Vec::new();
        for target_id in db::related_sense_ids(&conn, lexicon_id, sense_id, rel_type)? {
            match db::sense(&conn, lexicon_id, &target_id)? {
                Some(sense) => related.push(sense),
                None => debug!(
                    "Relation target '{}' is outside lexicon '{}'",
                    target_id, lexicon_id
                ),
            }
        }
        Ok(related)
    }

    // --- Interlingual index ---

    pub fn ili(&self, ili_id: &str) -> Result<Option<IliEntry>> {
        let conn = self.read()?;
        db::ili(&conn, ili_id)
    }

    pub fn ilis(&self) -> Result<Vec<IliEntry>> {
        let conn = self.read()?;
        db::ilis(&conn)
    }

    /// All synsets sharing an interlingual concept, across every installed
    /// lexicon in installation order. This is the cross-lexicon join.
    pub fn synsets_for_ili(&self, ili_id: &str) -> Result<Vec<SynsetRef>> {
        let conn = self.read()?;
        let mut synsets = Vec::new();
        for (lexicon_id, synset_id) in db::synsets_for_ili(&conn, ili_id)? {
            if let Some(synset) = db::synset(&conn, &lexicon_id, &synset_id)? {
                synsets.push(SynsetRef {
                    lexicon: lexicon_id,
                    synset,
                });
            }
        }
        Ok(synsets)
    }

    // --- Statistics and export ---

    /// Aggregate counts over the whole store, computed on demand.
    pub fn statistics(&self) -> Result<Statistics> {
        let conn = self.read()?;
        db::statistics(&conn)
    }

    /// Writes the selected lexicons to `writer` in the requested format.
    pub fn export<W: Write>(&self, options: &ExportOptions, writer: &mut W) -> Result<()> {
        let conn = self.read()?;
        export::export(&conn, options, writer)
    }

    /// Export convenience returning the document as a string.
    pub fn export_to_string(&self, options: &ExportOptions) -> Result<String> {
        let conn = self.read()?;
        export::export_to_string(&conn, options)
    }
}

fn resolve_filter(conn: &Connection, filter: &LexiconFilter) -> Result<Vec<String>> {
    match filter {
        LexiconFilter::All => Ok(db::lexicons(conn)?.into_iter().map(|l| l.id).collect()),
        LexiconFilter::Ids(ids) => {
            for id in ids {
                if db::lexicon(conn, id)?.is_none() {
                    return Err(WnError::LexiconNotFound(id.clone()));
                }
            }
            Ok(ids.clone())
        }
    }
}

fn words_in_lexicon(
    conn: &Connection,
    lexicon_id: &str,
    lemma: &str,
    pos: Option<PartOfSpeech>,
) -> Result<Vec<Word>> {
    let mut words = Vec::new();
    for entry_id in db::entry_ids_for_lemma(conn, lexicon_id, lemma, pos)? {
        match db::entry(conn, lexicon_id, &entry_id)? {
            Some(entry) => words.push(Word {
                lexicon: lexicon_id.to_string(),
                entry,
            }),
            None => warn!(
                "Entry '{}' indexed in lexicon '{}' but not fetchable",
                entry_id, lexicon_id
            ),
        }
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const ENGLISH_LMF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<LexicalResource>
  <Lexicon id="ewn" label="English" language="en" email="e" license="c" version="1">
    <LexicalEntry id="ewn-cat">
      <Lemma writtenForm="cat" partOfSpeech="n"/>
      <Sense id="ewn-cat-1" synset="ewn-001-n"/>
    </LexicalEntry>
    <LexicalEntry id="ewn-feline">
      <Lemma writtenForm="feline" partOfSpeech="n"/>
      <Sense id="ewn-feline-1" synset="ewn-001-n"/>
    </LexicalEntry>
    <Synset id="ewn-001-n" ili="i46593" partOfSpeech="n" members="ewn-cat-1 ewn-feline-1">
      <Definition>feline mammal</Definition>
      <SynsetRelation relType="hypernym" target="ewn-002-n"/>
    </Synset>
    <Synset id="ewn-002-n" ili="i46541" partOfSpeech="n">
      <Definition>carnivorous mammal</Definition>
    </Synset>
  </Lexicon>
</LexicalResource>"#;

    const GERMAN_LMF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<LexicalResource>
  <Lexicon id="dwn" label="German" language="de" email="e" license="c" version="1">
    <LexicalEntry id="dwn-katze">
      <Lemma writtenForm="Katze" partOfSpeech="n"/>
      <Sense id="dwn-katze-1" synset="dwn-001-n"/>
    </LexicalEntry>
    <Synset id="dwn-001-n" ili="i46593" partOfSpeech="n">
      <Definition language="de">Katzenartiges Säugetier</Definition>
    </Synset>
  </Lexicon>
</LexicalResource>"#;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    async fn open_with_fixtures() -> (Wordnet, tempfile::TempDir) {
        init_logging();
        let tmp = tempdir().unwrap();
        let config = Config {
            data_dir: Some(tmp.path().to_path_buf()),
            ..Config::default()
        };
        let wn = Wordnet::open(config).unwrap();
        for (name, content) in [("english.xml", ENGLISH_LMF), ("german.xml", GERMAN_LMF)] {
            let path = tmp.path().join(name);
            std::fs::write(&path, content).unwrap();
            wn.add_lexicon_file(&path, false).await.unwrap();
        }
        (wn, tmp)
    }

    #[tokio::test]
    async fn word_lookup_and_fan_out() {
        let (wn, _tmp) = open_with_fixtures().await;

        let all = wn.words("cat", None, &LexiconFilter::All).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].lexicon, "ewn");

        // Case-insensitive, restricted to one lexicon.
        let german = wn
            .words("katze", None, &LexiconFilter::parse("dwn"))
            .unwrap();
        assert_eq!(german.len(), 1);
        assert_eq!(german[0].entry.lemma.written_form, "Katze");

        // Unknown lemma is an empty result.
        assert!(wn.words("dog", None, &LexiconFilter::All).unwrap().is_empty());

        // Explicitly naming a missing lexicon is an error.
        let err = wn
            .words("cat", None, &LexiconFilter::parse("nope"))
            .unwrap_err();
        assert!(matches!(err, WnError::LexiconNotFound(_)));
    }

    #[tokio::test]
    async fn id_lookup_without_naming_the_lexicon() {
        let (wn, _tmp) = open_with_fixtures().await;

        let word = wn.word("ewn-cat", &LexiconFilter::All).unwrap().unwrap();
        assert_eq!(word.lexicon, "ewn");
        assert_eq!(word.entry.lemma.written_form, "cat");

        let sense = wn.sense("dwn-katze-1", &LexiconFilter::All).unwrap().unwrap();
        assert_eq!(sense.lexicon, "dwn");
        assert_eq!(sense.entry_id, "dwn-katze");

        let synset = wn.synset("dwn-001-n", &LexiconFilter::All).unwrap().unwrap();
        assert_eq!(synset.lexicon, "dwn");

        // A narrower filter hides other lexicons' ids.
        assert!(
            wn.synset("dwn-001-n", &LexiconFilter::parse("ewn"))
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn senses_and_synsets_resolve() {
        let (wn, _tmp) = open_with_fixtures().await;

        let senses = wn.senses("cat", None, &LexiconFilter::All).unwrap();
        assert_eq!(senses.len(), 1);
        assert_eq!(senses[0].sense.synset, "ewn-001-n");
        assert_eq!(
            wn.entry_id_for_sense("ewn", "ewn-cat-1").unwrap().as_deref(),
            Some("ewn-cat")
        );

        let synsets = wn.synsets("cat", None, &LexiconFilter::All).unwrap();
        assert_eq!(synsets.len(), 1);
        assert_eq!(synsets[0].synset.definitions[0].text, "feline mammal");

        let members = wn.members("ewn", "ewn-001-n").unwrap();
        let ids: Vec<_> = members.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["ewn-cat-1", "ewn-feline-1"]);
    }

    #[tokio::test]
    async fn relation_traversal_with_derived_inverse() {
        let (wn, _tmp) = open_with_fixtures().await;

        let ups = wn
            .related_synsets("ewn", "ewn-001-n", SynsetRelType::Hypernym)
            .unwrap();
        assert_eq!(ups.len(), 1);
        assert_eq!(ups[0].id, "ewn-002-n");

        let downs = wn
            .related_synsets("ewn", "ewn-002-n", SynsetRelType::Hyponym)
            .unwrap();
        assert_eq!(downs.len(), 1);
        assert_eq!(downs[0].id, "ewn-001-n");

        // Reads return empty for unknown ids, they do not fail.
        let none = wn
            .related_synsets("ewn", "ewn-999-n", SynsetRelType::Hypernym)
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn ili_joins_across_lexicons() {
        let (wn, _tmp) = open_with_fixtures().await;

        let shared = wn.synsets_for_ili("i46593").unwrap();
        let pairs: Vec<_> = shared
            .iter()
            .map(|s| (s.lexicon.as_str(), s.synset.id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("ewn", "ewn-001-n"), ("dwn", "dwn-001-n")]);

        assert!(wn.ili("i46593").unwrap().is_some());
        assert!(wn.ili("i00000").unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_then_queries_come_up_empty() {
        let (wn, _tmp) = open_with_fixtures().await;

        wn.remove("ewn").unwrap();
        assert!(wn.words("cat", None, &LexiconFilter::All).unwrap().is_empty());
        assert!(wn.synset("ewn-001-n", &LexiconFilter::All).unwrap().is_none());
        // The German lexicon and the shared concept remain.
        assert_eq!(wn.lexicons().unwrap().len(), 1);
        assert!(wn.ili("i46593").unwrap().is_some());

        let err = wn.remove("ewn").unwrap_err();
        assert!(matches!(err, WnError::LexiconNotFound(_)));
    }

    #[tokio::test]
    async fn reinstall_requires_force() {
        let (wn, tmp) = open_with_fixtures().await;
        let path = tmp.path().join("english.xml");

        let err = wn.add_lexicon_file(&path, false).await.unwrap_err();
        assert!(matches!(err, WnError::Conflict(_)));

        let added = wn.add_lexicon_file(&path, true).await.unwrap();
        assert_eq!(added, vec!["ewn"]);
        assert_eq!(wn.statistics().unwrap().total_lexicons, 2);
    }

    #[tokio::test]
    async fn cancelling_callback_aborts_ingestion() {
        init_logging();
        let tmp = tempdir().unwrap();
        let config = Config {
            data_dir: Some(tmp.path().to_path_buf()),
            ..Config::default()
        };
        let wn = Wordnet::open(config).unwrap();
        wn.set_progress_callback(Box::new(|_| false));

        let path = tmp.path().join("english.xml");
        std::fs::write(&path, ENGLISH_LMF).unwrap();
        let err = wn.add_lexicon_file(&path, false).await.unwrap_err();
        assert!(matches!(err, WnError::Cancelled));

        // Nothing was committed.
        wn.clear_progress_callback();
        assert!(wn.lexicons().unwrap().is_empty());
        assert_eq!(wn.statistics().unwrap().total_words, 0);
    }

    #[tokio::test]
    async fn writers_do_not_block_readers() {
        let (wn, _tmp) = open_with_fixtures().await;

        // Simulate another writer holding the write lock on the same store.
        let db_path = wn.config.db_path().unwrap();
        let other = Connection::open(&db_path).unwrap();
        other.execute_batch("BEGIN IMMEDIATE").unwrap();

        // Reads still see a consistent snapshot under WAL.
        let words = wn.words("cat", None, &LexiconFilter::All).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(wn.statistics().unwrap().total_lexicons, 2);

        other.execute_batch("ROLLBACK").unwrap();
    }

    #[tokio::test]
    async fn statistics_reflect_the_store() {
        let (wn, _tmp) = open_with_fixtures().await;
        let stats = wn.statistics().unwrap();
        assert_eq!(stats.total_lexicons, 2);
        assert_eq!(stats.total_words, 3);
        assert_eq!(stats.total_synsets, 3);
        assert_eq!(stats.total_ilis, 2);
        assert_eq!(stats.pos_distribution.get("n"), Some(&3));
    }

    #[tokio::test]
    async fn export_rebuilds_an_equivalent_store() {
        let (wn, tmp) = open_with_fixtures().await;
        let document = wn.export_to_string(&ExportOptions::default()).unwrap();

        let other_dir = tmp.path().join("copy");
        let config = Config {
            data_dir: Some(other_dir),
            ..Config::default()
        };
        let copy = Wordnet::open(config).unwrap();
        let exported = tmp.path().join("export.xml");
        std::fs::write(&exported, &document).unwrap();
        copy.add_lexicon_file(&exported, false).await.unwrap();

        assert_eq!(copy.statistics().unwrap(), wn.statistics().unwrap());
        let words = copy.words("cat", None, &LexiconFilter::All).unwrap();
        assert_eq!(words.len(), 1);
    }

    #[test]
    fn filter_parsing() {
        assert_eq!(LexiconFilter::parse("*"), LexiconFilter::All);
        assert_eq!(LexiconFilter::parse(""), LexiconFilter::All);
        assert_eq!(
            LexiconFilter::parse("ewn, dwn"),
            LexiconFilter::Ids(vec!["ewn".to_string(), "dwn".to_string()])
        );
    }
}
