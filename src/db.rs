//! SQLite storage engine: schema, atomic lexicon add/remove, point and
//! pattern queries, derived statistics.
//!
//! Entry, sense and synset ids are scoped by their owning lexicon (composite
//! primary keys); only ILI ids are global. Every owned table cascades from
//! `lexicons`, so removing a lexicon is a single delete inside one
//! transaction. The `ilis` table is not owned by any lexicon and survives
//! removals.
//!
//! Relations are stored exactly as written in the source (single-write);
//! inverse traversal derives the opposite direction from the relation
//! vocabulary at query time.

use crate::error::{Result, WnError};
use crate::models::{
    Definition, Example, Form, IliDefinition, IliEntry, IliStatus, Lemma, LexicalEntry,
    LexicalResource, Lexicon, PartOfSpeech, Pronunciation, Requires, Sense, SenseRelation, Synset,
    SynsetRelation, ILI_PROPOSED,
};
use crate::progress::{self, ProgressReporter, ProgressUpdate};
use crate::relations::{SenseRelType, SynsetRelType};
use log::{debug, info, warn};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Transaction, TransactionBehavior, params};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

// --- Schema Definition ---

const SCHEMA_VERSION: u32 = 1;

/// Bound on waiting for another writer before surfacing `Locked`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );",
    "CREATE TABLE IF NOT EXISTS lexicons (
        id TEXT PRIMARY KEY,
        label TEXT NOT NULL,
        language TEXT NOT NULL,
        email TEXT NOT NULL,
        license TEXT NOT NULL,
        version TEXT NOT NULL,
        url TEXT,
        citation TEXT,
        logo TEXT,
        status TEXT,
        confidence_score REAL,
        install_seq INTEGER NOT NULL
    );",
    "CREATE TABLE IF NOT EXISTS requires (
        lexicon_id TEXT NOT NULL REFERENCES lexicons(id) ON DELETE CASCADE,
        required_id TEXT NOT NULL,
        required_version TEXT NOT NULL
    );",
    "CREATE TABLE IF NOT EXISTS lexical_entries (
        lexicon_id TEXT NOT NULL REFERENCES lexicons(id) ON DELETE CASCADE,
        id TEXT NOT NULL,
        lemma TEXT NOT NULL,
        lemma_lower TEXT NOT NULL, -- For case-insensitive search
        part_of_speech TEXT NOT NULL,
        PRIMARY KEY (lexicon_id, id)
    );",
    "CREATE TABLE IF NOT EXISTS forms (
        lexicon_id TEXT NOT NULL REFERENCES lexicons(id) ON DELETE CASCADE,
        entry_id TEXT NOT NULL,
        ord INTEGER NOT NULL,
        written_form TEXT NOT NULL
    );",
    "CREATE TABLE IF NOT EXISTS pronunciations (
        lexicon_id TEXT NOT NULL REFERENCES lexicons(id) ON DELETE CASCADE,
        entry_id TEXT NOT NULL,
        ord INTEGER NOT NULL,
        variety TEXT,
        notation TEXT,
        phonemic INTEGER NOT NULL, -- 0 for false, 1 for true
        audio TEXT,
        text TEXT NOT NULL
    );",
    "CREATE TABLE IF NOT EXISTS synsets (
        lexicon_id TEXT NOT NULL REFERENCES lexicons(id) ON DELETE CASCADE,
        id TEXT NOT NULL,
        ili TEXT, -- global ILI id, 'in' for proposed, NULL when absent
        part_of_speech TEXT NOT NULL,
        members TEXT NOT NULL DEFAULT '',
        PRIMARY KEY (lexicon_id, id)
    );",
    // No FK to synsets: a sense may reference a synset of a lexicon named in
    // requires; intra-lexicon integrity is enforced before insertion.
    "CREATE TABLE IF NOT EXISTS senses (
        lexicon_id TEXT NOT NULL REFERENCES lexicons(id) ON DELETE CASCADE,
        id TEXT NOT NULL,
        entry_id TEXT NOT NULL,
        synset_id TEXT NOT NULL,
        entry_rank INTEGER NOT NULL,
        PRIMARY KEY (lexicon_id, id),
        FOREIGN KEY (lexicon_id, entry_id)
            REFERENCES lexical_entries(lexicon_id, id) ON DELETE CASCADE
    );",
    "CREATE TABLE IF NOT EXISTS definitions (
        lexicon_id TEXT NOT NULL REFERENCES lexicons(id) ON DELETE CASCADE,
        synset_id TEXT NOT NULL,
        ord INTEGER NOT NULL,
        language TEXT,
        text TEXT NOT NULL,
        dc_source TEXT
    );",
    "CREATE TABLE IF NOT EXISTS ili_definitions (
        lexicon_id TEXT NOT NULL REFERENCES lexicons(id) ON DELETE CASCADE,
        synset_id TEXT NOT NULL,
        text TEXT NOT NULL,
        dc_source TEXT,
        PRIMARY KEY (lexicon_id, synset_id)
    );",
    "CREATE TABLE IF NOT EXISTS examples (
        lexicon_id TEXT NOT NULL REFERENCES lexicons(id) ON DELETE CASCADE,
        synset_id TEXT NOT NULL,
        ord INTEGER NOT NULL,
        text TEXT NOT NULL,
        dc_source TEXT
    );",
    "CREATE TABLE IF NOT EXISTS sense_relations (
        lexicon_id TEXT NOT NULL REFERENCES lexicons(id) ON DELETE CASCADE,
        source_sense_id TEXT NOT NULL,
        target_sense_id TEXT NOT NULL,
        rel_type TEXT NOT NULL,
        ord INTEGER NOT NULL,
        PRIMARY KEY (lexicon_id, source_sense_id, target_sense_id, rel_type)
    );",
    "CREATE TABLE IF NOT EXISTS synset_relations (
        lexicon_id TEXT NOT NULL REFERENCES lexicons(id) ON DELETE CASCADE,
        source_synset_id TEXT NOT NULL,
        target_synset_id TEXT NOT NULL,
        rel_type TEXT NOT NULL,
        ord INTEGER NOT NULL,
        PRIMARY KEY (lexicon_id, source_synset_id, target_synset_id, rel_type)
    );",
    // Global interlingual index; never owned by a lexicon.
    "CREATE TABLE IF NOT EXISTS ilis (
        id TEXT PRIMARY KEY,
        definition TEXT,
        status TEXT NOT NULL
    );",
];

const CREATE_INDICES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_entry_lemma_lower ON lexical_entries (lemma_lower);",
    "CREATE INDEX IF NOT EXISTS idx_entry_lemma_pos ON lexical_entries (lemma_lower, part_of_speech);",
    "CREATE INDEX IF NOT EXISTS idx_sense_synset ON senses (lexicon_id, synset_id);",
    "CREATE INDEX IF NOT EXISTS idx_sense_entry ON senses (lexicon_id, entry_id);",
    "CREATE INDEX IF NOT EXISTS idx_synset_ili ON synsets (ili);",
    "CREATE INDEX IF NOT EXISTS idx_sense_rel_source ON sense_relations (lexicon_id, source_sense_id, rel_type);",
    "CREATE INDEX IF NOT EXISTS idx_sense_rel_target ON sense_relations (lexicon_id, target_sense_id, rel_type);",
    "CREATE INDEX IF NOT EXISTS idx_synset_rel_source ON synset_relations (lexicon_id, source_synset_id, rel_type);",
    "CREATE INDEX IF NOT EXISTS idx_synset_rel_target ON synset_relations (lexicon_id, target_synset_id, rel_type);",
    "CREATE INDEX IF NOT EXISTS idx_definition_synset ON definitions (lexicon_id, synset_id);",
    "CREATE INDEX IF NOT EXISTS idx_example_synset ON examples (lexicon_id, synset_id);",
    "CREATE INDEX IF NOT EXISTS idx_form_entry ON forms (lexicon_id, entry_id);",
    "CREATE INDEX IF NOT EXISTS idx_pronunciation_entry ON pronunciations (lexicon_id, entry_id);",
];

// --- Connection Handling ---

/// Opens (creating if needed) the store and applies the session pragmas.
///
/// WAL mode lets readers keep a consistent snapshot while one writer
/// commits; a bounded busy timeout turns contention into a distinct
/// [`WnError::Locked`] instead of an indefinite hang.
pub fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
    )?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "cache_size", "-64000")?; // 64MB
    conn.busy_timeout(BUSY_TIMEOUT)?;

    Ok(conn)
}

/// Creates all necessary tables and indices in the database if they don't exist.
/// Also checks and sets the schema version.
pub fn initialize_database(conn: &mut Connection) -> Result<()> {
    debug!("Initializing database schema (version {})...", SCHEMA_VERSION);
    let tx = conn.transaction()?;

    for sql in CREATE_TABLES {
        tx.execute(sql, [])?;
    }
    for sql in CREATE_INDICES {
        tx.execute(sql, [])?;
    }

    let existing: Option<String> = tx
        .query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(v) if v == SCHEMA_VERSION.to_string() => {}
        Some(v) => {
            warn!(
                "Database schema version ({}) differs from expected ({}).",
                v, SCHEMA_VERSION
            );
        }
        None => {
            tx.execute(
                "INSERT INTO metadata (key, value) VALUES ('schema_version', ?1)",
                params![SCHEMA_VERSION.to_string()],
            )?;
        }
    }

    tx.commit()?;
    Ok(())
}

// --- Ingestion (write path) ---

/// Adds every lexicon of a parsed resource as one atomic unit.
///
/// An already-installed lexicon id aborts the whole transaction with
/// [`WnError::Conflict`] unless `force` is set, in which case the existing
/// lexicon is cascade-removed first. Either all lexicons of the resource
/// become visible or none do.
pub fn add_resource(
    conn: &mut Connection,
    resource: &LexicalResource,
    force: bool,
    reporter: &ProgressReporter,
) -> Result<Vec<String>> {
    let start_time = Instant::now();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut added = Vec::new();
    for lexicon in &resource.lexicons {
        let exists: Option<String> = tx
            .query_row(
                "SELECT id FROM lexicons WHERE id = ?1",
                params![lexicon.id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            if !force {
                return Err(WnError::Conflict(lexicon.id.clone()));
            }
            info!("Replacing existing lexicon '{}'", lexicon.id);
            delete_lexicon(&tx, &lexicon.id)?;
        }
        insert_lexicon(&tx, lexicon, reporter)?;
        added.push(lexicon.id.clone());
    }

    tx.commit()?;
    info!(
        "Added lexicons {:?} in {:.2?}",
        added,
        start_time.elapsed()
    );
    Ok(added)
}

/// Cascade-removes a lexicon and everything it owns. ILI entries are global
/// and survive; unknown ids are an error.
pub fn remove_lexicon(conn: &mut Connection, lexicon_id: &str) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let affected = delete_lexicon(&tx, lexicon_id)?;
    if affected == 0 {
        return Err(WnError::LexiconNotFound(lexicon_id.to_string()));
    }
    tx.commit()?;
    info!("Removed lexicon '{}'", lexicon_id);
    Ok(())
}

fn delete_lexicon(tx: &Transaction, lexicon_id: &str) -> Result<usize> {
    // ON DELETE CASCADE clears every owned table.
    Ok(tx.execute("DELETE FROM lexicons WHERE id = ?1", params![lexicon_id])?)
}

fn insert_lexicon(tx: &Transaction, lexicon: &Lexicon, reporter: &ProgressReporter) -> Result<()> {
    let total = (lexicon.lexical_entries.len() + lexicon.synsets.len()) as u64;
    let keep_going = progress::report(
        reporter,
        ProgressUpdate::new_stage(format!("Storing lexicon {}", lexicon.id), Some(total)),
    );
    if !keep_going {
        return Err(WnError::Cancelled);
    }
    let mut stored: u64 = 0;

    let next_seq: i64 = tx.query_row(
        "SELECT COALESCE(MAX(install_seq), 0) + 1 FROM lexicons",
        [],
        |row| row.get(0),
    )?;
    tx.execute(
        "INSERT INTO lexicons (id, label, language, email, license, version,
                               url, citation, logo, status, confidence_score, install_seq)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            lexicon.id,
            lexicon.label,
            lexicon.language,
            lexicon.email,
            lexicon.license,
            lexicon.version,
            lexicon.url,
            lexicon.citation,
            lexicon.logo,
            lexicon.status,
            lexicon.confidence_score,
            next_seq,
        ],
    )?;

    let mut requires_stmt = tx.prepare(
        "INSERT INTO requires (lexicon_id, required_id, required_version) VALUES (?1, ?2, ?3)",
    )?;
    for requires in &lexicon.requires {
        requires_stmt.execute(params![lexicon.id, requires.id, requires.version])?;
    }

    let mut entry_stmt = tx.prepare(
        "INSERT INTO lexical_entries (lexicon_id, id, lemma, lemma_lower, part_of_speech)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let mut form_stmt = tx.prepare(
        "INSERT INTO forms (lexicon_id, entry_id, ord, written_form) VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut pron_stmt = tx.prepare(
        "INSERT INTO pronunciations (lexicon_id, entry_id, ord, variety, notation, phonemic, audio, text)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    let mut sense_stmt = tx.prepare(
        "INSERT INTO senses (lexicon_id, id, entry_id, synset_id, entry_rank)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let mut sense_rel_stmt = tx.prepare(
        "INSERT OR IGNORE INTO sense_relations (lexicon_id, source_sense_id, target_sense_id, rel_type, ord)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;

    for entry in &lexicon.lexical_entries {
        entry_stmt.execute(params![
            lexicon.id,
            entry.id,
            entry.lemma.written_form,
            entry.lemma.written_form.to_lowercase(),
            entry.lemma.part_of_speech.tag(),
        ])?;
        for (ord, form) in entry.forms.iter().enumerate() {
            form_stmt.execute(params![lexicon.id, entry.id, ord as i64, form.written_form])?;
        }
        for (ord, pron) in entry.pronunciations.iter().enumerate() {
            pron_stmt.execute(params![
                lexicon.id,
                entry.id,
                ord as i64,
                pron.variety,
                pron.notation,
                pron.phonemic,
                pron.audio,
                pron.text,
            ])?;
        }
        for (rank, sense) in entry.senses.iter().enumerate() {
            sense_stmt.execute(params![
                lexicon.id,
                sense.id,
                entry.id,
                sense.synset,
                rank as i64,
            ])?;
            for (ord, relation) in sense.sense_relations.iter().enumerate() {
                sense_rel_stmt.execute(params![
                    lexicon.id,
                    sense.id,
                    relation.target,
                    relation.rel_type.as_str(),
                    ord as i64,
                ])?;
            }
        }
        stored += 1;
        if stored % 1000 == 0 {
            let keep_going = progress::report(
                reporter,
                ProgressUpdate {
                    stage_description: format!("Storing lexicon {}", lexicon.id),
                    current_item: stored,
                    total_items: Some(total),
                    message: None,
                },
            );
            if !keep_going {
                return Err(WnError::Cancelled);
            }
        }
    }

    let mut synset_stmt = tx.prepare(
        "INSERT INTO synsets (lexicon_id, id, ili, part_of_speech, members)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let mut def_stmt = tx.prepare(
        "INSERT INTO definitions (lexicon_id, synset_id, ord, language, text, dc_source)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    let mut ili_def_stmt = tx.prepare(
        "INSERT INTO ili_definitions (lexicon_id, synset_id, text, dc_source)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut example_stmt = tx.prepare(
        "INSERT INTO examples (lexicon_id, synset_id, ord, text, dc_source)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let mut synset_rel_stmt = tx.prepare(
        "INSERT OR IGNORE INTO synset_relations (lexicon_id, source_synset_id, target_synset_id, rel_type, ord)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    // A concept already known to the index keeps its definition unless the
    // incoming document supplies one.
    let mut ili_stmt = tx.prepare(
        "INSERT INTO ilis (id, definition, status) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET definition = COALESCE(excluded.definition, definition)",
    )?;

    for synset in &lexicon.synsets {
        synset_stmt.execute(params![
            lexicon.id,
            synset.id,
            synset.ili,
            synset.part_of_speech.tag(),
            synset.members,
        ])?;
        for (ord, definition) in synset.definitions.iter().enumerate() {
            def_stmt.execute(params![
                lexicon.id,
                synset.id,
                ord as i64,
                definition.language,
                definition.text,
                definition.dc_source,
            ])?;
        }
        if let Some(ili_def) = &synset.ili_definition {
            ili_def_stmt.execute(params![
                lexicon.id,
                synset.id,
                ili_def.text,
                ili_def.dc_source,
            ])?;
        }
        for (ord, example) in synset.examples.iter().enumerate() {
            example_stmt.execute(params![
                lexicon.id,
                synset.id,
                ord as i64,
                example.text,
                example.dc_source,
            ])?;
        }
        for (ord, relation) in synset.synset_relations.iter().enumerate() {
            synset_rel_stmt.execute(params![
                lexicon.id,
                synset.id,
                relation.target,
                relation.rel_type.as_str(),
                ord as i64,
            ])?;
        }
        if let Some(ili) = synset.ili.as_deref() {
            if ili != ILI_PROPOSED {
                let definition = synset.ili_definition.as_ref().map(|d| d.text.as_str());
                ili_stmt.execute(params![ili, definition, "active"])?;
            }
        }
        stored += 1;
        if stored % 1000 == 0 {
            let keep_going = progress::report(
                reporter,
                ProgressUpdate {
                    stage_description: format!("Storing lexicon {}", lexicon.id),
                    current_item: stored,
                    total_items: Some(total),
                    message: None,
                },
            );
            if !keep_going {
                return Err(WnError::Cancelled);
            }
        }
    }

    Ok(())
}

// --- Lexicon metadata ---

/// Installation metadata of one lexicon, without touching its data rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexiconInfo {
    pub id: String,
    pub label: String,
    pub language: String,
    pub email: String,
    pub license: String,
    pub version: String,
    pub url: Option<String>,
    pub citation: Option<String>,
    pub logo: Option<String>,
    pub status: Option<String>,
    pub confidence_score: Option<f32>,
}

fn row_to_lexicon_info(row: &rusqlite::Row) -> rusqlite::Result<LexiconInfo> {
    Ok(LexiconInfo {
        id: row.get("id")?,
        label: row.get("label")?,
        language: row.get("language")?,
        email: row.get("email")?,
        license: row.get("license")?,
        version: row.get("version")?,
        url: row.get("url")?,
        citation: row.get("citation")?,
        logo: row.get("logo")?,
        status: row.get("status")?,
        confidence_score: row.get("confidence_score")?,
    })
}

const LEXICON_COLUMNS: &str = "id, label, language, email, license, version,
                               url, citation, logo, status, confidence_score";

/// All installed lexicons in installation order.
pub fn lexicons(conn: &Connection) -> Result<Vec<LexiconInfo>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LEXICON_COLUMNS} FROM lexicons ORDER BY install_seq"
    ))?;
    let iter = stmt.query_map([], row_to_lexicon_info)?;
    iter.collect::<rusqlite::Result<Vec<_>>>().map_err(WnError::from)
}

pub fn lexicon(conn: &Connection, lexicon_id: &str) -> Result<Option<LexiconInfo>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LEXICON_COLUMNS} FROM lexicons WHERE id = ?1"
    ))?;
    stmt.query_row(params![lexicon_id], row_to_lexicon_info)
        .optional()
        .map_err(WnError::from)
}

// --- Query helpers (read path) ---

fn pos_from_column(s: &str) -> rusqlite::Result<PartOfSpeech> {
    PartOfSpeech::from_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            e.into(),
        )
    })
}

/// Entry ids matching a lemma (case-insensitive), optionally filtered by
/// part of speech, within one lexicon.
pub fn entry_ids_for_lemma(
    conn: &Connection,
    lexicon_id: &str,
    lemma: &str,
    pos: Option<PartOfSpeech>,
) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM lexical_entries
         WHERE lexicon_id = ?1 AND lemma_lower = ?2
           AND (?3 IS NULL OR part_of_speech = ?3)
         ORDER BY id",
    )?;
    let iter = stmt.query_map(
        params![lexicon_id, lemma.to_lowercase(), pos.map(|p| p.tag())],
        |row| row.get::<_, String>(0),
    )?;
    iter.collect::<rusqlite::Result<Vec<_>>>().map_err(WnError::from)
}

/// Fetches a full entry with forms, pronunciations and ranked senses.
pub fn entry(conn: &Connection, lexicon_id: &str, entry_id: &str) -> Result<Option<LexicalEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, lemma, part_of_speech FROM lexical_entries
         WHERE lexicon_id = ?1 AND id = ?2",
    )?;
    let base = stmt
        .query_row(params![lexicon_id, entry_id], |row| {
            let id: String = row.get(0)?;
            let lemma: String = row.get(1)?;
            let pos_str: String = row.get(2)?;
            Ok((id, lemma, pos_str))
        })
        .optional()?;

    let Some((id, written_form, pos_str)) = base else {
        return Ok(None);
    };
    let part_of_speech = pos_from_column(&pos_str)?;

    Ok(Some(LexicalEntry {
        lemma: Lemma {
            written_form,
            part_of_speech,
        },
        forms: forms_for_entry(conn, lexicon_id, &id)?,
        pronunciations: pronunciations_for_entry(conn, lexicon_id, &id)?,
        senses: senses_for_entry(conn, lexicon_id, &id)?,
        id,
    }))
}

fn forms_for_entry(conn: &Connection, lexicon_id: &str, entry_id: &str) -> Result<Vec<Form>> {
    let mut stmt = conn.prepare(
        "SELECT written_form FROM forms
         WHERE lexicon_id = ?1 AND entry_id = ?2 ORDER BY ord",
    )?;
    let iter = stmt.query_map(params![lexicon_id, entry_id], |row| {
        Ok(Form {
            written_form: row.get(0)?,
        })
    })?;
    iter.collect::<rusqlite::Result<Vec<_>>>().map_err(WnError::from)
}

fn pronunciations_for_entry(
    conn: &Connection,
    lexicon_id: &str,
    entry_id: &str,
) -> Result<Vec<Pronunciation>> {
    let mut stmt = conn.prepare(
        "SELECT variety, notation, phonemic, audio, text FROM pronunciations
         WHERE lexicon_id = ?1 AND entry_id = ?2 ORDER BY ord",
    )?;
    let iter = stmt.query_map(params![lexicon_id, entry_id], |row| {
        Ok(Pronunciation {
            variety: row.get(0)?,
            notation: row.get(1)?,
            phonemic: row.get::<_, i64>(2)? != 0,
            audio: row.get(3)?,
            text: row.get(4)?,
        })
    })?;
    iter.collect::<rusqlite::Result<Vec<_>>>().map_err(WnError::from)
}

/// Senses of an entry in rank order.
pub fn senses_for_entry(
    conn: &Connection,
    lexicon_id: &str,
    entry_id: &str,
) -> Result<Vec<Sense>> {
    let mut stmt = conn.prepare(
        "SELECT id, synset_id FROM senses
         WHERE lexicon_id = ?1 AND entry_id = ?2 ORDER BY entry_rank",
    )?;
    let ids = stmt
        .query_map(params![lexicon_id, entry_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut senses = Vec::with_capacity(ids.len());
    for (id, synset) in ids {
        let sense_relations = sense_relations_for(conn, lexicon_id, &id)?;
        senses.push(Sense {
            id,
            synset,
            sense_relations,
        });
    }
    Ok(senses)
}

pub fn sense(conn: &Connection, lexicon_id: &str, sense_id: &str) -> Result<Option<Sense>> {
    let mut stmt = conn.prepare(
        "SELECT id, synset_id FROM senses WHERE lexicon_id = ?1 AND id = ?2",
    )?;
    let base = stmt
        .query_row(params![lexicon_id, sense_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .optional()?;
    let Some((id, synset)) = base else {
        return Ok(None);
    };
    let sense_relations = sense_relations_for(conn, lexicon_id, &id)?;
    Ok(Some(Sense {
        id,
        synset,
        sense_relations,
    }))
}

/// The entry owning a sense, if any.
pub fn entry_id_for_sense(
    conn: &Connection,
    lexicon_id: &str,
    sense_id: &str,
) -> Result<Option<String>> {
    let mut stmt =
        conn.prepare("SELECT entry_id FROM senses WHERE lexicon_id = ?1 AND id = ?2")?;
    stmt.query_row(params![lexicon_id, sense_id], |row| row.get(0))
        .optional()
        .map_err(WnError::from)
}

fn sense_relations_for(
    conn: &Connection,
    lexicon_id: &str,
    sense_id: &str,
) -> Result<Vec<SenseRelation>> {
    let mut stmt = conn.prepare(
        "SELECT target_sense_id, rel_type FROM sense_relations
         WHERE lexicon_id = ?1 AND source_sense_id = ?2 ORDER BY ord",
    )?;
    let iter = stmt.query_map(params![lexicon_id, sense_id], |row| {
        let target: String = row.get(0)?;
        let rel_type: String = row.get(1)?;
        Ok(SenseRelation {
            rel_type: SenseRelType::parse(&rel_type),
            target,
        })
    })?;
    iter.collect::<rusqlite::Result<Vec<_>>>().map_err(WnError::from)
}

/// Fetches a fully resolved synset.
pub fn synset(conn: &Connection, lexicon_id: &str, synset_id: &str) -> Result<Option<Synset>> {
    let mut stmt = conn.prepare(
        "SELECT id, ili, part_of_speech, members FROM synsets
         WHERE lexicon_id = ?1 AND id = ?2",
    )?;
    let base = stmt
        .query_row(params![lexicon_id, synset_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .optional()?;
    let Some((id, ili, pos_str, members)) = base else {
        return Ok(None);
    };

    Ok(Some(Synset {
        part_of_speech: pos_from_column(&pos_str)?,
        definitions: definitions_for_synset(conn, lexicon_id, &id)?,
        ili_definition: ili_definition_for_synset(conn, lexicon_id, &id)?,
        examples: examples_for_synset(conn, lexicon_id, &id)?,
        synset_relations: synset_relations_for(conn, lexicon_id, &id)?,
        id,
        ili,
        members,
    }))
}

/// Definitions in document order; empty for synsets without definitions.
pub fn definitions_for_synset(
    conn: &Connection,
    lexicon_id: &str,
    synset_id: &str,
) -> Result<Vec<Definition>> {
    let mut stmt = conn.prepare(
        "SELECT language, text, dc_source FROM definitions
         WHERE lexicon_id = ?1 AND synset_id = ?2 ORDER BY ord",
    )?;
    let iter = stmt.query_map(params![lexicon_id, synset_id], |row| {
        Ok(Definition {
            language: row.get(0)?,
            text: row.get(1)?,
            dc_source: row.get(2)?,
        })
    })?;
    iter.collect::<rusqlite::Result<Vec<_>>>().map_err(WnError::from)
}

fn ili_definition_for_synset(
    conn: &Connection,
    lexicon_id: &str,
    synset_id: &str,
) -> Result<Option<IliDefinition>> {
    let mut stmt = conn.prepare(
        "SELECT text, dc_source FROM ili_definitions
         WHERE lexicon_id = ?1 AND synset_id = ?2",
    )?;
    stmt.query_row(params![lexicon_id, synset_id], |row| {
        Ok(IliDefinition {
            text: row.get(0)?,
            dc_source: row.get(1)?,
        })
    })
    .optional()
    .map_err(WnError::from)
}

fn examples_for_synset(
    conn: &Connection,
    lexicon_id: &str,
    synset_id: &str,
) -> Result<Vec<Example>> {
    let mut stmt = conn.prepare(
        "SELECT text, dc_source FROM examples
         WHERE lexicon_id = ?1 AND synset_id = ?2 ORDER BY ord",
    )?;
    let iter = stmt.query_map(params![lexicon_id, synset_id], |row| {
        Ok(Example {
            text: row.get(0)?,
            dc_source: row.get(1)?,
        })
    })?;
    iter.collect::<rusqlite::Result<Vec<_>>>().map_err(WnError::from)
}

fn synset_relations_for(
    conn: &Connection,
    lexicon_id: &str,
    synset_id: &str,
) -> Result<Vec<SynsetRelation>> {
    let mut stmt = conn.prepare(
        "SELECT target_synset_id, rel_type FROM synset_relations
         WHERE lexicon_id = ?1 AND source_synset_id = ?2 ORDER BY ord",
    )?;
    let iter = stmt.query_map(params![lexicon_id, synset_id], |row| {
        let target: String = row.get(0)?;
        let rel_type: String = row.get(1)?;
        Ok(SynsetRelation {
            rel_type: SynsetRelType::parse(&rel_type),
            target,
        })
    })?;
    iter.collect::<rusqlite::Result<Vec<_>>>().map_err(WnError::from)
}

/// Member sense ids of a synset: the declared member list when present,
/// sense document order otherwise.
pub fn synset_members(
    conn: &Connection,
    lexicon_id: &str,
    synset_id: &str,
) -> Result<Vec<String>> {
    let declared: Option<String> = conn
        .query_row(
            "SELECT members FROM synsets WHERE lexicon_id = ?1 AND id = ?2",
            params![lexicon_id, synset_id],
            |row| row.get(0),
        )
        .optional()?;
    match declared {
        Some(members) if !members.is_empty() => {
            Ok(members.split_whitespace().map(String::from).collect())
        }
        Some(_) => {
            let mut stmt = conn.prepare(
                "SELECT id FROM senses
                 WHERE lexicon_id = ?1 AND synset_id = ?2 ORDER BY rowid",
            )?;
            let iter = stmt.query_map(params![lexicon_id, synset_id], |row| row.get(0))?;
            iter.collect::<rusqlite::Result<Vec<_>>>().map_err(WnError::from)
        }
        None => Ok(Vec::new()),
    }
}

/// Synsets related to `synset_id` by `rel_type`, in relation order.
///
/// Edges are stored single-write; the reverse direction of the inverse type
/// is derived here, deduplicated against explicitly stored duals.
pub fn related_synset_ids(
    conn: &Connection,
    lexicon_id: &str,
    synset_id: &str,
    rel_type: SynsetRelType,
) -> Result<Vec<String>> {
    let mut targets: Vec<String> = {
        let mut stmt = conn.prepare(
            "SELECT target_synset_id FROM synset_relations
             WHERE lexicon_id = ?1 AND source_synset_id = ?2 AND rel_type = ?3
             ORDER BY ord",
        )?;
        let iter = stmt.query_map(params![lexicon_id, synset_id, rel_type.as_str()], |row| {
            row.get::<_, String>(0)
        })?;
        iter.collect::<rusqlite::Result<Vec<_>>>()?
    };

    if let Some(inverse) = rel_type.inverse() {
        let mut stmt = conn.prepare(
            "SELECT source_synset_id FROM synset_relations
             WHERE lexicon_id = ?1 AND target_synset_id = ?2 AND rel_type = ?3
             ORDER BY source_synset_id",
        )?;
        let iter = stmt.query_map(params![lexicon_id, synset_id, inverse.as_str()], |row| {
            row.get::<_, String>(0)
        })?;
        for derived in iter {
            let derived = derived?;
            if !targets.contains(&derived) {
                targets.push(derived);
            }
        }
    }
    Ok(targets)
}

/// Sense-level counterpart of [`related_synset_ids`].
pub fn related_sense_ids(
    conn: &Connection,
    lexicon_id: &str,
    sense_id: &str,
    rel_type: SenseRelType,
) -> Result<Vec<String>> {
    let mut targets: Vec<String> = {
        let mut stmt = conn.prepare(
            "SELECT target_sense_id FROM sense_relations
             WHERE lexicon_id = ?1 AND source_sense_id = ?2 AND rel_type = ?3
             ORDER BY ord",
        )?;
        let iter = stmt.query_map(params![lexicon_id, sense_id, rel_type.as_str()], |row| {
            row.get::<_, String>(0)
        })?;
        iter.collect::<rusqlite::Result<Vec<_>>>()?
    };

    if let Some(inverse) = rel_type.inverse() {
        let mut stmt = conn.prepare(
            "SELECT source_sense_id FROM sense_relations
             WHERE lexicon_id = ?1 AND target_sense_id = ?2 AND rel_type = ?3
             ORDER BY source_sense_id",
        )?;
        let iter = stmt.query_map(params![lexicon_id, sense_id, inverse.as_str()], |row| {
            row.get::<_, String>(0)
        })?;
        for derived in iter {
            let derived = derived?;
            if !targets.contains(&derived) {
                targets.push(derived);
            }
        }
    }
    Ok(targets)
}

// --- Interlingual index ---

pub fn ili(conn: &Connection, ili_id: &str) -> Result<Option<IliEntry>> {
    let mut stmt = conn.prepare("SELECT id, definition, status FROM ilis WHERE id = ?1")?;
    stmt.query_row(params![ili_id], row_to_ili)
        .optional()
        .map_err(WnError::from)
}

pub fn ilis(conn: &Connection) -> Result<Vec<IliEntry>> {
    let mut stmt = conn.prepare("SELECT id, definition, status FROM ilis ORDER BY id")?;
    let iter = stmt.query_map([], row_to_ili)?;
    iter.collect::<rusqlite::Result<Vec<_>>>().map_err(WnError::from)
}

fn row_to_ili(row: &rusqlite::Row) -> rusqlite::Result<IliEntry> {
    let status: String = row.get(2)?;
    Ok(IliEntry {
        id: row.get(0)?,
        definition: row.get(1)?,
        status: if status == "proposed" {
            IliStatus::Proposed
        } else {
            IliStatus::Active
        },
    })
}

/// The multilingual join: all `(lexicon_id, synset_id)` pairs sharing an ILI,
/// in lexicon installation order.
pub fn synsets_for_ili(conn: &Connection, ili_id: &str) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT s.lexicon_id, s.id FROM synsets s
         JOIN lexicons l ON l.id = s.lexicon_id
         WHERE s.ili = ?1
         ORDER BY l.install_seq, s.id",
    )?;
    let iter = stmt.query_map(params![ili_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    iter.collect::<rusqlite::Result<Vec<_>>>().map_err(WnError::from)
}

// --- Derived statistics ---

/// Read-only aggregate view over the store; computed from indices, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_lexicons: u64,
    pub total_words: u64,
    pub total_senses: u64,
    pub total_synsets: u64,
    pub total_ilis: u64,
    /// Synsets with a concrete ILI reference over all synsets, as a percent.
    pub ili_coverage_percent: f64,
    /// Synsets with no member senses.
    pub empty_synsets: u64,
    pub synsets_without_definitions: u64,
    /// Word counts keyed by part-of-speech tag.
    pub pos_distribution: BTreeMap<String, u64>,
}

pub fn statistics(conn: &Connection) -> Result<Statistics> {
    let count = |sql: &str| -> Result<u64> {
        Ok(conn.query_row(sql, [], |row| row.get::<_, i64>(0))? as u64)
    };

    let total_lexicons = count("SELECT COUNT(*) FROM lexicons")?;
    let total_words = count("SELECT COUNT(*) FROM lexical_entries")?;
    let total_senses = count("SELECT COUNT(*) FROM senses")?;
    let total_synsets = count("SELECT COUNT(*) FROM synsets")?;
    let total_ilis = count("SELECT COUNT(*) FROM ilis")?;
    let with_ili = count(
        "SELECT COUNT(*) FROM synsets WHERE ili IS NOT NULL AND ili != 'in'",
    )?;
    let empty_synsets = count(
        "SELECT COUNT(*) FROM synsets s
         WHERE NOT EXISTS (SELECT 1 FROM senses n
                           WHERE n.lexicon_id = s.lexicon_id AND n.synset_id = s.id)",
    )?;
    let synsets_without_definitions = count(
        "SELECT COUNT(*) FROM synsets s
         WHERE NOT EXISTS (SELECT 1 FROM definitions d
                           WHERE d.lexicon_id = s.lexicon_id AND d.synset_id = s.id)",
    )?;

    let mut pos_distribution = BTreeMap::new();
    let mut stmt = conn.prepare(
        "SELECT part_of_speech, COUNT(*) FROM lexical_entries GROUP BY part_of_speech",
    )?;
    let iter = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
    })?;
    for entry in iter {
        let (pos, n) = entry?;
        pos_distribution.insert(pos, n);
    }

    let ili_coverage_percent = if total_synsets == 0 {
        0.0
    } else {
        with_ili as f64 * 100.0 / total_synsets as f64
    };

    Ok(Statistics {
        total_lexicons,
        total_words,
        total_senses,
        total_synsets,
        total_ilis,
        ili_coverage_percent,
        empty_synsets,
        synsets_without_definitions,
        pos_distribution,
    })
}

// --- Full reconstruction (export path) ---

/// Rebuilds a complete lexicon document from the store. Everything flows
/// through the same readers the query façade uses.
pub fn load_lexicon(conn: &Connection, lexicon_id: &str) -> Result<Option<Lexicon>> {
    let Some(info) = lexicon(conn, lexicon_id)? else {
        return Ok(None);
    };

    let mut requires_stmt = conn.prepare(
        "SELECT required_id, required_version FROM requires
         WHERE lexicon_id = ?1 ORDER BY rowid",
    )?;
    let requires = requires_stmt
        .query_map(params![lexicon_id], |row| {
            Ok(Requires {
                id: row.get(0)?,
                version: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut entry_stmt = conn.prepare(
        "SELECT id FROM lexical_entries WHERE lexicon_id = ?1 ORDER BY rowid",
    )?;
    let entry_ids = entry_stmt
        .query_map(params![lexicon_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let mut lexical_entries = Vec::with_capacity(entry_ids.len());
    for entry_id in entry_ids {
        if let Some(full) = entry(conn, lexicon_id, &entry_id)? {
            lexical_entries.push(full);
        }
    }

    let mut synset_stmt =
        conn.prepare("SELECT id FROM synsets WHERE lexicon_id = ?1 ORDER BY rowid")?;
    let synset_ids = synset_stmt
        .query_map(params![lexicon_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let mut synsets = Vec::with_capacity(synset_ids.len());
    for synset_id in synset_ids {
        if let Some(full) = synset(conn, lexicon_id, &synset_id)? {
            synsets.push(full);
        }
    }

    Ok(Some(Lexicon {
        id: info.id,
        label: info.label,
        language: info.language,
        email: info.email,
        license: info.license,
        version: info.version,
        url: info.url,
        citation: info.citation,
        logo: info.logo,
        status: info.status,
        confidence_score: info.confidence_score,
        requires,
        lexical_entries,
        synsets,
    }))
}
