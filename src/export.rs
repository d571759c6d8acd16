//! Export of installed lexicons back out of the store.
//!
//! XML output reconstructs a WN-LMF document that the parser accepts again,
//! so a store can be rebuilt from its own export. JSON output is a flattened
//! projection for downstream tooling, not a round-trip format.

use crate::db;
use crate::error::{Result, WnError};
use crate::models::{LexicalResource, Lexicon};
use rusqlite::Connection;
use serde::Serialize;
use std::io::Write;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xml,
    Json,
}

/// What to export and how.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Lexicon ids to include; empty means every installed lexicon.
    pub lexicons: Vec<String>,
    pub format: ExportFormat,
}

/// Serializes the selected lexicons to `writer`. Explicitly named lexicons
/// must exist; an empty selection exports everything in installation order.
pub fn export<W: Write>(conn: &Connection, options: &ExportOptions, writer: &mut W) -> Result<()> {
    let lexicons = collect(conn, options)?;
    match options.format {
        ExportFormat::Xml => {
            let document = to_xml(&LexicalResource { lexicons })?;
            writer.write_all(document.as_bytes())?;
        }
        ExportFormat::Json => {
            let projection = JsonResource::project(&lexicons);
            serde_json::to_writer_pretty(writer, &projection)?;
        }
    }
    Ok(())
}

/// Convenience wrapper returning the document as a string.
pub fn export_to_string(conn: &Connection, options: &ExportOptions) -> Result<String> {
    let mut buffer = Vec::new();
    export(conn, options, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| WnError::Internal(format!("non-UTF8 export: {e}")))
}

fn collect(conn: &Connection, options: &ExportOptions) -> Result<Vec<Lexicon>> {
    let selected: Vec<String> = if options.lexicons.is_empty() {
        db::lexicons(conn)?.into_iter().map(|l| l.id).collect()
    } else {
        options.lexicons.clone()
    };

    let mut lexicons = Vec::with_capacity(selected.len());
    for id in selected {
        match db::load_lexicon(conn, &id)? {
            Some(lexicon) => lexicons.push(lexicon),
            None => return Err(WnError::LexiconNotFound(id)),
        }
    }
    Ok(lexicons)
}

fn to_xml(resource: &LexicalResource) -> Result<String> {
    let mut body = String::new();
    let mut serializer =
        quick_xml::se::Serializer::with_root(&mut body, Some("LexicalResource"))?;
    serializer.indent(' ', 2);
    resource.serialize(serializer)?;

    let mut document = String::with_capacity(XML_DECLARATION.len() + body.len() + 1);
    document.push_str(XML_DECLARATION);
    document.push_str(&body);
    document.push('\n');
    Ok(document)
}

// --- JSON projection ---

#[derive(Debug, Serialize)]
struct JsonResource {
    lexicons: Vec<JsonLexicon>,
}

#[derive(Debug, Serialize)]
struct JsonLexicon {
    id: String,
    label: String,
    language: String,
    version: String,
    license: String,
    entries: Vec<JsonEntry>,
    synsets: Vec<JsonSynset>,
}

#[derive(Debug, Serialize)]
struct JsonEntry {
    id: String,
    lemma: String,
    part_of_speech: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    forms: Vec<String>,
    senses: Vec<JsonSense>,
}

#[derive(Debug, Serialize)]
struct JsonSense {
    id: String,
    synset: String,
}

#[derive(Debug, Serialize)]
struct JsonSynset {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ili: Option<String>,
    part_of_speech: String,
    definitions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    examples: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    relations: Vec<JsonRelation>,
}

#[derive(Debug, Serialize)]
struct JsonRelation {
    rel_type: String,
    target: String,
}

impl JsonResource {
    fn project(lexicons: &[Lexicon]) -> JsonResource {
        JsonResource {
            lexicons: lexicons
                .iter()
                .map(|lexicon| JsonLexicon {
                    id: lexicon.id.clone(),
                    label: lexicon.label.clone(),
                    language: lexicon.language.clone(),
                    version: lexicon.version.clone(),
                    license: lexicon.license.clone(),
                    entries: lexicon
                        .lexical_entries
                        .iter()
                        .map(|entry| JsonEntry {
                            id: entry.id.clone(),
                            lemma: entry.lemma.written_form.clone(),
                            part_of_speech: entry.lemma.part_of_speech.tag().to_string(),
                            forms: entry
                                .forms
                                .iter()
                                .map(|f| f.written_form.clone())
                                .collect(),
                            senses: entry
                                .senses
                                .iter()
                                .map(|sense| JsonSense {
                                    id: sense.id.clone(),
                                    synset: sense.synset.clone(),
                                })
                                .collect(),
                        })
                        .collect(),
                    synsets: lexicon
                        .synsets
                        .iter()
                        .map(|synset| JsonSynset {
                            id: synset.id.clone(),
                            ili: synset.ili.clone(),
                            part_of_speech: synset.part_of_speech.tag().to_string(),
                            definitions: synset
                                .definitions
                                .iter()
                                .map(|d| d.text.clone())
                                .collect(),
                            examples: synset.examples.iter().map(|e| e.text.clone()).collect(),
                            relations: synset
                                .synset_relations
                                .iter()
                                .map(|r| JsonRelation {
                                    rel_type: r.rel_type.as_str().to_string(),
                                    target: r.target.clone(),
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{add_resource, initialize_database};
    use crate::parse::{ParseOptions, parse_lmf_str};
    use crate::progress::no_progress;

    const FIXTURE: &str = r#"<LexicalResource>
  <Lexicon id="ewn" label="English" language="en" email="e" license="c" version="1">
    <LexicalEntry id="ewn-cat">
      <Lemma writtenForm="cat" partOfSpeech="n"/>
      <Sense id="ewn-cat-1" synset="ewn-001-n"/>
    </LexicalEntry>
    <Synset id="ewn-001-n" ili="i46593" partOfSpeech="n" members="ewn-cat-1">
      <Definition>feline mammal</Definition>
      <Example>the cat sat</Example>
    </Synset>
  </Lexicon>
</LexicalResource>"#;

    fn populated() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        initialize_database(&mut conn).unwrap();
        let resource = parse_lmf_str(FIXTURE, &ParseOptions::default()).unwrap();
        add_resource(&mut conn, &resource, false, &no_progress()).unwrap();
        conn
    }

    #[test]
    fn xml_export_is_reingestable() {
        let conn = populated();
        let document =
            export_to_string(&conn, &ExportOptions::default()).unwrap();
        assert!(document.starts_with(XML_DECLARATION));

        let reparsed = parse_lmf_str(&document, &ParseOptions::default()).unwrap();
        assert_eq!(reparsed.lexicons.len(), 1);
        let lexicon = &reparsed.lexicons[0];
        assert_eq!(lexicon.id, "ewn");
        assert_eq!(lexicon.lexical_entries.len(), 1);
        assert_eq!(lexicon.synsets.len(), 1);
        assert_eq!(lexicon.synsets[0].ili.as_deref(), Some("i46593"));
        assert_eq!(lexicon.synsets[0].examples[0].text, "the cat sat");
    }

    #[test]
    fn json_export_carries_lexicon_identity() {
        let conn = populated();
        let options = ExportOptions {
            format: ExportFormat::Json,
            ..ExportOptions::default()
        };
        let document = export_to_string(&conn, &options).unwrap();
        let value: serde_json::Value = serde_json::from_str(&document).unwrap();

        let lexicon = &value["lexicons"][0];
        assert_eq!(lexicon["id"], "ewn");
        assert_eq!(lexicon["version"], "1");
        assert_eq!(lexicon["entries"][0]["lemma"], "cat");
        assert_eq!(lexicon["synsets"][0]["definitions"][0], "feline mammal");
    }

    #[test]
    fn unknown_lexicon_selection_fails() {
        let conn = populated();
        let options = ExportOptions {
            lexicons: vec!["missing".to_string()],
            ..ExportOptions::default()
        };
        let err = export_to_string(&conn, &options).unwrap_err();
        assert!(matches!(err, WnError::LexiconNotFound(_)));
    }

    #[test]
    fn explicit_selection_filters() {
        let conn = populated();
        let options = ExportOptions {
            lexicons: vec!["ewn".to_string()],
            ..ExportOptions::default()
        };
        let document = export_to_string(&conn, &options).unwrap();
        assert!(document.contains("ewn-cat"));
    }
}
