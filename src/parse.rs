//! LMF parsing strategies.
//!
//! Two interchangeable strategies produce the same document model:
//!
//! - [`ParserStrategy::WholeFile`] deserializes the entire document through
//!   serde (`quick_xml::de`). Simple and fast for small inputs.
//! - [`ParserStrategy::Streaming`] walks XML events over any `BufRead`,
//!   buffering only the entry or synset currently under construction and
//!   emitting each entity as its closing tag is reached. Required for
//!   multi-hundred-megabyte documents.
//!
//! [`ParserStrategy::Auto`] picks by file size. Every strategy runs the same
//! [`validate`] pass, so well-formed input yields equal results regardless of
//! strategy.

use crate::error::{Result, WnError};
use crate::models::{
    Definition, Example, Form, IliDefinition, Lemma, LexicalEntry, LexicalResource, Lexicon,
    PartOfSpeech, Pronunciation, Requires, Sense, SenseRelation, Synset, SynsetRelation,
};
use crate::progress::{self, ProgressReporter, ProgressUpdate};
use crate::relations::{SenseRelType, SynsetRelType};
use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use tokio::task;

/// Above this size the Auto strategy switches to streaming.
pub const WHOLE_FILE_LIMIT: u64 = 16 * 1024 * 1024;

const PROGRESS_EVERY: u64 = 1000;

/// Explicitly selected parsing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserStrategy {
    /// File-size heuristic: whole-file below [`WHOLE_FILE_LIMIT`], streaming
    /// above it.
    #[default]
    Auto,
    WholeFile,
    Streaming,
}

impl ParserStrategy {
    fn resolve(self, file_size: u64) -> ParserStrategy {
        match self {
            ParserStrategy::Auto if file_size <= WHOLE_FILE_LIMIT => ParserStrategy::WholeFile,
            ParserStrategy::Auto => ParserStrategy::Streaming,
            other => other,
        }
    }
}

/// Options shared by all strategies.
#[derive(Clone)]
pub struct ParseOptions {
    /// Reject relation types outside the closed vocabulary.
    pub strict: bool,
    pub progress: ProgressReporter,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            strict: false,
            progress: progress::no_progress(),
        }
    }
}

/// Parses an LMF file with the given strategy, off the async runtime.
pub async fn parse_lmf_file(
    path: &Path,
    strategy: ParserStrategy,
    options: ParseOptions,
) -> Result<LexicalResource> {
    let size = tokio::fs::metadata(path).await?.len();
    let resolved = strategy.resolve(size);
    debug!(
        "Parsing {:?} ({} bytes) with strategy {:?}",
        path, size, resolved
    );
    let path = path.to_path_buf();
    task::spawn_blocking(move || match resolved {
        ParserStrategy::WholeFile | ParserStrategy::Auto => {
            let content = std::fs::read_to_string(&path)?;
            parse_lmf_str(&content, &options)
        }
        ParserStrategy::Streaming => {
            let file = File::open(&path)?;
            parse_lmf_reader(BufReader::new(file), &options)
        }
    })
    .await?
}

/// Whole-file strategy: serde deserialization of a complete document.
pub fn parse_lmf_str(content: &str, options: &ParseOptions) -> Result<LexicalResource> {
    let resource: LexicalResource = quick_xml::de::from_str(content)?;
    validate(&resource, options.strict)?;
    Ok(resource)
}

/// Streaming strategy over any byte source. Never holds the full document.
pub fn parse_lmf_reader<R: std::io::BufRead>(
    reader: R,
    options: &ParseOptions,
) -> Result<LexicalResource> {
    let mut collector = ResourceCollector::default();
    stream_parse(reader, &mut collector, options)?;
    let resource = collector.into_resource();
    validate(&resource, options.strict)?;
    Ok(resource)
}

// --- Streaming machinery ---

/// Receiver for entities emitted incrementally by the streaming parser, in
/// document order: a lexicon header, then its entries and synsets, then the
/// lexicon end.
pub trait LmfSink {
    fn lexicon_start(&mut self, lexicon: Lexicon) -> Result<()>;
    fn entry(&mut self, entry: LexicalEntry) -> Result<()>;
    fn synset(&mut self, synset: Synset) -> Result<()>;
    fn lexicon_end(&mut self) -> Result<()>;
}

/// Sink that rebuilds the whole document model; used when the caller wants
/// the same output as the whole-file strategy.
#[derive(Default)]
pub struct ResourceCollector {
    resource: LexicalResource,
}

impl ResourceCollector {
    pub fn into_resource(self) -> LexicalResource {
        self.resource
    }

    fn current(&mut self) -> Result<&mut Lexicon> {
        self.resource
            .lexicons
            .last_mut()
            .ok_or_else(|| WnError::Internal("entity emitted outside a lexicon".to_string()))
    }
}

impl LmfSink for ResourceCollector {
    fn lexicon_start(&mut self, lexicon: Lexicon) -> Result<()> {
        self.resource.lexicons.push(lexicon);
        Ok(())
    }

    fn entry(&mut self, entry: LexicalEntry) -> Result<()> {
        self.current()?.lexical_entries.push(entry);
        Ok(())
    }

    fn synset(&mut self, synset: Synset) -> Result<()> {
        self.current()?.synsets.push(synset);
        Ok(())
    }

    fn lexicon_end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Text-bearing child element currently being accumulated.
enum Capture {
    Definition(Definition),
    IliDefinition(IliDefinition),
    Example(Example),
    Pronunciation(Pronunciation),
}

/// Open-element context of the entity under construction. This is the only
/// state the streaming parser keeps between events.
#[derive(Default)]
struct StreamState {
    lexicon: Option<Lexicon>,
    header_sent: bool,
    entry: Option<EntryBuilder>,
    sense: Option<Sense>,
    synset: Option<Synset>,
    capture: Option<Capture>,
    emitted: u64,
}

#[derive(Default)]
struct EntryBuilder {
    id: String,
    lemma: Option<Lemma>,
    forms: Vec<Form>,
    pronunciations: Vec<Pronunciation>,
    senses: Vec<Sense>,
}

/// Drives a sink from an XML byte stream. Entities are handed to the sink as
/// their closing tags are reached; nothing else is retained.
pub fn stream_parse<R: std::io::BufRead, S: LmfSink>(
    reader: R,
    sink: &mut S,
    options: &ParseOptions,
) -> Result<()> {
    let mut xml = Reader::from_reader(reader);
    let mut buf = Vec::new();
    let mut state = StreamState::default();

    loop {
        let pos = xml.buffer_position();
        match xml.read_event_into(&mut buf) {
            Err(e) => return Err(WnError::parse_at(e.to_string(), xml.buffer_position())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) => {
                state.open(e, pos, sink)?;
            }
            Ok(Event::Empty(ref e)) => {
                state.open(e, pos, sink)?;
                let name = e.name().as_ref().to_vec();
                state.close(&name, pos, sink, options)?;
            }
            Ok(Event::End(ref e)) => {
                let name = e.name().as_ref().to_vec();
                state.close(&name, pos, sink, options)?;
            }
            Ok(Event::Text(ref t)) => {
                if state.capture.is_some() {
                    let text = t
                        .unescape()
                        .map_err(|e| WnError::parse_at(format!("text decode error: {e}"), pos))?;
                    state.append_text(&text);
                }
            }
            Ok(Event::CData(ref t)) => {
                if state.capture.is_some() {
                    let text = String::from_utf8_lossy(t.as_ref()).into_owned();
                    state.append_text(&text);
                }
            }
            // Declarations, DOCTYPE, comments, processing instructions.
            Ok(_) => {}
        }
        buf.clear();
    }

    if state.lexicon.is_some() {
        return Err(WnError::parse_at(
            "unexpected end of input inside Lexicon",
            xml.buffer_position(),
        ));
    }
    Ok(())
}

fn attr_map(e: &BytesStart, pos: u64) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| WnError::parse_at(format!("bad attribute: {err}"), pos))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| WnError::parse_at(format!("bad attribute value: {err}"), pos))?
            .into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn required(attrs: &mut HashMap<String, String>, key: &str, element: &str, pos: u64) -> Result<String> {
    attrs
        .remove(key)
        .ok_or_else(|| WnError::parse_at(format!("<{element}> missing required @{key}"), pos))
}

fn parse_pos(value: &str, element: &str, pos: u64) -> Result<PartOfSpeech> {
    PartOfSpeech::from_str(value)
        .map_err(|_| WnError::parse_at(format!("<{element}> has invalid partOfSpeech '{value}'"), pos))
}

impl StreamState {
    fn append_text(&mut self, text: &str) {
        if let Some(capture) = self.capture.as_mut() {
            match capture {
                Capture::Definition(d) => d.text.push_str(text),
                Capture::IliDefinition(d) => d.text.push_str(text),
                Capture::Example(e) => e.text.push_str(text),
                Capture::Pronunciation(p) => p.text.push_str(text),
            }
        }
    }

    fn ensure_header_sent<S: LmfSink>(&mut self, sink: &mut S) -> Result<()> {
        if !self.header_sent {
            let lexicon = self
                .lexicon
                .as_ref()
                .ok_or_else(|| WnError::Internal("no open lexicon".to_string()))?;
            sink.lexicon_start(lexicon.header_only())?;
            self.header_sent = true;
        }
        Ok(())
    }

    fn open<S: LmfSink>(&mut self, e: &BytesStart, pos: u64, sink: &mut S) -> Result<()> {
        let name = e.name();
        let mut attrs = attr_map(e, pos)?;
        match name.as_ref() {
            b"LexicalResource" => {}
            b"Lexicon" => {
                if self.lexicon.is_some() {
                    return Err(WnError::parse_at("nested <Lexicon>", pos));
                }
                let confidence_score = match attrs.remove("confidenceScore") {
                    Some(v) => Some(v.parse::<f32>().map_err(|_| {
                        WnError::parse_at(format!("invalid confidenceScore '{v}'"), pos)
                    })?),
                    None => None,
                };
                self.lexicon = Some(Lexicon {
                    id: required(&mut attrs, "id", "Lexicon", pos)?,
                    label: required(&mut attrs, "label", "Lexicon", pos)?,
                    language: required(&mut attrs, "language", "Lexicon", pos)?,
                    email: required(&mut attrs, "email", "Lexicon", pos)?,
                    license: required(&mut attrs, "license", "Lexicon", pos)?,
                    version: required(&mut attrs, "version", "Lexicon", pos)?,
                    url: attrs.remove("url"),
                    citation: attrs.remove("citation"),
                    logo: attrs.remove("logo"),
                    status: attrs.remove("status"),
                    confidence_score,
                    requires: Vec::new(),
                    lexical_entries: Vec::new(),
                    synsets: Vec::new(),
                });
                self.header_sent = false;
            }
            b"Requires" => {
                let requires = Requires {
                    id: required(&mut attrs, "id", "Requires", pos)?,
                    version: required(&mut attrs, "version", "Requires", pos)?,
                };
                match self.lexicon.as_mut() {
                    Some(lexicon) if !self.header_sent => lexicon.requires.push(requires),
                    _ => return Err(WnError::parse_at("<Requires> outside lexicon header", pos)),
                }
            }
            b"LexicalEntry" => {
                self.ensure_header_sent(sink)?;
                self.entry = Some(EntryBuilder {
                    id: required(&mut attrs, "id", "LexicalEntry", pos)?,
                    ..EntryBuilder::default()
                });
            }
            b"Lemma" => {
                let written_form = required(&mut attrs, "writtenForm", "Lemma", pos)?;
                let pos_attr = required(&mut attrs, "partOfSpeech", "Lemma", pos)?;
                let lemma = Lemma {
                    written_form,
                    part_of_speech: parse_pos(&pos_attr, "Lemma", pos)?,
                };
                match self.entry.as_mut() {
                    Some(entry) => entry.lemma = Some(lemma),
                    None => return Err(WnError::parse_at("<Lemma> outside <LexicalEntry>", pos)),
                }
            }
            b"Form" => {
                let form = Form {
                    written_form: required(&mut attrs, "writtenForm", "Form", pos)?,
                };
                match self.entry.as_mut() {
                    Some(entry) => entry.forms.push(form),
                    None => return Err(WnError::parse_at("<Form> outside <LexicalEntry>", pos)),
                }
            }
            b"Pronunciation" => {
                let phonemic = match attrs.remove("phonemic").as_deref() {
                    Some("false") | Some("0") => false,
                    _ => true,
                };
                self.capture = Some(Capture::Pronunciation(Pronunciation {
                    variety: attrs.remove("variety"),
                    notation: attrs.remove("notation"),
                    phonemic,
                    audio: attrs.remove("audio"),
                    text: String::new(),
                }));
            }
            b"Sense" => {
                if self.entry.is_none() {
                    return Err(WnError::parse_at("<Sense> outside <LexicalEntry>", pos));
                }
                self.sense = Some(Sense {
                    id: required(&mut attrs, "id", "Sense", pos)?,
                    synset: required(&mut attrs, "synset", "Sense", pos)?,
                    sense_relations: Vec::new(),
                });
            }
            b"SenseRelation" => {
                let rel_type = required(&mut attrs, "relType", "SenseRelation", pos)?;
                let relation = SenseRelation {
                    rel_type: SenseRelType::parse(&rel_type),
                    target: required(&mut attrs, "target", "SenseRelation", pos)?,
                };
                match self.sense.as_mut() {
                    Some(sense) => sense.sense_relations.push(relation),
                    None => {
                        return Err(WnError::parse_at("<SenseRelation> outside <Sense>", pos));
                    }
                }
            }
            b"Synset" => {
                self.ensure_header_sent(sink)?;
                let pos_attr = required(&mut attrs, "partOfSpeech", "Synset", pos)?;
                self.synset = Some(Synset {
                    id: required(&mut attrs, "id", "Synset", pos)?,
                    ili: attrs.remove("ili"),
                    part_of_speech: parse_pos(&pos_attr, "Synset", pos)?,
                    members: attrs.remove("members").unwrap_or_default(),
                    definitions: Vec::new(),
                    ili_definition: None,
                    synset_relations: Vec::new(),
                    examples: Vec::new(),
                });
            }
            b"Definition" => {
                self.capture = Some(Capture::Definition(Definition {
                    language: attrs.remove("language"),
                    dc_source: attrs.remove("dc:source"),
                    text: String::new(),
                }));
            }
            b"ILIDefinition" => {
                self.capture = Some(Capture::IliDefinition(IliDefinition {
                    dc_source: attrs.remove("dc:source"),
                    text: String::new(),
                }));
            }
            b"Example" => {
                self.capture = Some(Capture::Example(Example {
                    dc_source: attrs.remove("dc:source"),
                    text: String::new(),
                }));
            }
            b"SynsetRelation" => {
                let rel_type = required(&mut attrs, "relType", "SynsetRelation", pos)?;
                let relation = SynsetRelation {
                    rel_type: SynsetRelType::parse(&rel_type),
                    target: required(&mut attrs, "target", "SynsetRelation", pos)?,
                };
                match self.synset.as_mut() {
                    Some(synset) => synset.synset_relations.push(relation),
                    None => {
                        return Err(WnError::parse_at("<SynsetRelation> outside <Synset>", pos));
                    }
                }
            }
            // Unknown elements (SyntacticBehaviour, Count, ...) are skipped.
            _ => {}
        }
        Ok(())
    }

    fn close<S: LmfSink>(
        &mut self,
        name: &[u8],
        pos: u64,
        sink: &mut S,
        options: &ParseOptions,
    ) -> Result<()> {
        match name {
            b"Lexicon" => {
                self.ensure_header_sent(sink)?;
                sink.lexicon_end()?;
                self.lexicon = None;
                self.header_sent = false;
            }
            b"LexicalEntry" => {
                let builder = self
                    .entry
                    .take()
                    .ok_or_else(|| WnError::parse_at("unmatched </LexicalEntry>", pos))?;
                let lemma = builder.lemma.ok_or_else(|| {
                    WnError::parse_at(
                        format!("<LexicalEntry id=\"{}\"> missing <Lemma>", builder.id),
                        pos,
                    )
                })?;
                sink.entry(LexicalEntry {
                    id: builder.id,
                    lemma,
                    forms: builder.forms,
                    pronunciations: builder.pronunciations,
                    senses: builder.senses,
                })?;
                self.bump_progress(options)?;
            }
            b"Sense" => {
                let sense = self
                    .sense
                    .take()
                    .ok_or_else(|| WnError::parse_at("unmatched </Sense>", pos))?;
                match self.entry.as_mut() {
                    Some(entry) => entry.senses.push(sense),
                    None => return Err(WnError::parse_at("<Sense> outside <LexicalEntry>", pos)),
                }
            }
            b"Synset" => {
                let synset = self
                    .synset
                    .take()
                    .ok_or_else(|| WnError::parse_at("unmatched </Synset>", pos))?;
                sink.synset(synset)?;
                self.bump_progress(options)?;
            }
            b"Definition" => match self.capture.take() {
                Some(Capture::Definition(definition)) => match self.synset.as_mut() {
                    Some(synset) => synset.definitions.push(definition),
                    None => return Err(WnError::parse_at("<Definition> outside <Synset>", pos)),
                },
                _ => return Err(WnError::parse_at("unmatched </Definition>", pos)),
            },
            b"ILIDefinition" => match self.capture.take() {
                Some(Capture::IliDefinition(definition)) => match self.synset.as_mut() {
                    Some(synset) => synset.ili_definition = Some(definition),
                    None => {
                        return Err(WnError::parse_at("<ILIDefinition> outside <Synset>", pos));
                    }
                },
                _ => return Err(WnError::parse_at("unmatched </ILIDefinition>", pos)),
            },
            b"Example" => match self.capture.take() {
                Some(Capture::Example(example)) => match self.synset.as_mut() {
                    Some(synset) => synset.examples.push(example),
                    None => return Err(WnError::parse_at("<Example> outside <Synset>", pos)),
                },
                _ => return Err(WnError::parse_at("unmatched </Example>", pos)),
            },
            b"Pronunciation" => match self.capture.take() {
                Some(Capture::Pronunciation(pronunciation)) => match self.entry.as_mut() {
                    Some(entry) => entry.pronunciations.push(pronunciation),
                    None => {
                        return Err(WnError::parse_at(
                            "<Pronunciation> outside <LexicalEntry>",
                            pos,
                        ));
                    }
                },
                _ => return Err(WnError::parse_at("unmatched </Pronunciation>", pos)),
            },
            _ => {}
        }
        Ok(())
    }

    fn bump_progress(&mut self, options: &ParseOptions) -> Result<()> {
        self.emitted += 1;
        if self.emitted % PROGRESS_EVERY == 0 {
            let keep_going = progress::report(
                &options.progress,
                ProgressUpdate {
                    stage_description: "Parsing LMF document".to_string(),
                    current_item: self.emitted,
                    total_items: None,
                    message: None,
                },
            );
            if !keep_going {
                return Err(WnError::Cancelled);
            }
        }
        Ok(())
    }
}

// --- Shared validation ---

/// Cross-reference and vocabulary checks applied after any strategy.
///
/// A lexicon that declares `Requires` dependencies may reference synsets and
/// senses defined in those external lexicons; resolution then happens at
/// query time through the store.
pub fn validate(resource: &LexicalResource, strict: bool) -> Result<()> {
    for lexicon in &resource.lexicons {
        let external_refs = !lexicon.requires.is_empty();

        let mut entry_ids = HashSet::new();
        let mut sense_to_synset: HashMap<&str, &str> = HashMap::new();
        for entry in &lexicon.lexical_entries {
            if !entry_ids.insert(entry.id.as_str()) {
                return Err(WnError::Validation(format!(
                    "duplicate LexicalEntry id '{}' in lexicon '{}'",
                    entry.id, lexicon.id
                )));
            }
            for sense in &entry.senses {
                if sense_to_synset
                    .insert(sense.id.as_str(), sense.synset.as_str())
                    .is_some()
                {
                    return Err(WnError::Validation(format!(
                        "duplicate Sense id '{}' in lexicon '{}'",
                        sense.id, lexicon.id
                    )));
                }
            }
        }

        let mut synset_ids = HashSet::new();
        for synset in &lexicon.synsets {
            if !synset_ids.insert(synset.id.as_str()) {
                return Err(WnError::Validation(format!(
                    "duplicate Synset id '{}' in lexicon '{}'",
                    synset.id, lexicon.id
                )));
            }
        }

        // Every sense's synset must resolve within the lexicon unless the
        // lexicon explicitly depends on others.
        if !external_refs {
            for (sense_id, synset_id) in &sense_to_synset {
                if !synset_ids.contains(synset_id) {
                    return Err(WnError::Validation(format!(
                        "sense '{}' references unknown synset '{}' in lexicon '{}'",
                        sense_id, synset_id, lexicon.id
                    )));
                }
            }
        }

        // Member lists and sense back-references must agree bidirectionally.
        for synset in &lexicon.synsets {
            for member in synset.member_ids() {
                match sense_to_synset.get(member.as_str()) {
                    Some(back_ref) if *back_ref == synset.id => {}
                    Some(back_ref) => {
                        return Err(WnError::Validation(format!(
                            "synset '{}' lists member '{}' whose sense points at '{}'",
                            synset.id, member, back_ref
                        )));
                    }
                    None if external_refs => {}
                    None => {
                        return Err(WnError::Validation(format!(
                            "synset '{}' lists unknown member sense '{}'",
                            synset.id, member
                        )));
                    }
                }
            }
        }

        if strict {
            for synset in &lexicon.synsets {
                if synset
                    .synset_relations
                    .iter()
                    .any(|r| r.rel_type == SynsetRelType::Other)
                {
                    return Err(WnError::Validation(format!(
                        "synset '{}' uses a relation type outside the closed vocabulary",
                        synset.id
                    )));
                }
            }
            for entry in &lexicon.lexical_entries {
                for sense in &entry.senses {
                    if sense
                        .sense_relations
                        .iter()
                        .any(|r| r.rel_type == SenseRelType::Other)
                    {
                        return Err(WnError::Validation(format!(
                            "sense '{}' uses a relation type outside the closed vocabulary",
                            sense.id
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Basic test with a minimal valid LMF structure
    const MINIMAL_LMF_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE LexicalResource SYSTEM "http://globalwordnet.github.io/schemas/WN-LMF-1.3.dtd">
<LexicalResource xmlns:dc="http://purl.org/dc/elements/1.1/">
  <Lexicon id="test-en"
           label="Test Wordnet (English)"
           language="en"
           email="test@example.com"
           license="https://example.com/license"
           version="1.0">
    <LexicalEntry id="w1">
      <Lemma writtenForm="cat" partOfSpeech="n"/>
      <Sense id="test-en-1-n-1" synset="test-en-1-n"/>
    </LexicalEntry>
    <Synset id="test-en-1-n" ili="i46593" partOfSpeech="n" members="test-en-1-n-1">
      <Definition>A small domesticated carnivorous mammal.</Definition>
      <Example>"the cat sat on the mat"</Example>
    </Synset>
  </Lexicon>
</LexicalResource>
"#;

    const LMF_WITH_RELATIONS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<LexicalResource xmlns:dc="http://purl.org/dc/elements/1.1/">
  <Lexicon id="test-en" label="Test" language="en" email="a@b.c"
           license="https://example.com/license" version="1.0">
    <LexicalEntry id="w1">
      <Lemma writtenForm="cat" partOfSpeech="n"/>
      <Pronunciation variety="en-GB-fonipa">kæt</Pronunciation>
      <Sense id="s1" synset="ss1">
        <SenseRelation relType="derivation" target="s2"/>
      </Sense>
    </LexicalEntry>
    <LexicalEntry id="w2">
      <Lemma writtenForm="feline" partOfSpeech="n"/>
      <Form writtenForm="felines"/>
      <Sense id="s2" synset="ss1"/>
    </LexicalEntry>
    <Synset id="ss1" ili="i46593" partOfSpeech="n" members="s1 s2">
      <Definition language="en">feline mammal</Definition>
      <SynsetRelation relType="hypernym" target="ss2"/>
    </Synset>
    <Synset id="ss2" ili="i46541" partOfSpeech="n">
      <Definition>a carnivore</Definition>
      <SynsetRelation relType="hyponym" target="ss1"/>
    </Synset>
  </Lexicon>
</LexicalResource>
"#;

    #[test]
    fn whole_file_minimal() {
        let resource = parse_lmf_str(MINIMAL_LMF_XML, &ParseOptions::default()).unwrap();
        assert_eq!(resource.lexicons.len(), 1);
        let lexicon = &resource.lexicons[0];
        assert_eq!(lexicon.id, "test-en");
        assert_eq!(lexicon.lexical_entries.len(), 1);
        assert_eq!(lexicon.synsets.len(), 1);
        assert_eq!(lexicon.lexical_entries[0].lemma.written_form, "cat");
        assert_eq!(
            lexicon.synsets[0].definitions[0].text,
            "A small domesticated carnivorous mammal."
        );
    }

    #[test]
    fn streaming_minimal() {
        let resource =
            parse_lmf_reader(MINIMAL_LMF_XML.as_bytes(), &ParseOptions::default()).unwrap();
        assert_eq!(resource.lexicons.len(), 1);
        let lexicon = &resource.lexicons[0];
        assert_eq!(lexicon.synsets[0].ili.as_deref(), Some("i46593"));
        assert_eq!(lexicon.synsets[0].examples.len(), 1);
        assert_eq!(lexicon.synsets[0].member_ids(), vec!["test-en-1-n-1"]);
    }

    // The core property of the subsystem: strategies agree on output.
    #[test]
    fn strategies_agree() {
        for doc in [MINIMAL_LMF_XML, LMF_WITH_RELATIONS] {
            let whole = parse_lmf_str(doc, &ParseOptions::default()).unwrap();
            let streamed = parse_lmf_reader(doc.as_bytes(), &ParseOptions::default()).unwrap();
            assert_eq!(whole, streamed);
        }
    }

    #[test]
    fn streaming_preserves_order_and_case() {
        let resource =
            parse_lmf_reader(LMF_WITH_RELATIONS.as_bytes(), &ParseOptions::default()).unwrap();
        let lexicon = &resource.lexicons[0];
        assert_eq!(lexicon.lexical_entries[0].lemma.written_form, "cat");
        assert_eq!(lexicon.lexical_entries[1].lemma.written_form, "feline");
        assert_eq!(lexicon.lexical_entries[1].forms[0].written_form, "felines");
        assert_eq!(
            lexicon.lexical_entries[0].pronunciations[0].text,
            "kæt"
        );
        assert_eq!(
            lexicon.synsets[0].definitions[0].language.as_deref(),
            Some("en")
        );
    }

    #[test]
    fn malformed_xml_fails_with_position() {
        let doc = "<LexicalResource><Lexicon id=\"x\"</LexicalResource>";
        let err = parse_lmf_reader(doc.as_bytes(), &ParseOptions::default()).unwrap_err();
        match err {
            WnError::Parse { offset, .. } => assert!(offset > 0),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_pos_is_an_error_not_a_default() {
        let doc = r#"<LexicalResource>
  <Lexicon id="l" label="L" language="en" email="e" license="c" version="1">
    <Synset id="ss1" partOfSpeech="q"/>
  </Lexicon>
</LexicalResource>"#;
        let err = parse_lmf_reader(doc.as_bytes(), &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, WnError::Parse { .. }), "got {err:?}");
        // The serde strategy must reject it too.
        assert!(parse_lmf_str(doc, &ParseOptions::default()).is_err());
    }

    #[test]
    fn missing_pos_on_synset_is_an_error() {
        let doc = r#"<LexicalResource>
  <Lexicon id="l" label="L" language="en" email="e" license="c" version="1">
    <Synset id="ss1"/>
  </Lexicon>
</LexicalResource>"#;
        assert!(parse_lmf_reader(doc.as_bytes(), &ParseOptions::default()).is_err());
        assert!(parse_lmf_str(doc, &ParseOptions::default()).is_err());
    }

    #[test]
    fn dangling_sense_reference_fails_validation() {
        let doc = r#"<LexicalResource>
  <Lexicon id="l" label="L" language="en" email="e" license="c" version="1">
    <LexicalEntry id="w1">
      <Lemma writtenForm="cat" partOfSpeech="n"/>
      <Sense id="s1" synset="nowhere"/>
    </LexicalEntry>
  </Lexicon>
</LexicalResource>"#;
        let err = parse_lmf_reader(doc.as_bytes(), &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, WnError::Validation(_)), "got {err:?}");
    }

    #[test]
    fn member_back_reference_mismatch_fails_validation() {
        let doc = r#"<LexicalResource>
  <Lexicon id="l" label="L" language="en" email="e" license="c" version="1">
    <LexicalEntry id="w1">
      <Lemma writtenForm="cat" partOfSpeech="n"/>
      <Sense id="s1" synset="ss1"/>
    </LexicalEntry>
    <Synset id="ss1" partOfSpeech="n" members="s1"/>
    <Synset id="ss2" partOfSpeech="n" members="s1"/>
  </Lexicon>
</LexicalResource>"#;
        let err = parse_lmf_reader(doc.as_bytes(), &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, WnError::Validation(_)), "got {err:?}");
    }

    #[test]
    fn strict_mode_rejects_unknown_relation_types() {
        let doc = r#"<LexicalResource>
  <Lexicon id="l" label="L" language="en" email="e" license="c" version="1">
    <Synset id="ss1" partOfSpeech="n">
      <SynsetRelation relType="feather_of" target="ss1"/>
    </Synset>
  </Lexicon>
</LexicalResource>"#;
        let lenient = ParseOptions::default();
        assert!(parse_lmf_reader(doc.as_bytes(), &lenient).is_ok());
        let strict = ParseOptions {
            strict: true,
            ..ParseOptions::default()
        };
        let err = parse_lmf_reader(doc.as_bytes(), &strict).unwrap_err();
        assert!(matches!(err, WnError::Validation(_)), "got {err:?}");
    }

    #[test]
    fn text_is_not_normalized() {
        let doc = r#"<LexicalResource>
  <Lexicon id="l" label="L" language="en" email="e" license="c" version="1">
    <LexicalEntry id="w1">
      <Lemma writtenForm="Paris" partOfSpeech="n"/>
      <Sense id="s1" synset="ss1"/>
    </LexicalEntry>
    <Synset id="ss1" partOfSpeech="n">
      <Definition>Capital of France;  two spaces kept</Definition>
    </Synset>
  </Lexicon>
</LexicalResource>"#;
        let resource = parse_lmf_reader(doc.as_bytes(), &ParseOptions::default()).unwrap();
        let lexicon = &resource.lexicons[0];
        assert_eq!(lexicon.lexical_entries[0].lemma.written_form, "Paris");
        assert_eq!(
            lexicon.synsets[0].definitions[0].text,
            "Capital of France;  two spaces kept"
        );
    }

    #[tokio::test]
    async fn file_dispatch_auto() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mini.xml");
        std::fs::write(&path, MINIMAL_LMF_XML).unwrap();
        let auto = parse_lmf_file(&path, ParserStrategy::Auto, ParseOptions::default())
            .await
            .unwrap();
        let streaming = parse_lmf_file(&path, ParserStrategy::Streaming, ParseOptions::default())
            .await
            .unwrap();
        assert_eq!(auto, streaming);
    }
}
