use crate::relations::{SenseRelType, SynsetRelType};
use serde::{Deserialize, Serialize};

// --- Top Level ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LexicalResource {
    #[serde(rename = "Lexicon", default)]
    pub lexicons: Vec<Lexicon>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@label")]
    pub label: String,
    #[serde(rename = "@language")]
    pub language: String,
    #[serde(rename = "@email")]
    pub email: String,
    #[serde(rename = "@license")]
    pub license: String,
    #[serde(rename = "@version")]
    pub version: String,
    #[serde(rename = "@url", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "@citation", default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(rename = "@logo", default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(rename = "@status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "@confidenceScore", default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f32>,

    // Requires element for dependencies on other lexicons
    #[serde(rename = "Requires", default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Requires>,

    // Lexical Entries and Synsets
    #[serde(rename = "LexicalEntry", default)]
    pub lexical_entries: Vec<LexicalEntry>,
    #[serde(rename = "Synset", default)]
    pub synsets: Vec<Synset>,
}

impl Lexicon {
    /// A lexicon carrying only its metadata, used by the streaming parser
    /// when the opening tag is seen and entries are still to come.
    pub fn header_only(&self) -> Lexicon {
        Lexicon {
            lexical_entries: Vec::new(),
            synsets: Vec::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requires {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@version")]
    pub version: String,
}

// --- Lexical Entry ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalEntry {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "Lemma")]
    pub lemma: Lemma,
    #[serde(rename = "Form", default, skip_serializing_if = "Vec::is_empty")]
    pub forms: Vec<Form>,
    #[serde(rename = "Pronunciation", default, skip_serializing_if = "Vec::is_empty")]
    pub pronunciations: Vec<Pronunciation>,
    #[serde(rename = "Sense", default)]
    pub senses: Vec<Sense>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lemma {
    #[serde(rename = "@writtenForm")]
    pub written_form: String,
    #[serde(rename = "@partOfSpeech")]
    pub part_of_speech: PartOfSpeech,
}

/// The closed part-of-speech vocabulary. Anything outside these five is a
/// validation error at parse time, never silently defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PartOfSpeech {
    #[serde(rename = "n")]
    Noun,
    #[serde(rename = "v")]
    Verb,
    #[serde(rename = "a")]
    Adjective,
    #[serde(rename = "s")]
    AdjectiveSatellite,
    #[serde(rename = "r")]
    Adverb,
}

/// An alternative written form of an entry (plural, inflection, spelling
/// variant).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Form {
    #[serde(rename = "@writtenForm")]
    pub written_form: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pronunciation {
    #[serde(rename = "@variety", default, skip_serializing_if = "Option::is_none")]
    pub variety: Option<String>, // e.g., "en-GB-fonipa"
    #[serde(rename = "@notation", default, skip_serializing_if = "Option::is_none")]
    pub notation: Option<String>,
    #[serde(rename = "@phonemic", default = "default_phonemic")]
    pub phonemic: bool, // Default true
    #[serde(rename = "@audio", default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>, // URL
    #[serde(rename = "$text")]
    pub text: String, // IPA text
}

fn default_phonemic() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sense {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@synset")]
    pub synset: String, // Reference to Synset ID
    #[serde(rename = "SenseRelation", default, skip_serializing_if = "Vec::is_empty")]
    pub sense_relations: Vec<SenseRelation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SenseRelation {
    #[serde(rename = "@relType")]
    pub rel_type: SenseRelType,
    #[serde(rename = "@target")]
    pub target: String, // Reference to another Sense ID
}

// --- Synset ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synset {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@ili", default, skip_serializing_if = "Option::is_none")]
    pub ili: Option<String>, // Global ILI id, or "in" for a proposed concept
    #[serde(rename = "@partOfSpeech")]
    pub part_of_speech: PartOfSpeech,
    #[serde(rename = "@members", default, skip_serializing_if = "String::is_empty")]
    pub members: String, // Space-separated list of member Sense IDs
    #[serde(rename = "Definition", default)]
    pub definitions: Vec<Definition>,
    #[serde(rename = "ILIDefinition", default, skip_serializing_if = "Option::is_none")]
    pub ili_definition: Option<IliDefinition>,
    #[serde(rename = "SynsetRelation", default, skip_serializing_if = "Vec::is_empty")]
    pub synset_relations: Vec<SynsetRelation>,
    #[serde(rename = "Example", default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Example>,
}

impl Synset {
    /// Member sense ids in declared order, or empty when the attribute was
    /// absent (member order then falls back to sense document order).
    pub fn member_ids(&self) -> Vec<String> {
        self.members.split_whitespace().map(String::from).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Definition {
    #[serde(rename = "@language", default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(rename = "@dc:source", default, skip_serializing_if = "Option::is_none")]
    pub dc_source: Option<String>,
    #[serde(rename = "$text")]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IliDefinition {
    #[serde(rename = "@dc:source", default, skip_serializing_if = "Option::is_none")]
    pub dc_source: Option<String>,
    #[serde(rename = "$text")]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SynsetRelation {
    #[serde(rename = "@relType")]
    pub rel_type: SynsetRelType,
    #[serde(rename = "@target")]
    pub target: String, // Reference to another Synset ID
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Example {
    #[serde(rename = "@dc:source", default, skip_serializing_if = "Option::is_none")]
    pub dc_source: Option<String>,
    #[serde(rename = "$text")]
    pub text: String,
}

// --- Interlingual Index ---

/// Status of an interlingual index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IliStatus {
    /// A concept carrying a real global id.
    Active,
    /// Declared as `ili="in"`: the lexicon proposes a new concept and must
    /// supply an ILIDefinition for it.
    Proposed,
}

/// A row of the interlingual index. Not lexicon-scoped; the join key for
/// cross-lexicon concept equivalence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IliEntry {
    pub id: String,
    pub definition: Option<String>,
    pub status: IliStatus,
}

/// Sentinel value for synsets declaring a proposed (not yet assigned) ILI.
pub const ILI_PROPOSED: &str = "in";

// Implement Display for PartOfSpeech for easier printing
impl std::fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PartOfSpeech::Noun => "noun",
                PartOfSpeech::Verb => "verb",
                PartOfSpeech::Adjective => "adjective",
                PartOfSpeech::AdjectiveSatellite => "adjective satellite",
                PartOfSpeech::Adverb => "adverb",
            }
        )
    }
}

// Implement FromStr for PartOfSpeech for filters and stored columns.
impl std::str::FromStr for PartOfSpeech {
    type Err = String; // Simple error type
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "n" | "noun" => Ok(PartOfSpeech::Noun),
            "v" | "verb" => Ok(PartOfSpeech::Verb),
            "a" | "adj" | "adjective" => Ok(PartOfSpeech::Adjective),
            "s" | "adj_sat" | "adjective_satellite" => Ok(PartOfSpeech::AdjectiveSatellite),
            "r" | "adv" | "adverb" => Ok(PartOfSpeech::Adverb),
            _ => Err(format!("Invalid part of speech: {}", s)),
        }
    }
}

impl PartOfSpeech {
    /// The single-letter LMF attribute value.
    pub fn tag(self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "n",
            PartOfSpeech::Verb => "v",
            PartOfSpeech::Adjective => "a",
            PartOfSpeech::AdjectiveSatellite => "s",
            PartOfSpeech::Adverb => "r",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn pos_round_trip() {
        for tag in ["n", "v", "a", "s", "r"] {
            let pos = PartOfSpeech::from_str(tag).unwrap();
            assert_eq!(pos.tag(), tag);
        }
    }

    #[test]
    fn pos_rejects_unknown() {
        assert!(PartOfSpeech::from_str("x").is_err());
        assert!(PartOfSpeech::from_str("").is_err());
    }

    #[test]
    fn member_ids_split() {
        let synset = Synset {
            id: "s1".into(),
            ili: None,
            part_of_speech: PartOfSpeech::Noun,
            members: "a b  c".into(),
            definitions: vec![],
            ili_definition: None,
            synset_relations: vec![],
            examples: vec![],
        };
        assert_eq!(synset.member_ids(), vec!["a", "b", "c"]);
    }
}
