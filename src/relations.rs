//! The closed vocabulary of typed relation edges and their inverse mapping.
//!
//! Relations are stored exactly as written in the source document; the
//! inverse direction is derived on the fly from the tables below rather than
//! dual-written.

use serde::{Deserialize, Serialize};

/// Relation types between two synsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynsetRelType {
    Hypernym,
    Hyponym,
    InstanceHypernym,
    InstanceHyponym,
    MeroMember,
    MeroPart,
    MeroSubstance,
    HoloMember,
    HoloPart,
    HoloSubstance,
    Meronym, // General meronym
    Holonym, // General holonym
    Entails,
    IsEntailedBy,
    Causes,
    IsCausedBy,
    Similar,
    Attribute,
    DomainRegion,
    DomainTopic,
    HasDomainRegion,
    HasDomainTopic,
    Exemplifies,
    IsExemplifiedBy,
    Antonym,
    Also,
    Pertainym,
    Participle,
    Derivation,
    // Catch-all for vocabulary extensions; rejected in strict parse mode.
    #[serde(other)]
    Other,
}

/// Relation types between two senses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenseRelType {
    Antonym,
    Also,
    Participle,
    Pertainym,
    Derivation,
    DomainTopic,
    DomainMemberTopic,
    DomainRegion,
    DomainMemberRegion,
    Exemplifies,
    IsExemplifiedBy,
    #[serde(other)]
    Other,
}

impl SynsetRelType {
    /// The LMF `relType` attribute value. Must agree with the serde renames.
    pub fn as_str(self) -> &'static str {
        use SynsetRelType::*;
        match self {
            Hypernym => "hypernym",
            Hyponym => "hyponym",
            InstanceHypernym => "instance_hypernym",
            InstanceHyponym => "instance_hyponym",
            MeroMember => "mero_member",
            MeroPart => "mero_part",
            MeroSubstance => "mero_substance",
            HoloMember => "holo_member",
            HoloPart => "holo_part",
            HoloSubstance => "holo_substance",
            Meronym => "meronym",
            Holonym => "holonym",
            Entails => "entails",
            IsEntailedBy => "is_entailed_by",
            Causes => "causes",
            IsCausedBy => "is_caused_by",
            Similar => "similar",
            Attribute => "attribute",
            DomainRegion => "domain_region",
            DomainTopic => "domain_topic",
            HasDomainRegion => "has_domain_region",
            HasDomainTopic => "has_domain_topic",
            Exemplifies => "exemplifies",
            IsExemplifiedBy => "is_exemplified_by",
            Antonym => "antonym",
            Also => "also",
            Pertainym => "pertainym",
            Participle => "participle",
            Derivation => "derivation",
            Other => "other",
        }
    }

    /// Parses an attribute value; unknown values map to `Other` so lenient
    /// parsing can proceed (strict mode rejects them afterwards).
    pub fn parse(s: &str) -> SynsetRelType {
        use SynsetRelType::*;
        match s {
            "hypernym" => Hypernym,
            "hyponym" => Hyponym,
            "instance_hypernym" => InstanceHypernym,
            "instance_hyponym" => InstanceHyponym,
            "mero_member" => MeroMember,
            "mero_part" => MeroPart,
            "mero_substance" => MeroSubstance,
            "holo_member" => HoloMember,
            "holo_part" => HoloPart,
            "holo_substance" => HoloSubstance,
            "meronym" => Meronym,
            "holonym" => Holonym,
            "entails" => Entails,
            "is_entailed_by" => IsEntailedBy,
            "causes" => Causes,
            "is_caused_by" => IsCausedBy,
            "similar" => Similar,
            "attribute" => Attribute,
            "domain_region" => DomainRegion,
            "domain_topic" => DomainTopic,
            "has_domain_region" => HasDomainRegion,
            "has_domain_topic" => HasDomainTopic,
            "exemplifies" => Exemplifies,
            "is_exemplified_by" => IsExemplifiedBy,
            "antonym" => Antonym,
            "also" => Also,
            "pertainym" => Pertainym,
            "participle" => Participle,
            "derivation" => Derivation,
            _ => Other,
        }
    }

    /// The inverse edge type, when one exists. Symmetric types are their own
    /// inverse; a few (pertainym, participle) have no inverse at all.
    pub fn inverse(self) -> Option<SynsetRelType> {
        use SynsetRelType::*;
        Some(match self {
            Hypernym => Hyponym,
            Hyponym => Hypernym,
            InstanceHypernym => InstanceHyponym,
            InstanceHyponym => InstanceHypernym,
            MeroMember => HoloMember,
            MeroPart => HoloPart,
            MeroSubstance => HoloSubstance,
            HoloMember => MeroMember,
            HoloPart => MeroPart,
            HoloSubstance => MeroSubstance,
            Meronym => Holonym,
            Holonym => Meronym,
            Entails => IsEntailedBy,
            IsEntailedBy => Entails,
            Causes => IsCausedBy,
            IsCausedBy => Causes,
            DomainRegion => HasDomainRegion,
            HasDomainRegion => DomainRegion,
            DomainTopic => HasDomainTopic,
            HasDomainTopic => DomainTopic,
            Exemplifies => IsExemplifiedBy,
            IsExemplifiedBy => Exemplifies,
            Similar | Attribute | Antonym | Also | Derivation => self,
            Pertainym | Participle | Other => return None,
        })
    }
}

impl SenseRelType {
    pub fn as_str(self) -> &'static str {
        use SenseRelType::*;
        match self {
            Antonym => "antonym",
            Also => "also",
            Participle => "participle",
            Pertainym => "pertainym",
            Derivation => "derivation",
            DomainTopic => "domain_topic",
            DomainMemberTopic => "domain_member_topic",
            DomainRegion => "domain_region",
            DomainMemberRegion => "domain_member_region",
            Exemplifies => "exemplifies",
            IsExemplifiedBy => "is_exemplified_by",
            Other => "other",
        }
    }

    pub fn parse(s: &str) -> SenseRelType {
        use SenseRelType::*;
        match s {
            "antonym" => Antonym,
            "also" => Also,
            "participle" => Participle,
            "pertainym" => Pertainym,
            "derivation" => Derivation,
            "domain_topic" => DomainTopic,
            "domain_member_topic" => DomainMemberTopic,
            "domain_region" => DomainRegion,
            "domain_member_region" => DomainMemberRegion,
            "exemplifies" => Exemplifies,
            "is_exemplified_by" => IsExemplifiedBy,
            _ => Other,
        }
    }

    pub fn inverse(self) -> Option<SenseRelType> {
        use SenseRelType::*;
        Some(match self {
            DomainTopic => DomainMemberTopic,
            DomainMemberTopic => DomainTopic,
            DomainRegion => DomainMemberRegion,
            DomainMemberRegion => DomainRegion,
            Exemplifies => IsExemplifiedBy,
            IsExemplifiedBy => Exemplifies,
            Antonym | Also | Derivation => self,
            Participle | Pertainym | Other => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_SYNSET_TYPES: &[SynsetRelType] = &[
        SynsetRelType::Hypernym,
        SynsetRelType::Hyponym,
        SynsetRelType::InstanceHypernym,
        SynsetRelType::InstanceHyponym,
        SynsetRelType::MeroMember,
        SynsetRelType::MeroPart,
        SynsetRelType::MeroSubstance,
        SynsetRelType::HoloMember,
        SynsetRelType::HoloPart,
        SynsetRelType::HoloSubstance,
        SynsetRelType::Meronym,
        SynsetRelType::Holonym,
        SynsetRelType::Entails,
        SynsetRelType::IsEntailedBy,
        SynsetRelType::Causes,
        SynsetRelType::IsCausedBy,
        SynsetRelType::Similar,
        SynsetRelType::Attribute,
        SynsetRelType::DomainRegion,
        SynsetRelType::DomainTopic,
        SynsetRelType::HasDomainRegion,
        SynsetRelType::HasDomainTopic,
        SynsetRelType::Exemplifies,
        SynsetRelType::IsExemplifiedBy,
        SynsetRelType::Antonym,
        SynsetRelType::Also,
        SynsetRelType::Pertainym,
        SynsetRelType::Participle,
        SynsetRelType::Derivation,
    ];

    #[test]
    fn string_round_trip() {
        for &rel in ALL_SYNSET_TYPES {
            assert_eq!(SynsetRelType::parse(rel.as_str()), rel);
        }
    }

    #[test]
    fn inverse_is_an_involution() {
        for &rel in ALL_SYNSET_TYPES {
            if let Some(inv) = rel.inverse() {
                assert_eq!(inv.inverse(), Some(rel), "inverse of {:?}", rel);
            }
        }
    }

    #[test]
    fn hypernym_pairs() {
        assert_eq!(
            SynsetRelType::Hypernym.inverse(),
            Some(SynsetRelType::Hyponym)
        );
        assert_eq!(
            SenseRelType::Antonym.inverse(),
            Some(SenseRelType::Antonym)
        );
        assert_eq!(SenseRelType::Pertainym.inverse(), None);
    }

    #[test]
    fn unknown_maps_to_other() {
        assert_eq!(SynsetRelType::parse("feather_of"), SynsetRelType::Other);
        assert_eq!(SenseRelType::parse("feather_of"), SenseRelType::Other);
    }
}
