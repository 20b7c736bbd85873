//! Mapping collections attached to component and threat drift records.

use super::parse::MappingKey;
use crate::diff::traits::MappingSet;
use crate::index::IndexService;
use crate::model::{IdRole, MappingFamily};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One relationship, with every referenced id resolved to a UUID.
///
/// Only the roles the family carries are set. Ids missing from the index
/// resolve to `Uuid::nil()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MappingEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_option: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_requirement: Option<Uuid>,
}

impl MappingEntry {
    /// Resolve the referenced ids of a parsed filename.
    pub fn resolve(key: &MappingKey, index: &dyn IndexService) -> Self {
        let mut entry = Self::default();
        for (role, id) in key.family.roles().iter().zip(&key.ids).skip(1) {
            let uuid = index.uuid_of(*id).unwrap_or_else(|| {
                tracing::error!(id, family = %key.family, "mapping references an id missing from the index");
                Uuid::nil()
            });
            match role {
                IdRole::Property => entry.property = Some(uuid),
                IdRole::PropertyOption => entry.property_option = Some(uuid),
                IdRole::Threat => entry.threat = Some(uuid),
                IdRole::SecurityRequirement => entry.security_requirement = Some(uuid),
                IdRole::Component => {}
            }
        }
        entry
    }
}

fn normalize_slot(slot: &mut Vec<MappingEntry>) {
    slot.sort();
    slot.dedup();
}

/// Mapping deltas owned by one component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMappingCollection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<MappingEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_options: Vec<MappingEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_option_threats: Vec<MappingEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_option_threat_security_requirements: Vec<MappingEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub threats: Vec<MappingEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub threat_security_requirements: Vec<MappingEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_requirements: Vec<MappingEntry>,
}

impl ComponentMappingCollection {
    fn slot_mut(&mut self, family: MappingFamily) -> Option<&mut Vec<MappingEntry>> {
        match family {
            MappingFamily::ComponentProperty => Some(&mut self.properties),
            MappingFamily::ComponentPropertyOption => Some(&mut self.property_options),
            MappingFamily::ComponentPropertyOptionThreat => Some(&mut self.property_option_threats),
            MappingFamily::ComponentPropertyOptionThreatSecurityRequirement => {
                Some(&mut self.property_option_threat_security_requirements)
            }
            MappingFamily::ComponentThreat => Some(&mut self.threats),
            MappingFamily::ComponentThreatSecurityRequirement => {
                Some(&mut self.threat_security_requirements)
            }
            MappingFamily::ComponentSecurityRequirement => Some(&mut self.security_requirements),
            MappingFamily::ThreatSecurityRequirement => None,
        }
    }

    fn slots_mut(&mut self) -> [&mut Vec<MappingEntry>; 7] {
        [
            &mut self.properties,
            &mut self.property_options,
            &mut self.property_option_threats,
            &mut self.property_option_threat_security_requirements,
            &mut self.threats,
            &mut self.threat_security_requirements,
            &mut self.security_requirements,
        ]
    }

    fn slots(&self) -> [&Vec<MappingEntry>; 7] {
        [
            &self.properties,
            &self.property_options,
            &self.property_option_threats,
            &self.property_option_threat_security_requirements,
            &self.threats,
            &self.threat_security_requirements,
            &self.security_requirements,
        ]
    }
}

impl MappingSet for ComponentMappingCollection {
    fn is_empty(&self) -> bool {
        self.slots().iter().all(|slot| slot.is_empty())
    }

    fn len(&self) -> usize {
        self.slots().iter().map(|slot| slot.len()).sum()
    }

    fn insert(&mut self, family: MappingFamily, entry: MappingEntry) -> bool {
        match self.slot_mut(family) {
            Some(slot) => {
                slot.push(entry);
                true
            }
            None => false,
        }
    }

    fn merge(&mut self, other: Self) {
        let Self {
            properties,
            property_options,
            property_option_threats,
            property_option_threat_security_requirements,
            threats,
            threat_security_requirements,
            security_requirements,
        } = other;
        self.properties.extend(properties);
        self.property_options.extend(property_options);
        self.property_option_threats.extend(property_option_threats);
        self.property_option_threat_security_requirements
            .extend(property_option_threat_security_requirements);
        self.threats.extend(threats);
        self.threat_security_requirements.extend(threat_security_requirements);
        self.security_requirements.extend(security_requirements);
    }

    fn normalize(&mut self) {
        for slot in self.slots_mut() {
            normalize_slot(slot);
        }
    }
}

/// Mapping deltas owned by one threat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatMappingCollection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_requirements: Vec<MappingEntry>,
}

impl MappingSet for ThreatMappingCollection {
    fn is_empty(&self) -> bool {
        self.security_requirements.is_empty()
    }

    fn len(&self) -> usize {
        self.security_requirements.len()
    }

    fn insert(&mut self, family: MappingFamily, entry: MappingEntry) -> bool {
        if family == MappingFamily::ThreatSecurityRequirement {
            self.security_requirements.push(entry);
            true
        } else {
            false
        }
    }

    fn merge(&mut self, other: Self) {
        self.security_requirements.extend(other.security_requirements);
    }

    fn normalize(&mut self) {
        normalize_slot(&mut self.security_requirements);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ContentIndex;

    #[test]
    fn test_resolve_five_id_entry() {
        let lib = Uuid::from_u128(1);
        let index = ContentIndex::builder()
            .entity(2, Uuid::from_u128(2))
            .entity(3, Uuid::from_u128(3))
            .threat(lib, 4, Uuid::from_u128(4))
            .security_requirement(lib, 5, Uuid::from_u128(5))
            .build();
        let key = MappingKey {
            family: MappingFamily::ComponentPropertyOptionThreatSecurityRequirement,
            ids: vec![1, 2, 3, 4, 5],
        };
        let entry = MappingEntry::resolve(&key, &index);
        assert_eq!(entry.property, Some(Uuid::from_u128(2)));
        assert_eq!(entry.property_option, Some(Uuid::from_u128(3)));
        assert_eq!(entry.threat, Some(Uuid::from_u128(4)));
        assert_eq!(entry.security_requirement, Some(Uuid::from_u128(5)));
    }

    #[test]
    fn test_unresolved_id_becomes_nil() {
        let index = ContentIndex::default();
        let key = MappingKey {
            family: MappingFamily::ComponentThreat,
            ids: vec![12, 40],
        };
        let entry = MappingEntry::resolve(&key, &index);
        assert_eq!(entry.threat, Some(Uuid::nil()));
        assert!(entry.property.is_none());
    }

    #[test]
    fn test_component_collection_slots() {
        let mut collection = ComponentMappingCollection::default();
        let entry = MappingEntry {
            threat: Some(Uuid::from_u128(40)),
            ..MappingEntry::default()
        };
        assert!(collection.insert(MappingFamily::ComponentThreat, entry.clone()));
        assert!(collection.insert(MappingFamily::ComponentThreat, entry));
        assert!(!collection.insert(MappingFamily::ThreatSecurityRequirement, MappingEntry::default()));

        collection.normalize();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.threats.len(), 1);
    }

    #[test]
    fn test_threat_collection_merge() {
        let mut a = ThreatMappingCollection::default();
        let mut b = ThreatMappingCollection::default();
        b.insert(MappingFamily::ThreatSecurityRequirement, MappingEntry::default());
        a.merge(b);
        assert!(!a.is_empty());
    }
}
