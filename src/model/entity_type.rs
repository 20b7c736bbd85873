//! Domain entity types and mapping families.
//!
//! Folder names here are the on-disk contract of the content repository:
//!
//! ```text
//! {root}/{libraryId}/{libraryId}.yaml
//! {root}/{libraryId}/{components|threats|security-requirements|test-cases|properties}/{id}.yaml
//! {root}/global/{component-types|property-types|property-options}/{id}.yaml
//! {root}/mappings/{family}/{id}_{id}[_...].yaml
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level folder holding mapping families.
pub const MAPPINGS_FOLDER: &str = "mappings";

/// Top-level folder holding library-independent entities.
pub const GLOBAL_FOLDER: &str = "global";

/// Typed classification of a repository path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DomainEntityType {
    Library,
    Components,
    SecurityRequirements,
    TestCases,
    Threats,
    Properties,
    ComponentType,
    PropertyType,
    PropertyOptions,
    ComponentProperties,
    ComponentPropertyOptions,
    ComponentPropertyOptionThreats,
    ComponentPropertyOptionThreatSecurityRequirements,
    ComponentThreats,
    ComponentThreatSecurityRequirements,
    ComponentSecurityRequirements,
    ThreatSecurityRequirements,
    /// Anything the classifier does not recognise; dropped by callers.
    Unknown,
}

impl DomainEntityType {
    /// Entity types that live inside a library folder.
    pub const LIBRARY_SCOPED: [Self; 5] = [
        Self::Components,
        Self::Threats,
        Self::SecurityRequirements,
        Self::TestCases,
        Self::Properties,
    ];

    /// Entity types under `global/`.
    pub const GLOBAL: [Self; 3] = [Self::ComponentType, Self::PropertyType, Self::PropertyOptions];

    /// Map a folder directly under a library root.
    #[must_use]
    pub fn from_library_folder(folder: &str) -> Self {
        match folder {
            "components" => Self::Components,
            "threats" => Self::Threats,
            "security-requirements" => Self::SecurityRequirements,
            "test-cases" => Self::TestCases,
            "properties" => Self::Properties,
            _ => Self::Unknown,
        }
    }

    /// Map a folder directly under `global/`.
    #[must_use]
    pub fn from_global_folder(folder: &str) -> Self {
        match folder {
            "component-types" => Self::ComponentType,
            "property-types" => Self::PropertyType,
            "property-options" => Self::PropertyOptions,
            _ => Self::Unknown,
        }
    }

    /// Map a folder directly under `mappings/`.
    #[must_use]
    pub fn from_mapping_folder(folder: &str) -> Self {
        MappingFamily::from_folder(folder).map_or(Self::Unknown, Self::from)
    }

    /// On-disk folder name for this type, if it has one.
    #[must_use]
    pub const fn folder_name(&self) -> Option<&'static str> {
        match self {
            Self::Components => Some("components"),
            Self::Threats => Some("threats"),
            Self::SecurityRequirements => Some("security-requirements"),
            Self::TestCases => Some("test-cases"),
            Self::Properties => Some("properties"),
            Self::ComponentType => Some("component-types"),
            Self::PropertyType => Some("property-types"),
            Self::PropertyOptions => Some("property-options"),
            Self::Library | Self::Unknown => None,
            other => match other.mapping_family() {
                Some(family) => Some(family.folder()),
                None => None,
            },
        }
    }

    /// The mapping family this type stands for, if it is a mapping type.
    #[must_use]
    pub const fn mapping_family(&self) -> Option<MappingFamily> {
        match self {
            Self::ComponentProperties => Some(MappingFamily::ComponentProperty),
            Self::ComponentPropertyOptions => Some(MappingFamily::ComponentPropertyOption),
            Self::ComponentPropertyOptionThreats => Some(MappingFamily::ComponentPropertyOptionThreat),
            Self::ComponentPropertyOptionThreatSecurityRequirements => {
                Some(MappingFamily::ComponentPropertyOptionThreatSecurityRequirement)
            }
            Self::ComponentThreats => Some(MappingFamily::ComponentThreat),
            Self::ComponentThreatSecurityRequirements => {
                Some(MappingFamily::ComponentThreatSecurityRequirement)
            }
            Self::ComponentSecurityRequirements => Some(MappingFamily::ComponentSecurityRequirement),
            Self::ThreatSecurityRequirements => Some(MappingFamily::ThreatSecurityRequirement),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_mapping(&self) -> bool {
        self.mapping_family().is_some()
    }

    #[must_use]
    pub const fn is_global(&self) -> bool {
        matches!(self, Self::ComponentType | Self::PropertyType | Self::PropertyOptions)
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Library => "library",
            Self::Components => "components",
            Self::SecurityRequirements => "security-requirements",
            Self::TestCases => "test-cases",
            Self::Threats => "threats",
            Self::Properties => "properties",
            Self::ComponentType => "component-type",
            Self::PropertyType => "property-type",
            Self::PropertyOptions => "property-options",
            Self::ComponentProperties => "component-properties",
            Self::ComponentPropertyOptions => "component-property-options",
            Self::ComponentPropertyOptionThreats => "component-property-option-threats",
            Self::ComponentPropertyOptionThreatSecurityRequirements => {
                "component-property-option-threat-security-requirements"
            }
            Self::ComponentThreats => "component-threats",
            Self::ComponentThreatSecurityRequirements => "component-threat-security-requirements",
            Self::ComponentSecurityRequirements => "component-security-requirements",
            Self::ThreatSecurityRequirements => "threat-security-requirements",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DomainEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<MappingFamily> for DomainEntityType {
    fn from(family: MappingFamily) -> Self {
        match family {
            MappingFamily::ComponentProperty => Self::ComponentProperties,
            MappingFamily::ComponentPropertyOption => Self::ComponentPropertyOptions,
            MappingFamily::ComponentPropertyOptionThreat => Self::ComponentPropertyOptionThreats,
            MappingFamily::ComponentPropertyOptionThreatSecurityRequirement => {
                Self::ComponentPropertyOptionThreatSecurityRequirements
            }
            MappingFamily::ComponentThreat => Self::ComponentThreats,
            MappingFamily::ComponentThreatSecurityRequirement => {
                Self::ComponentThreatSecurityRequirements
            }
            MappingFamily::ComponentSecurityRequirement => Self::ComponentSecurityRequirements,
            MappingFamily::ThreatSecurityRequirement => Self::ThreatSecurityRequirements,
        }
    }
}

/// Kind of entity that owns a mapping (its id comes first in the filename).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MappingOwner {
    Component,
    Threat,
}

/// Role of one positional id inside a mapping filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdRole {
    Component,
    Property,
    PropertyOption,
    Threat,
    SecurityRequirement,
}

/// A family of relationship files under `mappings/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MappingFamily {
    ComponentProperty,
    ComponentPropertyOption,
    ComponentPropertyOptionThreat,
    ComponentPropertyOptionThreatSecurityRequirement,
    ComponentThreat,
    ComponentThreatSecurityRequirement,
    ComponentSecurityRequirement,
    ThreatSecurityRequirement,
}

impl MappingFamily {
    pub const ALL: [Self; 8] = [
        Self::ComponentProperty,
        Self::ComponentPropertyOption,
        Self::ComponentPropertyOptionThreat,
        Self::ComponentPropertyOptionThreatSecurityRequirement,
        Self::ComponentThreat,
        Self::ComponentThreatSecurityRequirement,
        Self::ComponentSecurityRequirement,
        Self::ThreatSecurityRequirement,
    ];

    #[must_use]
    pub const fn folder(&self) -> &'static str {
        match self {
            Self::ComponentProperty => "component-properties",
            Self::ComponentPropertyOption => "component-property-options",
            Self::ComponentPropertyOptionThreat => "component-property-option-threats",
            Self::ComponentPropertyOptionThreatSecurityRequirement => {
                "component-property-option-threat-security-requirements"
            }
            Self::ComponentThreat => "component-threats",
            Self::ComponentThreatSecurityRequirement => "component-threat-security-requirements",
            Self::ComponentSecurityRequirement => "component-security-requirements",
            Self::ThreatSecurityRequirement => "threat-security-requirements",
        }
    }

    #[must_use]
    pub fn from_folder(folder: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.folder() == folder)
    }

    /// Relative path of this family's folder inside a repository.
    #[must_use]
    pub fn relative_folder(&self) -> String {
        format!("{MAPPINGS_FOLDER}/{}", self.folder())
    }

    #[must_use]
    pub const fn owner(&self) -> MappingOwner {
        match self {
            Self::ThreatSecurityRequirement => MappingOwner::Threat,
            _ => MappingOwner::Component,
        }
    }

    /// Positional roles of the ids encoded in a filename of this family.
    #[must_use]
    pub const fn roles(&self) -> &'static [IdRole] {
        use IdRole::{Component, Property, PropertyOption, SecurityRequirement, Threat};
        match self {
            Self::ComponentProperty => &[Component, Property],
            Self::ComponentPropertyOption => &[Component, Property, PropertyOption],
            Self::ComponentPropertyOptionThreat => &[Component, Property, PropertyOption, Threat],
            Self::ComponentPropertyOptionThreatSecurityRequirement => {
                &[Component, Property, PropertyOption, Threat, SecurityRequirement]
            }
            Self::ComponentThreat => &[Component, Threat],
            Self::ComponentThreatSecurityRequirement => &[Component, Threat, SecurityRequirement],
            Self::ComponentSecurityRequirement => &[Component, SecurityRequirement],
            Self::ThreatSecurityRequirement => &[Threat, SecurityRequirement],
        }
    }

    /// Exact number of ids a filename of this family carries.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.roles().len()
    }

    /// Families whose owning id is of the given kind.
    pub fn owned_by(owner: MappingOwner) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |family| family.owner() == owner)
    }
}

impl fmt::Display for MappingFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_folder_roundtrip() {
        for family in MappingFamily::ALL {
            assert_eq!(MappingFamily::from_folder(family.folder()), Some(family));
            let entity_type = DomainEntityType::from(family);
            assert_eq!(entity_type.mapping_family(), Some(family));
            assert_eq!(entity_type.folder_name(), Some(family.folder()));
        }
    }

    #[test]
    fn test_owner_and_arity() {
        assert_eq!(MappingFamily::ThreatSecurityRequirement.owner(), MappingOwner::Threat);
        assert_eq!(MappingFamily::ComponentThreat.owner(), MappingOwner::Component);
        assert_eq!(
            MappingFamily::ComponentPropertyOptionThreatSecurityRequirement.arity(),
            5
        );
        assert_eq!(MappingFamily::owned_by(MappingOwner::Threat).count(), 1);
        assert_eq!(MappingFamily::owned_by(MappingOwner::Component).count(), 7);
    }

    #[test]
    fn test_folder_lookup_unknown() {
        assert_eq!(DomainEntityType::from_library_folder("widgets"), DomainEntityType::Unknown);
        assert_eq!(DomainEntityType::from_global_folder("components"), DomainEntityType::Unknown);
        assert_eq!(DomainEntityType::from_mapping_folder("nope"), DomainEntityType::Unknown);
    }
}
