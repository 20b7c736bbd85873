//! Property-based tests for path classification and mapping filenames.
//!
//! Classification and filename parsing see every path the tree differ
//! reports, so they must never panic and must not depend on the separator.

use drift_tools::diff::mappings::parse_mapping_filename;
use drift_tools::tree::TreeDiffReport;
use drift_tools::{DomainEntityType, MappingFamily, classify_path};
use proptest::prelude::*;

const LIBRARY_FOLDERS: [&str; 5] = [
    "components",
    "threats",
    "security-requirements",
    "test-cases",
    "properties",
];

fn any_family() -> impl Strategy<Value = MappingFamily> {
    prop::sample::select(MappingFamily::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn classify_path_doesnt_panic(s in "\\PC{0,300}") {
        let _ = classify_path(&s);
    }

    #[test]
    fn classify_path_only_rejects_empty_paths(s in "[a-z0-9_./\\\\-]{0,80}") {
        let has_segment = s.split(['/', '\\']).any(|segment| !segment.is_empty());
        prop_assert_eq!(classify_path(&s).is_ok(), has_segment);
    }

    #[test]
    fn classification_ignores_separator_style(
        segments in prop::collection::vec("[a-z0-9-]{1,12}", 1..6)
    ) {
        let forward = segments.join("/");
        let backward = segments.join("\\");
        prop_assert_eq!(classify_path(&forward).unwrap(), classify_path(&backward).unwrap());
    }

    #[test]
    fn library_entity_paths_keep_their_folder(
        library in 1u32..100_000,
        folder in prop::sample::select(LIBRARY_FOLDERS.to_vec()),
        id in 1u32..1_000_000,
    ) {
        let path = format!("{library}/{folder}/{id}.yaml");
        let info = classify_path(&path).unwrap();
        prop_assert_eq!(info.entity_type, DomainEntityType::from_library_folder(folder));
        prop_assert_eq!(info.library_key, Some(library.to_string()));
    }

    #[test]
    fn mapping_paths_have_no_library(
        family in any_family(),
        name in "[0-9_]{1,20}\\.yaml",
    ) {
        let path = format!("mappings/{}/{name}", family.folder());
        let info = classify_path(&path).unwrap();
        prop_assert_eq!(info.entity_type, DomainEntityType::from(family));
        prop_assert!(info.library_key.is_none());
    }

    #[test]
    fn parse_mapping_filename_doesnt_panic(family in any_family(), s in "\\PC{0,200}") {
        let _ = parse_mapping_filename(family, &s);
    }

    #[test]
    fn well_formed_mapping_names_parse(
        family in any_family(),
        ids in prop::collection::vec(0i64..10_000_000, 5),
    ) {
        let ids = &ids[..family.arity()];
        let stem: Vec<String> = ids.iter().map(ToString::to_string).collect();
        let name = format!("{}.yaml", stem.join("_"));

        let key = parse_mapping_filename(family, &name).unwrap();
        prop_assert_eq!(key.owner_id(), ids[0]);
        prop_assert_eq!(key.referenced_ids(), &ids[1..]);
    }

    #[test]
    fn wrong_arity_is_rejected(
        family in any_family(),
        extra in 1usize..3,
    ) {
        let name = vec!["1"; family.arity() + extra].join("_") + ".yaml";
        prop_assert!(parse_mapping_filename(family, &name).is_err());
    }

    #[test]
    fn merging_a_report_into_itself_adds_nothing(
        added in prop::collection::btree_set("[a-z]{1,8}/[a-z]{1,8}\\.yaml", 0..20),
        deleted in prop::collection::btree_set("[a-z]{1,8}/[a-z]{1,8}\\.yaml", 0..20),
    ) {
        let report = TreeDiffReport {
            added: added.into_iter().collect(),
            deleted: deleted.into_iter().collect(),
            ..TreeDiffReport::default()
        };
        let mut merged = report.clone();
        merged.merge(report.clone());
        prop_assert_eq!(merged, report);
    }
}
