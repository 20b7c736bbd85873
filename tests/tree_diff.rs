//! Tree comparison over committed and working-directory snapshots.

mod common;

use common::{CORE, LEGACY, TestRepo, index, remove_legacy, seed_golden};
use drift_tools::scope::{DiffUnit, ScopedDiffOrchestrator};
use drift_tools::tree::{EntryKind, SnapshotPair, SnapshotSource};
use drift_tools::utils::CancellationToken;
use drift_tools::reader::DocumentSource;
use drift_tools::{KindChangePolicy, ScopedDiffRequest, TreeDiffer};
use std::collections::HashSet;

fn committed(repo: &TestRepo) -> SnapshotSource {
    SnapshotSource::Revision {
        root: repo.root().to_path_buf(),
        revision: "HEAD".to_string(),
    }
}

fn compare(pair: &SnapshotPair, differ: TreeDiffer, folder: &str) -> drift_tools::TreeDiffReport {
    let baseline = pair.baseline.open().unwrap();
    let target = pair.target.open().unwrap();
    differ
        .compare_full(&baseline.root().unwrap(), &target.root().unwrap(), folder)
        .unwrap()
}

fn pair_with(edit: impl FnOnce(&TestRepo)) -> (TestRepo, TestRepo) {
    let golden = TestRepo::new();
    seed_golden(&golden);
    golden.commit("golden");
    let client = TestRepo::new();
    seed_golden(&client);
    edit(&client);
    client.commit("client");
    (golden, client)
}

#[test]
fn test_folder_comparison_lists_blob_paths() {
    let (golden, client) = pair_with(|client| {
        client
            .write("7/components/12.yaml", "uuid: changed\n")
            .remove("7/components/13.yaml")
            .write("7/properties/60.yaml", "uuid: new\n");
    });
    let pair = SnapshotPair::resolve(&committed(&golden), &committed(&client)).unwrap();
    let report = compare(&pair, TreeDiffer::default(), "7");

    assert_eq!(report.added, vec!["7/properties/60.yaml"]);
    assert_eq!(report.deleted, vec!["7/components/13.yaml"]);
    assert_eq!(report.modified, vec!["7/components/12.yaml"]);
    assert!(report.kind_changed.is_empty());
}

#[test]
fn test_folder_missing_on_one_side_is_collected_whole() {
    let (golden, client) = pair_with(remove_legacy);
    let pair = SnapshotPair::resolve(&committed(&golden), &committed(&client)).unwrap();
    let report = compare(&pair, TreeDiffer::default(), "9");

    let mut deleted = report.deleted.clone();
    deleted.sort();
    assert_eq!(
        deleted,
        vec![
            "9/9.yaml",
            "9/components/90.yaml",
            "9/components/91.yaml",
            "9/components/92.yaml"
        ]
    );
    assert!(report.added.is_empty());
}

#[test]
fn test_kind_change_policies() {
    let (golden, client) = pair_with(|client| {
        client
            .remove("7/components/13.yaml")
            .write("7/components/13.yaml/nested.yaml", "uuid: nested\n");
    });
    let pair = SnapshotPair::resolve(&committed(&golden), &committed(&client)).unwrap();

    let decomposed = compare(&pair, TreeDiffer::new(KindChangePolicy::Decompose), "7");
    assert_eq!(decomposed.kind_changed.len(), 1);
    let change = &decomposed.kind_changed[0];
    assert_eq!(change.path, "7/components/13.yaml");
    assert_eq!((change.from, change.to), (EntryKind::Blob, EntryKind::Tree));
    assert_eq!(decomposed.deleted, vec!["7/components/13.yaml"]);
    assert_eq!(decomposed.added, vec!["7/components/13.yaml/nested.yaml"]);

    let reported = compare(&pair, TreeDiffer::new(KindChangePolicy::ReportOnly), "7");
    assert_eq!(reported.kind_changed.len(), 1);
    assert!(reported.added.is_empty());
    assert!(reported.deleted.is_empty());
}

#[test]
fn test_excluded_names_are_skipped_at_any_depth() {
    let (golden, client) = pair_with(|client| {
        client
            .write("7/components/.gitkeep", "")
            .write("8/.gitkeep", "")
            .write("8/components/.gitkeep", "");
    });
    let pair = SnapshotPair::resolve(&committed(&golden), &committed(&client)).unwrap();
    let baseline = pair.baseline.open().unwrap();
    let target = pair.target.open().unwrap();
    let ignore: HashSet<String> = [".gitkeep".to_string()].into();

    let report = TreeDiffer::default()
        .compare_excluding(&baseline.root().unwrap(), &target.root().unwrap(), "", &ignore)
        .unwrap();
    assert!(report.is_empty(), "unexpected changes: {report:?}");
}

#[test]
fn test_prefixed_comparison_only_sees_owned_ids() {
    let (golden, client) = pair_with(|client| {
        client
            .remove("mappings/component-threats/12_40.yaml")
            .write("mappings/component-threats/99_40.yaml", "")
            .write("mappings/component-threats/120_40.yaml", "");
    });
    let pair = SnapshotPair::resolve(&committed(&golden), &committed(&client)).unwrap();
    let baseline = pair.baseline.open().unwrap();
    let target = pair.target.open().unwrap();
    let prefixes: HashSet<String> = ["12".to_string()].into();

    let report = TreeDiffer::default()
        .compare_prefixed(
            &baseline.root().unwrap(),
            &target.root().unwrap(),
            "mappings/component-threats",
            &prefixes,
        )
        .unwrap();
    assert_eq!(report.deleted, vec!["mappings/component-threats/12_40.yaml"]);
    assert!(report.added.is_empty(), "120 and 99 are other owners");
}

#[test]
fn test_working_directory_snapshot_sees_uncommitted_files() {
    let golden = TestRepo::new();
    seed_golden(&golden);
    golden.commit("golden");
    let client = TestRepo::new();
    seed_golden(&client);
    client.commit("client");
    client.write("7/threats/41.yaml", "uuid: draft\n");

    let pair = SnapshotPair::resolve(
        &SnapshotSource::WorkingDirectory(golden.root().to_path_buf()),
        &SnapshotSource::WorkingDirectory(client.root().to_path_buf()),
    )
    .unwrap();
    let report = compare(&pair, TreeDiffer::default(), "");
    assert_eq!(report.added, vec!["7/threats/41.yaml"]);
    assert!(report.deleted.is_empty());
    assert!(report.modified.is_empty());
}

#[test]
fn test_orchestrated_units_merge_in_order() {
    let (golden, client) = pair_with(|client| {
        client
            .write("7/components/12.yaml", "uuid: changed\n")
            .write("9/components/95.yaml", "uuid: new\n")
            .remove("mappings/component-threats/12_40.yaml");
    });
    let index = index();
    let orchestrator = ScopedDiffOrchestrator::new(&index, &index).with_max_workers(2);
    let scope = orchestrator.resolve_scope(&[CORE, LEGACY]).unwrap();
    assert_eq!(scope.folders, vec!["7", "9", "global"]);

    let units = scope.units();
    assert!(matches!(units[0], DiffUnit::Folder(ref folder) if folder == "7"));

    let pair = SnapshotPair::resolve(&committed(&golden), &committed(&client)).unwrap();
    let report = orchestrator
        .run_units(&pair, &units, &CancellationToken::new())
        .unwrap();
    assert_eq!(report.modified, vec!["7/components/12.yaml"]);
    assert_eq!(report.added, vec!["9/components/95.yaml"]);
    assert_eq!(report.deleted, vec!["mappings/component-threats/12_40.yaml"]);
}

#[test]
fn test_orchestrator_run_reports_libraries() {
    let (golden, client) = pair_with(|_| {});
    let index = index();
    let orchestrator = ScopedDiffOrchestrator::new(&index, &index);

    let request = ScopedDiffRequest::new(golden.root(), client.root(), vec![CORE, CORE]);
    let scoped = orchestrator.run(&request, &CancellationToken::new()).unwrap();
    assert_eq!(scoped.libraries, vec![CORE]);
    assert!(scoped.report.is_empty());
}

#[test]
fn test_document_sources_follow_the_snapshot_mode() {
    let (golden, client) = pair_with(|_| {});
    let index = index();
    let orchestrator = ScopedDiffOrchestrator::new(&index, &index);

    let request = ScopedDiffRequest::new(golden.root(), client.root(), vec![CORE]);
    let scoped = orchestrator.run(&request, &CancellationToken::new()).unwrap();
    assert!(matches!(scoped.baseline, DocumentSource::Snapshot(_)));
    assert!(matches!(scoped.target, DocumentSource::Snapshot(_)));

    let request = request.with_uncommitted(true);
    let scoped = orchestrator.run(&request, &CancellationToken::new()).unwrap();
    assert_eq!(scoped.baseline, DocumentSource::Directory(golden.root().to_path_buf()));
    assert_eq!(scoped.target, DocumentSource::Directory(client.root().to_path_buf()));
}
