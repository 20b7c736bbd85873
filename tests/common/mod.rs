//! Shared fixtures: throwaway git repositories holding content libraries.

#![allow(dead_code)]

use drift_tools::ContentIndex;
use git2::{Repository, Signature};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

pub const CORE: Uuid = Uuid::from_u128(0x7);
pub const EXTRA: Uuid = Uuid::from_u128(0x8);
pub const LEGACY: Uuid = Uuid::from_u128(0x9);

/// Integer ids of the components library Legacy owns.
pub const LEGACY_COMPONENTS: [i64; 3] = [90, 91, 92];

/// UUID used for the entity with integer id `id`.
pub fn id_uuid(id: i64) -> Uuid {
    Uuid::from_u128(0x1000 + u128::try_from(id).unwrap())
}

/// A git repository in a temporary directory.
pub struct TestRepo {
    _dir: TempDir,
    root: PathBuf,
    repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let repo = Repository::init(&root).unwrap();
        Self {
            _dir: dir,
            root,
            repo,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write(&self, relative: &str, content: &str) -> &Self {
        let path = self.root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
        self
    }

    pub fn remove(&self, relative: &str) -> &Self {
        std::fs::remove_file(self.root.join(relative)).unwrap();
        self
    }

    /// Stage the whole working tree (deletions included) and commit it.
    pub fn commit(&self, message: &str) -> git2::Oid {
        let mut index = self.repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.update_all(["*"].iter(), None).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        let signature = Signature::now("Drift Tests", "drift-tests@example.com").unwrap();
        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap()
    }
}

pub fn library_yaml(uuid: Uuid, id: i64, name: &str) -> String {
    format!("uuid: {uuid}\nid: {id}\nname: {name}\n")
}

pub fn component_yaml(id: i64, library: Uuid, name: &str, description: &str) -> String {
    format!(
        "uuid: {}\nid: {id}\nlibrary_uuid: {library}\nname: {name}\ndescription: {description}\n",
        id_uuid(id)
    )
}

pub fn threat_yaml(id: i64, library: Uuid, name: &str) -> String {
    format!("uuid: {}\nid: {id}\nlibrary_uuid: {library}\nname: {name}\n", id_uuid(id))
}

/// Write the golden layout shared by most tests.
///
/// Library Core (folder 7) owns components 12 and 13 and threat 40;
/// component 12 maps to threat 40. Library Legacy (folder 9) owns
/// components 90, 91 and 92.
pub fn seed_golden(repo: &TestRepo) {
    repo.write("7/7.yaml", &library_yaml(CORE, 7, "Core"))
        .write("7/components/12.yaml", &component_yaml(12, CORE, "Auth", "Handles login"))
        .write("7/components/13.yaml", &component_yaml(13, CORE, "Cache", "Keeps sessions"))
        .write("7/threats/40.yaml", &threat_yaml(40, CORE, "Credential stuffing"))
        .write("mappings/component-threats/12_40.yaml", "")
        .write("9/9.yaml", &library_yaml(LEGACY, 9, "Legacy"))
        .write("9/components/90.yaml", &component_yaml(90, LEGACY, "Mainframe", "Old"))
        .write("9/components/91.yaml", &component_yaml(91, LEGACY, "Batch", "Nightly jobs"))
        .write("9/components/92.yaml", &component_yaml(92, LEGACY, "Terminal", "Green screen"))
        .write("global/component-types/3.yaml", "uuid: 00000000-0000-0000-0000-000000000003\n");
}

/// Delete library Legacy's folder from the working tree.
pub fn remove_legacy(repo: &TestRepo) {
    repo.remove("9/9.yaml");
    for id in LEGACY_COMPONENTS {
        repo.remove(&format!("9/components/{id}.yaml"));
    }
}

/// Index covering every id either side of the tests uses.
pub fn index() -> ContentIndex {
    ContentIndex::builder()
        .library(CORE, 7, "Core")
        .library(EXTRA, 8, "Extra")
        .library(LEGACY, 9, "Legacy")
        .component(CORE, 12, id_uuid(12))
        .component(CORE, 13, id_uuid(13))
        .component(CORE, 14, id_uuid(14))
        .component(EXTRA, 80, id_uuid(80))
        .component(LEGACY, 90, id_uuid(90))
        .component(LEGACY, 91, id_uuid(91))
        .component(LEGACY, 92, id_uuid(92))
        .threat(CORE, 40, id_uuid(40))
        .threat(CORE, 41, id_uuid(41))
        .build()
}

/// The same index as a YAML file, for configured runs.
pub fn write_index_file(dir: &Path) -> PathBuf {
    let u = |id: i64| id_uuid(id).to_string();
    let yaml = format!(
        r"entities:
  12: {c12}
  13: {c13}
  14: {c14}
  80: {c80}
  90: {c90}
  91: {c91}
  92: {c92}
  40: {t40}
  41: {t41}
libraries:
  {core}:
    id: 7
    name: Core
    components: [12, 13, 14]
    threats: [40, 41]
  {extra}:
    id: 8
    name: Extra
    components: [80]
  {legacy}:
    id: 9
    name: Legacy
    components: [90, 91, 92]
",
        c12 = u(12),
        c13 = u(13),
        c14 = u(14),
        c80 = u(80),
        c90 = u(90),
        c91 = u(91),
        c92 = u(92),
        t40 = u(40),
        t41 = u(41),
        core = CORE,
        extra = EXTRA,
        legacy = LEGACY,
    );
    let path = dir.join("index.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}
