use graft_patch::{ApplyMode, Error, PatchApplier, PatchFile, PatchStatus, check_overlaps};
use std::path::Path;
use tempfile::tempdir;

const FACTORY: &str = "\
diff --git a/api/core/node_factory.py b/api/core/node_factory.py
--- a/api/core/node_factory.py
+++ b/api/core/node_factory.py
@@ -1,4 +1,6 @@
 from core.nodes import BUILTIN
+from core.nodes.custom import discover

 def node_types():
-    return dict(BUILTIN)
+    types = dict(BUILTIN)
+    return {**types, **discover()}
";

const FACTORY_SOURCE: &str =
    "from core.nodes import BUILTIN\n\ndef node_types():\n    return dict(BUILTIN)\n";

fn write_host(root: &Path, content: &str) {
    std::fs::create_dir_all(root.join("api/core")).unwrap();
    std::fs::write(root.join("api/core/node_factory.py"), content).unwrap();
}

fn write_patch(dir: &Path, name: &str, text: &str) -> PatchFile {
    let path = dir.join(format!("{name}.patch"));
    std::fs::write(&path, text).unwrap();
    PatchFile::load(name, &path).unwrap()
}

#[test]
fn test_apply_twice_is_idempotent() {
    let host = tempdir().unwrap();
    let plugin = tempdir().unwrap();
    write_host(host.path(), FACTORY_SOURCE);
    let patch = write_patch(plugin.path(), "factory", FACTORY);
    let applier = PatchApplier::default();

    let first = applier.apply(&patch, host.path(), ApplyMode::Apply).unwrap();
    let after_first = std::fs::read(host.path().join("api/core/node_factory.py")).unwrap();
    let second = applier.apply(&patch, host.path(), ApplyMode::Apply).unwrap();
    let after_second = std::fs::read(host.path().join("api/core/node_factory.py")).unwrap();

    assert_eq!(first, PatchStatus::Applied);
    assert_eq!(second, PatchStatus::AlreadyApplied);
    assert_eq!(after_first, after_second);
    assert!(String::from_utf8(after_first).unwrap().contains("discover()"));
}

const REPEATED_SOURCE: &str = "class Start:\n    pass\n\n\nclass End:\n    pass\n\n\n";

const REGISTER: &str = "\
--- a/api/core/node_factory.py
+++ b/api/core/node_factory.py
@@ -2,3 +2,4 @@
     pass
 
+register_custom_nodes()
 
";

#[test]
fn test_repeated_blocks_apply_once() {
    let host = tempdir().unwrap();
    let plugin = tempdir().unwrap();
    write_host(host.path(), REPEATED_SOURCE);
    let patch = write_patch(plugin.path(), "register", REGISTER);
    let applier = PatchApplier::default();

    let statuses: Vec<_> = (0..3)
        .map(|_| applier.apply(&patch, host.path(), ApplyMode::Apply).unwrap())
        .collect();
    let content = std::fs::read_to_string(host.path().join("api/core/node_factory.py")).unwrap();

    assert_eq!(
        statuses,
        vec![PatchStatus::Applied, PatchStatus::AlreadyApplied, PatchStatus::AlreadyApplied]
    );
    assert_eq!(content.matches("register_custom_nodes()").count(), 1);
}

#[test]
fn test_missing_anchor_leaves_file_untouched() {
    let host = tempdir().unwrap();
    let plugin = tempdir().unwrap();
    let drifted = "from core.nodes import BUILTIN, EXTRA\n\ndef node_types():\n    return {}\n";
    write_host(host.path(), drifted);
    let patch = write_patch(plugin.path(), "factory", FACTORY);

    let err = PatchApplier::default()
        .apply(&patch, host.path(), ApplyMode::Apply)
        .unwrap_err();

    assert!(matches!(err, Error::ApplyFailed { .. }));
    assert_eq!(
        std::fs::read(host.path().join("api/core/node_factory.py")).unwrap(),
        drifted.as_bytes()
    );
}

#[test]
fn test_check_mode_classifies_without_writing() {
    let host = tempdir().unwrap();
    let plugin = tempdir().unwrap();
    write_host(host.path(), FACTORY_SOURCE);
    let patch = write_patch(plugin.path(), "factory", FACTORY);
    let applier = PatchApplier::default();

    assert_eq!(
        applier.apply(&patch, host.path(), ApplyMode::Check).unwrap(),
        PatchStatus::Applicable
    );
    assert_eq!(
        std::fs::read_to_string(host.path().join("api/core/node_factory.py")).unwrap(),
        FACTORY_SOURCE
    );

    applier.apply(&patch, host.path(), ApplyMode::Apply).unwrap();
    assert_eq!(
        applier.apply(&patch, host.path(), ApplyMode::Check).unwrap(),
        PatchStatus::AlreadyApplied
    );
}

#[test]
fn test_overlapping_patch_set_is_rejected_before_writing() {
    let host = tempdir().unwrap();
    let plugin = tempdir().unwrap();
    write_host(host.path(), FACTORY_SOURCE);
    let first = write_patch(plugin.path(), "factory", FACTORY);
    let second = write_patch(
        plugin.path(),
        "factory-again",
        "--- a/api/core/node_factory.py\n+++ b/api/core/node_factory.py\n@@ -3,2 +3,2 @@\n def node_types():\n-    return dict(BUILTIN)\n+    return {}\n",
    );

    assert!(matches!(
        check_overlaps(&[first, second]),
        Err(Error::Overlap { .. })
    ));
    assert_eq!(
        std::fs::read_to_string(host.path().join("api/core/node_factory.py")).unwrap(),
        FACTORY_SOURCE
    );
}
