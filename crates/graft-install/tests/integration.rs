use graft_install::{
    Config, Error, FailurePolicy, InstallationPaths, Installer, MountMode, Outcome, RunOptions,
};
use std::path::Path;
use tempfile::{TempDir, tempdir};

const REGISTRY_PATCH: &str = "\
diff --git a/api/core/workflow/nodes/node_mapping.py b/api/core/workflow/nodes/node_mapping.py
--- a/api/core/workflow/nodes/node_mapping.py
+++ b/api/core/workflow/nodes/node_mapping.py
@@ -1,3 +1,5 @@
 from core.workflow.nodes.llm import LLMNode
+from core.workflow.nodes.custom import load_custom_nodes

 NODE_TYPE_CLASSES_MAPPING = {\"llm\": LLMNode}
+NODE_TYPE_CLASSES_MAPPING.update(load_custom_nodes())
";

const MAPPING: &str =
    "from core.workflow.nodes.llm import LLMNode\n\nNODE_TYPE_CLASSES_MAPPING = {\"llm\": LLMNode}\n";

fn host() -> TempDir {
    let host = tempdir().unwrap();
    for marker in ["api", "web", "docker"] {
        std::fs::create_dir_all(host.path().join(marker)).unwrap();
    }
    let mapping = host.path().join("api/core/workflow/nodes/node_mapping.py");
    std::fs::create_dir_all(mapping.parent().unwrap()).unwrap();
    std::fs::write(mapping, MAPPING).unwrap();
    host
}

fn plugin(config: &str) -> TempDir {
    let plugin = tempdir().unwrap();
    let write = |rel: &str, content: &str| {
        let path = plugin.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    };
    write("graft.toml", config);
    write("patches/0001-node-mapping.patch", REGISTRY_PATCH);
    write("nodes/weather/manifest.json", r#"{"node_type":"weather","version":"0.1.0","name":"Weather"}"#);
    write("nodes/weather/node.py", "class WeatherNode: ...\n");
    plugin
}

const LINK_CONFIG: &str = r#"
[[mount]]
source = "nodes"
target = "api/core/workflow/nodes/custom"
mode = "link"
"#;

fn installer(plugin: &Path, host: &Path, mode: Option<MountMode>) -> Installer {
    let config = Config::discover(plugin, None).unwrap();
    let paths = InstallationPaths::resolve(plugin, host, &config, mode).unwrap();
    Installer::new(paths, config.discovery.options())
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_end_to_end_link_install() {
    let host = host();
    let plugin = plugin(LINK_CONFIG);

    let report = installer(plugin.path(), host.path(), None)
        .run(&RunOptions::new())
        .await
        .unwrap();

    assert!(report.success());
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.patch_counts().applied, 1);
    assert_eq!(report.mount_counts().applied, 1);

    let target = host.path().join("api/core/workflow/nodes/custom");
    assert!(std::fs::symlink_metadata(&target).unwrap().file_type().is_symlink());
    assert_eq!(listing(&target), listing(&plugin.path().join("nodes")));
    assert!(
        std::fs::read_to_string(host.path().join("api/core/workflow/nodes/node_mapping.py"))
            .unwrap()
            .contains("load_custom_nodes()")
    );
}

#[tokio::test]
async fn test_second_run_reports_already_applied() {
    let host = host();
    let plugin = plugin(LINK_CONFIG);
    let installer = installer(plugin.path(), host.path(), None);

    installer.run(&RunOptions::new()).await.unwrap();
    let second = installer.run(&RunOptions::new()).await.unwrap();

    assert!(second.success());
    assert_eq!(second.patches[0].outcome, Outcome::AlreadyApplied);
    assert_eq!(second.mounts[0].outcome, Outcome::Applied);
}

#[tokio::test]
async fn test_link_onto_user_directory_fails_and_preserves_it() {
    let host = host();
    let plugin = plugin(LINK_CONFIG);
    let target = host.path().join("api/core/workflow/nodes/custom");
    std::fs::create_dir_all(&target).unwrap();
    std::fs::write(target.join("mine.py"), "keep me\n").unwrap();

    let report = installer(plugin.path(), host.path(), None)
        .run(&RunOptions::new())
        .await
        .unwrap();

    assert!(!report.success());
    assert_eq!(report.mounts[0].outcome, Outcome::Failed);
    assert!(report.mounts[0].error.as_deref().unwrap().contains("not a symlink"));
    assert_eq!(std::fs::read_to_string(target.join("mine.py")).unwrap(), "keep me\n");
}

#[tokio::test]
async fn test_copy_mode_override_replaces_user_directory() {
    let host = host();
    let plugin = plugin(LINK_CONFIG);
    let target = host.path().join("api/core/workflow/nodes/custom");
    std::fs::create_dir_all(&target).unwrap();
    std::fs::write(target.join("stale.py"), "old\n").unwrap();

    let report = installer(plugin.path(), host.path(), Some(MountMode::Copy))
        .run(&RunOptions::new().skip_patches(true))
        .await
        .unwrap();

    assert!(report.success());
    assert!(!std::fs::symlink_metadata(&target).unwrap().file_type().is_symlink());
    assert_eq!(listing(&target), vec!["weather"]);
}

#[tokio::test]
async fn test_overlapping_patches_are_a_config_error() {
    let host = host();
    let plugin = plugin(LINK_CONFIG);
    std::fs::write(
        plugin.path().join("patches/0002-node-mapping-again.patch"),
        REGISTRY_PATCH,
    )
    .unwrap();

    let err = installer(plugin.path(), host.path(), None)
        .run(&RunOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Patch(graft_patch::Error::Overlap { .. })));
    assert_eq!(
        std::fs::read_to_string(host.path().join("api/core/workflow/nodes/node_mapping.py")).unwrap(),
        MAPPING
    );
    assert!(!host.path().join("api/core/workflow/nodes/custom").exists());
}

#[test]
fn test_unknown_mode_in_config_fails_before_run() {
    let plugin = plugin("[[mount]]\nsource = \"nodes\"\ntarget = \"x\"\nmode = \"mirror\"\n");
    let err = Config::discover(plugin.path(), None).unwrap_err();
    assert!(matches!(err, Error::ConfigParse { .. }));
}

#[tokio::test]
async fn test_report_serializes_outcomes() {
    let host = host();
    let plugin = plugin(LINK_CONFIG);

    let report = installer(plugin.path(), host.path(), None)
        .run(&RunOptions::new().dry_run(true).policy(FailurePolicy::FailFast))
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["dry_run"], true);
    assert_eq!(json["patches"][0]["outcome"], "planned");
    assert_eq!(json["mounts"][0]["kind"], "mount");
}
