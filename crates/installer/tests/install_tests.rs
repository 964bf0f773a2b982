//! Registry and local installs against a fake gateway

use orla_core::{MANIFEST_FILE_NAME, NullSink, RecordingSink, RuntimeMode};
use orla_installer::{Error, Installer};
use orla_registry::{LATEST, REGISTRY_FILE_NAME, RegistryCache};
use orla_vcs::{FakeGateway, VcsCall};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const REGISTRY_URL: &str = "https://github.com/dorcha-inc/orla-registry";
const FS_REPO: &str = "https://github.com/dorcha-inc/orla-tool-fs";

const REGISTRY_YAML: &str = "\
version: 1
registry_url: https://github.com/dorcha-inc/orla-registry
tools:
  - name: fs
    description: Read and write local files
    repository: https://github.com/dorcha-inc/orla-tool-fs
  - name: http
    description: Make HTTP requests
    repository: https://github.com/dorcha-inc/orla-tool-http
  - name: git
    description: Git helpers
    repository: https://github.com/dorcha-inc/orla-tool-git
";

const RUN_SCRIPT: &str = "#!/bin/sh\necho fs\n";

fn fs_manifest(version: &str) -> String {
    format!("name: fs\nversion: {version}\ndescription: Filesystem tool\nentrypoint: bin/run\n")
}

struct Fixture {
    _temp: TempDir,
    tools_dir: std::path::PathBuf,
    fake: Arc<FakeGateway>,
    installer: Installer,
}

fn fixture(fake: FakeGateway) -> Fixture {
    let temp = TempDir::new().unwrap();
    let tools_dir = temp.path().join("tools");
    let fake = Arc::new(fake.with_repo(REGISTRY_URL, &[(REGISTRY_FILE_NAME, REGISTRY_YAML)]));
    let cache = RegistryCache::new(temp.path().join("cache/registry"), fake.clone());
    let installer = Installer::new(&tools_dir, cache).unwrap();
    Fixture {
        _temp: temp,
        tools_dir,
        fake,
        installer,
    }
}

fn fs_release(fake: FakeGateway, version: &str) -> FakeGateway {
    let manifest = fs_manifest(version);
    fake.with_tag(
        FS_REPO,
        &format!("v{version}"),
        &[
            (MANIFEST_FILE_NAME, manifest.as_str()),
            ("bin/run", RUN_SCRIPT),
            ("README.md", "fs tool\n"),
        ],
    )
}

fn read_tree(root: &Path) -> Vec<(String, String)> {
    let mut files: Vec<(String, String)> = walkdir::WalkDir::new(root)
        .into_iter()
        .map(Result::unwrap)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            (
                e.path().strip_prefix(root).unwrap().display().to_string(),
                std::fs::read_to_string(e.path()).unwrap(),
            )
        })
        .collect();
    files.sort();
    files
}

#[test]
fn test_install_latest_from_registry() {
    let f = fixture(fs_release(fs_release(FakeGateway::new(), "0.1.0"), "0.2.0"));
    let sink = RecordingSink::new();

    let outcome = f.installer.install_tool(REGISTRY_URL, "fs", LATEST, &sink).unwrap();

    assert_eq!(outcome.version, "0.2.0");
    assert_eq!(outcome.tag.as_deref(), Some("v0.2.0"));
    assert_eq!(outcome.path, f.tools_dir.join("fs/0.2.0"));
    assert!(outcome.path.join("bin/run").is_file());
    assert!(!outcome.path.join(".git").exists());
    assert!(!sink.messages().is_empty());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(outcome.path.join("bin/run"))
            .unwrap()
            .permissions()
            .mode();
        assert_ne!(mode & 0o111, 0, "executable bit must survive the copy");
    }
}

#[test]
fn test_install_explicit_tag() {
    let f = fixture(fs_release(fs_release(FakeGateway::new(), "0.1.0"), "0.2.0"));

    let outcome = f.installer.install_tool(REGISTRY_URL, "fs", "v0.1.0", &NullSink).unwrap();

    assert_eq!(outcome.version, "0.1.0");
    assert!(f.tools_dir.join("fs/0.1.0").is_dir());
    assert!(!f.tools_dir.join("fs/0.2.0").exists());
    assert_eq!(
        f.fake.count_calls(|c| matches!(c, VcsCall::ListTags { .. })),
        0
    );
}

#[test]
fn test_install_is_idempotent() {
    let f = fixture(fs_release(FakeGateway::new(), "0.2.0"));

    let first = f.installer.install_tool(REGISTRY_URL, "fs", LATEST, &NullSink).unwrap();
    let before = read_tree(&first.path);

    std::fs::write(first.path.join("stray.txt"), "left over").unwrap();
    let second = f.installer.install_tool(REGISTRY_URL, "fs", LATEST, &NullSink).unwrap();

    assert_eq!(first.path, second.path);
    assert_eq!(read_tree(&second.path), before);
    assert_eq!(f.installer.inventory().list_installed().unwrap().len(), 1);
}

#[test]
fn test_unknown_tool_suggests_close_name() {
    let f = fixture(FakeGateway::new());

    let err = f.installer.install_tool(REGISTRY_URL, "fss", LATEST, &NullSink).unwrap_err();
    match err {
        Error::ToolNotFound { name, suggestion } => {
            assert_eq!(name, "fss");
            assert_eq!(suggestion.as_deref(), Some("fs"));
        }
        other => panic!("expected ToolNotFound, got {other:?}"),
    }

    let err = f.installer.install_tool(REGISTRY_URL, "xyz", LATEST, &NullSink).unwrap_err();
    assert!(matches!(err, Error::ToolNotFound { suggestion: None, .. }));
    assert!(err.is_not_found());
}

#[test]
fn test_failure_stages_are_distinct() {
    let f = fixture(FakeGateway::new().with_tag_names(FS_REPO, &["nightly"]));
    assert!(matches!(
        f.installer.install_tool(REGISTRY_URL, "fs", LATEST, &NullSink),
        Err(Error::Resolution { .. })
    ));
    assert!(matches!(
        f.installer.install_tool(REGISTRY_URL, "fs", "v9.9.9", &NullSink),
        Err(Error::Clone { .. })
    ));

    let f = fixture(FakeGateway::new());
    f.fake.fail_clone(REGISTRY_URL);
    assert!(matches!(
        f.installer.install_tool(REGISTRY_URL, "fs", LATEST, &NullSink),
        Err(Error::RegistryFetch { .. })
    ));
}

#[test]
fn test_invalid_manifest_never_reaches_tools_dir() {
    let fake = FakeGateway::new().with_tag(
        FS_REPO,
        "v0.1.0",
        &[(
            MANIFEST_FILE_NAME,
            "name: fs\nversion: 0.1.0\ndescription: broken\nentrypoint: bin/missing\n",
        )],
    );
    let f = fixture(fake);

    let err = f.installer.install_tool(REGISTRY_URL, "fs", "v0.1.0", &NullSink).unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert!(!f.tools_dir.join("fs/0.1.0").exists());
}

#[test]
fn test_tag_must_match_manifest_version() {
    let manifest = fs_manifest("0.1.1");
    let fake = FakeGateway::new().with_tag(
        FS_REPO,
        "v0.1.0",
        &[(MANIFEST_FILE_NAME, manifest.as_str()), ("bin/run", RUN_SCRIPT)],
    );
    let f = fixture(fake);

    let err = f.installer.install_tool(REGISTRY_URL, "fs", "v0.1.0", &NullSink).unwrap_err();
    assert!(matches!(err, Error::VersionMismatch { .. }));
    assert!(!f.tools_dir.join("fs").join("0.1.1").exists());
}

#[test]
fn test_scratch_clone_is_removed() {
    let f = fixture(fs_release(FakeGateway::new(), "0.2.0"));
    f.installer.install_tool(REGISTRY_URL, "fs", LATEST, &NullSink).unwrap();

    let scratch = f
        .fake
        .calls()
        .into_iter()
        .find_map(|c| match c {
            VcsCall::CloneAt { target, .. } => Some(target),
            _ => None,
        })
        .unwrap();
    assert!(!scratch.exists());
    assert!(!scratch.parent().unwrap().exists());
}

#[test]
fn test_update_keeps_previous_version() {
    let f = fixture(fs_release(FakeGateway::new(), "0.1.0"));

    assert!(matches!(
        f.installer.update_tool(REGISTRY_URL, "fs", &NullSink),
        Err(Error::NotInstalled { .. })
    ));

    f.installer.install_tool(REGISTRY_URL, "fs", LATEST, &NullSink).unwrap();

    let manifest = fs_manifest("0.2.0");
    f.fake.add_tag(
        FS_REPO,
        "v0.2.0",
        &[(MANIFEST_FILE_NAME, manifest.as_str()), ("bin/run", RUN_SCRIPT)],
    );

    let outcome = f.installer.update_tool(REGISTRY_URL, "fs", &NullSink).unwrap();
    assert_eq!(outcome.version, "0.2.0");

    let versions: Vec<String> = f
        .installer
        .inventory()
        .list_installed()
        .unwrap()
        .into_iter()
        .map(|t| t.version)
        .collect();
    assert_eq!(versions, vec!["0.1.0", "0.2.0"]);

    let info = f.installer.inventory().tool_info("fs").unwrap();
    assert_eq!(info.manifest.version, "0.2.0");
}

#[test]
fn test_local_install_end_to_end() {
    let f = fixture(FakeGateway::new());
    let source = TempDir::new().unwrap();
    std::fs::create_dir_all(source.path().join("bin")).unwrap();
    std::fs::write(source.path().join("bin/run"), "#!/bin/sh\necho demo\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(
            source.path().join("bin/run"),
            std::fs::Permissions::from_mode(0o755),
        )
        .unwrap();
    }
    std::fs::write(
        source.path().join(MANIFEST_FILE_NAME),
        "name: demo\nversion: 1.0.0\ndescription: Demo tool\nentrypoint: bin/run\n",
    )
    .unwrap();
    std::fs::create_dir_all(source.path().join(".git")).unwrap();
    std::fs::write(source.path().join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();

    let outcome = f.installer.install_local_tool(source.path(), &NullSink).unwrap();
    assert_eq!(outcome.path, f.tools_dir.join("demo/1.0.0"));
    assert!(outcome.tag.is_none());
    assert!(!outcome.path.join(".git").exists());
    assert!(f.fake.calls().is_empty());

    let listed = f.installer.inventory().list_installed().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "demo");
    assert_eq!(listed[0].version, "1.0.0");
    assert_eq!(listed[0].description, "Demo tool");

    let info = f.installer.inventory().tool_info("demo").unwrap();
    assert_eq!(info.manifest.runtime_mode(), RuntimeMode::Simple);
    assert_eq!(info.path, outcome.path);

    // Re-running replaces the version directory instead of failing.
    f.installer.install_local_tool(source.path(), &NullSink).unwrap();
    assert_eq!(f.installer.inventory().list_installed().unwrap().len(), 1);
}

#[test]
fn test_local_install_rejects_bad_paths() {
    let f = fixture(FakeGateway::new());
    let temp = TempDir::new().unwrap();

    let err = f
        .installer
        .install_local_tool(&temp.path().join("missing"), &NullSink)
        .unwrap_err();
    assert!(matches!(err, Error::LocalPathNotFound { .. }));

    let file = temp.path().join("tool.tar.gz");
    std::fs::write(&file, "archive").unwrap();
    let err = f.installer.install_local_tool(&file, &NullSink).unwrap_err();
    assert!(matches!(err, Error::LocalPathNotDirectory { .. }));

    let err = f.installer.install_local_tool(temp.path(), &NullSink).unwrap_err();
    assert!(matches!(err, Error::Manifest { .. }));
}

#[cfg(unix)]
fn local_tool_with_socket(root: &Path, version: &str) -> std::os::unix::net::UnixListener {
    std::fs::create_dir_all(root).unwrap();
    std::fs::write(root.join("run"), "#!/bin/sh\n").unwrap();
    std::fs::write(
        root.join(MANIFEST_FILE_NAME),
        format!("name: demo\nversion: {version}\ndescription: Demo tool\nentrypoint: run\n"),
    )
    .unwrap();
    // Sockets cannot be copied, so the copy step fails after validation.
    std::os::unix::net::UnixListener::bind(root.join("sock")).unwrap()
}

#[cfg(unix)]
#[test]
fn test_failed_first_install_leaves_no_tool_dir() {
    let f = fixture(FakeGateway::new());
    let source = TempDir::new().unwrap();
    let _listener = local_tool_with_socket(&source.path().join("demo"), "1.0.0");

    let err = f
        .installer
        .install_local_tool(&source.path().join("demo"), &NullSink)
        .unwrap_err();
    assert!(matches!(err, Error::Materialize { .. }));
    assert!(!f.tools_dir.join("demo").exists());
    assert!(matches!(
        f.installer.inventory().uninstall("demo"),
        Err(Error::NotInstalled { .. })
    ));
}

#[cfg(unix)]
#[test]
fn test_failed_install_keeps_existing_versions() {
    let f = fixture(FakeGateway::new());
    let source = TempDir::new().unwrap();

    let good = source.path().join("good");
    std::fs::create_dir_all(&good).unwrap();
    std::fs::write(good.join("run"), "#!/bin/sh\n").unwrap();
    std::fs::write(
        good.join(MANIFEST_FILE_NAME),
        "name: demo\nversion: 1.0.0\ndescription: Demo tool\nentrypoint: run\n",
    )
    .unwrap();
    f.installer.install_local_tool(&good, &NullSink).unwrap();

    let _listener = local_tool_with_socket(&source.path().join("bad"), "2.0.0");
    assert!(f.installer.install_local_tool(&source.path().join("bad"), &NullSink).is_err());

    assert!(f.tools_dir.join("demo/1.0.0").is_dir());
    assert!(!f.tools_dir.join("demo/2.0.0").exists());
    assert_eq!(f.installer.inventory().list_installed().unwrap().len(), 1);
}
