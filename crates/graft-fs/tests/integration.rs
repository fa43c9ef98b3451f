use graft_fs::{
    AtomicWriteOptions, EntryKind, atomic_read, atomic_write, copy_dir_all, probe, remove_entry,
    symlink_dir,
};
use tempfile::tempdir;

#[test]
fn test_symlink_then_replace_with_copy() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("plugin");
    let mount = dir.path().join("host/custom");

    std::fs::create_dir_all(&src).unwrap();
    std::fs::create_dir_all(mount.parent().unwrap()).unwrap();
    std::fs::write(src.join("node.py"), "print('hi')").unwrap();

    symlink_dir(&src, &mount).unwrap();
    assert_eq!(probe(&mount).unwrap(), Some(EntryKind::Symlink));

    remove_entry(&mount).unwrap();
    copy_dir_all(&src, &mount).unwrap();

    assert_eq!(probe(&mount).unwrap(), Some(EntryKind::Dir));
    assert!(src.join("node.py").exists());
    assert_eq!(atomic_read(mount.join("node.py")).unwrap(), b"print('hi')");
}

#[test]
fn test_edits_through_symlink_are_visible() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("plugin");
    let mount = dir.path().join("mount");
    std::fs::create_dir_all(&src).unwrap();

    symlink_dir(&src, &mount).unwrap();
    atomic_write(src.join("late.txt"), b"later", AtomicWriteOptions::new()).unwrap();

    assert_eq!(atomic_read(mount.join("late.txt")).unwrap(), b"later");
}

#[test]
fn test_copy_is_independent_of_source() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("plugin");
    let dest = dir.path().join("copy");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(src.join("a.txt"), "v1").unwrap();

    copy_dir_all(&src, &dest).unwrap();
    std::fs::write(src.join("a.txt"), "v2").unwrap();

    assert_eq!(atomic_read(dest.join("a.txt")).unwrap(), b"v1");
}
