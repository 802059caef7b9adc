use std::fs;

use rand::Rng;
use yatta::{pack_directory, unpack_directory, DirectoryModel, DirectoryPatcher, NullSink, VirtualFile};

fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen::<u8>()).collect()
}

fn write_tree(root: &std::path::Path, files: &[(&str, Vec<u8>)]) {
    for (path, data) in files {
        let absolute = root.join(path);
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(absolute, data).unwrap();
    }
}

#[test]
fn scan_pack_unpack_write_preserves_bytes() {
    let src = tempfile::tempdir().unwrap();
    let files = [
        ("readme.txt", random_bytes(64)),
        ("assets/logo.bin", random_bytes(4096)),
        ("assets/nested/deep.dat", random_bytes(17)),
        ("skip.cache", random_bytes(8)),
    ];
    write_tree(src.path(), &files);

    let mut sink = NullSink;
    let exclusions = vec![".cache".to_string()];
    let scanned = DirectoryModel::scan(src.path(), &exclusions, &mut sink).unwrap();
    assert_eq!(scanned.file_count(), 3);

    let packed = pack_directory(&scanned, &mut sink).unwrap();
    let unpacked = unpack_directory(packed.as_slice()).unwrap();
    assert_eq!(unpacked.file_count(), scanned.file_count());

    let dst = tempfile::tempdir().unwrap();
    unpacked.write(dst.path(), &mut sink).unwrap();

    for (path, data) in &files[..3] {
        assert_eq!(fs::read(dst.path().join(path)).unwrap(), *data);
    }
    assert!(!dst.path().join("skip.cache").exists());
}

#[test]
fn install_then_patch_to_next_version_on_disk() {
    let install = tempfile::tempdir().unwrap();

    let mut v1 = DirectoryModel::new();
    v1.insert(VirtualFile::new("app.bin", random_bytes(2048).into()).unwrap())
        .unwrap();
    v1.insert(VirtualFile::new("config/defaults.ini", b"a=1\nb=2\n".to_vec().into()).unwrap())
        .unwrap();
    v1.insert(VirtualFile::new("legacy/obsolete.dat", random_bytes(32).into()).unwrap())
        .unwrap();

    let mut sink = NullSink;
    v1.write(install.path(), &mut sink).unwrap();

    let mut v2 = DirectoryModel::new();
    let mut patched_app = v1.get("app.bin").unwrap().data().as_slice().to_vec();
    patched_app.truncate(patched_app.len() - 100);
    patched_app.extend_from_slice(&random_bytes(150));
    v2.insert(VirtualFile::new("app.bin", patched_app.clone().into()).unwrap())
        .unwrap();
    v2.insert(VirtualFile::new("config/defaults.ini", b"a=1\nb=2\n".to_vec().into()).unwrap())
        .unwrap();
    v2.insert(VirtualFile::new("config/new_feature.ini", b"enabled=true\n".to_vec().into()).unwrap())
        .unwrap();

    let patch = yatta::diff_directories(&v1, &v2, &mut sink).unwrap();

    let patcher = DirectoryPatcher::new(install.path());
    let result = patcher.apply(&v1, patch.as_slice()).unwrap();

    assert_eq!(result.file_count(), 3);
    assert_eq!(result.get("app.bin").unwrap().data().as_slice(), patched_app.as_slice());
    assert_eq!(
        fs::read(install.path().join("app.bin")).unwrap(),
        patched_app
    );
    assert_eq!(
        fs::read(install.path().join("config/new_feature.ini")).unwrap(),
        b"enabled=true\n"
    );
    assert!(!install.path().join("legacy/obsolete.dat").exists());
    assert!(install.path().join("config/defaults.ini").exists());
}

#[test]
fn reapplying_same_patch_after_success_finds_everything_already_current() {
    let mut v1 = DirectoryModel::new();
    v1.insert(VirtualFile::new("a.txt", b"one".to_vec().into()).unwrap())
        .unwrap();

    let mut v2 = DirectoryModel::new();
    v2.insert(VirtualFile::new("a.txt", b"two".to_vec().into()).unwrap())
        .unwrap();
    v2.insert(VirtualFile::new("b.txt", b"brand new".to_vec().into()).unwrap())
        .unwrap();

    let mut sink = NullSink;
    let patch = yatta::diff_directories(&v1, &v2, &mut sink).unwrap();
    let once = yatta::apply_directory_patch(&v1, patch.as_slice(), &mut sink).unwrap();
    assert_eq!(once.get("a.txt").unwrap().data().as_slice(), b"two");
    assert_eq!(once.get("b.txt").unwrap().data().as_slice(), b"brand new");

    // Re-applying against the already-patched model: every record's target hash is
    // already present, so the second apply is a no-op that leaves the model as-is.
    let twice = yatta::apply_directory_patch(&once, patch.as_slice(), &mut sink).unwrap();
    assert_eq!(twice.get("a.txt").unwrap().data().as_slice(), b"two");
    assert_eq!(twice.get("b.txt").unwrap().data().as_slice(), b"brand new");
    assert_eq!(twice.file_count(), once.file_count());
}
