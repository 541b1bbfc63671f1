mod common;

use std::io::Cursor;

use common::build_zip;
use modpack_dl::manifest::ManifestExtractor;
use modpack_dl::manifest::errors::ManifestParseError;

const DESCRIPTOR: &str = r#"{"name": "test pack", "mod_install_folders": ["mods/", "extras/"]}"#;

const MOD_A: &str = r#"{
    "file_name": "a.7z",
    "nexus_mod_id": 1,
    "nexus_file_id": 11,
    "file_size": 10,
    "md5": "0123456789abcdef0123456789abcdef",
    "install_folder": "a",
    "installation_parameters": {"kind": "fomod", "choices": [1, 2]}
}"#;

const MOD_B: &str = r#"{
    "file_name": "b.zip",
    "external_id": "22",
    "file_size": "2048",
    "expected_hash": "fedcba9876543210fedcba9876543210",
    "install_folder": "b"
}"#;

const MOD_NO_ID: &str = r#"{
    "file_name": "manual.zip",
    "nexus_file_id": null,
    "file_size": 5,
    "md5": "00000000000000000000000000000000"
}"#;

fn extract(files: &[(&str, &str)]) -> Result<Vec<modpack_dl::manifest::models::ManifestEntry>, ManifestParseError> {
    ManifestExtractor::extract_from_reader(Cursor::new(build_zip(files)))
}

#[test]
fn test_extract_entries_under_listed_folders() {
    let entries = extract(&[
        ("modpack.json", DESCRIPTOR),
        ("mods/", ""),
        ("mods/a.json", MOD_A),
        ("readme.json", r#"{"not": "a mod"}"#),
        ("other/c.json", "this is not even json"),
        ("extras/b.json", MOD_B),
        ("extras/manual.json", MOD_NO_ID),
    ])
    .unwrap();

    let names: Vec<&str> = entries.iter().map(|e| e.file_name.as_str()).collect();
    assert_eq!(names, vec!["a.7z", "b.zip", "manual.zip"]);

    let a = &entries[0];
    assert_eq!(a.external_id, Some(11));
    assert_eq!(a.mod_id, Some(1));
    assert_eq!(a.file_size, 10);
    assert_eq!(a.expected_hash, "0123456789abcdef0123456789abcdef");
    assert!(a.installation_parameters.is_some());

    // 字符串形式的数字也能解析
    let b = &entries[1];
    assert_eq!(b.external_id, Some(22));
    assert_eq!(b.file_size, 2048);
    assert_eq!(b.mod_id, None);

    assert_eq!(entries[2].external_id, None);
    assert_eq!(entries[2].install_folder, "");
}

#[test]
fn test_extract_from_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pack.zip");
    std::fs::write(&path, build_zip(&[("modpack.json", DESCRIPTOR), ("mods/a.json", MOD_A)])).unwrap();

    let entries = ManifestExtractor::extract(&path).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file_name, "a.7z");
}

#[test]
fn test_missing_descriptor_is_error() {
    let result = extract(&[("mods/a.json", MOD_A)]);
    assert!(matches!(result, Err(ManifestParseError::MissingDescriptor(_))));
}

#[test]
fn test_malformed_descriptor_is_error() {
    let result = extract(&[("modpack.json", r#"{"mod_install_folders": "mods/"}"#)]);
    assert!(matches!(result, Err(ManifestParseError::InvalidDescriptor(_))));
}

#[test]
fn test_malformed_mod_file_names_the_entry() {
    let result = extract(&[("modpack.json", DESCRIPTOR), ("mods/broken.json", "{ nope")]);
    match result {
        Err(ManifestParseError::InvalidEntry { path, .. }) => assert_eq!(path, "mods/broken.json"),
        other => panic!("expected InvalidEntry, got {:?}", other),
    }
}

#[test]
fn test_unreadable_archive_is_error() {
    let result = ManifestExtractor::extract_from_reader(Cursor::new(b"definitely not a zip".to_vec()));
    assert!(result.is_err());

    let missing = ManifestExtractor::extract("/nonexistent/pack.zip");
    assert!(matches!(missing, Err(ManifestParseError::Io(_))));
}

#[test]
fn test_file_name_outside_download_dir_is_rejected() {
    for bad in ["../escaped.zip", "/tmp/abs.zip", "mods/../../up.zip", ""] {
        let mod_json = format!(
            r#"{{"file_name": "{}", "nexus_file_id": 1, "file_size": 1, "md5": "00"}}"#,
            bad
        );
        let result = extract(&[("modpack.json", DESCRIPTOR), ("mods/evil.json", &mod_json)]);
        match result {
            Err(ManifestParseError::InvalidEntry { path, .. }) => assert_eq!(path, "mods/evil.json"),
            other => panic!("{:?} should be rejected, got {:?}", bad, other),
        }
    }
}

#[test]
fn test_nested_relative_file_name_is_accepted() {
    let mod_json = r#"{"file_name": "sub/dir/c.zip", "nexus_file_id": 1, "file_size": 1, "md5": "00"}"#;
    let entries = extract(&[("modpack.json", DESCRIPTOR), ("mods/c.json", mod_json)]).unwrap();
    assert_eq!(entries[0].file_name, "sub/dir/c.zip");
}

// 已知限制：排在描述文件之前的模组文件会被忽略
#[test]
fn test_mod_before_descriptor_is_excluded() {
    let entries = extract(&[
        ("mods/a.json", MOD_A),
        ("modpack.json", DESCRIPTOR),
        ("extras/b.json", MOD_B),
    ])
    .unwrap();

    let names: Vec<&str> = entries.iter().map(|e| e.file_name.as_str()).collect();
    assert_eq!(names, vec!["b.zip"]);
}

#[test]
fn test_serialized_entry_strips_installation_parameters() {
    let entries = extract(&[("modpack.json", DESCRIPTOR), ("mods/a.json", MOD_A)]).unwrap();
    let json = serde_json::to_value(&entries[0]).unwrap();

    assert!(json.get("installation_parameters").is_none());
    assert_eq!(json["file_name"], "a.7z");
    assert_eq!(json["external_id"], 11);
}

#[tokio::test]
async fn test_extract_async_runs_off_the_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pack.zip");
    std::fs::write(&path, build_zip(&[("modpack.json", DESCRIPTOR), ("extras/b.json", MOD_B)])).unwrap();

    let entries = ManifestExtractor::extract_async(path).await.unwrap();
    assert_eq!(entries[0].file_name, "b.zip");
}
