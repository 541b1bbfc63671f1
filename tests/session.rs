use modpack_dl::auth::{AuthManager, SessionStore};
use modpack_dl::common::client::client::NexusClient;

const BROWSER_COOKIES: &str = r#"[
    {"name": "nexusmods_session", "value": "abc123", "domain": ".nexusmods.com", "path": "/", "expires": -1, "httpOnly": true},
    {"name": "member_id", "value": "42", "domain": "www.nexusmods.com", "path": "/"}
]"#;

#[test]
fn test_client_from_browser_cookie_export() {
    let client = NexusClient::from_cookie_json(BROWSER_COOKIES).unwrap();
    assert!(client.has_cookie("nexusmods_session"));
    assert!(client.has_cookie("member_id"));
    assert!(!client.has_cookie("missing"));
}

#[test]
fn test_invalid_cookie_json_is_rejected() {
    assert!(NexusClient::from_cookie_json("not json").is_err());
    assert!(NexusClient::from_cookie_json("[]").is_err());
}

#[test]
fn test_session_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("sessions").join("cookies.json"));
    assert!(store.load().is_none());

    let client = NexusClient::from_cookie_json(BROWSER_COOKIES).unwrap();
    store.save(&client).unwrap();

    let restored = store.load().unwrap();
    assert!(restored.has_cookie("nexusmods_session"));
}

#[test]
fn test_login_by_cookies_accepts_inline_json_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let manager = AuthManager::new(SessionStore::new(dir.path().join("cookies.json")));

    let inline = manager.login_by_cookies(BROWSER_COOKIES).unwrap();
    assert!(inline.has_cookie("member_id"));

    let path = dir.path().join("exported.json");
    std::fs::write(&path, BROWSER_COOKIES).unwrap();
    let from_file = manager.login_by_cookies(path.to_str().unwrap()).unwrap();
    assert!(from_file.has_cookie("nexusmods_session"));

    assert!(manager.restore_session().is_none());
}
