use super::*;
use tempfile::tempdir;

#[test]
fn unknown_provider_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let store = TokenStore::open(dir.path()).expect("open store");
    let err = model_config_for("bogus", &store).unwrap_err();
    assert!(matches!(err, GatewayError::TokenStore(_)));
}

#[test]
fn known_providers_build_a_primary_model_with_no_token_saved() {
    let dir = tempdir().expect("tempdir");
    let store = TokenStore::open(dir.path()).expect("open store");
    for provider in PROVIDERS {
        let cfg = model_config_for(provider, &store).expect("model config");
        assert_eq!(cfg.model_name, PRIMARY_MODEL);
        assert_eq!(cfg.provider_name.as_deref(), Some(*provider));
        assert!(cfg.auth_token.is_none());
    }
}

#[test]
fn saved_token_is_loaded_into_the_model_config() {
    let dir = tempdir().expect("tempdir");
    let store = TokenStore::open(dir.path()).expect("open store");
    let token = forge_core::TokenData {
        access_token: "secret-token".to_string(),
        refresh_token: None,
        expires_at: 0,
        extra: Default::default(),
    };
    store.save("claude", &token).expect("save token");

    let cfg = model_config_for("claude", &store).expect("model config");
    assert_eq!(cfg.auth_token.as_deref(), Some("secret-token"));
}

#[test]
fn is_known_provider_matches_the_provider_list() {
    assert!(is_known_provider("claude"));
    assert!(!is_known_provider("bogus"));
}
