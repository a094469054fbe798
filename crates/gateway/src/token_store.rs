// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Encrypted token store: `<home>/.forge/auth.key` holds a random AES-256-GCM
//! key (generated on first use), `<home>/.forge/tokens.enc` holds every
//! provider's [`TokenData`] encrypted under it as one blob.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use forge_core::TokenData;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::GatewayError;

pub struct TokenStore {
    key_path: PathBuf,
    tokens_path: PathBuf,
}

impl TokenStore {
    /// Open the store rooted at `home`, generating a key on first use.
    pub fn open(home: &Path) -> Result<Self, GatewayError> {
        let dir = home.join(".forge");
        fs::create_dir_all(&dir).map_err(io_err)?;
        let key_path = dir.join("auth.key");
        let tokens_path = dir.join("tokens.enc");

        if !key_path.exists() {
            let mut key_bytes = [0u8; 32];
            SystemRandom::new()
                .fill(&mut key_bytes)
                .map_err(|_| GatewayError::TokenStore("failed to generate auth key".into()))?;
            fs::write(&key_path, BASE64.encode(key_bytes)).map_err(io_err)?;
            set_owner_only_permissions(&key_path)?;
        }

        Ok(Self { key_path, tokens_path })
    }

    fn load_key(&self) -> Result<LessSafeKey, GatewayError> {
        let encoded = fs::read_to_string(&self.key_path).map_err(io_err)?;
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| GatewayError::TokenStore(format!("auth key is not valid base64: {e}")))?;
        let unbound = UnboundKey::new(&AES_256_GCM, &bytes)
            .map_err(|_| GatewayError::TokenStore("auth key has the wrong length".into()))?;
        Ok(LessSafeKey::new(unbound))
    }

    fn load_all(&self) -> Result<BTreeMap<String, TokenData>, GatewayError> {
        if !self.tokens_path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read(&self.tokens_path).map_err(io_err)?;
        if raw.len() <= NONCE_LEN {
            return Ok(BTreeMap::new());
        }
        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let key = self.load_key()?;
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| GatewayError::TokenStore("tokens.enc has a malformed nonce".into()))?;
        let mut in_out = ciphertext.to_vec();
        let plaintext = key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| GatewayError::TokenStore("tokens.enc failed to decrypt".into()))?;
        serde_json::from_slice(plaintext).map_err(GatewayError::from)
    }

    fn save_all(&self, tokens: &BTreeMap<String, TokenData>) -> Result<(), GatewayError> {
        let key = self.load_key()?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        SystemRandom::new()
            .fill(&mut nonce_bytes)
            .map_err(|_| GatewayError::TokenStore("failed to generate nonce".into()))?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = serde_json::to_vec(tokens)?;
        key.seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| GatewayError::TokenStore("failed to encrypt tokens".into()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + in_out.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend(in_out);
        fs::write(&self.tokens_path, out).map_err(io_err)?;
        Ok(())
    }

    pub fn load(&self, provider_name: &str) -> Result<Option<TokenData>, GatewayError> {
        Ok(self.load_all()?.get(provider_name).cloned())
    }

    pub fn save(&self, provider_name: &str, token: &TokenData) -> Result<(), GatewayError> {
        let mut all = self.load_all()?;
        all.insert(provider_name.to_string(), token.clone());
        self.save_all(&all)
    }

    /// Remove a provider's stored token, if present. Idempotent.
    pub fn delete(&self, provider_name: &str) -> Result<(), GatewayError> {
        let mut all = self.load_all()?;
        all.remove(provider_name);
        self.save_all(&all)
    }

    /// Every provider with a stored token, for `auth-status` reporting.
    pub fn list_providers(&self) -> Result<Vec<String>, GatewayError> {
        Ok(self.load_all()?.into_keys().collect())
    }
}

fn io_err(e: std::io::Error) -> GatewayError {
    GatewayError::TokenStore(e.to_string())
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<(), GatewayError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(io_err)
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<(), GatewayError> {
    Ok(())
}

#[cfg(test)]
#[path = "token_store_tests.rs"]
mod tests;
