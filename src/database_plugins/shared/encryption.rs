// ABOUTME: Vault-backed codec between decrypted datasources and their persisted rows.
// ABOUTME: Encrypts connection fields on write and decrypts them on read for both backends.

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! Datasource field encryption
//!
//! Backends only ever see `StoredDatasource` rows whose connection fields are
//! vault tokens. `DatasourceCodec` is the single place where those fields
//! cross between plaintext and ciphertext.
//!
//! Encrypted fields: `host`, `port`, `database_name`, `username`, `password`.
//! Everything else is stored as-is.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::crypto::CredentialVault;
use crate::errors::AppResult;
use crate::models::{
    Datasource, DatasourceSummary, DatasourceUpdate, NewDatasource, StoredDatasource,
};

/// Converts datasources between their decrypted and stored forms
#[derive(Debug, Clone)]
pub struct DatasourceCodec {
    vault: CredentialVault,
}

impl DatasourceCodec {
    /// Create a codec over the given vault
    #[must_use]
    pub const fn new(vault: CredentialVault) -> Self {
        Self { vault }
    }

    /// Encrypt a registration request into a new row
    ///
    /// # Errors
    ///
    /// Returns an error if any field fails to encrypt
    pub fn encode_new(
        &self,
        id: Uuid,
        request: &NewDatasource,
        now: DateTime<Utc>,
    ) -> AppResult<StoredDatasource> {
        Ok(StoredDatasource {
            id,
            user_id: request.user_id.clone(),
            project_id: request.project_id.clone(),
            datasource_type: request.datasource_type,
            host: self.vault.encrypt(&request.host)?,
            port: self.vault.encrypt(&request.port)?,
            database_name: self.vault.encrypt(&request.database_name)?,
            username: self.vault.encrypt(&request.username)?,
            password: self.vault.encrypt(&request.password)?,
            is_default: request.is_default,
            created_at: now,
            updated_at: now,
        })
    }

    /// Overwrite an existing row with an update, re-encrypting every connection field
    ///
    /// `id`, `user_id`, `is_default` and `created_at` are kept from `existing`.
    ///
    /// # Errors
    ///
    /// Returns an error if any field fails to encrypt
    pub fn encode_update(
        &self,
        existing: &StoredDatasource,
        update: &DatasourceUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<StoredDatasource> {
        Ok(StoredDatasource {
            id: existing.id,
            user_id: existing.user_id.clone(),
            project_id: update.project_id.clone(),
            datasource_type: update.datasource_type,
            host: self.vault.encrypt(&update.host)?,
            port: self.vault.encrypt(&update.port)?,
            database_name: self.vault.encrypt(&update.database_name)?,
            username: self.vault.encrypt(&update.username)?,
            password: self.vault.encrypt(&update.password)?,
            is_default: existing.is_default,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Decrypt a stored row
    ///
    /// # Errors
    ///
    /// Returns a decode error if any stored token is malformed
    pub fn decode(&self, stored: StoredDatasource) -> AppResult<Datasource> {
        Ok(Datasource {
            host: self.vault.decrypt(&stored.host)?,
            port: self.vault.decrypt(&stored.port)?,
            database_name: self.vault.decrypt(&stored.database_name)?,
            username: self.vault.decrypt(&stored.username)?,
            password: self.vault.decrypt(&stored.password)?,
            id: stored.id,
            user_id: stored.user_id,
            project_id: stored.project_id,
            datasource_type: stored.datasource_type,
            is_default: stored.is_default,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }

    /// Project a stored row into its list summary, decrypting only the database name
    ///
    /// # Errors
    ///
    /// Returns a decode error if the database name token is malformed
    pub fn summarize(&self, stored: &StoredDatasource) -> AppResult<DatasourceSummary> {
        Ok(DatasourceSummary {
            id: stored.id,
            project_id: stored.project_id.clone(),
            datasource_type: stored.datasource_type,
            database: self.vault.decrypt(&stored.database_name)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> DatasourceCodec {
        DatasourceCodec::new(CredentialVault::from_secret("codec-secret").unwrap())
    }

    fn request() -> NewDatasource {
        NewDatasource {
            user_id: "user-1".to_owned(),
            project_id: "project-1".to_owned(),
            host: "db.internal".to_owned(),
            port: "5433".to_owned(),
            database_name: "analytics".to_owned(),
            username: "reader".to_owned(),
            password: "hunter2".to_owned(),
            ..NewDatasource::default()
        }
    }

    #[test]
    fn test_stored_fields_are_ciphertext() {
        let stored = codec()
            .encode_new(Uuid::new_v4(), &request(), Utc::now())
            .unwrap();
        assert_ne!(stored.host, "db.internal");
        assert_ne!(stored.password, "hunter2");
        assert!(stored.password.contains(':'));
        assert_eq!(stored.user_id, "user-1");
        assert_eq!(stored.project_id, "project-1");
    }

    #[test]
    fn test_decode_restores_plaintext() {
        let codec = codec();
        let stored = codec
            .encode_new(Uuid::new_v4(), &request(), Utc::now())
            .unwrap();
        let summary = codec.summarize(&stored).unwrap();
        let decoded = codec.decode(stored).unwrap();
        assert_eq!(decoded.host, "db.internal");
        assert_eq!(decoded.port, "5433");
        assert_eq!(decoded.password, "hunter2");
        assert_eq!(summary.database, "analytics");
    }

    #[test]
    fn test_empty_fields_stay_empty() {
        let codec = codec();
        let mut req = request();
        req.password = String::new();
        let stored = codec.encode_new(Uuid::new_v4(), &req, Utc::now()).unwrap();
        assert_eq!(stored.password, "");
        assert_eq!(codec.decode(stored).unwrap().password, "");
    }
}
