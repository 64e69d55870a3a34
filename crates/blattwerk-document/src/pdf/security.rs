// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Password protection — apply and remove PDF encryption with AES-128 and a
// fixed permission profile.

use std::collections::BTreeMap;
use std::sync::Arc;

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::PermissionProfile;
use lopdf::encryption::crypt_filters::{Aes128CryptFilter, CryptFilter};
use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use lopdf::Document;
use tracing::{debug, info, instrument};

use crate::pdf::codec;

/// Name of the single crypt filter registered for both streams and strings.
const CRYPT_FILTER_NAME: &[u8] = b"StdCF";

/// Remove password protection from a document.
///
/// A document that carries no encryption dictionary is returned unchanged,
/// byte for byte. A wrong password surfaces as
/// [`BlattwerkError::InvalidPassword`].
#[instrument(skip_all, fields(bytes_len = bytes.len()))]
pub fn unlock(bytes: &[u8], password: &str) -> Result<Vec<u8>> {
    let mut document = Document::load_mem(bytes)
        .map_err(|err| BlattwerkError::Corrupt(format!("failed to parse PDF: {err}")))?;

    if !document.is_encrypted() {
        debug!("Document carries no encryption dictionary, returning input unchanged");
        return Ok(bytes.to_vec());
    }

    document.decrypt(password).map_err(|err| match err {
        lopdf::Error::Decryption(_) => BlattwerkError::InvalidPassword,
        other => BlattwerkError::Corrupt(format!("failed to decrypt document: {other}")),
    })?;

    // decrypt() rewrites the object streams in place; dropping the /Encrypt
    // entry makes the serialised output a plain document.
    document.trailer.remove(b"Encrypt");

    info!("Document unlocked");
    codec::serialize(&mut document)
}

/// Apply password protection to an unprotected document.
///
/// Encrypts with AES-128. When `owner_password` is `None` the user password
/// doubles as the owner password. An already-protected input is rejected
/// rather than re-encrypted.
#[instrument(skip_all, fields(bytes_len = bytes.len()))]
pub fn lock(
    bytes: &[u8],
    user_password: &str,
    owner_password: Option<&str>,
    profile: PermissionProfile,
) -> Result<Vec<u8>> {
    let mut document = Document::load_mem(bytes)
        .map_err(|err| BlattwerkError::Corrupt(format!("failed to parse PDF: {err}")))?;

    if document.is_encrypted() {
        return Err(BlattwerkError::AlreadyEncrypted);
    }

    let owner_password = owner_password.unwrap_or(user_password);
    let permissions = profile_permissions(profile);

    let mut crypt_filters: BTreeMap<Vec<u8>, Arc<dyn CryptFilter>> = BTreeMap::new();
    crypt_filters.insert(CRYPT_FILTER_NAME.to_vec(), Arc::new(Aes128CryptFilter));

    let version = EncryptionVersion::V4 {
        document: &document,
        encrypt_metadata: true,
        crypt_filters,
        stream_filter: CRYPT_FILTER_NAME.to_vec(),
        string_filter: CRYPT_FILTER_NAME.to_vec(),
        owner_password,
        user_password,
        permissions,
    };

    let state = EncryptionState::try_from(version)
        .map_err(|err| BlattwerkError::Pdf(format!("failed to build encryption state: {err}")))?;
    document
        .encrypt(&state)
        .map_err(|err| BlattwerkError::Pdf(format!("failed to encrypt document: {err}")))?;

    info!("Document locked");
    codec::serialize(&mut document)
}

/// Translate a [`PermissionProfile`] into the PDF permission flag set.
fn profile_permissions(profile: PermissionProfile) -> Permissions {
    let mut permissions = Permissions::empty();
    if profile.can_print {
        permissions |= Permissions::PRINTABLE | Permissions::PRINTABLE_IN_HIGH_QUALITY;
    }
    if profile.can_extract_content {
        permissions |= Permissions::COPYABLE;
    }
    if profile.can_modify {
        permissions |= Permissions::MODIFIABLE;
    }
    if profile.can_modify_annotations {
        permissions |= Permissions::ANNOTABLE;
    }
    if profile.can_fill_form {
        permissions |= Permissions::FILLABLE;
    }
    if profile.can_extract_for_accessibility {
        permissions |= Permissions::COPYABLE_FOR_ACCESSIBILITY;
    }
    permissions
}
