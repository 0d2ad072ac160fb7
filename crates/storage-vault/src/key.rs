// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Public keys able to authenticate a vault manifest digest.
// Author: Lukas Bower

use ed25519_dalek::{Signature, VerifyingKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::Sha256;
use signature::Verifier;

/// A public key that verifies detached signatures over a manifest's SHA-256 digest.
pub trait VaultKey {
    /// Exact length of a signature produced for this key.
    fn signature_size(&self) -> usize;

    /// Check `signature` against `digest`.
    fn verify_digest(&self, digest: &[u8; 32], signature: &[u8]) -> bool;
}

/// PKCS#1 v1.5 signatures with a SHA-256 `DigestInfo`; RSA-2048 keys produce 256 bytes.
impl VaultKey for RsaPublicKey {
    fn signature_size(&self) -> usize {
        self.size()
    }

    fn verify_digest(&self, digest: &[u8; 32], signature: &[u8]) -> bool {
        self.verify(Pkcs1v15Sign::new::<Sha256>(), digest, signature)
            .is_ok()
    }
}

/// Ed25519 signatures over the 32 digest bytes.
impl VaultKey for VerifyingKey {
    fn signature_size(&self) -> usize {
        Signature::BYTE_SIZE
    }

    fn verify_digest(&self, digest: &[u8; 32], signature: &[u8]) -> bool {
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        self.verify(digest, &signature).is_ok()
    }
}
