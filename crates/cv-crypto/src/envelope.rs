//! # Recipient Envelopes
//!
//! Seals a payload for one recipient certificate.
//!
//! ## Wire Layout
//!
//! ```text
//! [version(1)] [psid(4, BE)] [recipient HashedId8(8)] [ephemeral key(33)] [nonce(24)] [ciphertext..]
//! ```
//!
//! The content key is `SHA-256(ecdh_x || "cv-discovery-envelope" || psid || recipient)`
//! and the whole header is authenticated as associated data, so an envelope
//! whose PSID or recipient was altered fails to decrypt.

use crate::certificate::{Certificate, RecipientKeyPair};
use crate::hashing::{sha256_many, HashedId8};
use crate::symmetric::{open_payload, seal_payload, ContentKey, Nonce, NONCE_LEN};
use crate::CryptoError;
use k256::ecdh::{diffie_hellman, EphemeralSecret};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;

/// Current envelope format version.
pub const ENVELOPE_VERSION: u8 = 1;

const KDF_LABEL: &[u8] = b"cv-discovery-envelope";
const EPHEMERAL_KEY_LEN: usize = 33;
const HEADER_LEN: usize = 1 + 4 + 8 + EPHEMERAL_KEY_LEN + NONCE_LEN;

/// Result of opening an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedEnvelope {
    /// Service identifier the payload was sealed under.
    pub psid: u32,
    /// Decrypted payload.
    pub plaintext: Vec<u8>,
}

fn derive_key(shared_x: &[u8], psid: u32, recipient: &HashedId8) -> ContentKey {
    ContentKey::from_bytes(sha256_many(&[
        shared_x,
        KDF_LABEL,
        &psid.to_be_bytes(),
        recipient.as_bytes(),
    ]))
}

/// Seal `plaintext` for `recipient` under `psid`.
///
/// # Errors
///
/// Returns `CryptoError::EncryptionFailed` if the AEAD step fails.
pub fn seal(recipient: &Certificate, psid: u32, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let ephemeral = EphemeralSecret::random(&mut rand::thread_rng());
    let ephemeral_public = ephemeral.public_key().to_encoded_point(true);
    let shared = ephemeral.diffie_hellman(recipient.encryption_key());

    let recipient_id = recipient.id();
    let key = derive_key(shared.raw_secret_bytes().as_slice(), psid, &recipient_id);
    let nonce = Nonce::random();

    let mut out = Vec::with_capacity(HEADER_LEN + plaintext.len() + 16);
    out.push(ENVELOPE_VERSION);
    out.extend_from_slice(&psid.to_be_bytes());
    out.extend_from_slice(recipient_id.as_bytes());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(nonce.as_bytes());

    let ciphertext = seal_payload(&key, &nonce, &out, plaintext)?;
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Open an envelope with the recipient's key pair.
///
/// # Errors
///
/// - `CryptoError::MalformedEnvelope` for truncated input or unknown version
/// - `CryptoError::RecipientMismatch` if sealed for another certificate
/// - `CryptoError::DecryptionFailed` if authentication fails
pub fn open(keys: &RecipientKeyPair, envelope: &[u8]) -> Result<OpenedEnvelope, CryptoError> {
    if envelope.len() < HEADER_LEN {
        return Err(CryptoError::MalformedEnvelope(format!(
            "{} bytes is shorter than the {} byte header",
            envelope.len(),
            HEADER_LEN
        )));
    }
    if envelope[0] != ENVELOPE_VERSION {
        return Err(CryptoError::MalformedEnvelope(format!(
            "unsupported version {}",
            envelope[0]
        )));
    }

    let mut psid_bytes = [0u8; 4];
    psid_bytes.copy_from_slice(&envelope[1..5]);
    let psid = u32::from_be_bytes(psid_bytes);

    let mut id_bytes = [0u8; 8];
    id_bytes.copy_from_slice(&envelope[5..13]);
    let recipient_id = HashedId8::from_bytes(id_bytes);
    let own_id = keys.certificate_id();
    if recipient_id != own_id {
        return Err(CryptoError::RecipientMismatch {
            expected: own_id.to_string(),
            actual: recipient_id.to_string(),
        });
    }

    let key_end = 13 + EPHEMERAL_KEY_LEN;
    let ephemeral_public =
        PublicKey::from_sec1_bytes(&envelope[13..key_end]).map_err(|_| CryptoError::InvalidPublicKey)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(&envelope[key_end..HEADER_LEN]);
    let nonce = Nonce::from_bytes(nonce_bytes);

    let shared = diffie_hellman(keys.secret().to_nonzero_scalar(), ephemeral_public.as_affine());
    let key = derive_key(shared.raw_secret_bytes().as_slice(), psid, &recipient_id);
    let (header, ciphertext) = envelope.split_at(HEADER_LEN);
    let plaintext = open_payload(&key, &nonce, header, ciphertext)?;

    Ok(OpenedEnvelope { psid, plaintext })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_PSID;

    fn recipient() -> (RecipientKeyPair, Certificate) {
        let keys = RecipientKeyPair::generate();
        let cert = Certificate::from_bytes(&keys.certificate_bytes()).unwrap();
        (keys, cert)
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let (keys, cert) = recipient();
        let sealed = seal(&cert, DEFAULT_PSID, b"discovery payload").unwrap();

        let opened = open(&keys, &sealed).unwrap();
        assert_eq!(opened.psid, DEFAULT_PSID);
        assert_eq!(opened.plaintext, b"discovery payload");
    }

    #[test]
    fn test_header_layout() {
        let (_, cert) = recipient();
        let sealed = seal(&cert, 0x0102_0304, b"x").unwrap();

        assert_eq!(sealed[0], ENVELOPE_VERSION);
        assert_eq!(&sealed[1..5], &[1, 2, 3, 4]);
        assert_eq!(&sealed[5..13], cert.id().as_bytes());
        // 16-byte Poly1305 tag follows the 1-byte ciphertext
        assert_eq!(sealed.len(), HEADER_LEN + 1 + 16);
    }

    #[test]
    fn test_other_recipient_cannot_open() {
        let (_, cert) = recipient();
        let (intruder, _) = recipient();
        let sealed = seal(&cert, DEFAULT_PSID, b"secret").unwrap();

        assert!(matches!(
            open(&intruder, &sealed),
            Err(CryptoError::RecipientMismatch { .. })
        ));
    }

    #[test]
    fn test_psid_is_bound_into_key() {
        let (keys, cert) = recipient();
        let mut sealed = seal(&cert, DEFAULT_PSID, b"secret").unwrap();
        sealed[4] ^= 0x01;

        assert!(matches!(
            open(&keys, &sealed),
            Err(CryptoError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_truncated_envelope_rejected() {
        let (keys, _) = recipient();
        assert!(matches!(
            open(&keys, &[ENVELOPE_VERSION, 0, 0]),
            Err(CryptoError::MalformedEnvelope(_))
        ));
    }
}
