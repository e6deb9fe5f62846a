//! Injected key generation and signing; private keys are scoped to
//! the operation that creates them.
//!
//! Grounded on krill's `util/test.rs` (`OpenSslSigner::new`,
//! `s.create_key(PublicKeyFormat)`) and the crypto/signing module in
//! `examples/other_examples/..._sitedata-krill__src-commons-crypto-signing-signing.rs.rs`
//! for the `Signer` trait shape; we don't need krill's later fork's
//! `sled`-backed key store or HSM/PKCS11 variants, just one-shot RSA-2048
//! generation and PKCS#1 v1.5 SHA-256 signing.

use std::fmt;

use openssl::hash::{hash, MessageDigest};
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::sign::Signer as OpenSslSigner;

use crate::asn1::decode;
use crate::asn1::tag::Tag;

#[derive(Debug)]
pub enum Error {
    KeyGeneration(openssl::error::ErrorStack),
    Signing(openssl::error::ErrorStack),
    Digest(openssl::error::ErrorStack),
    MalformedKey(decode::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::KeyGeneration(e) => write!(f, "key generation failed: {}", e),
            Error::Signing(e) => write!(f, "signing failed: {}", e),
            Error::Digest(e) => write!(f, "digest computation failed: {}", e),
            Error::MalformedKey(e) => write!(f, "malformed public key: {}", e),
        }
    }
}

impl std::error::Error for Error {}

/// A source of fresh key pairs. Every EE object and every CA gets its
/// own one-shot key, so construction asks for a new pair rather than
/// reusing one.
pub trait KeyGen {
    fn generate(&self) -> Result<KeyPair, Error>;
}

/// The default, non-deterministic key source: a fresh RSA-2048 pair from
/// the system RNG on every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenSslKeyGen;

impl KeyGen for OpenSslKeyGen {
    fn generate(&self) -> Result<KeyPair, Error> {
        let rsa = Rsa::generate(2048).map_err(Error::KeyGeneration)?;
        let pkey = PKey::from_rsa(rsa).map_err(Error::KeyGeneration)?;
        KeyPair::new(pkey)
    }
}

/// An RSA-2048 key pair plus the two derived values every certificate
/// field needs: its `SubjectPublicKeyInfo` DER and its RFC 6487
/// §4.8.2 Subject/Authority Key Identifier (SHA-1 of the raw
/// `subjectPublicKey` bits, regardless of the SHA-256 signature
/// profile -- see DESIGN.md).
pub struct KeyPair {
    pkey: PKey<Private>,
    spki_der: Vec<u8>,
    key_id: [u8; 20],
}

impl KeyPair {
    /// Builds a key pair from an existing PKCS#8 PEM-encoded RSA private
    /// key, bypassing key generation entirely. Used to inject a
    /// deterministic key source for tests (see [`FixedKeyGen`]).
    pub fn from_pkcs8_pem(pem: &[u8]) -> Result<Self, Error> {
        let pkey = PKey::private_key_from_pem(pem).map_err(Error::KeyGeneration)?;
        KeyPair::new(pkey)
    }

    fn new(pkey: PKey<Private>) -> Result<Self, Error> {
        let spki_der = pkey.public_key_to_der().map_err(Error::KeyGeneration)?;
        let key_id = subject_public_key_sha1(&spki_der)?;
        Ok(KeyPair {
            pkey,
            spki_der,
            key_id,
        })
    }

    pub fn subject_public_key_info_der(&self) -> &[u8] {
        &self.spki_der
    }

    pub fn key_identifier(&self) -> [u8; 20] {
        self.key_id
    }

    /// RSASSA-PKCS1-v1_5 signature over the SHA-256 digest of `data`.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let mut signer =
            OpenSslSigner::new(MessageDigest::sha256(), &self.pkey).map_err(Error::Signing)?;
        signer.update(data).map_err(Error::Signing)?;
        signer.sign_to_vec().map_err(Error::Signing)
    }
}

/// A deterministic key source that always hands back the same RSA key
/// pair, parsed from a fixed PKCS#8 PEM. Every CA and EE in a tree built
/// with this share one key; that's fine for byte-stability checks since
/// distinct subject common names still keep certificates distinguishable.
pub struct FixedKeyGen(pub &'static [u8]);

impl KeyGen for FixedKeyGen {
    fn generate(&self) -> Result<KeyPair, Error> {
        KeyPair::from_pkcs8_pem(self.0)
    }
}

/// SHA-1 of the content octets of a `SubjectPublicKeyInfo`'s
/// `subjectPublicKey` BIT STRING (RFC 5280 §4.2.1.2 method (1)).
fn subject_public_key_sha1(spki_der: &[u8]) -> Result<[u8; 20], Error> {
    let mut top = decode::Reader::new(spki_der);
    let mut inner = top.take_sequence().map_err(Error::MalformedKey)?;
    let _algorithm = inner.take_tlv().map_err(Error::MalformedKey)?;
    let bitstring = inner
        .take_tagged(Tag::BIT_STRING)
        .map_err(Error::MalformedKey)?;
    let (_unused, bits) = decode::bit_string(bitstring).map_err(Error::MalformedKey)?;
    digest_sha1(bits)
}

fn digest_sha1(data: &[u8]) -> Result<[u8; 20], Error> {
    let digest = hash(MessageDigest::sha1(), data).map_err(Error::Digest)?;
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest);
    Ok(out)
}

/// SHA-256 of arbitrary content; used for message digests (RFC 6488) and
/// manifest file hashes (RFC 6486).
pub fn sha256(data: &[u8]) -> Result<[u8; 32], Error> {
    let digest = hash(MessageDigest::sha256(), data).map_err(Error::Digest)?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_pair_signs_and_reports_a_20_byte_key_id() {
        let pair = OpenSslKeyGen.generate().expect("key generation");
        assert_eq!(pair.key_identifier().len(), 20);
        let sig = pair.sign(b"hello").expect("signing");
        assert!(!sig.is_empty());
    }

    #[test]
    fn sha256_is_32_bytes() {
        let digest = sha256(b"hello").unwrap();
        assert_eq!(digest.len(), 32);
    }

    const TEST_KEY_PEM: &[u8] = include_bytes!("../../tests/fixtures/test_key.pem");

    #[test]
    fn fixed_key_gen_is_deterministic_across_calls() {
        let gen = FixedKeyGen(TEST_KEY_PEM);
        let a = gen.generate().expect("first generate");
        let b = gen.generate().expect("second generate");
        assert_eq!(a.key_identifier(), b.key_identifier());
        assert_eq!(a.subject_public_key_info_der(), b.subject_public_key_info_der());
    }
}
