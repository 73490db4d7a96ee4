use crate::error::{Error, Result};
use crate::hash::{HashAlgorithm, calculate_hash};
use crate::link::{Link, Signature};
use openssl::hash::MessageDigest;
use openssl::pkey::{HasPublic, Id, PKey, PKeyRef, Private, Public};
use openssl::sign::{Signer, Verifier};
use std::fs::read;
use std::path::Path;
use zeroize::{ZeroizeOnDrop, Zeroizing};

pub mod signable;

use signable::Signable;

/// Capability to sign bytes on behalf of one identity.
pub trait SigningKey {
    /// Identifier recorded next to every signature made with this key.
    fn key_id(&self) -> &str;

    fn sign(&self, data: &[u8]) -> Result<Signature>;
}

/// Secure wrapper for private key data that zeroizes on drop
#[derive(ZeroizeOnDrop)]
pub struct SecurePrivateKey {
    #[zeroize(skip)]
    pkey: PKey<Private>,
    #[zeroize(skip)]
    key_id: String,
    #[zeroize(skip)]
    algorithm: HashAlgorithm,
    // Store the original key bytes in case we need them
    _key_data: Zeroizing<Vec<u8>>,
}

impl SecurePrivateKey {
    /// Create a new SecurePrivateKey from raw PEM data
    pub fn from_pem(pem_data: Vec<u8>) -> Result<Self> {
        // Wrap the PEM data in Zeroizing to ensure it's cleared when dropped
        let zeroizing_pem = Zeroizing::new(pem_data);

        let pkey = PKey::private_key_from_pem(&zeroizing_pem)
            .map_err(|e| Error::Signing(format!("Failed to load private key: {e}")))?;
        let key_id = compute_key_id(&pkey)?;

        Ok(Self {
            pkey,
            key_id,
            algorithm: HashAlgorithm::Sha256,
            _key_data: zeroizing_pem,
        })
    }

    /// Digest used when signing; ignored for Ed25519 keys.
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Get a reference to the inner PKey
    pub fn as_pkey(&self) -> &PKey<Private> {
        &self.pkey
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

impl SigningKey for SecurePrivateKey {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn sign(&self, data: &[u8]) -> Result<Signature> {
        let sig = sign_data_with_algorithm(data, self, &self.algorithm)?;
        Ok(Signature::new(self.key_id.clone(), &sig))
    }
}

/// Load a private key from a file path with automatic zeroization
pub fn load_private_key(key_path: &Path) -> Result<SecurePrivateKey> {
    // Read the key data - will be automatically zeroized when dropped
    let key_data = read(key_path)?;
    SecurePrivateKey::from_pem(key_data)
}

/// Load the key configured for a step, reporting every failure as a signing error.
pub fn load_signing_key(key_path: &Path, algorithm: HashAlgorithm) -> Result<SecurePrivateKey> {
    if !key_path.exists() {
        return Err(Error::Signing(format!(
            "Signing key path ({}) does not exist",
            key_path.display()
        )));
    }

    let key = load_private_key(key_path).map_err(|e| match e {
        Error::Io(err) => Error::Signing(format!(
            "Failed to read signing key {}: {err}",
            key_path.display()
        )),
        other => other,
    })?;

    Ok(key.with_algorithm(algorithm))
}

/// Key id: lowercase hex sha256 of the DER encoded SubjectPublicKeyInfo.
pub fn compute_key_id<T: HasPublic>(pkey: &PKeyRef<T>) -> Result<String> {
    let der = pkey
        .public_key_to_der()
        .map_err(|e| Error::Signing(format!("Failed to encode public key: {e}")))?;
    Ok(calculate_hash(&der))
}

/// Sign the canonical form of `link` with `key`.
///
/// The link itself is left untouched; callers attach the returned signature
/// to the document they send on.
pub fn sign_link(link: &Link, key: Option<&dyn SigningKey>) -> Result<Signature> {
    let key = key.ok_or_else(|| Error::Signing("No signing key loaded".to_string()))?;
    link.sign_with(key)
}

fn message_digest(algorithm: &HashAlgorithm) -> MessageDigest {
    match algorithm {
        HashAlgorithm::Sha256 => MessageDigest::sha256(),
        HashAlgorithm::Sha384 => MessageDigest::sha384(),
        HashAlgorithm::Sha512 => MessageDigest::sha512(),
    }
}

/// Sign data with a specific hash algorithm and automatic key zeroization
pub fn sign_data_with_algorithm(
    data: &[u8],
    private_key: &SecurePrivateKey,
    algorithm: &HashAlgorithm,
) -> Result<Vec<u8>> {
    let pkey = private_key.as_pkey();

    if pkey.id() == Id::ED25519 {
        let mut signer = Signer::new_without_digest(pkey)
            .map_err(|e| Error::Signing(format!("Failed to create signer: {e}")))?;
        return signer
            .sign_oneshot_to_vec(data)
            .map_err(|e| Error::Signing(format!("Failed to sign data: {e}")));
    }

    let mut signer = Signer::new(message_digest(algorithm), pkey)
        .map_err(|e| Error::Signing(format!("Failed to create signer: {e}")))?;

    signer
        .update(data)
        .map_err(|e| Error::Signing(format!("Failed to update signer: {e}")))?;

    // Sign to a zeroizing vector first to ensure cleanup
    let sig_len = signer
        .len()
        .map_err(|e| Error::Signing(format!("Failed to get signature length: {e}")))?;
    let mut signature = Zeroizing::new(vec![0u8; sig_len]);
    let len = signer
        .sign(&mut signature)
        .map_err(|e| Error::Signing(format!("Failed to sign data: {e}")))?;

    // Return only the used portion of the signature
    Ok(signature[..len].to_vec())
}

/// Verify a raw signature with a public key using the specified algorithm
pub fn verify_signature_with_algorithm(
    data: &[u8],
    signature: &[u8],
    public_key: &PKey<Public>,
    algorithm: &HashAlgorithm,
) -> Result<bool> {
    if public_key.id() == Id::ED25519 {
        let mut verifier =
            Verifier::new_without_digest(public_key).map_err(|e| Error::Signing(e.to_string()))?;
        return verifier
            .verify_oneshot(signature, data)
            .map_err(|e| Error::Signing(e.to_string()));
    }

    let mut verifier = Verifier::new(message_digest(algorithm), public_key)
        .map_err(|e| Error::Signing(e.to_string()))?;

    verifier
        .update(data)
        .map_err(|e| Error::Signing(e.to_string()))?;

    verifier
        .verify(signature)
        .map_err(|e| Error::Signing(e.to_string()))
}
