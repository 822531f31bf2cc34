//! Custody wallet address decryption.
//!
//! The backend ships the custody address AES-CBC encrypted (PKCS7 padding),
//! with the key and IV distributed base64-encoded out of band. Key length
//! selects the AES variant.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::errors::{ApiError, ApiResult};

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

#[derive(Clone)]
pub struct AddressDecryptor {
    key: Vec<u8>,
    iv: [u8; 16],
}

impl AddressDecryptor {
    pub fn from_base64(key_b64: &str, iv_b64: &str) -> ApiResult<Self> {
        let key = BASE64
            .decode(key_b64.trim())
            .map_err(|e| ApiError::Decrypt(format!("invalid key: {e}")))?;
        if !matches!(key.len(), 16 | 24 | 32) {
            return Err(ApiError::Decrypt(format!(
                "unsupported AES key length {}",
                key.len()
            )));
        }

        let iv_bytes = BASE64
            .decode(iv_b64.trim())
            .map_err(|e| ApiError::Decrypt(format!("invalid iv: {e}")))?;
        let iv: [u8; 16] = iv_bytes
            .try_into()
            .map_err(|_| ApiError::Decrypt("iv must be 16 bytes".to_string()))?;

        Ok(Self { key, iv })
    }

    /// Decrypts a base64 ciphertext to the plaintext wallet address.
    pub fn decrypt(&self, cipher_b64: &str) -> ApiResult<String> {
        let ciphertext = BASE64
            .decode(cipher_b64.trim())
            .map_err(|e| ApiError::Decrypt(format!("invalid ciphertext: {e}")))?;

        let plaintext = match self.key.len() {
            16 => Aes128CbcDec::new_from_slices(&self.key, &self.iv)
                .map_err(|e| ApiError::Decrypt(e.to_string()))?
                .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext),
            24 => Aes192CbcDec::new_from_slices(&self.key, &self.iv)
                .map_err(|e| ApiError::Decrypt(e.to_string()))?
                .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext),
            _ => Aes256CbcDec::new_from_slices(&self.key, &self.iv)
                .map_err(|e| ApiError::Decrypt(e.to_string()))?
                .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext),
        }
        .map_err(|e| ApiError::Decrypt(format!("bad padding: {e}")))?;

        String::from_utf8(plaintext)
            .map_err(|e| ApiError::Decrypt(format!("plaintext is not UTF-8: {e}")))
    }
}

impl std::fmt::Debug for AddressDecryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material stays out of logs.
        f.debug_struct("AddressDecryptor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::BlockEncryptMut;

    type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

    #[test]
    fn decrypts_what_the_backend_encrypts() {
        let key = [7u8; 16];
        let iv = [9u8; 16];
        let address = "HooPxCustody1111111111111111111111111111111";

        let ciphertext = Aes128CbcEnc::new_from_slices(&key, &iv)
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(address.as_bytes());

        let decryptor =
            AddressDecryptor::from_base64(&BASE64.encode(key), &BASE64.encode(iv)).unwrap();
        let decrypted = decryptor.decrypt(&BASE64.encode(ciphertext)).unwrap();
        assert_eq!(decrypted, address);
    }

    #[test]
    fn rejects_bad_key_material() {
        let short_key = BASE64.encode([1u8; 5]);
        let iv = BASE64.encode([0u8; 16]);
        assert!(matches!(
            AddressDecryptor::from_base64(&short_key, &iv),
            Err(ApiError::Decrypt(_))
        ));
    }

    #[test]
    fn garbage_ciphertext_is_an_error_not_a_panic() {
        let decryptor = AddressDecryptor::from_base64(
            &BASE64.encode([7u8; 16]),
            &BASE64.encode([9u8; 16]),
        )
        .unwrap();
        assert!(decryptor.decrypt("not-base64!!").is_err());
        assert!(decryptor.decrypt(&BASE64.encode([0u8; 16])).is_err());
    }
}
