use digest::{Digest, DynDigest};
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChecksumVerifierError {
    #[error("Checksum is not valid hex: {0}")]
    InvalidChecksum(String),
    #[error("Checksum has incorrect length: expected {expected}, got {actual}")]
    IncorrectLength { expected: usize, actual: usize },
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

/// A [`Write`] adapter that digests everything passed through it, for checking a download
/// against the digest its catalog published.
pub struct ChecksumVerifier<T, W> {
    checksum: Box<[u8]>,
    checksummer: Box<T>,
    delegate: W,
}

impl<T: DynDigest, W: Write> ChecksumVerifier<T, W> {
    pub fn new(
        checksum: &str,
        checksummer: Box<T>,
        delegate: W,
    ) -> Result<Self, ChecksumVerifierError> {
        let checksum = hex::decode(checksum.trim())
            .map_err(|_| ChecksumVerifierError::InvalidChecksum(checksum.to_string()))?
            .into_boxed_slice();
        if checksum.len() != checksummer.output_size() {
            return Err(ChecksumVerifierError::IncorrectLength {
                expected: checksummer.output_size(),
                actual: checksum.len(),
            });
        }
        Ok(Self {
            checksum,
            checksummer,
            delegate,
        })
    }

    pub fn verify(self) -> Result<W, ChecksumVerifierError> {
        let actual = self.checksummer.finalize();
        let expected = self.checksum;
        if actual == expected {
            Ok(self.delegate)
        } else {
            Err(ChecksumVerifierError::ChecksumMismatch {
                expected: hex::encode(expected),
                actual: hex::encode(actual),
            })
        }
    }
}

impl<T: Digest, W: Write> Write for ChecksumVerifier<T, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.delegate.write(buf)?;
        Digest::update(&mut *self.checksummer, &buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.delegate.flush()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use sha2::Sha256;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_matching_checksum() {
        let mut verifier =
            ChecksumVerifier::new(HELLO_SHA256, Box::new(Sha256::new()), Vec::new()).unwrap();
        verifier.write_all(b"hello").unwrap();
        assert_eq!(b"hello".to_vec(), verifier.verify().unwrap());
    }

    #[test]
    fn test_mismatched_checksum() {
        let mut verifier =
            ChecksumVerifier::new(HELLO_SHA256, Box::new(Sha256::new()), Vec::new()).unwrap();
        verifier.write_all(b"goodbye").unwrap();
        assert!(matches!(
            verifier.verify(),
            Err(ChecksumVerifierError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_bad_checksum_input() {
        assert_eq!(
            Some(ChecksumVerifierError::InvalidChecksum("zz".to_string())),
            ChecksumVerifier::new("zz", Box::new(Sha256::new()), Vec::new()).err()
        );
        assert_eq!(
            Some(ChecksumVerifierError::IncorrectLength {
                expected: 32,
                actual: 2
            }),
            ChecksumVerifier::new("abcd", Box::new(Sha256::new()), Vec::new()).err()
        );
    }
}
