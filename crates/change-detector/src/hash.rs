use std::path::Path;

use blake3::Hasher;

use crate::errors::CacheError;

pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

pub fn hash_file(path: &Path) -> Result<String, CacheError> {
    let bytes = std::fs::read(path).map_err(|source| CacheError::io(path, source))?;
    Ok(hash_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_hex() {
        let digest = hash_bytes(b"## Login\nopen the page\n");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hash_bytes(b"## Login\nopen the page\n"));
        assert_ne!(digest, hash_bytes(b"## Login\nopen the page \n"));
    }
}
