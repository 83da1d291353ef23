use crate::errors::PackError;
use std::path::Path;

/// Read the private key text from `ppk`, if one was given.
///
/// The content is passed to the packaging step untouched.
pub fn load_private_key(ppk: Option<&Path>) -> Result<Option<String>, PackError> {
    let Some(path) = ppk else {
        return Ok(None);
    };
    tracing::debug!("Loading an existing key: {}", path.display());
    std::fs::read_to_string(path)
        .map(Some)
        .map_err(|e| PackError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_no_key_path() {
        assert!(matches!(load_private_key(None), Ok(None)));
    }

    #[test]
    fn test_key_file_is_read_verbatim() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let path = temp_dir.path().join("private.ppk");
        assert!(std::fs::write(&path, "PRIVATE_KEY\n").is_ok());
        assert_eq!(
            load_private_key(Some(&path)).ok().flatten().as_deref(),
            Some("PRIVATE_KEY\n")
        );
    }

    #[test]
    fn test_unreadable_key_is_io_error() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let path = temp_dir.path().join("absent.ppk");
        assert!(matches!(
            load_private_key(Some(&path)),
            Err(PackError::Io { .. })
        ));
    }
}
