//! Client-side checks applied before a file joins a batch.

use crate::config::UploadLimits;
use crate::error::RestrictionError;

use super::LocalFile;

/// Whether `file` matches one allow-list entry.
///
/// Entries take three forms: `type/*` (any subtype), an exact mime type, or a
/// `.ext` filename suffix. Comparison is case-insensitive.
fn matches_pattern(file: &LocalFile, pattern: &str) -> bool {
    let pattern = pattern.trim().to_ascii_lowercase();
    let mime = file.mime_type.to_ascii_lowercase();

    if pattern.starts_with('.') {
        return file.name.to_ascii_lowercase().ends_with(&pattern);
    }
    if let Some(family) = pattern.strip_suffix("/*") {
        return mime
            .split_once('/')
            .is_some_and(|(top, _)| top == family);
    }
    mime == pattern
}

/// Whether the file's type is allowed. An empty allow-list accepts anything.
pub fn is_type_allowed(file: &LocalFile, allowed_types: &[String]) -> bool {
    allowed_types.is_empty() || allowed_types.iter().any(|p| matches_pattern(file, p))
}

/// Validate one file against the limits, given how many are already staged.
pub fn check(file: &LocalFile, limits: &UploadLimits, staged: usize) -> Result<(), RestrictionError> {
    if staged >= limits.max_files {
        return Err(RestrictionError::TooManyFiles {
            filename: file.name.clone(),
            max: limits.max_files,
        });
    }
    if file.size() > limits.max_file_size {
        return Err(RestrictionError::TooLarge {
            filename: file.name.clone(),
            size: file.size(),
            max: limits.max_file_size,
        });
    }
    if !is_type_allowed(file, &limits.allowed_types) {
        return Err(RestrictionError::TypeNotAllowed {
            filename: file.name.clone(),
            mime_type: file.mime_type.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: usize) -> LocalFile {
        LocalFile::new(name, vec![0u8; size])
    }

    #[test]
    fn wildcard_matches_mime_family() {
        let allowed = vec!["image/*".to_string()];
        assert!(is_type_allowed(&file("cat.png", 1), &allowed));
        assert!(is_type_allowed(&file("cat.JPG", 1), &allowed));
        assert!(!is_type_allowed(&file("notes.txt", 1), &allowed));
    }

    #[test]
    fn extension_and_exact_mime_patterns() {
        let allowed = vec![".docx".to_string(), "application/pdf".to_string()];
        assert!(is_type_allowed(&file("Report.DOCX", 1), &allowed));
        assert!(is_type_allowed(&file("paper.pdf", 1), &allowed));
        assert!(!is_type_allowed(&file("paper.doc", 1), &allowed));
    }

    #[test]
    fn empty_allow_list_accepts_everything() {
        assert!(is_type_allowed(&file("anything.bin", 1), &[]));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let limits = UploadLimits {
            max_file_size: 10,
            ..UploadLimits::default()
        };
        let err = check(&file("big.png", 11), &limits, 0).unwrap_err();
        assert_eq!(
            err,
            RestrictionError::TooLarge {
                filename: "big.png".into(),
                size: 11,
                max: 10
            }
        );
        assert!(check(&file("ok.png", 10), &limits, 0).is_ok());
    }

    #[test]
    fn count_limit_counts_staged_files() {
        let limits = UploadLimits {
            max_files: 2,
            ..UploadLimits::default()
        };
        assert!(check(&file("a.png", 1), &limits, 1).is_ok());
        assert!(matches!(
            check(&file("b.png", 1), &limits, 2),
            Err(RestrictionError::TooManyFiles { max: 2, .. })
        ));
    }
}
