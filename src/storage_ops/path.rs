use crate::storage_ops::handler_utils::AppError;

/// Root prefix isolating one user's keys from every other user's. The prefix
/// is the sole access-isolation mechanism; nothing else keeps users apart.
pub fn user_root(user_id: i64) -> String {
    format!("user-{user_id}-files/")
}

/// Builds the absolute store key for a user-supplied relative path.
///
/// The path is normalized to forward-slash segments and validated before it
/// is ever combined with the root: absolute paths, `.`/`..` segments, and
/// empty segments (`a//b`) are rejected. An empty path resolves to the user
/// root itself; a trailing slash is preserved for folder keys.
pub fn resolve(user_id: i64, relative_path: &str) -> Result<String, AppError> {
    let normalized = relative_path.replace('\\', "/");

    if normalized.starts_with('/') {
        return Err(AppError::InvalidPath(relative_path.to_string()));
    }

    let without_trailing = normalized.strip_suffix('/').unwrap_or(&normalized);
    if !without_trailing.is_empty() {
        for segment in without_trailing.split('/') {
            match segment {
                "" | "." | ".." => {
                    return Err(AppError::InvalidPath(relative_path.to_string()));
                }
                _ => {}
            }
        }
    }

    Ok(format!("{}{}", user_root(user_id), normalized))
}

/// Validates a user-supplied object or folder name (the `newName` of a
/// rename): a single non-empty segment, no delimiters, no traversal.
pub fn validate_name(name: &str) -> Result<(), AppError> {
    let normalized = name.replace('\\', "/");
    match normalized.as_str() {
        "" | "." | ".." => Err(AppError::InvalidPath(name.to_string())),
        n if n.contains('/') => Err(AppError::InvalidPath(name.to_string())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_under_user_root() {
        assert_eq!(resolve(7, "docs/a.txt").unwrap(), "user-7-files/docs/a.txt");
    }

    #[test]
    fn empty_path_is_the_user_root() {
        assert_eq!(resolve(7, "").unwrap(), "user-7-files/");
    }

    #[test]
    fn keeps_trailing_slash_for_folders() {
        assert_eq!(resolve(7, "docs/").unwrap(), "user-7-files/docs/");
    }

    #[test]
    fn normalizes_backslashes() {
        assert_eq!(resolve(7, "docs\\a.txt").unwrap(), "user-7-files/docs/a.txt");
    }

    #[test]
    fn rejects_traversal() {
        assert!(resolve(7, "../other-user").is_err());
        assert!(resolve(7, "docs/../../x").is_err());
        assert!(resolve(7, "docs/./x").is_err());
    }

    #[test]
    fn rejects_absolute_paths() {
        assert!(resolve(7, "/etc/passwd").is_err());
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(resolve(7, "docs//a.txt").is_err());
    }

    #[test]
    fn validates_names() {
        assert!(validate_name("report.pdf").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("a\\b").is_err());
    }
}
