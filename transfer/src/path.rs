//! Remote path and object key derivation for the transfer loop.

/// Joins the remote directory with an entry name. A directory of "." means
/// the session's initial directory, so the bare name is used as-is.
pub fn remote_file_path(directory: &str, name: &str) -> String {
    if directory == "." {
        name.to_string()
    } else {
        format!("{directory}/{name}")
    }
}

/// Builds the destination object key. The prefix is already normalized to
/// empty or trailing-separator form, so plain concatenation cannot double
/// the separator.
pub fn object_key(prefix: &str, name: &str) -> String {
    format!("{prefix}{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_file_path() {
        assert_eq!(remote_file_path(".", "a.csv"), "a.csv");
        assert_eq!(remote_file_path("incoming", "a.csv"), "incoming/a.csv");
        assert_eq!(remote_file_path("/data/in", "a.csv"), "/data/in/a.csv");
    }

    #[test]
    fn test_object_key() {
        assert_eq!(object_key("", "a.csv"), "a.csv");
        assert_eq!(object_key("in/", "a.csv"), "in/a.csv");
        assert_eq!(object_key("a/b/", "c.txt"), "a/b/c.txt");
    }
}
