use std::path::PathBuf;

/// The daemon binary is installed next to the cli one.
pub fn to_daemon_path(mut path: PathBuf) -> PathBuf {
    path.set_file_name("focuslog-daemon");
    #[cfg(windows)]
    {
        path.set_extension("exe");
    }
    path
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::to_daemon_path;

    #[test]
    fn test_daemon_sits_next_to_cli() {
        let daemon = to_daemon_path(PathBuf::from("/usr/local/bin/focuslog"));
        assert_eq!(daemon.parent(), Some(PathBuf::from("/usr/local/bin").as_path()));
        assert!(daemon
            .file_name()
            .and_then(|v| v.to_str())
            .is_some_and(|v| v.starts_with("focuslog-daemon")));
    }
}
