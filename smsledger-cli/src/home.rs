use std::path::{Path, PathBuf};

/// Expand a leading `~` / `~/` using `$HOME`; other paths pass through.
pub fn expand_home(raw: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    expand_home_with(raw, home.as_deref())
}

pub fn expand_home_with(raw: &str, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(raw);
    };

    if raw == "~" {
        return home.to_path_buf();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home() {
        let home = Path::new("/home/ana");
        assert_eq!(
            expand_home_with("~/Documents/Obsidian/Costs.md", Some(home)),
            PathBuf::from("/home/ana/Documents/Obsidian/Costs.md")
        );
        assert_eq!(expand_home_with("~", Some(home)), PathBuf::from("/home/ana"));
        assert_eq!(expand_home_with("/abs/Costs.md", Some(home)), PathBuf::from("/abs/Costs.md"));
        // ~user is not supported
        assert_eq!(expand_home_with("~bob/x", Some(home)), PathBuf::from("~bob/x"));
    }

    #[test]
    fn test_expand_without_home_is_literal() {
        assert_eq!(expand_home_with("~/x.md", None), PathBuf::from("~/x.md"));
    }
}
