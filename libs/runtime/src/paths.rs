use std::io;
use std::path::{Path, PathBuf};

/// Resolve `server.home_dir` to an absolute path.
///
/// `""` is the current working directory, `~` and `~/..` expand to the user
/// home, relative paths are joined onto the current directory. The directory
/// is not created; log writers create what they need.
pub fn resolve_home_dir(raw: &str) -> io::Result<PathBuf> {
    let raw = raw.trim();
    let cwd = std::env::current_dir()?;

    if raw.is_empty() {
        return Ok(cwd);
    }

    let expanded = if raw == "~" {
        user_home()?
    } else if let Some(rest) = raw.strip_prefix("~/") {
        user_home()?.join(rest)
    } else {
        PathBuf::from(raw)
    };

    Ok(if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    })
}

fn user_home() -> io::Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "home directory is unknown"))
}

/// Join `file` onto `base` unless it is already absolute.
pub fn resolve_under(base: &Path, file: &str) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_cwd() {
        assert_eq!(resolve_home_dir("").unwrap(), std::env::current_dir().unwrap());
        assert_eq!(resolve_home_dir("  ").unwrap(), std::env::current_dir().unwrap());
    }

    #[test]
    fn tilde_expands() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(resolve_home_dir("~").unwrap(), home);
        assert_eq!(resolve_home_dir("~/.dbpulse").unwrap(), home.join(".dbpulse"));
    }

    #[test]
    fn relative_joins_cwd() {
        let p = resolve_home_dir("var/dbpulse").unwrap();
        assert!(p.is_absolute());
        assert!(p.ends_with("var/dbpulse"));
    }

    #[test]
    fn resolve_under_keeps_absolute() {
        let base = Path::new("/srv/dbpulse");
        assert_eq!(resolve_under(base, "logs/a.log"), base.join("logs/a.log"));
        assert_eq!(resolve_under(base, "/tmp/a.log"), PathBuf::from("/tmp/a.log"));
    }
}
