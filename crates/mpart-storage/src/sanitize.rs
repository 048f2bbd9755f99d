//! Lexical confinement of caller-supplied filesystem paths.
//!
//! Nothing here touches the filesystem: symlinks are not resolved and the
//! result is not canonicalized.

use std::path::{MAIN_SEPARATOR, PathBuf};

/// Characters rejected by at least one supported filesystem.
const ILLEGAL_CHARS: [char; 6] = [':', '*', '"', '<', '>', '|'];

/// Removes traversal tokens and illegal characters, and rewrites both `/`
/// and `\` to the host separator.
///
/// Any run of two or more dots is dropped entirely; a single dot is kept so
/// file extensions survive. Empty segments collapse. Only a path that was
/// absolute before traversal tokens were stripped keeps its leading
/// separator, so a relative input always yields a relative output. The
/// function is idempotent.
pub fn sanitize_path(path: &str) -> String {
    let legal: String = path.chars().filter(|ch| !ILLEGAL_CHARS.contains(ch)).collect();
    let absolute = legal.starts_with(['/', '\\']);
    normalize_separators(&strip_dot_runs(&legal), absolute)
}

/// Joins `segments` under `root` and sanitizes the whole result, so no
/// segment can climb out of `root` or replace it with an absolute path.
pub fn sanitized_join(root: &str, segments: &[&str]) -> PathBuf {
    let mut joined = sanitize_path(root);
    for segment in segments {
        if !joined.is_empty() {
            joined.push('/');
        }
        joined.push_str(segment);
    }
    PathBuf::from(sanitize_path(&joined))
}

fn strip_dot_runs(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '.' {
            out.push(ch);
            continue;
        }

        let mut run = 1;
        while chars.next_if_eq(&'.').is_some() {
            run += 1;
        }
        if run == 1 {
            out.push('.');
        }
    }
    out
}

fn normalize_separators(path: &str, absolute: bool) -> String {
    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .collect();

    let mut out = String::with_capacity(path.len());
    if absolute {
        out.push(MAIN_SEPARATOR);
    }
    for (idx, segment) in segments.iter().enumerate() {
        if idx > 0 {
            out.push(MAIN_SEPARATOR);
        }
        out.push_str(segment);
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::{Component, MAIN_SEPARATOR, Path};

    use super::{sanitize_path, sanitized_join};

    fn host(path: &str) -> String {
        path.replace('/', &MAIN_SEPARATOR.to_string())
    }

    #[test]
    fn strips_traversal_tokens() {
        assert_eq!(sanitize_path("../../etc/passwd"), host("etc/passwd"));
        assert_eq!(sanitize_path("a/.../b/...../c"), host("a/b/c"));
        assert_eq!(sanitize_path("......"), "");
    }

    #[test]
    fn keeps_single_dots() {
        assert_eq!(sanitize_path("photos/cat.v2.png"), host("photos/cat.v2.png"));
    }

    #[test]
    fn removes_illegal_characters() {
        assert_eq!(sanitize_path("a:b*c\"d<e>f|g"), "abcdefg");
    }

    #[test]
    fn normalizes_both_separator_styles() {
        let out = sanitize_path("dir\\sub/file\\..\\x");
        assert_eq!(out, host("dir/sub/file/x"));
        let foreign = if MAIN_SEPARATOR == '/' { '\\' } else { '/' };
        assert!(!out.contains(foreign));
    }

    #[test]
    fn illegal_characters_cannot_splice_a_traversal() {
        let out = sanitize_path(".:./secret");
        assert!(!out.contains(".."));
    }

    #[test]
    fn relative_inputs_stay_relative() {
        for input in [
            "../../etc/passwd",
            "..\\..\\windows",
            ".../x",
            ".:./secret",
            "../staging",
            "..",
        ] {
            let out = sanitize_path(input);
            assert!(!Path::new(&out).has_root(), "input {input:?} gave {out:?}");
        }
        assert_eq!(sanitize_path(".:./secret"), "secret");
    }

    #[test]
    fn sanitized_relative_paths_join_under_root() {
        let root = Path::new("/srv/root");
        let joined = root.join(sanitize_path("../../etc/passwd"));
        assert_eq!(joined, root.join("etc").join("passwd"));
    }

    #[test]
    fn relative_roots_are_not_made_absolute() {
        assert_eq!(sanitized_join("../staging", &["ID"]), Path::new("staging").join("ID"));
        assert_eq!(sanitized_join("..", &["ID"]), Path::new("ID"));
        assert!(!sanitized_join("../../tmp", &["ID", "..", "x"]).has_root());
    }

    #[test]
    fn preserves_absolute_roots() {
        assert_eq!(sanitize_path("/var//data/"), host("/var/data"));
    }

    #[test]
    fn sanitizing_is_idempotent() {
        for input in [
            "../../etc/passwd",
            ".:./x",
            "a\\..\\b/./c",
            "/tmp/uploads",
            "x...y....z",
            "",
        ] {
            let once = sanitize_path(input);
            assert_eq!(sanitize_path(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn joined_paths_stay_under_root() {
        let root = "/srv/storage";
        let joined = sanitized_join(root, &["b1", "../../etc/passwd"]);
        assert!(joined.starts_with(root));
        assert!(
            joined
                .components()
                .all(|component| !matches!(component, Component::ParentDir))
        );
        assert_eq!(joined, Path::new(root).join("b1").join("etc").join("passwd"));
    }

    #[test]
    fn absolute_segments_do_not_replace_root() {
        let joined = sanitized_join("data", &["/etc", "\\passwd"]);
        assert_eq!(joined, Path::new("data").join("etc").join("passwd"));
    }
}
