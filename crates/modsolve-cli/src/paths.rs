use crate::error::{CliError, Result};
use directories::UserDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves the input model path and the result file path for a run.
///
/// Environment variables in the input path are expanded first. The output
/// folder spec selects where the result file goes:
///
/// - empty: next to the input file, with the extension replaced by `.txt`
/// - `~...`: under the home directory
/// - `:...`: under the input file's directory
/// - `....`: under the current directory
/// - anything else: used as a path as-is
///
/// For the prefixed forms, the prefix character and one directly following
/// separator are stripped before joining. The output directory is created;
/// the result file name is the input file name with a `.txt` extension.
pub fn resolve_io_paths(input: &Path, out_spec: &str) -> Result<(PathBuf, PathBuf)> {
    let expanded = expand_env_vars(&input.to_string_lossy());
    let input = PathBuf::from(expanded);

    let file_name = input.file_stem().ok_or_else(|| {
        CliError::Argument(format!("input path has no file name: {:?}", input))
    })?;
    let result_name = PathBuf::from(file_name).with_extension("txt");

    if out_spec.is_empty() {
        let output = input.with_file_name(&result_name);
        return Ok((input, output));
    }

    let out_dir = match out_spec.as_bytes()[0] {
        b'~' => {
            let user_dirs = UserDirs::new().ok_or_else(|| {
                CliError::Config("could not determine the home directory".to_string())
            })?;
            join_after_prefix(user_dirs.home_dir(), out_spec)
        }
        b':' => {
            let base = input.parent().unwrap_or_else(|| Path::new(""));
            join_after_prefix(base, out_spec)
        }
        b'.' => join_after_prefix(&std::env::current_dir()?, out_spec),
        _ => PathBuf::from(out_spec),
    };

    std::fs::create_dir_all(&out_dir)?;
    let output = out_dir.join(result_name);
    debug!("Resolved paths: input {:?}, output {:?}.", input, output);
    Ok((input, output))
}

/// Joins the spec (minus its prefix character and one directly following
/// separator) onto `base`.
fn join_after_prefix(base: &Path, spec: &str) -> PathBuf {
    let mut rest = &spec[1..];
    if let Some(stripped) = rest.strip_prefix(std::path::MAIN_SEPARATOR) {
        rest = stripped;
    }
    if rest.is_empty() {
        base.to_path_buf()
    } else {
        base.join(rest)
    }
}

/// Expands `$VAR` and `${VAR}` occurrences from the process environment.
/// Unset variables are left untouched.
pub fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = matches!(chars.peek(), Some((_, '{')));
        if braced {
            chars.next();
        }

        let mut name = String::new();
        while let Some((_, c)) = chars.peek() {
            if c.is_ascii_alphanumeric() || *c == '_' {
                name.push(*c);
                chars.next();
            } else {
                break;
            }
        }

        let closed = if braced {
            if matches!(chars.peek(), Some((_, '}'))) {
                chars.next();
                true
            } else {
                false
            }
        } else {
            true
        };

        match std::env::var(&name) {
            Ok(value) if closed && !name.is_empty() => result.push_str(&value),
            _ => {
                // Not a resolvable reference; reproduce the original text.
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if braced && closed {
                    result.push('}');
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_spec_places_the_result_next_to_the_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.dmodl");
        std::fs::write(&input, "").unwrap();

        let (in_path, out_path) = resolve_io_paths(&input, "").unwrap();
        assert_eq!(in_path, input);
        assert_eq!(out_path, dir.path().join("model.txt"));
    }

    #[test]
    fn plain_spec_is_used_as_a_path_and_created() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("Res");
        let spec = out_dir.to_string_lossy().to_string();

        let (_, out_path) = resolve_io_paths(Path::new("models/m.dmodl"), &spec).unwrap();
        assert_eq!(out_path, out_dir.join("m.txt"));
        assert!(out_dir.is_dir());
    }

    #[test]
    fn colon_spec_resolves_under_the_input_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.dmodl");
        std::fs::write(&input, "").unwrap();

        let (_, out_path) = resolve_io_paths(&input, ":Res").unwrap();
        assert_eq!(out_path, dir.path().join("Res").join("model.txt"));
        assert!(dir.path().join("Res").is_dir());
    }

    #[test]
    fn prefix_separator_is_stripped_once() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.dmodl");
        std::fs::write(&input, "").unwrap();

        let spec = format!(":{}Res", std::path::MAIN_SEPARATOR);
        let (_, out_path) = resolve_io_paths(&input, &spec).unwrap();
        assert_eq!(out_path, dir.path().join("Res").join("model.txt"));
    }

    #[test]
    fn dot_spec_resolves_under_the_current_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.dmodl");
        std::fs::write(&input, "").unwrap();

        // "." alone resolves to the current directory itself.
        let (_, out_path) = resolve_io_paths(&input, ".").unwrap();
        assert_eq!(
            out_path,
            std::env::current_dir().unwrap().join("model.txt")
        );
    }

    #[test]
    fn tilde_spec_resolves_under_the_home_directory() {
        if let Some(user_dirs) = UserDirs::new() {
            let (_, out_path) = resolve_io_paths(Path::new("m.dmodl"), "~").unwrap();
            assert_eq!(out_path, user_dirs.home_dir().join("m.txt"));
        }
    }

    #[test]
    fn input_without_a_file_name_is_rejected() {
        let err = resolve_io_paths(Path::new("/"), "").unwrap_err();
        assert!(matches!(err, CliError::Argument(_)));
    }

    #[test]
    fn expands_set_variables_in_both_forms() {
        // PATH is present in any reasonable test environment.
        let path = std::env::var("PATH").unwrap();
        assert_eq!(expand_env_vars("$PATH"), path);
        assert_eq!(expand_env_vars("pre/${PATH}/post"), format!("pre/{}/post", path));
    }

    #[test]
    fn unset_variables_are_left_untouched() {
        assert_eq!(
            expand_env_vars("$MODSOLVE_NO_SUCH_VAR/x"),
            "$MODSOLVE_NO_SUCH_VAR/x"
        );
        assert_eq!(
            expand_env_vars("${MODSOLVE_NO_SUCH_VAR}/x"),
            "${MODSOLVE_NO_SUCH_VAR}/x"
        );
    }

    #[test]
    fn lone_dollar_signs_pass_through() {
        assert_eq!(expand_env_vars("a$"), "a$");
        assert_eq!(expand_env_vars("${unterminated"), "${unterminated");
    }
}
