//! Shell quoting helpers for generated commands and hook scripts.

/// Escape a value for use inside single quotes.
/// Replaces `'` with `'\''` (end quote, escaped quote, start quote).
pub fn escape_single_quote_content(value: &str) -> String {
    value.replace('\'', "'\\''")
}

/// Quote one argument for `sh -c` execution.
///
/// Plain identifiers pass through untouched so generated configs stay
/// readable; anything containing shell metacharacters is single-quoted.
pub fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    const SHELL_META: &[char] = &[
        ' ', '\t', '\n', '\'', '"', '\\', '$', '`', '!', '*', '?', '[', ']', '(', ')', '{', '}',
        '<', '>', '|', '&', ';', '#', '~',
    ];

    if !arg.contains(SHELL_META) {
        return arg.to_string();
    }

    format!("'{}'", escape_single_quote_content(arg))
}

/// Quote a filesystem path for shell execution (always quotes).
pub fn quote_path(path: &str) -> String {
    format!("'{}'", escape_single_quote_content(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_arg_plain_identifier_untouched() {
        assert_eq!(quote_arg("package:debian"), "package:debian");
        assert_eq!(quote_arg("make:packages"), "make:packages");
    }

    #[test]
    fn quote_arg_with_spaces() {
        assert_eq!(quote_arg("test dev"), "'test dev'");
    }

    #[test]
    fn quote_arg_embedded_single_quote() {
        assert_eq!(quote_arg("it's"), "'it'\\''s'");
    }

    #[test]
    fn quote_arg_empty() {
        assert_eq!(quote_arg(""), "''");
    }

    #[test]
    fn quote_path_always_quotes() {
        assert_eq!(quote_path("/srv/packages"), "'/srv/packages'");
    }
}
