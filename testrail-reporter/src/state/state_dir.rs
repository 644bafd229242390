// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform-specific state directory discovery for reporter state.
//!
//! Failure markers and cached run ids are accumulated state that can't be regenerated, so they
//! live in `XDG_STATE_HOME` (on Linux/macOS) rather than in a cache directory.

use crate::errors::StateDirError;
use camino::{Utf8Path, Utf8PathBuf};
use etcetera::{BaseStrategy, choose_base_strategy};
use xxhash_rust::xxh3::xxh3_64;

/// Maximum length in bytes of a component written by [`encode_bounded_component`].
///
/// Well below the 255-byte file name limit of common filesystems, leaving room for the temporary
/// file suffix used by atomic writes.
pub const MAX_ENCODED_LEN: usize = 96;

/// Length of the hex hash suffix appended to truncated components.
const HASH_SUFFIX_LEN: usize = 8;

/// Environment variable to override the reporter state directory.
///
/// When set, state for a working directory is stored in
/// `$TESTRAIL_STATE_DIR/projects/<encoded-working-dir>/`.
pub const TESTRAIL_STATE_DIR_ENV: &str = "TESTRAIL_STATE_DIR";

/// Returns the state directory for reports issued from `working_dir`.
///
/// If the `TESTRAIL_STATE_DIR` environment variable is set, uses that as the base directory.
/// Otherwise, uses the platform-specific default:
///
/// - Linux, macOS, and other Unix: `$XDG_STATE_HOME/testrail-reporter/projects/<encoded>/` or
///   `~/.local/state/testrail-reporter/projects/<encoded>/`
/// - Windows: `%LOCALAPPDATA%\testrail-reporter\projects\<encoded>\` (Windows has no state
///   directory concept, so this falls back to the cache directory.)
///
/// The working directory is canonicalized before being encoded, so that reaching it through a
/// symlink shares state with the real path.
pub fn reporter_state_dir(working_dir: &Utf8Path) -> Result<Utf8PathBuf, StateDirError> {
    let base_dir = if let Ok(state_dir) = std::env::var(TESTRAIL_STATE_DIR_ENV) {
        Utf8PathBuf::from(state_dir)
    } else {
        let strategy = choose_base_strategy().map_err(StateDirError::BaseDirStrategy)?;
        let reporter_dir = strategy
            .state_dir()
            .unwrap_or_else(|| strategy.cache_dir())
            .join("testrail-reporter");
        Utf8PathBuf::from_path_buf(reporter_dir)
            .map_err(|path| StateDirError::StateDirNotUtf8 { path })?
    };

    state_dir_within(&base_dir, working_dir)
}

fn state_dir_within(
    base_dir: &Utf8Path,
    working_dir: &Utf8Path,
) -> Result<Utf8PathBuf, StateDirError> {
    let canonical = working_dir
        .canonicalize_utf8()
        .map_err(|error| StateDirError::Canonicalize {
            working_dir: working_dir.to_owned(),
            error,
        })?;
    Ok(base_dir
        .join("projects")
        .join(encode_bounded_component(canonical.as_str())))
}

/// Encodes an arbitrary string into a single directory-safe path component.
///
/// The encoding is bijective and uses underscore as an escape character:
///
/// - `_` → `__` (escape underscore first)
/// - `/` → `_s`, `\` → `_b` (path separators)
/// - `:` → `_c`, `*` → `_a`, `"` → `_q`, `<` → `_l`, `>` → `_g`, `|` → `_p`, `?` → `_m`
///   (invalid on Windows)
/// - a leading `.` → `_d` (so that `.` and `..` can't escape the namespace)
/// - the empty string → `_e`
///
/// # Examples
///
/// - `/home/ci/e2e` → `_shome_sci_se2e`
/// - `chrome 120` → `chrome 120`
/// - `..` → `_d.`
pub fn encode_component(input: &str) -> String {
    if input.is_empty() {
        return "_e".to_owned();
    }

    let mut encoded = String::with_capacity(input.len() * 2);
    for (index, ch) in input.chars().enumerate() {
        match ch {
            '_' => encoded.push_str("__"),
            '/' => encoded.push_str("_s"),
            '\\' => encoded.push_str("_b"),
            ':' => encoded.push_str("_c"),
            '*' => encoded.push_str("_a"),
            '"' => encoded.push_str("_q"),
            '<' => encoded.push_str("_l"),
            '>' => encoded.push_str("_g"),
            '|' => encoded.push_str("_p"),
            '?' => encoded.push_str("_m"),
            '.' if index == 0 => encoded.push_str("_d"),
            _ => encoded.push(ch),
        }
    }
    encoded
}

/// Encodes `input` like [`encode_component`], capping the result at [`MAX_ENCODED_LEN`] bytes.
///
/// Longer encodings are cut at a UTF-8 boundary and suffixed with eight hex digits of a hash of the
/// full encoding, so distinct inputs still map to distinct components. Truncated components can't
/// be decoded back to their input.
pub fn encode_bounded_component(input: &str) -> String {
    truncate_with_hash(encode_component(input))
}

fn truncate_with_hash(encoded: String) -> String {
    if encoded.len() <= MAX_ENCODED_LEN {
        return encoded;
    }

    let hash = xxh3_64(encoded.as_bytes());
    let hash_suffix = format!("{:08x}", hash & 0xFFFF_FFFF);
    let mut prefix_len = MAX_ENCODED_LEN - HASH_SUFFIX_LEN;
    while !encoded.is_char_boundary(prefix_len) {
        prefix_len -= 1;
    }

    let mut truncated = encoded[..prefix_len].to_owned();
    truncated.push_str(&hash_suffix);
    truncated
}

/// Decodes a component that was encoded with [`encode_component`].
///
/// Returns `None` if the encoded string is malformed (contains an invalid escape sequence like
/// `_x` where `x` is not a recognized escape character).
pub fn decode_component(encoded: &str) -> Option<String> {
    if encoded == "_e" {
        return Some(String::new());
    }

    let mut decoded = String::with_capacity(encoded.len());
    let mut chars = encoded.chars();

    while let Some(ch) = chars.next() {
        if ch == '_' {
            match chars.next() {
                Some('_') => decoded.push('_'),
                Some('s') => decoded.push('/'),
                Some('b') => decoded.push('\\'),
                Some('c') => decoded.push(':'),
                Some('a') => decoded.push('*'),
                Some('q') => decoded.push('"'),
                Some('l') => decoded.push('<'),
                Some('g') => decoded.push('>'),
                Some('p') => decoded.push('|'),
                Some('m') => decoded.push('?'),
                Some('d') if decoded.is_empty() => decoded.push('.'),
                // Malformed: `_` at end of string or followed by unknown char.
                _ => return None,
            }
        } else {
            decoded.push(ch);
        }
    }

    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("/home/ci/e2e", "_shome_sci_se2e" ; "unix path")]
    #[test_case(r"C:\Users\ci", "C_c_bUsers_bci" ; "windows path")]
    #[test_case("chrome 120", "chrome 120" ; "plain")]
    #[test_case("path_with_underscore", "path__with__underscore" ; "underscore")]
    #[test_case("..", "_d." ; "parent dir")]
    #[test_case(".hidden", "_dhidden" ; "leading dot")]
    #[test_case("a.b", "a.b" ; "inner dot")]
    #[test_case("", "_e" ; "empty")]
    fn encode_decode(input: &str, encoded: &str) {
        assert_eq!(encode_component(input), encoded);
        assert_eq!(decode_component(encoded).as_deref(), Some(input));
    }

    #[test_case("_" ; "trailing escape")]
    #[test_case("_x" ; "unknown escape")]
    #[test_case("a_d" ; "dot escape not at start")]
    fn decode_malformed(encoded: &str) {
        assert_eq!(decode_component(encoded), None);
    }

    #[test]
    fn short_components_are_not_truncated() {
        let input = "chrome 120 headless";
        assert_eq!(encode_bounded_component(input), encode_component(input));
    }

    #[test_case(&"chrome ".repeat(40) ; "ascii")]
    #[test_case(&"é".repeat(100) ; "multi-byte")]
    #[test_case(&"/very/deep".repeat(30) ; "escaped path")]
    fn long_components_are_truncated_with_hash(input: &str) {
        let encoded = encode_bounded_component(input);
        assert!(
            encoded.len() <= MAX_ENCODED_LEN,
            "component should fit in {MAX_ENCODED_LEN} bytes: {encoded:?} (len={})",
            encoded.len()
        );

        let hash_suffix = &encoded[encoded.len() - HASH_SUFFIX_LEN..];
        assert!(
            hash_suffix.chars().all(|c| c.is_ascii_hexdigit()),
            "hash suffix should be hex digits: {hash_suffix:?}"
        );

        let other = format!("{input}x");
        assert_ne!(encode_bounded_component(&other), encoded);
    }

    #[test]
    fn state_dir_is_per_working_dir() {
        let temp_dir = camino_tempfile::tempdir().expect("tempdir should be created");
        let base = temp_dir.path().join("state");
        let working_dir = temp_dir.path().join("project");
        std::fs::create_dir(&working_dir).expect("working dir should be created");

        let state_dir = state_dir_within(&base, &working_dir).expect("state dir is available");
        assert!(state_dir.starts_with(base.join("projects")));

        let canonical = working_dir.canonicalize_utf8().expect("canonicalizes");
        assert_eq!(
            state_dir.file_name().and_then(decode_component),
            Some(canonical.into_string())
        );
    }

    #[test]
    fn state_dir_requires_existing_working_dir() {
        let temp_dir = camino_tempfile::tempdir().expect("tempdir should be created");
        let missing = temp_dir.path().join("missing");
        let err = state_dir_within(temp_dir.path(), &missing).unwrap_err();
        assert!(
            matches!(err, StateDirError::Canonicalize { .. }),
            "unexpected error: {err:?}"
        );
    }
}
