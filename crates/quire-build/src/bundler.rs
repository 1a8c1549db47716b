//! Client asset bundling.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::BuildError;

/// Name of the client entry point passed to the bundler.
pub const CLIENT_ENTRY: &str = "main";

const CLIENT_SCRIPT: &str = include_str!("../assets/client.js");
const CLIENT_STYLES: &str = include_str!("../assets/styles.css");

/// Options for a bundle invocation.
#[derive(Clone, Debug)]
pub struct BundleOptions {
    /// Directory the bundle is written into.
    pub out_dir: PathBuf,
    pub minify: bool,
}

/// Files produced by a bundle invocation (absolute paths).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BundleOutput {
    pub script_path: Option<PathBuf>,
    pub style_path: Option<PathBuf>,
    pub outputs: Vec<PathBuf>,
}

/// Produces the client script and stylesheet for an entry point.
pub trait Bundler: Send + Sync {
    fn bundle(&self, entry: &str, options: &BundleOptions) -> Result<BundleOutput, BuildError>;
}

/// Bundler writing the built-in client script and stylesheet.
///
/// Output files are named `<entry>-<hash>.js` and `<entry>-<hash>.css`, with
/// the first 8 hex digits of the SHA-256 of their content.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedBundler;

impl Bundler for EmbeddedBundler {
    fn bundle(&self, entry: &str, options: &BundleOptions) -> Result<BundleOutput, BuildError> {
        if entry.is_empty() || entry.contains(['/', '\\']) {
            return Err(BuildError::Bundle(format!("invalid entry name `{entry}`")));
        }

        let (script, styles) = if options.minify {
            (minify_script(CLIENT_SCRIPT), minify_styles(CLIENT_STYLES))
        } else {
            (CLIENT_SCRIPT.to_owned(), CLIENT_STYLES.to_owned())
        };

        let script_path = write_hashed(&options.out_dir, entry, "js", &script)?;
        let style_path = write_hashed(&options.out_dir, entry, "css", &styles)?;

        Ok(BundleOutput {
            outputs: vec![script_path.clone(), style_path.clone()],
            script_path: Some(script_path),
            style_path: Some(style_path),
        })
    }
}

fn write_hashed(out_dir: &Path, entry: &str, ext: &str, content: &str) -> Result<PathBuf, BuildError> {
    let path = out_dir.join(format!("{entry}-{}.{ext}", content_hash(content)));
    std::fs::write(&path, content).map_err(BuildError::io(&path))?;
    Ok(path)
}

fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..4])
}

/// Drop blank lines, whole-line comments and indentation.
fn minify_script(source: &str) -> String {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drop comments, blank lines and indentation.
fn minify_styles(source: &str) -> String {
    let mut without_comments = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("/*") {
        without_comments.push_str(&rest[..start]);
        rest = match rest[start..].find("*/") {
            Some(end) => &rest[start + end + 2..],
            None => "",
        };
    }
    without_comments.push_str(rest);

    without_comments
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_writes_hashed_files() {
        let dir = tempfile::tempdir().unwrap();
        let options = BundleOptions {
            out_dir: dir.path().to_path_buf(),
            minify: false,
        };

        let output = EmbeddedBundler.bundle(CLIENT_ENTRY, &options).unwrap();

        let script = output.script_path.unwrap();
        let name = script.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("main-"));
        assert!(name.ends_with(".js"));
        assert_eq!(name.len(), "main-".len() + 8 + ".js".len());
        assert_eq!(std::fs::read_to_string(&script).unwrap(), CLIENT_SCRIPT);
        assert!(output.style_path.unwrap().exists());
        assert_eq!(output.outputs.len(), 2);
    }

    #[test]
    fn test_bundle_hash_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let options = BundleOptions {
            out_dir: dir.path().to_path_buf(),
            minify: true,
        };

        let first = EmbeddedBundler.bundle(CLIENT_ENTRY, &options).unwrap();
        let second = EmbeddedBundler.bundle(CLIENT_ENTRY, &options).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_bundle_rejects_invalid_entry() {
        let dir = tempfile::tempdir().unwrap();
        let options = BundleOptions {
            out_dir: dir.path().to_path_buf(),
            minify: false,
        };

        let err = EmbeddedBundler.bundle("../main", &options).unwrap_err();
        assert!(matches!(err, BuildError::Bundle(_)));
    }

    #[test]
    fn test_minify_styles() {
        assert_eq!(
            minify_styles("/* theme */\na {\n  color: red;\n}\n"),
            "a {color: red;}"
        );
    }

    #[test]
    fn test_minify_script() {
        assert_eq!(
            minify_script("// header\n  var a = 1;\n\n  a += 1;\n"),
            "var a = 1;\na += 1;"
        );
    }
}
