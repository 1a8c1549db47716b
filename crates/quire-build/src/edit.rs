//! "Edit this page" links.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use quire_book::paths::encode_path_for_href;
use quire_config::Config;

/// Characters a URI component keeps unescaped besides alphanumerics.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// URL for editing the chapter at `source_path`, if the site is configured for it.
///
/// `site.github_edit_base_url` wins; otherwise a `github.com/<owner>/<repo>`
/// URL in `site.socials.github` produces a GitHub edit link on
/// `site.github_edit_branch` under `site.github_edit_path` (default: the
/// source directory).
pub(crate) fn edit_url(config: &Config, source_path: &str) -> Option<String> {
    let site = &config.site;
    let source = encode_path_for_href(source_path);

    let base = site.github_edit_base_url.trim();
    if !base.is_empty() {
        return Some(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            source.trim_start_matches('/')
        ));
    }

    let (owner, repository) = github_repository(&site.socials.github)?;
    let branch = match site.github_edit_branch.trim() {
        "" => "main",
        branch => branch,
    };
    let root = match site.github_edit_path.trim() {
        "" => config.relative_src_dir(),
        path => path.to_owned(),
    };
    let root = encode_path_for_href(&root);
    let root = root.trim_matches('/');

    let full_path = if root.is_empty() {
        source
    } else {
        format!("{root}/{source}")
    };
    Some(format!(
        "https://github.com/{owner}/{repository}/edit/{}/{full_path}",
        utf8_percent_encode(branch, COMPONENT)
    ))
}

/// `(owner, repository)` of a `https://github.com/<owner>/<repo>` URL.
fn github_repository(url: &str) -> Option<(&str, &str)> {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    let (host, path) = rest.split_once('/')?;
    if !host.eq_ignore_ascii_case("github.com") {
        return None;
    }

    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    let owner = segments.next()?;
    let repository = segments.next()?;
    let repository = repository
        .strip_suffix(".git")
        .or_else(|| repository.strip_suffix(".GIT"))
        .unwrap_or(repository);
    if repository.is_empty() {
        return None;
    }
    Some((owner, repository))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn config() -> Config {
        Config::default_with_base(Path::new("/site"))
    }

    #[test]
    fn test_no_edit_link_without_settings() {
        assert_eq!(edit_url(&config(), "guide.md"), None);
    }

    #[test]
    fn test_explicit_base_url() {
        let mut config = config();
        config.site.github_edit_base_url = "https://git.example.com/docs/edit/".to_owned();
        config.site.socials.github = "https://github.com/acme/docs".to_owned();

        assert_eq!(
            edit_url(&config, "guide/my page.md").as_deref(),
            Some("https://git.example.com/docs/edit/guide/my%20page.md")
        );
    }

    #[test]
    fn test_derived_from_github_social() {
        let mut config = config();
        config.site.socials.github = "https://github.com/acme/handbook.git/".to_owned();
        config.site.github_edit_branch = "release/1.0".to_owned();

        assert_eq!(
            edit_url(&config, "guide.md").as_deref(),
            Some("https://github.com/acme/handbook/edit/release%2F1.0/book/guide.md")
        );

        config.site.github_edit_path = "/docs/src/".to_owned();
        assert_eq!(
            edit_url(&config, "guide.md").as_deref(),
            Some("https://github.com/acme/handbook/edit/release%2F1.0/docs/src/guide.md")
        );
    }

    #[test]
    fn test_github_repository() {
        assert_eq!(
            github_repository("https://github.com/acme/docs?tab=readme"),
            Some(("acme", "docs"))
        );
        assert_eq!(github_repository("https://github.com/acme"), None);
        assert_eq!(github_repository("https://gitlab.com/acme/docs"), None);
        assert_eq!(github_repository("github.com/acme/docs"), None);
    }
}
