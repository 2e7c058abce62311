// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

#[yare::parameterized(
    simple      = { "acme/widgets" },
    host_prefix = { "github.com/acme/widgets" },
    single      = { "widgets" },
    dotted_name = { "acme/widgets.js" },
    hidden_file = { "acme/.github" },
)]
fn parse_accepts(name: &str) {
    assert_eq!(RepoName::parse(name).unwrap().as_str(), name);
}

#[yare::parameterized(
    empty          = { "",                 RepoNameError::Empty },
    leading_slash  = { "/acme/widgets",    RepoNameError::EmptySegment("/acme/widgets".into()) },
    trailing_slash = { "acme/widgets/",    RepoNameError::EmptySegment("acme/widgets/".into()) },
    double_slash   = { "acme//widgets",    RepoNameError::EmptySegment("acme//widgets".into()) },
    nul            = { "acme/wid\0gets",   RepoNameError::InvalidChar("acme/wid\0gets".into()) },
    backslash      = { "acme\\widgets",    RepoNameError::InvalidChar("acme\\widgets".into()) },
)]
fn parse_rejects(name: &str, expected: RepoNameError) {
    assert_eq!(RepoName::parse(name).unwrap_err(), expected);
}

#[yare::parameterized(
    parent  = { "acme/../etc", ".." },
    current = { "./acme",      "." },
    git_dir = { "acme/.git",   ".git" },
)]
fn parse_rejects_reserved_segments(name: &str, segment: &str) {
    match RepoName::parse(name) {
        Err(RepoNameError::ReservedSegment { segment: got, .. }) => assert_eq!(got, segment),
        other => panic!("expected reserved segment error, got {:?}", other),
    }
}

#[test]
fn clone_dir_layout() {
    let repo = RepoName::parse("acme/widgets").unwrap();
    let dir = CloneDir::for_repo(Path::new("/srv/repos"), &repo);
    assert_eq!(dir.path(), Path::new("/srv/repos/acme/widgets/.git"));
    assert_eq!(dir.head_path(), PathBuf::from("/srv/repos/acme/widgets/.git/HEAD"));
    assert_eq!(dir.repo_root(), Path::new("/srv/repos/acme/widgets"));
}

#[test]
fn clone_dir_is_deterministic() {
    let repo = RepoName::parse("acme/widgets").unwrap();
    let root = Path::new("/srv/repos");
    assert_eq!(CloneDir::for_repo(root, &repo), CloneDir::for_repo(root, &repo));
}

#[test]
fn repo_name_serializes_as_plain_string() {
    let repo = RepoName::parse("acme/widgets").unwrap();
    assert_eq!(serde_json::to_string(&repo).unwrap(), r#""acme/widgets""#);
}

proptest! {
    #[test]
    fn distinct_names_yield_distinct_dirs(
        a in crate::test_support::strategies::arb_repo_name(),
        b in crate::test_support::strategies::arb_repo_name(),
    ) {
        let root = Path::new("/repos");
        let same_dir = CloneDir::for_repo(root, &a) == CloneDir::for_repo(root, &b);
        prop_assert_eq!(a == b, same_dir);
    }
}
