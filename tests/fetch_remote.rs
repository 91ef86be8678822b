#![cfg(unix)]

mod common;

use common::{git_in, stderr, tagged_fixture};

#[test]
fn fetches_new_tags_from_origin() {
    let upstream = tagged_fixture();
    let clone = upstream.dir.path().join("clone");
    git_in(
        upstream.dir.path(),
        &["clone", "-q", upstream.root().to_str().unwrap(), "clone"],
        None,
    );

    // Release made upstream after the clone was taken.
    upstream.write("pkg/shim.py", "ok\n");
    upstream.commit_all("fix shim", "2023-03-01");
    upstream.tag("v1.1.0");

    let out = std::process::Command::new(env!("CARGO_BIN_EXE_lintgate"))
        .arg(&clone)
        .arg("--linter")
        .arg(&upstream.linter)
        .arg("--json")
        .output()
        .unwrap();
    assert!(
        matches!(out.status.code(), Some(0 | 1)),
        "stderr: {}",
        stderr(&out)
    );
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["baseline"]["tag"], "v1.1.0");
    assert_eq!(v["baseline"]["errors"], 1);
    assert_eq!(v["current"]["errors"], 3);

    let tags = git_in(&clone, &["tag", "--list"], None);
    assert!(tags.lines().any(|t| t == "v1.1.0"), "{tags}");
}

#[test]
fn unknown_remote_is_fatal() {
    let fx = tagged_fixture();
    let out = std::process::Command::new(env!("CARGO_BIN_EXE_lintgate"))
        .arg(fx.root())
        .arg("--linter")
        .arg(&fx.linter)
        .args(["--remote", "nowhere"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("find remote nowhere"), "{}", stderr(&out));
}
