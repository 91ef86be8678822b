#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Reports each line containing `BAD` as `path:line:1: E001 bad marker`.
/// Passing an ignore list that contains E001 silences it.
const FAKE_LINTER: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    --ignore=*E001*) exit 0 ;;
  esac
done
status=0
for f in "$@"; do
  case "$f" in
    -*) continue ;;
  esac
  grep -n BAD "$f" | while IFS=: read -r n _; do
    echo "$f:$n:1: E001 bad marker"
  done
  grep -q BAD "$f" && status=1
done
exit $status
"#;

pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub linter: PathBuf,
}

impl Fixture {
    /// An initialised repository plus a fake linter living outside it.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        fs::create_dir_all(&repo).unwrap();
        let linter = dir.path().join("fake-lint.sh");
        fs::write(&linter, FAKE_LINTER).unwrap();
        fs::set_permissions(&linter, fs::Permissions::from_mode(0o755)).unwrap();

        let fx = Fixture { dir, linter };
        fx.git(&["-c", "init.defaultBranch=main", "init"]);
        fx
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("repo")
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root().join(rel)).unwrap()
    }

    pub fn git(&self, args: &[&str]) -> String {
        git_in(&self.root(), args, None)
    }

    /// Commits everything with a fixed committer date (`YYYY-MM-DD`).
    pub fn commit_all(&self, message: &str, date: &str) {
        self.git(&["add", "."]);
        git_in(
            &self.root(),
            &[
                "-c",
                "user.name=Test",
                "-c",
                "user.email=test@example.com",
                "commit",
                "-q",
                "-m",
                message,
            ],
            Some(date),
        );
    }

    pub fn tag(&self, name: &str) {
        self.git(&["tag", name]);
    }

    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"]).trim().to_string()
    }

    /// Runs the gate against the fixture repo with `--no-fetch` and the fake linter.
    pub fn run_gate(&self, extra: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_lintgate"));
        cmd.arg(self.root())
            .arg("--linter")
            .arg(&self.linter)
            .arg("--no-fetch")
            .args(extra)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd.output().expect("run lintgate")
    }
}

pub fn git_in(dir: &Path, args: &[&str], date: Option<&str>) -> String {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(dir);
    if let Some(date) = date {
        let stamp = format!("{date} 12:00:00 +0000");
        cmd.env("GIT_AUTHOR_DATE", &stamp)
            .env("GIT_COMMITTER_DATE", &stamp);
    }
    let out = cmd.output().expect("run git");
    assert!(
        out.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).into_owned()
}

pub fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

pub fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

/// Three violations at the tag: one in `pkg/a.py`, two in `pkg/shim.py`.
pub fn tagged_fixture() -> Fixture {
    let fx = Fixture::new();
    fx.write("pkg/a.py", "BAD = 1\nok = 2\n");
    fx.write("pkg/shim.py", "BAD\nBAD\n");
    fx.write("README.md", "BAD but not python\n");
    fx.commit_all("initial", "2021-01-01");
    fx.tag("v1.0.0");
    fx
}
