use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;

pub struct TraversalOptions {
    pub allowed_exts: HashSet<String>, // lowercase, no dot
}

impl TraversalOptions {
    pub fn from_extensions<S: AsRef<str>>(exts: &[S]) -> Self {
        let allowed_exts = exts
            .iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { allowed_exts }
    }
}

/// Lists lintable files in the `scope` subdirectory of the checkout at
/// `root`, as paths relative to that subdirectory, sorted.
///
/// Only rules that travel with the tree are applied (`.gitignore`,
/// `.ignore` from `root` downwards), so a live clone and an exported tag see
/// the same file set. Ignore files above `root` are never read.
pub fn collect_files(root: &Path, scope: &Path, opts: &TraversalOptions) -> Result<Vec<PathBuf>> {
    let mut builder = WalkBuilder::new(root);
    builder.follow_links(false);
    builder.hidden(false);
    builder.parents(false);
    builder.require_git(false);
    builder.git_ignore(true);
    builder.git_exclude(false);
    builder.git_global(false);
    let (walk_root, walk_scope) = (root.to_path_buf(), scope.to_path_buf());
    builder.filter_entry(move |dent| {
        if dent.file_name() == ".git" {
            return false;
        }
        // Descend only along the path to `scope` and below it.
        dent.path()
            .strip_prefix(&walk_root)
            .is_ok_and(|rel| rel.starts_with(&walk_scope) || walk_scope.starts_with(rel))
    });

    let base = root.join(scope);
    let mut out = Vec::new();
    for dent in builder.build() {
        let dent = match dent {
            Ok(d) => d,
            Err(err) => {
                tracing::debug!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if !dent.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = dent.path();
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        if !opts.allowed_exts.contains(&ext.to_ascii_lowercase()) {
            continue;
        }
        let rel = path
            .strip_prefix(&base)
            .with_context(|| format!("{} is outside {}", path.display(), base.display()))?;
        out.push(rel.to_path_buf());
    }

    out.sort();
    Ok(out)
}
