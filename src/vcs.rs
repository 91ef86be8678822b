use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use git2::build::CheckoutBuilder;
use git2::{
    AutotagOption, Cred, CredentialType, DescribeFormatOptions, DescribeOptions, FetchOptions,
    Oid, RemoteCallbacks, Repository,
};
use serde::Deserialize;
use tempfile::TempDir;

use crate::error::GateError;

/// Rule for picking the baseline among the repository's tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TagSelection {
    /// Tag whose commit has the newest committer time.
    #[default]
    CommitDate,
    /// Highest `vMAJOR.MINOR.PATCH` tag.
    Semver,
    /// Nearest tag reachable from HEAD.
    Describe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub name: String,
    pub commit: Oid,
    /// Committer time of the tagged commit, seconds since the epoch.
    pub time: i64,
}

impl TagInfo {
    pub fn committed_at(&self) -> Option<String> {
        chrono::DateTime::from_timestamp(self.time, 0).map(|d| d.to_rfc3339())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
}

impl Version {
    /// Accepts `1.2.3`, `v1.2.3`, `1.2` and a `-pre` suffix; build metadata is ignored.
    pub fn parse(tag: &str) -> Option<Self> {
        let s = tag.strip_prefix(['v', 'V']).unwrap_or(tag);
        let s = s.split_once('+').map_or(s, |(v, _)| v);
        let (core, pre) = match s.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre.to_string())),
            Some(_) => return None,
            None => (s, None),
        };
        let mut parts = core.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            major,
            minor,
            patch,
            pre,
        })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Picks the latest tag by date or version. `Describe` needs the commit
/// graph and is handled by [`VcsContext::select_tag`].
pub fn pick_latest(tags: &[TagInfo], selection: TagSelection) -> Option<&TagInfo> {
    match selection {
        TagSelection::CommitDate | TagSelection::Describe => tags.iter().max_by(|a, b| {
            a.time
                .cmp(&b.time)
                .then_with(|| Version::parse(&a.name).cmp(&Version::parse(&b.name)))
                .then_with(|| a.name.cmp(&b.name))
        }),
        TagSelection::Semver => tags
            .iter()
            .filter_map(|t| Version::parse(&t.name).map(|v| (v, t)))
            .max_by(|(va, a), (vb, b)| va.cmp(vb).then_with(|| a.name.cmp(&b.name)))
            .map(|(_, t)| t),
    }
}

/// A tag's tree exported into a private temporary directory. Removed on drop.
pub struct BaselineCheckout {
    dir: TempDir,
}

impl BaselineCheckout {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// First credential kind in `allowed` that has not been offered yet, recorded
/// in `tried`.
fn next_credential(allowed: CredentialType, tried: &mut CredentialType) -> Option<CredentialType> {
    [
        CredentialType::SSH_KEY,
        CredentialType::USER_PASS_PLAINTEXT,
        CredentialType::DEFAULT,
    ]
    .into_iter()
    .find(|kind| allowed.contains(*kind) && !tried.contains(*kind))
    .inspect(|kind| tried.insert(*kind))
}

pub struct VcsContext {
    pub repo: Repository,
}

impl VcsContext {
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path).context("open git repo")?;
        Ok(Self { repo })
    }

    /// Canonical root of the working tree.
    pub fn workdir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .ok_or_else(|| anyhow!("bare repository has no working tree"))?
            .canonicalize()
            .context("resolve working tree")
    }

    /// Location of `path` inside the working tree, so the same subtree can be
    /// measured in an exported tag.
    pub fn relative_to_workdir(&self, path: &Path) -> Result<PathBuf> {
        let workdir = self.workdir()?;
        let path = path
            .canonicalize()
            .with_context(|| format!("resolve {}", path.display()))?;
        let rel = path
            .strip_prefix(&workdir)
            .with_context(|| format!("{} is outside {}", path.display(), workdir.display()))?;
        Ok(rel.to_path_buf())
    }

    /// Updates `refs/tags/*` from `remote_name`. No retry on failure.
    pub fn fetch_tags(&self, remote_name: &str) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote(remote_name)
            .with_context(|| format!("find remote {remote_name}"))?;
        let config = self.repo.config().context("read git config")?;

        let mut callbacks = RemoteCallbacks::new();
        // libgit2 calls back again after a rejected credential; each kind is
        // offered once, then the fetch fails instead of retrying forever.
        let mut tried = CredentialType::empty();
        callbacks.credentials(move |url, username, allowed| {
            let Some(kind) = next_credential(allowed, &mut tried) else {
                return Err(git2::Error::from_str(&format!(
                    "no usable credentials for {url}"
                )));
            };
            if kind == CredentialType::SSH_KEY {
                Cred::ssh_key_from_agent(username.unwrap_or("git"))
            } else if kind == CredentialType::USER_PASS_PLAINTEXT {
                Cred::credential_helper(&config, url, username)
            } else {
                Cred::default()
            }
        });
        let mut opts = FetchOptions::new();
        opts.remote_callbacks(callbacks)
            .download_tags(AutotagOption::All);

        tracing::info!("fetching tags from {remote_name}");
        remote
            .fetch(&["+refs/tags/*:refs/tags/*"], Some(&mut opts), None)
            .with_context(|| format!("fetch tags from {remote_name}"))?;
        Ok(())
    }

    /// All tags that peel to a commit.
    pub fn list_tags(&self) -> Result<Vec<TagInfo>> {
        let names = self.repo.tag_names(None).context("list tags")?;
        let mut out = Vec::with_capacity(names.len());
        for name in names.iter().flatten() {
            match self.find_tag(name) {
                Ok(tag) => out.push(tag),
                Err(err) => tracing::debug!("ignoring tag {name}: {err:#}"),
            }
        }
        Ok(out)
    }

    pub fn find_tag(&self, name: &str) -> Result<TagInfo> {
        let reference = self
            .repo
            .find_reference(&format!("refs/tags/{name}"))
            .map_err(|_| GateError::TagNotFound(name.to_string()))?;
        let commit = reference
            .peel_to_commit()
            .with_context(|| format!("tag {name} does not point at a commit"))?;
        Ok(TagInfo {
            name: name.to_string(),
            commit: commit.id(),
            time: commit.time().seconds(),
        })
    }

    pub fn select_tag(&self, selection: TagSelection) -> Result<TagInfo> {
        if selection == TagSelection::Describe {
            return self.describe_nearest_tag();
        }
        let tags = self.list_tags()?;
        tracing::debug!("{} tags considered", tags.len());
        pick_latest(&tags, selection).cloned().ok_or_else(|| {
            let detail = if selection == TagSelection::Semver && !tags.is_empty() {
                " (none is a semantic version)".to_string()
            } else {
                String::new()
            };
            GateError::NoTags { detail }.into()
        })
    }

    fn describe_nearest_tag(&self) -> Result<TagInfo> {
        let mut opts = DescribeOptions::new();
        opts.describe_tags();
        let describe = self
            .repo
            .describe(&opts)
            .map_err(|_| GateError::NoTags {
                detail: " (none reachable from HEAD)".to_string(),
            })?;
        let mut fmt = DescribeFormatOptions::new();
        fmt.abbreviated_size(0);
        let name = describe.format(Some(&fmt)).context("format describe result")?;
        self.find_tag(&name)
    }

    /// Writes the tag's tree into a fresh temporary directory. HEAD, the
    /// index and the working tree of the repository are left alone.
    pub fn export_tag(&self, tag: &TagInfo) -> Result<BaselineCheckout> {
        let dir = tempfile::Builder::new()
            .prefix("lintgate-baseline-")
            .tempdir()
            .context("create baseline directory")?;
        let commit = self.repo.find_commit(tag.commit)?;
        let tree = commit.tree()?;

        let mut checkout = CheckoutBuilder::new();
        checkout
            .target_dir(dir.path())
            .force()
            .recreate_missing(true)
            .update_index(false);
        self.repo
            .checkout_tree(tree.as_object(), Some(&mut checkout))
            .with_context(|| format!("export tag {}", tag.name))?;
        tracing::info!("exported {} to {}", tag.name, dir.path().display());

        Ok(BaselineCheckout { dir })
    }
}
