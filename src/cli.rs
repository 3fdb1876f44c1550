//! Command line interface

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::client::Client;
use crate::config::{home_dir, CredentialCache, Prompter, SettingLayers, TerminalPrompter};
use crate::errors::{RevisionsError, Result};
use crate::operations::{download_revisions, Progress, RevisionPlan, RevisionService};
use crate::types::{
    ClientConfig, DownloadSummary, DEFAULT_DROPBOX_DIR, DEFAULT_N_REVISIONS, DROPBOX_ROOT_ENV,
    MAX_CONCURRENT_DOWNLOADS,
};

/// Download up to 100 revisions of a Dropbox file to a folder.
///
/// Revisions are written to `<file>.revisions`, next to the file.
#[derive(Parser, Debug)]
#[command(name = "dropbox-download-revisions", author, version, about, long_about = None)]
pub struct Cli {
    /// Local path of a file inside the Dropbox folder
    pub path: PathBuf,

    /// Maximum number of revisions to download
    #[arg(short = 'n', long, default_value_t = DEFAULT_N_REVISIONS)]
    pub n_revisions: u32,

    /// Dropbox API key; prompted for when absent
    #[arg(long)]
    pub api_key: Option<String>,

    /// Remember the API key for later runs
    #[arg(long)]
    pub save_api_key: bool,

    /// Local Dropbox folder; defaults to $DROPBOX, then prompts
    #[arg(long)]
    pub dropbox_root: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Process state the settings are resolved against
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Home directory, holding the credential cache and the default root
    pub home: Option<PathBuf>,
    /// Value of `$DROPBOX`
    pub dropbox_root: Option<String>,
}

impl Environment {
    /// Reads `$HOME` and `$DROPBOX`
    pub fn from_process() -> Self {
        Self {
            home: home_dir().ok(),
            dropbox_root: std::env::var(DROPBOX_ROOT_ENV)
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }

    /// Credential cache inside the home directory
    pub fn credential_cache(&self) -> Option<CredentialCache> {
        self.home.as_deref().map(CredentialCache::in_home)
    }
}

/// Fully resolved run settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Absolute path of the local file
    pub file: PathBuf,
    /// Dropbox API key
    pub api_key: String,
    /// Local Dropbox root
    pub dropbox_root: PathBuf,
    /// Maximum number of revisions
    pub n_revisions: u32,
    /// Whether to cache the API key after listing
    pub save_api_key: bool,
}

impl Cli {
    /// Resolves every setting, prompting for what is missing
    ///
    /// The API key comes from the flag, else the prompt offering the cached
    /// key. The root comes from the flag, else `$DROPBOX`, else the prompt
    /// offering `$HOME/Dropbox`.
    pub fn resolve(self, env: &Environment, prompter: &mut dyn Prompter) -> Result<Settings> {
        let file = resolve_file(&self.path)?;

        let api_key = SettingLayers::default()
            .with_flag(self.api_key)
            .with_default(env.credential_cache().and_then(|cache| cache.load()))
            .resolve("Dropbox API key", prompter)?;

        let dropbox_root: String = SettingLayers::default()
            .with_flag(self.dropbox_root)
            .with_environment(env.dropbox_root.clone())
            .with_default(env.home.as_ref().map(|home| {
                home.join(DEFAULT_DROPBOX_DIR)
                    .to_string_lossy()
                    .into_owned()
            }))
            .resolve("Dropbox root", prompter)?;

        Ok(Settings {
            file,
            api_key,
            dropbox_root: normalize_root(Path::new(&dropbox_root)),
            n_revisions: self.n_revisions,
            save_api_key: self.save_api_key,
        })
    }
}

/// Resolves settings from the process, then downloads the revisions
pub async fn run(cli: Cli) -> Result<DownloadSummary> {
    let env = Environment::from_process();
    let settings = cli.resolve(&env, &mut TerminalPrompter)?;
    execute(&settings, &env, |api_key| {
        Ok(Arc::new(Client::new(ClientConfig::new(api_key))?))
    })
    .await
}

/// Runs the download with resolved settings
///
/// `connect` builds the revision service from the API key once the
/// preconditions hold. The API key is cached only when requested and only
/// after the listing succeeded.
pub async fn execute<S, C>(settings: &Settings, env: &Environment, connect: C) -> Result<DownloadSummary>
where
    S: RevisionService + 'static,
    C: FnOnce(&str) -> Result<Arc<S>>,
{
    let plan = RevisionPlan::new(&settings.file, &settings.dropbox_root)?;
    let service = connect(&settings.api_key)?;

    download_revisions(
        service,
        &plan,
        settings.n_revisions,
        MAX_CONCURRENT_DOWNLOADS,
        |progress| {
            match progress {
                Progress::Listing { .. } => println!("Getting list of revisions..."),
                Progress::Listed { .. } if settings.save_api_key => {
                    println!("Saving API key to cache...");
                    let cache = env.credential_cache().ok_or_else(|| {
                        RevisionsError::Config("HOME is not set, cannot cache API key".into())
                    })?;
                    cache.save(&settings.api_key)?;
                }
                Progress::Listed { .. } => {}
                Progress::Downloading { .. } => println!("Downloading revisions..."),
            }
            Ok(())
        },
    )
    .await
}

/// Makes `path` absolute and checks that it is a regular file
fn resolve_file(path: &Path) -> Result<PathBuf> {
    let resolved =
        std::fs::canonicalize(path).map_err(|_| RevisionsError::NotAFile(path.to_path_buf()))?;
    if !resolved.is_file() {
        return Err(RevisionsError::NotAFile(path.to_path_buf()));
    }
    Ok(resolved)
}

/// Canonicalizes the root when it exists so symlinked homes still match
fn normalize_root(root: &Path) -> PathBuf {
    std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}
