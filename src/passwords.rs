// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Password store export and restore.
//!
//! Secrets live in a `pass` compatible store: one gpg encrypted file per
//! secret, named after the secret itself, somewhere under the store root.
//! Exporting dumps every secret into a cleartext file, and importing feeds
//! such a file back into the store.
//!
//! # Cleartext Layout
//!
//! One secret per line, name first, secret second, separated by a single
//! space:
//!
//! ```text
//! email/personal hunter2
//! web/forum correct-horse-battery-staple
//! ```
//!
//! Neither names nor secrets may contain whitespace. Blank lines are
//! ignored on import.

use crate::{
    syscall::{Invocation, Syscall, SyscallError},
    target::{OutputTarget, TargetError},
};

use std::{
    fs::read_to_string,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Layer of indirection for secret store access.
pub trait SecretStore {
    /// List names of every stored secret.
    fn names(&self) -> Result<Vec<String>>;

    /// Fetch secret by name.
    fn fetch(&self, name: &str) -> Result<String>;

    /// Insert secret under target name.
    fn insert(&self, name: &str, secret: &str) -> Result<()>;
}

/// Secret store access through the pass binary.
#[derive(Debug)]
pub struct PassStore<S>
where
    S: Syscall,
{
    root: PathBuf,
    syscall: S,
}

impl<S> PassStore<S>
where
    S: Syscall,
{
    /// Construct new pass front end over target store root.
    pub fn new(root: impl Into<PathBuf>, syscall: S) -> Self {
        Self {
            root: root.into(),
            syscall,
        }
    }
}

impl<S> SecretStore for PassStore<S>
where
    S: Syscall,
{
    #[instrument(skip(self), level = "debug")]
    fn names(&self) -> Result<Vec<String>> {
        let pattern = self.root.join("**").join("*.gpg");
        let mut names = Vec::new();
        for entry in glob::glob(pattern.to_string_lossy().as_ref())? {
            let path = entry?;
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            names.push(relative.with_extension("").to_string_lossy().into_owned());
        }

        names.sort();
        debug!("found {} secrets", names.len());
        Ok(names)
    }

    fn fetch(&self, name: &str) -> Result<String> {
        let output = self.syscall.capture(&Invocation::new("pass").arg(name))?;
        Ok(output.trim().to_string())
    }

    fn insert(&self, name: &str, secret: &str) -> Result<()> {
        let call = Invocation::new("pass").args(["insert", "--echo", name]);
        Ok(self.syscall.feed(&call, secret)?)
    }
}

/// Name and secret pair of a cleartext file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub name: String,
    pub secret: String,
}

/// Parse cleartext credential listing.
///
/// # Errors
///
/// - Return [`PasswordError::MalformedLine`] if a non-blank line does not
///   hold exactly a name and a secret.
pub fn parse_credentials(data: &str) -> Result<Vec<Credential>> {
    let mut credentials = Vec::new();
    for (index, line) in data.lines().enumerate() {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        match tokens.as_slice() {
            [] => continue,
            [name, secret] => credentials.push(Credential {
                name: name.to_string(),
                secret: secret.to_string(),
            }),
            _ => return Err(PasswordError::MalformedLine { line: index + 1 }),
        }
    }

    Ok(credentials)
}

/// Export every secret of store into a new cleartext file.
///
/// # Errors
///
/// - Return [`PasswordError::Target`] if export file cannot be placed.
/// - Return [`PasswordError::Syscall`] if a secret cannot be fetched.
/// - Return [`PasswordError::Write`] if export file cannot be written.
#[instrument(skip(store, destination, filename), level = "debug")]
pub fn export(
    store: &impl SecretStore,
    destination: impl AsRef<Path>,
    filename: impl AsRef<Path>,
) -> Result<OutputTarget> {
    let target = OutputTarget::resolve(destination, filename)?;
    info!("backing up the passwords in {}", target.as_path().display());

    let mut contents = String::new();
    for name in store.names()? {
        let secret = store.fetch(&name)?;
        contents.push_str(format!("{name} {secret}\n").as_str());
    }

    let write_error = |source| PasswordError::Write {
        source,
        path: target.as_path().to_path_buf(),
    };
    let mut file = target.create()?;
    file.write_all(contents.as_bytes()).map_err(write_error)?;
    file.sync_all().map_err(write_error)?;

    info!("passwords backed up");
    Ok(target)
}

/// Restore every secret of a cleartext file into store.
///
/// The whole file is parsed before anything gets inserted.
///
/// # Errors
///
/// - Return [`PasswordError::MissingFile`] if source is not an existing file.
/// - Return [`PasswordError::MalformedLine`] if source cannot be parsed.
/// - Return [`PasswordError::Syscall`] if a secret cannot be inserted.
#[instrument(skip(store, source, filename), level = "debug")]
pub fn import(
    store: &impl SecretStore,
    source: impl AsRef<Path>,
    filename: impl AsRef<Path>,
) -> Result<usize> {
    let path = source.as_ref().join(filename.as_ref());
    if !path.is_file() {
        return Err(PasswordError::MissingFile { path });
    }

    let data = read_to_string(&path).map_err(|source| PasswordError::Read {
        source,
        path: path.clone(),
    })?;
    let credentials = parse_credentials(&data)?;

    info!("restoring the passwords into pass...");
    for credential in &credentials {
        debug!("insert {}", credential.name);
        store.insert(&credential.name, &credential.secret)?;
    }

    info!("restored {} passwords", credentials.len());
    Ok(credentials.len())
}

/// Password error types.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Cleartext file does not exist.
    #[error("file {:?} does not exist", path.display())]
    MissingFile { path: PathBuf },

    /// Cleartext line does not hold exactly one name and one secret.
    #[error("line {line} must hold exactly a name and a secret")]
    MalformedLine { line: usize },

    /// Cleartext file cannot be read.
    #[error("failed to read {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Cleartext file cannot be written.
    #[error("failed to write {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Export file cannot be placed.
    #[error(transparent)]
    Target(#[from] TargetError),

    /// Pass binary call failed.
    #[error(transparent)]
    Syscall(#[from] SyscallError),

    /// Store root makes for a bad search pattern.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Store entry cannot be inspected.
    #[error(transparent)]
    Glob(#[from] glob::GlobError),
}

/// Friendly result alias :3
pub type Result<T, E = PasswordError> = std::result::Result<T, E>;
