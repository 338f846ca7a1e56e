//! Race-free file claiming and atomic publication.
//!
//! A download writes into a hidden `.<name>.part` file that is created with
//! `create_new`, so two workers can never hold the same name. The finished file
//! is published with a hard link, which fails instead of overwriting when the
//! final name already exists. An uncommitted [`StagedFile`] removes its staging
//! file when dropped, so an aborted download leaves nothing behind.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::fs::naming::{candidate_name, staging_name};

/// Upper bound on `name_<n>` candidates tried for one base name.
const MAX_CANDIDATES: usize = 10_000;

/// A claimed destination name with its open staging file.
#[derive(Debug)]
pub struct StagedFile {
    dir: PathBuf,
    base_name: String,
    candidate: usize,
    temp_path: PathBuf,
    file: Option<File>,
    committed: bool,
}

/// Claim the first free candidate for `base_name` in `dir`.
///
/// A candidate is free when neither the final file nor its staging file exists.
pub async fn claim(dir: &Path, base_name: &str) -> io::Result<StagedFile> {
    for n in 0..MAX_CANDIDATES {
        let name = candidate_name(base_name, n);
        if fs::try_exists(dir.join(&name)).await? {
            continue;
        }

        let temp_path = dir.join(staging_name(&name));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await
        {
            Ok(file) => {
                tracing::trace!("Claimed {}", name);
                return Ok(StagedFile {
                    dir: dir.to_path_buf(),
                    base_name: base_name.to_string(),
                    candidate: n,
                    temp_path,
                    file: Some(file),
                    committed: false,
                });
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        ErrorKind::AlreadyExists,
        format!("No free file name for '{}'", base_name),
    ))
}

impl StagedFile {
    /// The name this download will be published under, if nothing else takes it first.
    pub fn final_path(&self) -> PathBuf {
        self.dir.join(candidate_name(&self.base_name, self.candidate))
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.write_all(bytes).await,
            None => Err(io::Error::other("staging file already closed")),
        }
    }

    /// Flush to disk and publish under the final name. Never overwrites.
    pub async fn commit(mut self) -> io::Result<PathBuf> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }

        loop {
            let final_path = self.final_path();
            match fs::hard_link(&self.temp_path, &final_path).await {
                Ok(()) => {
                    self.committed = true;
                    let _ = fs::remove_file(&self.temp_path).await;
                    return Ok(final_path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    // Someone outside this run created the name meanwhile.
                    self.next_candidate(e)?;
                }
                Err(e) if e.kind() == ErrorKind::Unsupported
                    || e.kind() == ErrorKind::PermissionDenied =>
                {
                    // Filesystems without hard links: rename if still free.
                    if fs::try_exists(&final_path).await? {
                        self.next_candidate(e)?;
                        continue;
                    }
                    fs::rename(&self.temp_path, &final_path).await?;
                    self.committed = true;
                    return Ok(final_path);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn next_candidate(&mut self, err: io::Error) -> io::Result<()> {
        self.candidate += 1;
        if self.candidate >= MAX_CANDIDATES {
            return Err(err);
        }
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            self.file.take();
            let _ = std::fs::remove_file(&self.temp_path);
        }
    }
}
