//! Request-scoped temporary files.
//!
//! Each staged file sits alone in `<upload_dir>/<uuid>/`, so the directory can be
//! removed wholesale and two requests uploading the same name never collide.

use crate::utils::constants::FALLBACK_UPLOAD_NAME;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// Reduces a client-supplied filename to a safe basename. Accented letters are
/// folded to ASCII (NFKD) and an extension survives even when the stem does not.
pub fn secure_filename(name: &str) -> String {
    let spaced: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let extension = cleaned
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    match extension {
        Some(ext) if trimmed.is_empty() || trimmed == ext => {
            format!("{FALLBACK_UPLOAD_NAME}.{ext}")
        }
        _ if trimmed.is_empty() => FALLBACK_UPLOAD_NAME.to_string(),
        _ => trimmed.to_string(),
    }
}

/// A file owned by exactly one request. Its directory is removed once, either by
/// [`StagedFile::discard`] or on drop.
#[derive(Debug)]
pub struct StagedFile {
    dir: PathBuf,
    path: PathBuf,
    removed: bool,
}

impl StagedFile {
    /// Creates an empty staged file named after `filename` (sanitized).
    pub async fn create(upload_dir: &Path, filename: &str) -> io::Result<(Self, tokio::fs::File)> {
        let dir = upload_dir.join(Uuid::new_v4().simple().to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let staged = Self {
            path: dir.join(secure_filename(filename)),
            dir,
            removed: false,
        };
        // on error `staged` drops here and takes the directory with it
        let file = tokio::fs::File::create(&staged.path).await?;
        Ok((staged, file))
    }

    pub async fn write(upload_dir: &Path, filename: &str, data: &[u8]) -> io::Result<Self> {
        let (staged, mut file) = Self::create(upload_dir, filename).await?;
        file.write_all(data).await?;
        file.flush().await?;
        tracing::debug!(path = %staged.path.display(), bytes = data.len(), "staged upload");
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn discard(mut self) {
        self.removed = true;
        if let Err(e) = tokio::fs::remove_dir_all(&self.dir).await {
            tracing::error!(path = %self.dir.display(), error = %e, "failed to remove staged file");
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::error!(path = %self.dir.display(), error = %e, "failed to remove staged file");
            }
        }
    }
}

pub async fn prepare_upload_dir(upload_dir: &Path) -> io::Result<()> {
    tokio::fs::create_dir_all(upload_dir).await
}

/// Removes staging directories left behind by a previous process. Only
/// UUID-named directories are touched. Returns how many were removed.
pub async fn sweep_stale(upload_dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    let mut entries = tokio::fs::read_dir(upload_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let is_staging_dir = entry.file_type().await?.is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| Uuid::try_parse(name).is_ok());
        if !is_staging_dir {
            continue;
        }
        tokio::fs::remove_dir_all(entry.path()).await?;
        removed += 1;
    }
    Ok(removed)
}

#[cfg(test)]
mod staging_tests {
    use super::{StagedFile, secure_filename, sweep_stale};

    fn entries(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("My cool movie.mov"), "My_cool_movie.mov");
        assert_eq!(secure_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("..\\windows\\win.ini"), "windows_win.ini");
        assert_eq!(secure_filename("rapport été.pdf"), "rapport_ete.pdf");
        assert_eq!(secure_filename("é.png"), "e.png");
        assert_eq!(secure_filename("été.png"), "ete.png");
        assert_eq!(secure_filename("ﬁle.txt"), "file.txt");
        assert_eq!(secure_filename("日本.png"), "upload.png");
        assert_eq!(secure_filename("__.pdf"), "upload.pdf");
        assert_eq!(secure_filename("png"), "png");
        assert_eq!(secure_filename("photo<1>.PNG"), "photo1.PNG");
        assert_eq!(secure_filename("..."), "upload");
        assert_eq!(secure_filename(""), "upload");
    }

    #[tokio::test]
    async fn test_write_then_discard_leaves_nothing() {
        let upload_dir = tempfile::tempdir().unwrap();
        let staged = StagedFile::write(upload_dir.path(), "../report.pdf", b"%PDF-1.4")
            .await
            .unwrap();

        assert_eq!(staged.path().file_name().unwrap(), "report.pdf");
        assert!(staged.path().starts_with(upload_dir.path()));
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"%PDF-1.4");

        staged.discard().await;
        assert_eq!(entries(upload_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_drop_removes_staged_file() {
        let upload_dir = tempfile::tempdir().unwrap();
        let staged = StagedFile::write(upload_dir.path(), "notes.txt", b"hello")
            .await
            .unwrap();
        let path = staged.path().to_path_buf();
        drop(staged);

        assert!(!path.exists());
        assert_eq!(entries(upload_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_same_name_does_not_collide() {
        let upload_dir = tempfile::tempdir().unwrap();
        let first = StagedFile::write(upload_dir.path(), "a.txt", b"first").await.unwrap();
        let second = StagedFile::write(upload_dir.path(), "a.txt", b"second").await.unwrap();

        assert_ne!(first.path(), second.path());
        assert_eq!(std::fs::read(first.path()).unwrap(), b"first");
        assert_eq!(std::fs::read(second.path()).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_sweep_stale_only_touches_staging_dirs() {
        let upload_dir = tempfile::tempdir().unwrap();
        let staged = StagedFile::write(upload_dir.path(), "left.txt", b"x").await.unwrap();
        std::mem::forget(staged);
        std::fs::create_dir(upload_dir.path().join("keep-me")).unwrap();
        std::fs::write(upload_dir.path().join("readme.txt"), b"keep").unwrap();

        let removed = sweep_stale(upload_dir.path()).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(entries(upload_dir.path()), 2);
    }
}
