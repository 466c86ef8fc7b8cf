use domain::ports::copier::{CopyError, SourceCopier};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Plain filesystem copy, preserving symlinks on Unix.
pub struct FsCopier;

impl FsCopier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FsCopier {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceCopier for FsCopier {
    fn copy_file(&self, from: &Path, to: &Path) -> Result<(), CopyError> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|e| CopyError::new(parent, e))?;
        }
        fs::copy(from, to).map_err(|e| CopyError::new(from, e))?;
        Ok(())
    }

    fn copy_tree(&self, from: &Path, to: &Path, ignore: &[String]) -> Result<usize, CopyError> {
        fs::create_dir_all(to).map_err(|e| CopyError::new(to, e))?;

        // The destination may live inside the source tree; never copy it into itself.
        let dest = fs::canonicalize(to).map_err(|e| CopyError::new(to, e))?;
        let mut copied = 0;

        let walker = WalkDir::new(from).follow_links(false).into_iter().filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let ignored = entry
                .file_name()
                .to_str()
                .is_some_and(|name| ignore.iter().any(|i| i == name));
            let is_dest = fs::canonicalize(entry.path()).is_ok_and(|p| p == dest);
            !ignored && !is_dest
        });

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                CopyError::new(path, e.into())
            })?;
            let relative = match entry.path().strip_prefix(from) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel,
                _ => continue,
            };
            let target = to.join(relative);
            let file_type = entry.file_type();

            if file_type.is_dir() {
                fs::create_dir_all(&target).map_err(|e| CopyError::new(&target, e))?;
            } else if file_type.is_symlink() {
                copy_symlink(entry.path(), &target)?;
                copied += 1;
            } else {
                self.copy_file(entry.path(), &target)?;
                copied += 1;
            }
        }

        tracing::debug!(files = copied, from = %from.display(), to = %to.display(), "copied source tree");
        Ok(copied)
    }
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), CopyError> {
    let points_to = fs::read_link(link).map_err(|e| CopyError::new(link, e))?;
    if target.symlink_metadata().is_ok() {
        fs::remove_file(target).map_err(|e| CopyError::new(target, e))?;
    }
    std::os::unix::fs::symlink(points_to, target).map_err(|e| CopyError::new(target, e))
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), CopyError> {
    fs::copy(link, target)
        .map(|_| ())
        .map_err(|e| CopyError::new(link, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ignore_list() -> Vec<String> {
        vec![".git".to_string(), "__pycache__".to_string()]
    }

    #[test]
    fn test_copy_tree_respects_ignore() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        fs::write(src.path().join("manage.py"), "print()").unwrap();
        fs::create_dir_all(src.path().join("scheduler/__pycache__")).unwrap();
        fs::write(src.path().join("scheduler/views.py"), "").unwrap();
        fs::write(src.path().join("scheduler/__pycache__/views.pyc"), "").unwrap();
        fs::create_dir(src.path().join(".git")).unwrap();
        fs::write(src.path().join(".git/HEAD"), "ref").unwrap();

        let copied = FsCopier::new()
            .copy_tree(src.path(), dst.path(), &ignore_list())
            .unwrap();

        assert_eq!(copied, 2);
        assert!(dst.path().join("manage.py").exists());
        assert!(dst.path().join("scheduler/views.py").exists());
        assert!(!dst.path().join("scheduler/__pycache__").exists());
        assert!(!dst.path().join(".git").exists());
    }

    #[test]
    fn test_nested_destination_not_recursed() {
        let src = tempdir().unwrap();
        fs::write(src.path().join("app.py"), "").unwrap();
        let dst = src.path().join("build");

        let copied = FsCopier::new().copy_tree(src.path(), &dst, &[]).unwrap();

        assert_eq!(copied, 1);
        assert!(dst.join("app.py").exists());
        assert!(!dst.join("build").exists());
    }

    #[test]
    fn test_copy_file_creates_parents() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        fs::write(src.path().join("requirements.txt"), "django\n").unwrap();

        let target = dst.path().join("deps/requirements.txt");
        FsCopier::new()
            .copy_file(&src.path().join("requirements.txt"), &target)
            .unwrap();

        assert_eq!(fs::read_to_string(target).unwrap(), "django\n");
    }
}
