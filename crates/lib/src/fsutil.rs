//! Filesystem helpers for template expansion.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// Collect paths under `root` whose file name ends with `ext`, skipping
/// anything inside one of the `exclude` roots.
///
/// Results are in sorted walk order, so repeated runs process files in the
/// same sequence. Directories are only matched when `with_dirs` is set.
pub fn paths_by_ext(root: &Path, ext: &str, with_dirs: bool, exclude: &[PathBuf]) -> Vec<PathBuf> {
  let mut result = Vec::new();

  for entry in WalkDir::new(root)
    .sort_by_file_name()
    .into_iter()
    .filter_map(|e| e.ok())
  {
    let path = entry.path();
    if exclude.iter().any(|prefix| path.starts_with(prefix)) {
      continue;
    }
    if entry.file_type().is_dir() && !with_dirs {
      continue;
    }
    if let Some(name) = path.file_name().and_then(|n| n.to_str())
      && name.ends_with(ext)
    {
      result.push(path.to_path_buf());
    }
  }

  result
}

/// Recursively copy `src` into `dst`, creating directories as needed.
///
/// `ignore` is consulted with each entry's source path and computed
/// destination; returning `true` skips the entry, and for directories the
/// whole subtree. Existing files are overwritten; symlinks are preserved on
/// Unix. Destination paths of copied files are appended to `copied`.
pub fn copy_tree(
  src: &Path,
  dst: &Path,
  ignore: &mut dyn FnMut(&Path, &Path) -> bool,
  copied: &mut Vec<PathBuf>,
) -> io::Result<()> {
  fs::create_dir_all(dst)?;

  let mut entries: Vec<_> = fs::read_dir(src)?.collect::<io::Result<Vec<_>>>()?;
  entries.sort_by_key(|e| e.file_name());

  for entry in entries {
    let src_path = entry.path();
    let dst_path = dst.join(entry.file_name());

    if ignore(&src_path, &dst_path) {
      debug!(path = %src_path.display(), "skipping");
      continue;
    }

    let file_type = entry.file_type()?;
    if file_type.is_dir() {
      copy_tree(&src_path, &dst_path, ignore, copied)?;
    } else if file_type.is_symlink() {
      copy_symlink(&src_path, &dst_path)?;
      copied.push(dst_path);
    } else {
      fs::copy(&src_path, &dst_path)?;
      copied.push(dst_path);
    }
  }

  Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
  let target = fs::read_link(src)?;
  if dst.symlink_metadata().is_ok() {
    fs::remove_file(dst)?;
  }
  std::os::unix::fs::symlink(target, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
  // Dangling links cannot be followed; skip them rather than fail the copy.
  match fs::copy(src, dst) {
    Ok(_) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e),
  }
}

/// Copy permission bits from `src` to `dst`.
pub fn copy_permissions(src: &Path, dst: &Path) -> io::Result<()> {
  let perm = fs::metadata(src)?.permissions();
  fs::set_permissions(dst, perm)
}

/// Map `src_path` (inside `src_root`) to the corresponding path under
/// `dst_root`.
pub fn compute_dst_path(src_path: &Path, src_root: &Path, dst_root: &Path) -> Option<PathBuf> {
  src_path
    .strip_prefix(src_root)
    .ok()
    .map(|rel| dst_root.join(rel))
}

/// Move `src` to `dst`, merging into an existing destination directory.
///
/// A plain rename is attempted first; directory-into-directory moves fall
/// back to a merge copy followed by removal of the source.
pub fn move_path(src: &Path, dst: &Path) -> io::Result<()> {
  if src.is_dir() && dst.is_dir() {
    let mut copied = Vec::new();
    copy_tree(src, dst, &mut |_, _| false, &mut copied)?;
    return fs::remove_dir_all(src);
  }

  if let Some(parent) = dst.parent() {
    fs::create_dir_all(parent)?;
  }

  match fs::rename(src, dst) {
    Ok(()) => Ok(()),
    Err(_) => {
      // Cross-device fallback.
      fs::copy(src, dst)?;
      fs::remove_file(src)
    }
  }
}
