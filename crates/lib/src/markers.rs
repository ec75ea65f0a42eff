//! File-name markers controlling template expansion.
//!
//! A bootstrap tree may contain specially suffixed entries that the expansion
//! pipeline consumes instead of copying verbatim:
//! - `*.tpl`: placeholder template, rendered in place (marker stripped)
//! - `*.gen.lua` / `*.gen1.lua`: generator script producing the file content
//! - `*.rename` / `*.ren1`: entry to rename, optionally driven by a sibling
//!   renamer script (`*.rename.lua` / `*.ren1.lua`)
//!
//! The `1` variants only take effect while a template is in init mode and are
//! skipped from the bootstrap copy on re-runs.

use std::path::{Path, PathBuf};

/// Placeholder template files, rendered and then removed.
pub const TEMPLATE_EXT: &str = ".tpl";

/// Name of the directory inside a template that holds the files to expand.
pub const BOOTSTRAP_DIR: &str = "bootstrap";

/// Generator scripts: renewable or init-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenMarker {
  /// Run on every expansion (`.gen.lua`).
  Renewable,
  /// Run only in init mode (`.gen1.lua`).
  Once,
}

impl GenMarker {
  pub fn ext(self) -> &'static str {
    match self {
      GenMarker::Renewable => ".gen.lua",
      GenMarker::Once => ".gen1.lua",
    }
  }

  pub fn is_once(self) -> bool {
    matches!(self, GenMarker::Once)
  }
}

/// Rename markers: renewable or init-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameMarker {
  /// Renamed on every expansion (`.rename`).
  Renewable,
  /// Renamed only in init mode (`.ren1`).
  Once,
}

impl RenameMarker {
  pub fn ext(self) -> &'static str {
    match self {
      RenameMarker::Renewable => ".rename",
      RenameMarker::Once => ".ren1",
    }
  }

  /// Extension of the sibling script that computes the new name.
  pub fn renamer_ext(self) -> &'static str {
    match self {
      RenameMarker::Renewable => ".rename.lua",
      RenameMarker::Once => ".ren1.lua",
    }
  }

  pub fn is_once(self) -> bool {
    matches!(self, RenameMarker::Once)
  }
}

/// Classification of a bootstrap entry by its file-name marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
  Template,
  Gen(GenMarker),
  Rename(RenameMarker),
  /// A renamer script consumed by the rename pass.
  Renamer(RenameMarker),
}

impl Marker {
  /// Classify a file name by its marker suffix, if any.
  pub fn classify(name: &str) -> Option<Marker> {
    // Longest suffixes first; the marker set is otherwise disjoint.
    if name.ends_with(RenameMarker::Renewable.renamer_ext()) {
      Some(Marker::Renamer(RenameMarker::Renewable))
    } else if name.ends_with(RenameMarker::Once.renamer_ext()) {
      Some(Marker::Renamer(RenameMarker::Once))
    } else if name.ends_with(GenMarker::Once.ext()) {
      Some(Marker::Gen(GenMarker::Once))
    } else if name.ends_with(GenMarker::Renewable.ext()) {
      Some(Marker::Gen(GenMarker::Renewable))
    } else if name.ends_with(RenameMarker::Renewable.ext()) {
      Some(Marker::Rename(RenameMarker::Renewable))
    } else if name.ends_with(RenameMarker::Once.ext()) {
      Some(Marker::Rename(RenameMarker::Once))
    } else if name.ends_with(TEMPLATE_EXT) {
      Some(Marker::Template)
    } else {
      None
    }
  }
}

/// Strip a marker suffix from a path.
///
/// Returns `None` if the path is not valid UTF-8 or does not carry the
/// suffix.
pub fn strip_suffix(path: &Path, ext: &str) -> Option<PathBuf> {
  let s = path.to_str()?;
  s.strip_suffix(ext).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classify_markers() {
    assert_eq!(Marker::classify("main.rs.tpl"), Some(Marker::Template));
    assert_eq!(
      Marker::classify("mod.rs.gen.lua"),
      Some(Marker::Gen(GenMarker::Renewable))
    );
    assert_eq!(
      Marker::classify("mod.rs.gen1.lua"),
      Some(Marker::Gen(GenMarker::Once))
    );
    assert_eq!(
      Marker::classify("lib.rename"),
      Some(Marker::Rename(RenameMarker::Renewable))
    );
    assert_eq!(
      Marker::classify("lib.ren1"),
      Some(Marker::Rename(RenameMarker::Once))
    );
    assert_eq!(
      Marker::classify("lib.rename.lua"),
      Some(Marker::Renamer(RenameMarker::Renewable))
    );
    assert_eq!(
      Marker::classify("lib.ren1.lua"),
      Some(Marker::Renamer(RenameMarker::Once))
    );
    assert_eq!(Marker::classify("plain.txt"), None);
  }

  #[test]
  fn renamer_does_not_classify_as_gen() {
    // "foo.rename.lua" ends with ".lua" but not with ".gen.lua"
    assert_eq!(
      Marker::classify("foo.rename.lua"),
      Some(Marker::Renamer(RenameMarker::Renewable))
    );
  }

  #[test]
  fn strip_suffix_removes_marker() {
    let stripped = strip_suffix(Path::new("/tmp/a/main.rs.tpl"), TEMPLATE_EXT).unwrap();
    assert_eq!(stripped, PathBuf::from("/tmp/a/main.rs"));
  }

  #[test]
  fn strip_suffix_requires_marker() {
    assert!(strip_suffix(Path::new("/tmp/a/main.rs"), TEMPLATE_EXT).is_none());
  }
}
