//! Filesystem helpers for reading and writing route files.
//!
//! Every operation goes through `cap-std` directory handles opened with
//! ambient authority at the nearest root, so callers pass plain UTF-8 paths.
#![forbid(unsafe_code)]

use std::io;
use std::path::Component;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

/// Open a file for reading.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Write `contents` to `path`, creating missing parent directories and
/// replacing any existing file.
pub fn write_file(path: &Utf8Path, contents: impl AsRef<[u8]>) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let (dir, name) = parent_dir_and_name(path)?;
    dir.write(name.as_str(), contents)
}

/// Create every missing directory above `path`.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) else {
        return Ok(());
    };
    let (root, relative) = root_and_relative(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    root.create_dir_all(&relative)
}

fn parent_dir_and_name(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} does not name a file")))?
        .to_owned();
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name))
}

/// Split `dir` into an openable root (filesystem root, drive prefix or the
/// current directory) and the remainder below it.
fn root_and_relative(dir: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let root = match dir.as_std_path().components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            Utf8PathBuf::from(format!("{prefix}{}", std::path::MAIN_SEPARATOR))
        }
        Some(Component::RootDir) => Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string()),
        _ => Utf8PathBuf::from("."),
    };
    let relative = dir
        .strip_prefix(&root)
        .map_or_else(|_| dir.to_path_buf(), Utf8Path::to_path_buf);
    let handle = fs_utf8::Dir::open_ambient_dir(&root, ambient_authority())?;
    Ok((handle, relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    #[fixture]
    fn scratch() -> (TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("UTF-8 temp dir");
        (dir, root)
    }

    #[rstest]
    fn writes_into_missing_directories(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        let target = root.join("routes/2024/loop.gpx");
        write_file(&target, "<gpx/>").expect("write");
        assert_eq!(fs::read_to_string(&target).expect("read back"), "<gpx/>");
    }

    #[rstest]
    fn overwrites_existing_files(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        let target = root.join("route.gpx");
        write_file(&target, "first").expect("first write");
        write_file(&target, "second").expect("second write");
        assert_eq!(fs::read_to_string(&target).expect("read back"), "second");
    }

    #[rstest]
    fn creates_nested_parents(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        ensure_parent_dir(&root.join("a/b/file.gpx")).expect("create parent");
        assert!(root.join("a/b").is_dir());
    }

    #[rstest]
    fn bare_file_names_need_no_parent() {
        ensure_parent_dir(Utf8Path::new("route.gpx")).expect("nothing to create");
    }

    #[rstest]
    fn opening_a_missing_file_fails(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        let err = open_utf8_file(&root.join("missing.gpx")).expect_err("absent");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[rstest]
    fn paths_without_a_file_name_are_rejected() {
        assert!(write_file(Utf8Path::new("/"), "x").is_err());
    }
}
