//! Writing generated scripts to disk.

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::error::Error;
use crate::platform::ScriptFile;

/// Write every file into `directory`, creating it if needed, and return
/// the paths written.
///
/// Each file is first staged as a temporary file in `directory` and only
/// moved into place once all of them have been staged. If moving one of
/// them fails, the files this call created are removed again, so a
/// platform never ends up with half of its scripts. Shell scripts are made
/// executable on Unix.
pub fn write_scripts(directory: &Path, files: &[ScriptFile]) -> Result<Vec<PathBuf>, Error> {
    std::fs::create_dir_all(directory).map_err(|source| Error::WriteScript {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut staged = Vec::with_capacity(files.len());
    for file in files {
        let path = directory.join(file.name);
        let temp = stage(directory, file).map_err(|source| Error::WriteScript {
            path: path.clone(),
            source,
        })?;
        staged.push((path, temp, file.contents.len()));
    }

    let mut written = Vec::with_capacity(files.len());
    let mut created = Vec::new();
    for (path, temp, bytes) in staged {
        let existed = path.exists();
        if let Err(error) = temp.persist(&path) {
            remove_created(&created);
            return Err(Error::WriteScript {
                path,
                source: error.error,
            });
        }
        if !existed {
            created.push(path.clone());
        }
        tracing::debug!(path = %path.display(), bytes, "wrote script");
        written.push(path);
    }

    Ok(written)
}

fn stage(directory: &Path, file: &ScriptFile) -> std::io::Result<NamedTempFile> {
    let mut temp = NamedTempFile::new_in(directory)?;
    temp.write_all(file.contents.as_bytes())?;
    temp.flush()?;

    // Temporary files are created owner-only.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = if file.executable { 0o755 } else { 0o644 };
        temp.as_file().set_permissions(std::fs::Permissions::from_mode(mode))?;
    }

    Ok(temp)
}

fn remove_created(paths: &[PathBuf]) {
    for path in paths {
        if let Err(error) = std::fs::remove_file(path) {
            tracing::warn!(%error, path = %path.display(), "could not remove partial output");
        }
    }
}

#[cfg(test)]
mod tests {
    use routes::cidr::CidrBlock;
    use routes::region::Region;

    use crate::platform::Platform;
    use crate::platform::RenderOptions;

    use super::*;

    fn files(platform: Platform) -> Vec<ScriptFile> {
        let blocks = [CidrBlock::new(0x0100_0000, 24).unwrap()];
        let options = RenderOptions {
            metric: 5,
            region: Region::Asia,
        };
        platform.render(&blocks, &options)
    }

    #[test]
    fn scripts_are_written_into_a_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("scripts");
        let files = files(Platform::Win);

        let written = write_scripts(&target, &files).unwrap();

        assert_eq!(written, [target.join("vpnup.bat"), target.join("vpndown.bat")]);
        for (path, file) in written.iter().zip(&files) {
            assert_eq!(std::fs::read_to_string(path).unwrap(), file.contents);
        }
    }

    #[test]
    fn existing_files_are_replaced() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("routes.txt"), "stale").unwrap();

        write_scripts(dir.path(), &files(Platform::Openvpn)).unwrap();

        let contents = std::fs::read_to_string(dir.path().join("routes.txt")).unwrap();
        assert_eq!(contents, "route 1.0.0.0 255.255.255.0 net_gateway 5\n");
    }

    #[cfg(unix)]
    #[test]
    fn shell_scripts_are_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let written = write_scripts(dir.path(), &files(Platform::Linux)).unwrap();

        for path in written {
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111, "{} is not executable", path.display());
        }

        let written = write_scripts(dir.path(), &files(Platform::Openvpn)).unwrap();
        let mode = std::fs::metadata(&written[0]).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn failed_write_leaves_no_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("vpndown.bat")).unwrap();

        let result = write_scripts(dir.path(), &files(Platform::Win));

        let blocked = dir.path().join("vpndown.bat");
        assert!(matches!(result, Err(Error::WriteScript { path, .. }) if path == blocked));
        assert!(!dir.path().join("vpnup.bat").exists());
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, ["vpndown.bat"]);
    }

    #[test]
    fn unwritable_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        let result = write_scripts(&blocker.join("scripts"), &files(Platform::Mac));

        assert!(matches!(result, Err(Error::WriteScript { .. })));
    }
}
