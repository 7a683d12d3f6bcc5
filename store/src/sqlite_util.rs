//! Secure filesystem preamble for the on-disk database.
//!
//! The demo database holds plaintext demo credentials, so the directory is
//! tightened to 0o700 and the file to 0o600 on Unix before SQLite opens it.

use std::fs::OpenOptions;
use std::path::Path;

use crate::StoreError;

pub(crate) fn prepare_db_path(path: &Path) -> Result<(), StoreError> {
    let path_err = |source| StoreError::Path {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(path_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))
                .map_err(path_err)?;
        }
    }

    if !path.exists() {
        let mut options = OpenOptions::new();
        options.create(true).truncate(false).read(true).write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        options.open(path).map_err(path_err)?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(path_err)?;
    }
    Ok(())
}
