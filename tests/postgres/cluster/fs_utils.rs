//! Filesystem helpers for `PostgreSQL` test clusters.

use super::BoxError;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use postgresql_embedded::Settings;
use std::io::ErrorKind;
use std::path::Path;

/// Reads a file, returning `None` when it does not exist yet.
fn read_optional(path: &Path) -> Result<Option<String>, BoxError> {
    let lossy = path.to_string_lossy();
    let utf8 = Utf8Path::new(lossy.as_ref());
    let file_name = utf8.file_name().ok_or_else(|| {
        Box::new(std::io::Error::other("path must include a file name")) as BoxError
    })?;
    let parent = utf8.parent().unwrap_or_else(|| Utf8Path::new("."));
    let dir = match Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(dir) => dir,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(Box::new(err) as BoxError),
    };
    match dir.read_to_string(file_name) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Box::new(err) as BoxError),
    }
}

/// Replaces the configured password with the one written by the bootstrap.
pub(super) fn sync_password_from_file(settings: &mut Settings) -> Result<(), BoxError> {
    if let Some(contents) = read_optional(&settings.password_file)? {
        let password = contents.trim_end();
        if !password.is_empty() {
            password.clone_into(&mut settings.password);
        }
    }
    Ok(())
}

/// Adopts the port the running server recorded in `postmaster.pid`.
pub(super) fn sync_port_from_pid(settings: &mut Settings) -> Result<(), BoxError> {
    let pid_file = settings.data_dir.join("postmaster.pid");
    let Some(contents) = read_optional(&pid_file)? else {
        return Ok(());
    };

    // The fourth line of postmaster.pid holds the listening port.
    if let Some(port) = contents
        .lines()
        .nth(3)
        .and_then(|line| line.trim().parse::<u16>().ok())
    {
        settings.port = port;
    }
    Ok(())
}
