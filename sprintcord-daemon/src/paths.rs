use std::path::{Path, PathBuf};

pub const DAEMON_SOCKET: &str = "daemon.sock";

pub fn sprintcord_root(home: &Path) -> PathBuf {
    home.join(".sprintcord")
}

pub fn socket_path(home: &Path) -> PathBuf {
    sprintcord_root(home).join(DAEMON_SOCKET)
}
