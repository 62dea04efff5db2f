//! Remote install script construction
//!
//! The download bootstrap pipes one shell script to the remote host. The
//! script is a single opaque text blob with three template parameters so the
//! whole body can be reproduced verbatim in error messages.

/// Where the server binary lives on the remote host
pub const SERVER_BINARY_PATH: &str = "~/.cache/portside/portside-server";

/// Remote data directory for the server's own state
pub const REMOTE_DATA_DIR: &str = "~/.local/share/portside-server";

/// Release endpoint for the latest Linux server build
pub const RELEASE_URL: &str = "https://releases.portside.dev/latest-linux";

/// Build the install script for the remote host.
///
/// The script refuses non-x86_64 machines, stops a previously running server
/// best-effort, fetches the release only if newer than the cached copy, and
/// links it into place before marking it executable.
pub fn install_script(server_path: &str, data_dir: &str, release_url: &str) -> String {
    let cache_dir = parent_of(server_path);
    format!(
        r#"set -euxo pipefail || exit 1

[ "$(uname -m)" != "x86_64" ] && echo "Unsupported server architecture $(uname -m). portside-server only has releases for x86_64 systems." && exit 1
pkill -f {server_path} || true
mkdir -p {data_dir} {cache_dir}
cd {cache_dir}
curlflags="-o latest-linux"
if [ -f latest-linux ]; then
	curlflags="$curlflags -z latest-linux"
fi
curl $curlflags {release_url}
[ -f {server_path} ] && rm {server_path}
ln latest-linux {server_path}
chmod +x {server_path}"#
    )
}

/// Parent directory of a slash-separated remote path.
fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => ".",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_of() {
        assert_eq!(parent_of("~/.cache/portside/portside-server"), "~/.cache/portside");
        assert_eq!(parent_of("/srv"), "/");
        assert_eq!(parent_of("plain"), ".");
    }

    #[test]
    fn test_install_script_content() {
        let script = install_script(SERVER_BINARY_PATH, REMOTE_DATA_DIR, RELEASE_URL);

        assert!(script.starts_with("set -euxo pipefail || exit 1"));
        assert!(script.contains(r#"[ "$(uname -m)" != "x86_64" ]"#));
        assert!(script.contains("pkill -f ~/.cache/portside/portside-server || true"));
        assert!(script.contains("mkdir -p ~/.local/share/portside-server ~/.cache/portside"));
        assert!(script.contains("cd ~/.cache/portside"));
        assert!(script.contains("curl $curlflags https://releases.portside.dev/latest-linux"));
        assert!(script.contains("ln latest-linux ~/.cache/portside/portside-server"));
        assert!(script.ends_with("chmod +x ~/.cache/portside/portside-server"));
    }

    #[test]
    fn test_install_script_fetch_only_if_newer() {
        let script = install_script(SERVER_BINARY_PATH, REMOTE_DATA_DIR, RELEASE_URL);
        let cached_check = script.find("if [ -f latest-linux ]").unwrap();
        let z_flag = script.find(r#"curlflags="$curlflags -z latest-linux""#).unwrap();
        assert!(z_flag > cached_check);
    }
}
