//! Host token resolution
//!
//! Plain tokens pass through untouched. A `gcp:` prefix names a Google Cloud
//! instance; the connection target comes from a `compute ssh --dry-run`
//! lookup, which prints the full ssh command line the cloud CLI would have
//! run. The last token of that line is the `user@ip` target and everything
//! between the program name and the target is connection flags we must keep.

use portside_core::error::ResolveError;
use portside_core::ExternalCommand;

use crate::options::ExternalTools;

/// A connection target plus any flags the resolver requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHost {
    pub host: String,
    pub extra_flags: Vec<String>,
}

/// Resolve a host token into a connectable target.
pub async fn resolve(tools: &ExternalTools, token: &str) -> Result<ResolvedHost, ResolveError> {
    let token = token.trim();
    let Some(instance) = token.strip_prefix("gcp:") else {
        return Ok(ResolvedHost {
            host: token.to_string(),
            extra_flags: Vec::new(),
        });
    };

    let cmd = ExternalCommand::new(&tools.lookup).args(["compute", "ssh", "--dry-run", instance]);
    let rendered = cmd.render();
    tracing::debug!("resolving instance via: {}", rendered);

    let output = cmd
        .capture()
        .await
        .map_err(|e| ResolveError::LookupFailed {
            command: rendered.clone(),
            output: e.to_string(),
        })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        return Err(ResolveError::LookupFailed {
            command: rendered,
            output: combined,
        });
    }

    parse_lookup_output(&rendered, &combined)
}

/// Extract the target and flags from a dry-run ssh command line.
///
/// The first token is the ssh binary path and is discarded. The last token
/// is the `user@ip` target. Anything in between is flag material that rides
/// along on every subsequent connection.
pub fn parse_lookup_output(command: &str, output: &str) -> Result<ResolvedHost, ResolveError> {
    let tokens: Vec<&str> = output.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(ResolveError::MalformedLookup {
            command: command.to_string(),
            output: output.to_string(),
        });
    }

    let host = tokens[tokens.len() - 1].to_string();
    let extra_flags = tokens[1..tokens.len() - 1]
        .iter()
        .map(|t| t.to_string())
        .collect();

    Ok(ResolvedHost { host, extra_flags })
}
