//! Connection-target parsing for SSH remotes.
//!
//! Accepts both the standard URL form `ssh://[user@]host[:port]/path` and
//! the abbreviated scp-like form `[user@]host:path`. Percent-escapes in the
//! standard form are decoded component-wise; malformed escapes pass through
//! verbatim. The option-injection guard lives here too, as an explicit
//! validation step separate from any argument quoting.

use memchr::{memchr, memrchr};

use crate::errors::TunnelError;

/// A connection string decomposed into the pieces the command builder
/// needs.
///
/// `host` is always non-empty after a successful parse; `port` is kept as
/// the digit string the URL carried so the tool receives it untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub username: Option<String>,
    pub port: Option<String>,
    pub path: String,
}

impl ConnectionTarget {
    /// Parse a connection string in either standard or scp-like form.
    pub fn parse(url: &str) -> Result<Self, TunnelError> {
        match find_scheme_separator(url) {
            Some(scheme_len) => Self::parse_standard(url, &url[scheme_len + 3..]),
            None => Self::parse_scp(url),
        }
    }

    /// Reject fields that a spawned tool could mistake for command-line
    /// options. Runs before any process is created.
    pub fn reject_option_like_fields(&self) -> Result<(), TunnelError> {
        if let Some(username) = &self.username {
            if looks_like_cmdline_option(username) {
                return Err(ambiguous("username", username));
            }
        }
        if looks_like_cmdline_option(&self.host) {
            return Err(ambiguous("host", &self.host));
        }
        if looks_like_cmdline_option(&self.path) {
            return Err(ambiguous("path", &self.path));
        }
        Ok(())
    }

    fn parse_standard(url: &str, rest: &str) -> Result<Self, TunnelError> {
        let slash = memchr(b'/', rest.as_bytes())
            .ok_or_else(|| TunnelError::InvalidUrl(format!("missing repository path: {url}")))?;
        let (authority, path) = rest.split_at(slash);

        let (username, hostport) = match memrchr(b'@', authority.as_bytes()) {
            Some(at) => {
                let user = &authority[..at];
                if user.is_empty() {
                    return Err(TunnelError::InvalidUrl(format!("empty username: {url}")));
                }
                (Some(unescape(user)), &authority[at + 1..])
            }
            None => (None, authority),
        };

        let (host, port) = split_host_port(url, hostport)?;
        if host.is_empty() {
            return Err(TunnelError::InvalidUrl(format!("missing host: {url}")));
        }

        Ok(Self {
            host: unescape(host),
            username,
            port,
            path: unescape(path),
        })
    }

    /// The abbreviated `[user@]host:path` form carries no port and no
    /// percent-escaping.
    fn parse_scp(url: &str) -> Result<Self, TunnelError> {
        // The path separator is the first colon outside brackets, so a
        // bracketed IPv6 literal keeps its own colons.
        let colon = separator_colon(url)
            .ok_or_else(|| TunnelError::InvalidUrl(format!("missing repository path: {url}")))?;
        let (userhost, path) = (&url[..colon], &url[colon + 1..]);

        let (username, host) = match memrchr(b'@', userhost.as_bytes()) {
            Some(at) => {
                let user = &userhost[..at];
                if user.is_empty() {
                    return Err(TunnelError::InvalidUrl(format!("empty username: {url}")));
                }
                (Some(user.to_string()), &userhost[at + 1..])
            }
            None => (None, userhost),
        };
        let host = host.trim_start_matches('[').trim_end_matches(']');

        if host.is_empty() {
            return Err(TunnelError::InvalidUrl(format!("missing host: {url}")));
        }
        if path.is_empty() {
            return Err(TunnelError::InvalidUrl(format!("missing repository path: {url}")));
        }

        Ok(Self {
            host: host.to_string(),
            username,
            port: None,
            path: path.to_string(),
        })
    }
}

/// First colon at bracket depth zero, the host/path separator of the
/// scp form.
fn separator_colon(s: &str) -> Option<usize> {
    let mut depth = 0u32;
    for (i, b) in s.bytes().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' => depth = depth.saturating_sub(1),
            b':' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Position of `://` when the string begins with a plausible scheme, else
/// `None` (which routes the input to the scp-form parser).
fn find_scheme_separator(url: &str) -> Option<usize> {
    let sep = url.find("://")?;
    let scheme = &url[..sep];
    if !scheme.is_empty()
        && scheme
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.')
    {
        Some(sep)
    } else {
        None
    }
}

fn split_host_port<'a>(
    url: &str,
    hostport: &'a str,
) -> Result<(&'a str, Option<String>), TunnelError> {
    let (host, port) = if let Some(stripped) = hostport.strip_prefix('[') {
        let close = memchr(b']', stripped.as_bytes())
            .ok_or_else(|| TunnelError::InvalidUrl(format!("unterminated bracket: {url}")))?;
        let after = &stripped[close + 1..];
        match after.strip_prefix(':') {
            Some(port) => (&stripped[..close], Some(port)),
            None if after.is_empty() => (&stripped[..close], None),
            None => {
                return Err(TunnelError::InvalidUrl(format!("malformed authority: {url}")));
            }
        }
    } else {
        match memchr(b':', hostport.as_bytes()) {
            Some(colon) => (&hostport[..colon], Some(&hostport[colon + 1..])),
            None => (hostport, None),
        }
    };

    match port {
        Some(p) => {
            if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TunnelError::InvalidUrl(format!("invalid port: {url}")));
            }
            Ok((host, Some(p.to_string())))
        }
        None => Ok((host, None)),
    }
}

/// Decode `%XY` escapes; anything malformed is copied through unchanged.
fn unescape(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            out.push(hex_value(bytes[i + 1]) << 4 | hex_value(bytes[i + 2]));
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        _ => (b | 0x20) - b'a' + 10,
    }
}

/// A value a command-line parser would treat as an option.
pub(crate) fn looks_like_cmdline_option(value: &str) -> bool {
    value.starts_with('-')
}

fn ambiguous(field: &'static str, value: &str) -> TunnelError {
    TunnelError::AmbiguousArgument {
        field,
        value: value.to_string(),
    }
}
