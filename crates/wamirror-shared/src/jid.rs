//! JID (`user[_agent][:device]@server`) parsing and normalization.

use crate::constants::{GROUP_SERVER, LEGACY_USER_SERVER, USER_SERVER};

/// Borrowed view of a decoded JID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jid<'a> {
    /// User part without agent or device suffix.
    pub user: &'a str,
    /// Device index, when the JID addresses a specific device.
    pub device: Option<u32>,
    /// Server part (`s.whatsapp.net`, `g.us`, `lid`, ...).
    pub server: &'a str,
}

impl<'a> Jid<'a> {
    /// Decode a JID. Returns `None` when there is no `@` separator.
    pub fn decode(jid: &'a str) -> Option<Self> {
        let (combined, server) = jid.split_once('@')?;
        let (user_agent, device) = match combined.split_once(':') {
            Some((ua, dev)) => (ua, dev.parse().ok()),
            None => (combined, None),
        };
        let user = user_agent.split('_').next().unwrap_or(user_agent);

        Some(Self {
            user,
            device,
            server,
        })
    }
}

/// Normalize a JID to its canonical user form: device and agent suffixes are
/// dropped and the legacy `c.us` server is rewritten to `s.whatsapp.net`.
///
/// Input without a server part is returned unchanged.
pub fn normalized_user(jid: &str) -> String {
    match Jid::decode(jid) {
        Some(decoded) => {
            let server = if decoded.server == LEGACY_USER_SERVER {
                USER_SERVER
            } else {
                decoded.server
            };
            format!("{}@{}", decoded.user, server)
        }
        None => jid.to_string(),
    }
}

/// Whether the JID addresses a group conversation.
pub fn is_group(jid: &str) -> bool {
    jid.strip_suffix(GROUP_SERVER)
        .is_some_and(|rest| rest.ends_with('@'))
}
