/// Server suffix of one-to-one user JIDs.
pub const USER_SERVER: &str = "s.whatsapp.net";

/// Legacy server suffix still found on older payloads; normalized to [`USER_SERVER`].
pub const LEGACY_USER_SERVER: &str = "c.us";

/// Server suffix of group JIDs.
pub const GROUP_SERVER: &str = "g.us";

/// Idle lifetime of a cached message (6 hours).
pub const MESSAGE_TTL_SECS: u64 = 6 * 60 * 60;

/// Freshness window of a cached group snapshot (3 hours).
pub const GROUP_FRESHNESS_SECS: u64 = 3 * 60 * 60;

/// Interval between background sweeps of expired messages.
pub const SWEEP_INTERVAL_SECS: u64 = 10 * 60;

/// `protocolMessage.type` announcing a disappearing-messages setting change.
pub const PROTOCOL_EPHEMERAL_SETTING: i32 = 3;

/// `messageStubType` marking a revoked ("deleted for everyone") message.
pub const STUB_REVOKE: i32 = 1;

/// Salt appended to a user id before hashing it into a notification alias.
pub const CONTACT_HASH_SALT: &str = "WA_ADD_NOTIF";

/// Number of base64 characters kept from the contact alias hash.
pub const CONTACT_HASH_LEN: usize = 3;

/// Author marker used for reactions sent by the local user.
pub const SELF_AUTHOR: &str = "me";
