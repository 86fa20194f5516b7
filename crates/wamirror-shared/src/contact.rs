use serde::{Deserialize, Serialize};

/// An address-book entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Primary contact JID.
    pub id: String,
    /// Alternate (linked-identity) JID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Name saved in the local address book.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Name the contact chose for themselves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_name: Option<String>,
    /// Avatar URL, or the literal `"changed"` when it must be refetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Contact {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Sparse merge: non-empty incoming fields overwrite, everything else is
    /// left untouched. The id is never rewritten.
    pub fn merge_sparse(&mut self, incoming: &Contact) {
        overwrite_if_set(&mut self.lid, &incoming.lid);
        overwrite_if_set(&mut self.phone_number, &incoming.phone_number);
        overwrite_if_set(&mut self.name, &incoming.name);
        overwrite_if_set(&mut self.notify, &incoming.notify);
        overwrite_if_set(&mut self.verified_name, &incoming.verified_name);
        overwrite_if_set(&mut self.img_url, &incoming.img_url);
        overwrite_if_set(&mut self.status, &incoming.status);
    }
}

fn overwrite_if_set(slot: &mut Option<String>, incoming: &Option<String>) {
    if let Some(value) = incoming.as_deref().filter(|v| !v.is_empty()) {
        *slot = Some(value.to_string());
    }
}
