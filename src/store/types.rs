//! Store-level types, independent of the SDK

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Group granted public read access by a `public-read` canned ACL.
pub const ALL_USERS_GROUP: &str = "http://acs.amazonaws.com/groups/global/AllUsers";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawObject {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: String,
}

/// One delimiter listing: folders as common prefixes plus the objects at this level.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawListing {
    pub common_prefixes: Vec<String>,
    pub contents: Vec<RawObject>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GranteeType {
    CanonicalUser,
    Group,
    Email,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AclPermission {
    FullControl,
    Read,
    ReadAcp,
    Write,
    WriteAcp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AclGrant {
    pub grantee_type: GranteeType,
    pub uri: Option<String>,
    pub permission: Option<AclPermission>,
}

impl AclGrant {
    pub fn public_read() -> Self {
        Self {
            grantee_type: GranteeType::Group,
            uri: Some(ALL_USERS_GROUP.to_string()),
            permission: Some(AclPermission::Read),
        }
    }

    pub fn owner_full_control() -> Self {
        Self {
            grantee_type: GranteeType::CanonicalUser,
            uri: None,
            permission: Some(AclPermission::FullControl),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CannedAcl {
    Private,
    PublicRead,
}

impl CannedAcl {
    pub fn from_public(is_public: bool) -> Self {
        if is_public {
            CannedAcl::PublicRead
        } else {
            CannedAcl::Private
        }
    }
}

/// Completion manifest entry for one uploaded part.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletedPartInfo {
    pub part_number: i32,
    pub etag: String,
    /// Base64 SHA-256 of the part when checksums are enabled.
    pub checksum_sha256: Option<String>,
}
