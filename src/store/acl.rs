//! Object ACL read/write

use aws_sdk_s3::types::{ObjectCannedAcl, Permission, Type};

use super::client::S3Store;
use super::types::{AclGrant, AclPermission, CannedAcl, GranteeType};
use crate::error::{Error, Result};

fn map_permission(permission: &Permission) -> Option<AclPermission> {
    match permission {
        Permission::FullControl => Some(AclPermission::FullControl),
        Permission::Read => Some(AclPermission::Read),
        Permission::ReadAcp => Some(AclPermission::ReadAcp),
        Permission::Write => Some(AclPermission::Write),
        Permission::WriteAcp => Some(AclPermission::WriteAcp),
        _ => None,
    }
}

impl S3Store {
    pub(super) async fn fetch_acl(&self, key: &str) -> Result<Vec<AclGrant>> {
        let response = self
            .client
            .get_object_acl()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::from_sdk("get_object_acl", key, e))?;

        let grants = response
            .grants()
            .iter()
            .filter_map(|grant| {
                let grantee = grant.grantee()?;
                let grantee_type = match grantee.r#type() {
                    Type::Group => GranteeType::Group,
                    Type::AmazonCustomerByEmail => GranteeType::Email,
                    _ => GranteeType::CanonicalUser,
                };
                Some(AclGrant {
                    grantee_type,
                    uri: grantee.uri().map(|s| s.to_string()),
                    permission: grant.permission().and_then(map_permission),
                })
            })
            .collect();

        Ok(grants)
    }

    pub(super) async fn apply_acl(&self, key: &str, acl: CannedAcl) -> Result<()> {
        let canned = match acl {
            CannedAcl::Private => ObjectCannedAcl::Private,
            CannedAcl::PublicRead => ObjectCannedAcl::PublicRead,
        };

        self.client
            .put_object_acl()
            .bucket(&self.bucket)
            .key(key)
            .acl(canned)
            .send()
            .await
            .map_err(|e| Error::from_sdk("put_object_acl", key, e))?;

        Ok(())
    }
}
