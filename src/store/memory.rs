//! In-memory `ObjectStore` with call recording and failure injection, for tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use super::types::{AclGrant, CannedAcl, CompletedPartInfo, RawListing, RawObject};
use super::ObjectStore;
use crate::error::{Error, Result};

const PRESIGN_SCHEME: &str = "memory://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    List(String),
    Put(String),
    PresignPut(String),
    PutPresigned(String),
    CreateMultipart(String),
    UploadPart { key: String, part_number: i32 },
    Complete { key: String, parts: Vec<i32> },
    Abort { key: String, upload_id: String },
    Delete(String),
    Copy(String, String),
    GetAcl(String),
    PutAcl(String, CannedAcl),
    PresignGet(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Fault {
    List,
    Put(String),
    Delete(String),
    Copy(String),
    GetAcl(String),
    PutAcl(String),
    Part(i32),
    Complete,
    PresignGet(String),
    PresignGetDenied(String),
}

struct MultipartSession {
    key: String,
    parts: BTreeMap<i32, Vec<u8>>,
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    public: Mutex<HashSet<String>>,
    sessions: Mutex<HashMap<String, MultipartSession>>,
    calls: Mutex<Vec<Call>>,
    faults: Mutex<HashSet<Fault>>,
    /// Remaining failures for `PresignGet` faults; `None` fails forever.
    presign_failures_left: Mutex<Option<usize>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, key: &str, body: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), body.to_vec());
    }

    pub(crate) fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub(crate) fn make_public(&self, key: &str) {
        self.public.lock().unwrap().insert(key.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_of(&self, filter: impl Fn(&Call) -> bool) -> Vec<Call> {
        self.calls().into_iter().filter(|c| filter(c)).collect()
    }

    pub(crate) fn open_sessions(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub(crate) fn fail_list(&self) {
        self.add_fault(Fault::List);
    }

    pub(crate) fn heal_list(&self) {
        self.faults.lock().unwrap().remove(&Fault::List);
    }

    pub(crate) fn fail_put(&self, key: &str) {
        self.add_fault(Fault::Put(key.to_string()));
    }

    pub(crate) fn fail_delete(&self, key: &str) {
        self.add_fault(Fault::Delete(key.to_string()));
    }

    pub(crate) fn fail_copy(&self, key: &str) {
        self.add_fault(Fault::Copy(key.to_string()));
    }

    pub(crate) fn fail_get_acl(&self, key: &str) {
        self.add_fault(Fault::GetAcl(key.to_string()));
    }

    pub(crate) fn fail_put_acl(&self, key: &str) {
        self.add_fault(Fault::PutAcl(key.to_string()));
    }

    pub(crate) fn fail_part(&self, part_number: i32) {
        self.add_fault(Fault::Part(part_number));
    }

    pub(crate) fn fail_complete(&self) {
        self.add_fault(Fault::Complete);
    }

    /// Fail presigned GETs for `key` with a transport error, `times` times (`None` = always).
    pub(crate) fn fail_presign_get(&self, key: &str, times: Option<usize>) {
        self.add_fault(Fault::PresignGet(key.to_string()));
        *self.presign_failures_left.lock().unwrap() = times;
    }

    pub(crate) fn deny_presign_get(&self, key: &str) {
        self.add_fault(Fault::PresignGetDenied(key.to_string()));
    }

    fn add_fault(&self, fault: Fault) {
        self.faults.lock().unwrap().insert(fault);
    }

    fn has_fault(&self, fault: &Fault) -> bool {
        self.faults.lock().unwrap().contains(fault)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn injected(operation: &'static str, key: &str) -> Error {
        Error::transport(operation, format!("injected failure for {}", key))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, prefix: &str, delimiter: Option<&str>) -> Result<RawListing> {
        self.record(Call::List(prefix.to_string()));
        if self.has_fault(&Fault::List) {
            return Err(Self::injected("list_objects", prefix));
        }

        let objects = self.objects.lock().unwrap();
        let mut listing = RawListing::default();
        for (key, body) in objects.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            let rest = &key[prefix.len()..];
            if let Some(idx) = delimiter.and_then(|d| rest.find(d)) {
                let folder = format!("{}{}", prefix, &rest[..=idx]);
                if !listing.common_prefixes.contains(&folder) {
                    listing.common_prefixes.push(folder);
                }
                continue;
            }
            listing.contents.push(RawObject {
                key: key.clone(),
                size: body.len() as u64,
                last_modified: Some(Utc::now()),
                etag: format!("etag-{}", body.len()),
            });
        }
        Ok(listing)
    }

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<String> {
        self.record(Call::Put(key.to_string()));
        if self.has_fault(&Fault::Put(key.to_string())) {
            return Err(Self::injected("put_object", key));
        }
        let etag = format!("etag-{}", body.len());
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(etag)
    }

    async fn presigned_put(&self, key: &str, _expires_in_secs: u64) -> Result<String> {
        self.record(Call::PresignPut(key.to_string()));
        Ok(format!(
            "{}bucket/{}?X-Amz-Signature=test",
            PRESIGN_SCHEME,
            urlencoding::encode(key)
        ))
    }

    async fn put_presigned(
        &self,
        url: &str,
        body: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<()> {
        let encoded = url
            .strip_prefix(PRESIGN_SCHEME)
            .and_then(|rest| rest.strip_prefix("bucket/"))
            .and_then(|rest| rest.split('?').next())
            .ok_or_else(|| Error::transport("presigned_put", format!("bad url {}", url)))?;
        let key = urlencoding::decode(encoded)
            .map_err(|e| Error::transport("presigned_put", e.to_string()))?
            .into_owned();

        self.record(Call::PutPresigned(key.clone()));
        if self.has_fault(&Fault::Put(key.clone())) {
            return Err(Self::injected("presigned_put", &key));
        }
        self.objects.lock().unwrap().insert(key, body);
        Ok(())
    }

    async fn create_multipart_upload(
        &self,
        key: &str,
        _content_type: Option<&str>,
        _with_checksums: bool,
    ) -> Result<String> {
        self.record(Call::CreateMultipart(key.to_string()));
        let mut sessions = self.sessions.lock().unwrap();
        let upload_id = format!("upload-{}", sessions.len() + 1);
        sessions.insert(
            upload_id.clone(),
            MultipartSession {
                key: key.to_string(),
                parts: BTreeMap::new(),
            },
        );
        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
        _checksum_sha256: Option<&str>,
    ) -> Result<String> {
        self.record(Call::UploadPart {
            key: key.to_string(),
            part_number,
        });
        if self.has_fault(&Fault::Part(part_number)) {
            return Err(Self::injected("upload_part", key));
        }
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(upload_id)
            .ok_or_else(|| Error::transport("upload_part", "NoSuchUpload"))?;
        session.parts.insert(part_number, body);
        Ok(format!("part-{}", part_number))
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPartInfo],
    ) -> Result<()> {
        self.record(Call::Complete {
            key: key.to_string(),
            parts: parts.iter().map(|p| p.part_number).collect(),
        });
        if self.has_fault(&Fault::Complete) {
            return Err(Self::injected("complete_multipart_upload", key));
        }
        let session = self
            .sessions
            .lock()
            .unwrap()
            .remove(upload_id)
            .ok_or_else(|| Error::transport("complete_multipart_upload", "NoSuchUpload"))?;

        let mut body = Vec::new();
        for part in parts {
            let data = session.parts.get(&part.part_number).ok_or_else(|| {
                Error::transport("complete_multipart_upload", "InvalidPart")
            })?;
            body.extend_from_slice(data);
        }
        self.objects.lock().unwrap().insert(session.key, body);
        Ok(())
    }

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<()> {
        self.record(Call::Abort {
            key: key.to_string(),
            upload_id: upload_id.to_string(),
        });
        self.sessions.lock().unwrap().remove(upload_id);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.record(Call::Delete(key.to_string()));
        if self.has_fault(&Fault::Delete(key.to_string())) {
            return Err(Self::injected("delete_object", key));
        }
        self.objects.lock().unwrap().remove(key);
        self.public.lock().unwrap().remove(key);
        Ok(())
    }

    async fn copy_object(&self, source_key: &str, dest_key: &str) -> Result<()> {
        self.record(Call::Copy(source_key.to_string(), dest_key.to_string()));
        if self.has_fault(&Fault::Copy(source_key.to_string())) {
            return Err(Self::injected("copy_object", source_key));
        }
        let mut objects = self.objects.lock().unwrap();
        let body = objects
            .get(source_key)
            .cloned()
            .ok_or_else(|| Error::transport("copy_object", format!("NoSuchKey {}", source_key)))?;
        objects.insert(dest_key.to_string(), body);
        Ok(())
    }

    async fn get_object_acl(&self, key: &str) -> Result<Vec<AclGrant>> {
        self.record(Call::GetAcl(key.to_string()));
        if self.has_fault(&Fault::GetAcl(key.to_string())) {
            return Err(Self::injected("get_object_acl", key));
        }
        let mut grants = vec![AclGrant::owner_full_control()];
        if self.public.lock().unwrap().contains(key) {
            grants.push(AclGrant::public_read());
        }
        Ok(grants)
    }

    async fn put_object_acl(&self, key: &str, acl: CannedAcl) -> Result<()> {
        self.record(Call::PutAcl(key.to_string(), acl));
        if self.has_fault(&Fault::PutAcl(key.to_string())) {
            return Err(Self::injected("put_object_acl", key));
        }
        let mut public = self.public.lock().unwrap();
        match acl {
            CannedAcl::PublicRead => public.insert(key.to_string()),
            CannedAcl::Private => public.remove(key),
        };
        Ok(())
    }

    async fn presigned_get(&self, key: &str, _expires_in_secs: u64) -> Result<String> {
        self.record(Call::PresignGet(key.to_string()));
        if self.has_fault(&Fault::PresignGetDenied(key.to_string())) {
            return Err(Error::AccessDenied(format!("presign_get on {}", key)));
        }
        if self.has_fault(&Fault::PresignGet(key.to_string())) {
            let mut left = self.presign_failures_left.lock().unwrap();
            match left.as_mut() {
                Some(0) => {}
                Some(n) => {
                    *n -= 1;
                    return Err(Self::injected("presign_get", key));
                }
                None => return Err(Self::injected("presign_get", key)),
            }
        }
        Ok(format!(
            "https://private.example/bucket/{}?X-Amz-Signature=test",
            key
        ))
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://public.example/bucket/{}", key)
    }
}
