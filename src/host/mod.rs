//! Host environment: object handles, native save behavior, deferred cleanup.
//!
//! The exporter never talks to a real browser. Everything environment-shaped
//! lives behind [`HostEnvironment`] so the pipeline can run against an
//! in-memory host in tests and a directory-backed host in native tools.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};

/// An in-memory byte buffer with a media type, held alive by the host until
/// its handle is revoked.
#[derive(Debug, Clone)]
pub struct Blob {
    data: Vec<u8>,
    media_type: String,
}

impl Blob {
    pub fn new(data: Vec<u8>, media_type: &str) -> Self {
        Self {
            data,
            media_type: media_type.to_string(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Short-lived addressable handle for a [`Blob`]. The referenced memory is
/// retained by the host until the handle is revoked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The host document's runtime environment.
///
/// Implementations own the object store, perform the native save behavior
/// behind synthetic link activation, and run the deferred revocation tasks
/// the dispatcher schedules. Revocation timing is a grace heuristic, not a
/// synchronization point: a handle may still be consumed after its delay has
/// nominally passed.
pub trait HostEnvironment {
    /// Allocate an addressable handle for a blob.
    fn create_object_url(&mut self, blob: Blob) -> Result<ObjectUrl>;

    /// Release a handle. Unknown or already-revoked handles are ignored.
    fn revoke_object_url(&mut self, url: &ObjectUrl);

    /// Look up the blob behind a handle, if still retained.
    fn object(&self, url: &ObjectUrl) -> Option<&Blob>;

    /// Synthetically activate a link element: read its `href` and `download`
    /// attributes and perform the native save.
    fn activate(&mut self, document: &Document, link: NodeId) -> Result<()>;

    /// Schedule revocation of a handle after a delay. Never awaited by the
    /// caller.
    fn schedule_revoke(&mut self, url: ObjectUrl, delay: Duration);
}

/// Read the save target off a link element.
fn link_target(document: &Document, link: NodeId) -> Result<(ObjectUrl, String)> {
    let href = document
        .get_attr(link, "href")
        .ok_or_else(|| Error::Activation("link element has no href".to_string()))?;
    let filename = document
        .get_attr(link, "download")
        .ok_or_else(|| Error::Activation("link element has no download target".to_string()))?;
    Ok((ObjectUrl(href.to_string()), filename.to_string()))
}

/// A save performed by [`MemoryHost::activate`].
#[derive(Debug, Clone)]
pub struct SaveEvent {
    pub url: ObjectUrl,
    pub filename: String,
    pub data: Vec<u8>,
    pub media_type: String,
}

/// In-memory host with a synthetic clock.
///
/// Saves are recorded instead of written anywhere, and deferred revocations
/// fire when [`MemoryHost::advance`] moves the clock past their due time,
/// so timing behavior is fully deterministic under test.
#[derive(Default)]
pub struct MemoryHost {
    objects: HashMap<ObjectUrl, Blob>,
    next_id: u64,
    capacity: Option<usize>,
    clock: Duration,
    pending: Vec<(Duration, ObjectUrl)>,
    saves: Vec<SaveEvent>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host that refuses allocations beyond `capacity` live handles.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Advance the synthetic clock, firing any revocation whose due time has
    /// been reached.
    pub fn advance(&mut self, elapsed: Duration) {
        self.clock += elapsed;
        let clock = self.clock;
        let mut due = Vec::new();
        self.pending.retain(|(at, url)| {
            if *at <= clock {
                due.push(url.clone());
                false
            } else {
                true
            }
        });
        for url in due {
            self.revoke_object_url(&url);
        }
    }

    /// Saves performed so far, in dispatch order.
    pub fn saves(&self) -> &[SaveEvent] {
        &self.saves
    }

    /// Number of live (unrevoked) handles.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of scheduled revocations that have not fired yet.
    pub fn pending_revocations(&self) -> usize {
        self.pending.len()
    }
}

impl HostEnvironment for MemoryHost {
    fn create_object_url(&mut self, blob: Blob) -> Result<ObjectUrl> {
        if let Some(cap) = self.capacity
            && self.objects.len() >= cap
        {
            return Err(Error::HandleCreation(format!(
                "object store at capacity ({cap})"
            )));
        }
        let url = ObjectUrl(format!("blob:mem/{}", self.next_id));
        self.next_id += 1;
        log::debug!("allocated {url} ({} bytes)", blob.len());
        self.objects.insert(url.clone(), blob);
        Ok(url)
    }

    fn revoke_object_url(&mut self, url: &ObjectUrl) {
        if self.objects.remove(url).is_some() {
            log::debug!("revoked {url}");
        }
    }

    fn object(&self, url: &ObjectUrl) -> Option<&Blob> {
        self.objects.get(url)
    }

    fn activate(&mut self, document: &Document, link: NodeId) -> Result<()> {
        let (url, filename) = link_target(document, link)?;
        let blob = self
            .objects
            .get(&url)
            .ok_or_else(|| Error::Activation(format!("stale object URL {url}")))?;
        log::debug!("saving {url} as {filename}");
        self.saves.push(SaveEvent {
            url: url.clone(),
            filename,
            data: blob.data().to_vec(),
            media_type: blob.media_type().to_string(),
        });
        Ok(())
    }

    fn schedule_revoke(&mut self, url: ObjectUrl, delay: Duration) {
        self.pending.push((self.clock + delay, url));
    }
}

/// Host that saves into a directory on disk.
///
/// Deferred revocations are stamped with wall-clock due times and processed
/// lazily: on the next allocation, or explicitly via [`DirectoryHost::poll`].
pub struct DirectoryHost {
    dir: PathBuf,
    objects: HashMap<ObjectUrl, Blob>,
    next_id: u64,
    pending: Vec<(Instant, ObjectUrl)>,
}

impl DirectoryHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            objects: HashMap::new(),
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Fire any revocation whose due time has passed.
    pub fn poll(&mut self) {
        let now = Instant::now();
        let mut due = Vec::new();
        self.pending.retain(|(at, url)| {
            if *at <= now {
                due.push(url.clone());
                false
            } else {
                true
            }
        });
        for url in due {
            self.revoke_object_url(&url);
        }
    }
}

impl HostEnvironment for DirectoryHost {
    fn create_object_url(&mut self, blob: Blob) -> Result<ObjectUrl> {
        self.poll();
        let url = ObjectUrl(format!("blob:fs/{}", self.next_id));
        self.next_id += 1;
        log::debug!("allocated {url} ({} bytes)", blob.len());
        self.objects.insert(url.clone(), blob);
        Ok(url)
    }

    fn revoke_object_url(&mut self, url: &ObjectUrl) {
        if self.objects.remove(url).is_some() {
            log::debug!("revoked {url}");
        }
    }

    fn object(&self, url: &ObjectUrl) -> Option<&Blob> {
        self.objects.get(url)
    }

    fn activate(&mut self, document: &Document, link: NodeId) -> Result<()> {
        let (url, filename) = link_target(document, link)?;
        if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
            return Err(Error::Activation(format!(
                "refusing save target outside directory: {filename}"
            )));
        }
        let blob = self
            .objects
            .get(&url)
            .ok_or_else(|| Error::Activation(format!("stale object URL {url}")))?;
        let path = self.dir.join(&filename);
        std::fs::write(&path, blob.data())?;
        log::debug!("saved {url} to {}", path.display());
        Ok(())
    }

    fn schedule_revoke(&mut self, url: ObjectUrl, delay: Duration) {
        self.pending.push((Instant::now() + delay, url));
    }
}
