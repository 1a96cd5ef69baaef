//! Download dispatch: wrap the snapshot in an object handle and trigger the
//! host's native save behavior.

use std::time::Duration;

use crate::dom::{Document, NodeSource};
use crate::error::Result;
use crate::host::{Blob, HostEnvironment};
use crate::style::collect_styles;

use super::snapshot::serialize;

/// Grace period before a dispatched handle is revoked. Handle release and
/// download completion cannot be synchronized, so the delay is a heuristic,
/// not a guarantee.
pub const REVOKE_DELAY: Duration = Duration::from_millis(10);

/// Media type of the exported artifact.
pub const EXPORT_MEDIA_TYPE: &str = "text/xml";

/// Marker class stamped on the synthesized link element.
pub const LINK_CLASS: &str = "svg-crowbar";

/// Export the graphic node as a downloadable `<filename>.svg`.
///
/// Collects applicable styles, captures a snapshot, stores it behind an
/// object handle, appends an invisible link element to the document, and
/// synthetically activates it. Revocation of the handle is scheduled
/// [`REVOKE_DELAY`] after dispatch and never awaited. The link element is
/// left attached to the document; callers that care can remove it.
///
/// On failure nothing is dispatched: a node that does not resolve produces
/// [`crate::Error::NodeNotFound`] before any handle or link element exists.
pub fn download(
    document: &mut Document,
    host: &mut impl HostEnvironment,
    source: impl Into<NodeSource>,
    filename: &str,
) -> Result<()> {
    let source = source.into();
    log::debug!("export requested for {source}");

    let styles = collect_styles(document);
    let snapshot = serialize(document, source, &styles)?;

    let data = snapshot.source.concat().into_bytes();
    let url = host.create_object_url(Blob::new(data, EXPORT_MEDIA_TYPE))?;

    let body = document.document();
    let link = document.create_element("a", vec![]);
    document.append(body, link);
    document.set_attr(link, "class", LINK_CLASS);
    document.set_attr(link, "download", &format!("{filename}.svg"));
    document.set_attr(link, "href", url.as_str());
    document.set_attr(link, "style", "display: none");

    host.activate(document, link)?;
    host.schedule_revoke(url, REVOKE_DELAY);
    Ok(())
}
