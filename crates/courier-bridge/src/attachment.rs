// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment resolution: fetch the bytes and name the file.

use tracing::debug;

use courier_core::{AttachmentDescriptor, CourierError, ProtocolClient, ResolvedFile};

/// Extensions chosen where a MIME type has several registered ones.
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/webp", ".webp"),
    ("image/gif", ".gif"),
    ("audio/ogg", ".ogg"),
    ("audio/mpeg", ".mp3"),
    ("audio/mp4", ".m4a"),
    ("video/mp4", ".mp4"),
    ("video/3gpp", ".3gp"),
    ("application/pdf", ".pdf"),
    ("text/plain", ".txt"),
];

/// Extension used for contact cards.
pub const VCARD_EXTENSION: &str = ".vcf";

/// Maps a MIME type to a file extension, dot included.
///
/// Parameters such as `; codecs=opus` are ignored. Returns `None` when the
/// type has no known extension; callers then name the file without one.
pub fn extension_for(mime_type: &str) -> Option<String> {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence.is_empty() {
        return None;
    }

    if let Some((_, ext)) = PREFERRED_EXTENSIONS.iter().find(|(m, _)| *m == essence) {
        return Some((*ext).to_string());
    }

    mime_guess::get_mime_extensions_str(&essence)
        .and_then(|exts| exts.first())
        .map(|ext| format!(".{ext}"))
}

/// `<event_id><extension>`, or the bare id when the type is unknown.
pub fn file_name(event_id: &str, mime_type: &str) -> String {
    match extension_for(mime_type) {
        Some(ext) => format!("{event_id}{ext}"),
        None => event_id.to_string(),
    }
}

/// Downloads and decrypts an attachment through the protocol client.
///
/// Failures come back as [`CourierError::Download`] tagged with the media kind.
pub async fn resolve(
    client: &dyn ProtocolClient,
    descriptor: &AttachmentDescriptor<'_>,
    event_id: &str,
) -> Result<ResolvedFile, CourierError> {
    let bytes = client.download(descriptor).await.map_err(|e| match e {
        err @ CourierError::Download { .. } => err,
        other => CourierError::Download {
            media: descriptor.kind,
            message: other.to_string(),
        },
    })?;

    let file_name = file_name(event_id, descriptor.mime_type);
    debug!(
        media = %descriptor.kind,
        file_name = %file_name,
        size = bytes.len(),
        "attachment resolved"
    );
    Ok(ResolvedFile { file_name, bytes })
}

/// Builds the `.vcf` file for a contact card. Nothing is downloaded.
pub fn contact_card(event_id: &str, vcard: &str) -> ResolvedFile {
    ResolvedFile {
        file_name: format!("{event_id}{VCARD_EXTENSION}"),
        bytes: vcard.as_bytes().to_vec(),
    }
}
