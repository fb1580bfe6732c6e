use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{HttpMessage, HttpRequest};
use futures::{StreamExt, TryStreamExt};
use shared::UploadField;
use std::str::FromStr;

use crate::error::DetectError;

/// One uploaded file, alive for the duration of a single request.
#[derive(Debug, Clone)]
pub struct UploadedMedia {
    pub field: UploadField,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

pub fn is_multipart(req: &HttpRequest) -> bool {
    matches!(req.mime_type(), Ok(Some(mime)) if mime.essence_str() == "multipart/form-data")
}

/// The upload field this multipart part stands for, if it is a file part
/// named `file` or `video`. A file input left empty arrives with `filename=""`
/// and does not count.
fn upload_field(field: &Field) -> Option<UploadField> {
    let disposition = field.content_disposition()?;
    disposition.get_filename().filter(|name| !name.is_empty())?;
    UploadField::from_str(disposition.get_name()?).ok()
}

async fn read_field(field: &mut Field) -> Result<Vec<u8>, DetectError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        data.extend_from_slice(&chunk?);
    }
    Ok(data)
}

/// Picks the upload out of a multipart body: `file` first, `video` as a fallback.
/// Every other part is drained and ignored.
pub async fn extract_upload(
    req: &HttpRequest,
    mut payload: Multipart,
) -> Result<UploadedMedia, DetectError> {
    if !is_multipart(req) {
        return Err(DetectError::MissingInput);
    }

    let mut found: Option<UploadedMedia> = None;

    loop {
        let mut field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            // a form with no parts ends before its first boundary
            Err(MultipartError::Incomplete) if found.is_none() => break,
            Err(e) => return Err(e.into()),
        };
        let Some(kind) = upload_field(&field) else {
            read_field(&mut field).await?;
            continue;
        };
        if found.as_ref().is_some_and(|media| media.field <= kind) {
            read_field(&mut field).await?;
            continue;
        }

        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let content_type = field.content_type().map(|mime| mime.to_string());
        let data = read_field(&mut field).await?;

        found = Some(UploadedMedia {
            field: kind,
            file_name,
            content_type,
            data,
        });
    }

    found.ok_or(DetectError::MissingInput)
}
