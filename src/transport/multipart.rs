//! `multipart/form-data` decoding shared by both transports.

use bytes::Bytes;
use futures_util::stream;
use serde_json::Value;

use crate::http::request::UploadedFile;
use crate::transport::FormData;

/// Split a buffered multipart body into text fields and uploaded files.
///
/// A part with a file name is a file even when it is empty.
pub async fn read_form(content_type: &str, body: Bytes) -> Result<FormData, multer::Error> {
    let boundary = multer::parse_boundary(content_type)?;
    let chunks = stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(chunks, boundary);

    let mut form = FormData::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(ToString::to_string);
                let data = field.bytes().await?;
                form.files.push(UploadedFile {
                    field: name,
                    file_name: Some(file_name),
                    content_type,
                    data,
                });
            }
            None => {
                let text = field.text().await?;
                form.fields.insert(name, Value::String(text));
            }
        }
    }
    Ok(form)
}
