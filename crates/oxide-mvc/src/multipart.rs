//! `multipart/form-data` request bodies.

use futures::executor::block_on;
use futures::{future, stream};
use oxide_router::Params;

use crate::error::{MvcError, Result};

/// A file part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field name.
    pub field: String,
    /// File name sent by the client.
    pub file_name: String,
    /// Declared content type of the part, if any.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Vec<u8>,
}

/// Decoded multipart body: text fields and file parts.
#[derive(Debug, Default)]
pub(crate) struct MultipartForm {
    pub fields: Params,
    pub files: Vec<UploadedFile>,
}

/// Decodes a complete multipart body.
///
/// The body is already in memory, so the parser's stream is driven to
/// completion on the calling thread.
pub(crate) fn decode(content_type: &str, body: &[u8]) -> Result<MultipartForm> {
    let boundary = multer::parse_boundary(content_type).map_err(multipart_error)?;
    let body = stream::once(future::ready(Ok::<_, std::io::Error>(body.to_vec())));
    let mut multipart = multer::Multipart::new(body, boundary);

    block_on(async {
        let mut form = MultipartForm::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(ToString::to_string);
                    let data = field.bytes().await.map_err(multipart_error)?;
                    form.files.push(UploadedFile {
                        field: name,
                        file_name,
                        content_type,
                        data: data.to_vec(),
                    });
                }
                None => {
                    let value = field.text().await.map_err(multipart_error)?;
                    form.fields.append(name, value);
                }
            }
        }
        Ok(form)
    })
}

fn multipart_error(err: multer::Error) -> MvcError {
    MvcError::Multipart(err.to_string())
}
