use wirepeek_codec::{Boundary, url_encode_bytes, url_encode_str};

use crate::{ByteSource, FieldValue, FormPayload, WebError};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// What a request carries after its preamble.
#[derive(Debug)]
pub enum Payload<'a> {
    Raw(&'a [u8]),
    Source(&'a ByteSource),
    Form(&'a mut FormPayload),
}

impl Payload<'_> {
    pub fn empty() -> Self {
        Payload::Raw(&[])
    }

    /// Puts back any form fields consumed by a failed serialization or send.
    pub fn rewind(&mut self) {
        if let Payload::Form(form) = self {
            form.reset();
        }
    }
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Payload::Raw(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for Payload<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Payload::Raw(bytes)
    }
}

impl<'a> From<&'a str> for Payload<'a> {
    fn from(text: &'a str) -> Self {
        Payload::Raw(text.as_bytes())
    }
}

impl<'a> From<&'a String> for Payload<'a> {
    fn from(text: &'a String) -> Self {
        Payload::Raw(text.as_bytes())
    }
}

impl<'a> From<&'a ByteSource> for Payload<'a> {
    fn from(source: &'a ByteSource) -> Self {
        Payload::Source(source)
    }
}

impl<'a> From<&'a mut FormPayload> for Payload<'a> {
    fn from(form: &'a mut FormPayload) -> Self {
        Payload::Form(form)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Serializes a payload. A form is drained in the process; `boundary` is
/// used for multipart forms, and a fresh one is generated when it is `None`.
pub fn encode_body(
    payload: &mut Payload<'_>,
    boundary: Option<&Boundary>,
) -> Result<EncodedBody, WebError> {
    match payload {
        Payload::Raw(bytes) => Ok(EncodedBody {
            content_type: None,
            bytes: bytes.to_vec(),
        }),
        Payload::Source(source) => Ok(EncodedBody {
            content_type: Some(source.mime_type().to_string()),
            bytes: source.read_all()?,
        }),
        Payload::Form(form) if form.needs_multipart() => {
            let boundary = boundary.cloned().unwrap_or_else(Boundary::generate);
            Ok(EncodedBody {
                content_type: Some(format!("multipart/form-data; boundary={boundary}")),
                bytes: encode_multipart(form, &boundary)?,
            })
        }
        Payload::Form(form) => Ok(EncodedBody {
            content_type: Some(FORM_URLENCODED.to_string()),
            bytes: encode_urlencoded(form)?,
        }),
    }
}

/// `name=value` pairs joined by `&`, each side percent-encoded per RFC 3986.
pub fn encode_urlencoded(form: &mut FormPayload) -> Result<Vec<u8>, WebError> {
    let mut pairs = Vec::new();
    while let Some(field) = form.take_first() {
        let value = match &field.value {
            FieldValue::Text(text) => url_encode_str(text),
            FieldValue::File { source, .. } => url_encode_bytes(&source.read_all()?),
        };
        pairs.push(format!("{}={}", url_encode_str(&field.name), value));
    }
    Ok(pairs.join("&").into_bytes())
}

pub fn encode_multipart(form: &mut FormPayload, boundary: &Boundary) -> Result<Vec<u8>, WebError> {
    let delimiter = boundary.delimiter();
    let mut bytes = delimiter.clone().into_bytes();

    while let Some(field) = form.take_first() {
        bytes.extend_from_slice(b"\r\n");
        let mut disposition = format!(
            "Content-Disposition: form-data; name=\"{}\"",
            escape_quoted(&field.name)
        );
        match &field.value {
            FieldValue::Text(text) => {
                disposition.push_str("\r\n\r\n");
                bytes.extend_from_slice(disposition.as_bytes());
                bytes.extend_from_slice(text.as_bytes());
            }
            FieldValue::File { source, .. } => {
                let filename = field.filename().unwrap_or_default();
                disposition.push_str(&format!(
                    "; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    escape_quoted(filename),
                    source.mime_type()
                ));
                bytes.extend_from_slice(disposition.as_bytes());
                bytes.extend_from_slice(&source.read_all()?);
            }
        }
        bytes.extend_from_slice(b"\r\n");
        bytes.extend_from_slice(delimiter.as_bytes());
    }

    bytes.extend_from_slice(b"--\r\n");
    Ok(bytes)
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
