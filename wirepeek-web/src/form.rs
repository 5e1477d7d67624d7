use std::collections::VecDeque;

use crate::{ByteSource, WebError};

#[derive(Debug, Clone)]
pub enum FieldValue {
    Text(String),
    File {
        source: ByteSource,
        filename: Option<String>,
    },
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ByteSource> for FieldValue {
    fn from(source: ByteSource) -> Self {
        Self::File {
            source,
            filename: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub value: FieldValue,
}

impl FormField {
    pub fn is_file(&self) -> bool {
        matches!(self.value, FieldValue::File { .. })
    }

    /// The filename sent for a file field: the override if one was given,
    /// otherwise the source's own basename.
    pub fn filename(&self) -> Option<&str> {
        match &self.value {
            FieldValue::Text(_) => None,
            FieldValue::File { source, filename } => {
                Some(filename.as_deref().unwrap_or(source.file_name()))
            }
        }
    }
}

/// An HTML-form-like set of fields, consumed front to back while a body is
/// serialized and restorable with [`FormPayload::reset`].
#[derive(Debug, Clone, Default)]
pub struct FormPayload {
    pending: VecDeque<FormField>,
    taken_front: Vec<FormField>,
    taken_back: VecDeque<FormField>,
    has_file: bool,
    multipart: bool,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty filename override on a file value counts as no override.
    pub fn append(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), WebError> {
        if name.is_empty() {
            return Err(WebError::InvalidField("field name is empty".to_string()));
        }
        let mut value = value.into();
        if let FieldValue::File { filename, .. } = &mut value {
            if filename.as_deref() == Some("") {
                *filename = None;
            }
            self.has_file = true;
        }
        self.pending.push_back(FormField {
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    /// Appends a file field with an optional filename override.
    pub fn append_file(
        &mut self,
        name: &str,
        source: ByteSource,
        filename: Option<&str>,
    ) -> Result<(), WebError> {
        let filename = filename.map(str::to_string);
        self.append(name, FieldValue::File { source, filename })
    }

    pub fn take_first(&mut self) -> Option<&FormField> {
        let field = self.pending.pop_front()?;
        self.taken_front.push(field);
        self.taken_front.last()
    }

    pub fn take_last(&mut self) -> Option<&FormField> {
        let field = self.pending.pop_back()?;
        self.taken_back.push_front(field);
        self.taken_back.front()
    }

    /// Puts every taken field back, restoring the original append order.
    pub fn reset(&mut self) {
        let mut restored: VecDeque<FormField> = self.taken_front.drain(..).collect();
        restored.append(&mut self.pending);
        restored.append(&mut self.taken_back);
        self.pending = restored;
    }

    pub fn pending(&self) -> impl Iterator<Item = &FormField> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn has_file(&self) -> bool {
        self.has_file
    }

    pub fn multipart(&self) -> bool {
        self.multipart
    }

    pub fn set_multipart(&mut self, multipart: bool) {
        self.multipart = multipart;
    }

    /// Whether this payload must be sent as multipart/form-data.
    pub fn needs_multipart(&self) -> bool {
        self.has_file || self.multipart
    }
}
