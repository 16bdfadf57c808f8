//! Small record type shared by unit tests.

use modkit_errors::{AppError, ErrorKind};

use crate::doc;
use crate::error::DecodeError;
use crate::factory::{Factory, StorageRecord};
use crate::oid::ObjectId;
use crate::value::Document;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub seq: i64,
    pub text: String,
}

pub struct NoteRecord {
    id: Option<ObjectId>,
    seq: i64,
    text: String,
}

impl StorageRecord for NoteRecord {
    fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        Ok(Self {
            id: Some(doc.get_object_id("_id")?),
            seq: doc.get_i64("Seq")?,
            text: doc.get_str("Text")?.to_owned(),
        })
    }

    fn to_document(&self) -> Document {
        let mut doc = doc! { "Seq" => self.seq, "Text" => self.text.as_str() };
        if let Some(id) = self.id {
            doc.insert("_id", id);
        }
        doc
    }
}

pub struct NoteFactory;

impl Factory for NoteFactory {
    type Domain = Note;
    type Record = NoteRecord;

    fn to_domain(&self, record: NoteRecord) -> Result<Note, AppError> {
        if record.text == "poison" {
            return Err(AppError::internal(anyhow::anyhow!("poisoned note")));
        }
        Ok(Note {
            id: record.id.map(|id| id.to_hex()).unwrap_or_default(),
            seq: record.seq,
            text: record.text,
        })
    }

    fn to_database(&self, note: &Note) -> Result<NoteRecord, AppError> {
        let id = if note.id.is_empty() {
            None
        } else {
            Some(
                ObjectId::parse_str(&note.id)
                    .map_err(|e| AppError::repository(ErrorKind::InvalidArgument, e))?,
            )
        };
        Ok(NoteRecord {
            id,
            seq: note.seq,
            text: note.text.clone(),
        })
    }
}

pub fn note(seq: i64, text: &str) -> Note {
    Note {
        id: String::new(),
        seq,
        text: text.to_owned(),
    }
}

pub fn note_doc(seq: i64, text: &str) -> Document {
    doc! { "_id" => ObjectId::new(), "Seq" => seq, "Text" => text }
}
