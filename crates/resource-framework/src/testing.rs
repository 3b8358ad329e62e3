//! Minimal resource shared by the unit tests.

use crate::entity::{RecordId, ResourceEntity};
use crate::error::ValidationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub code: String,
    pub slug: String,
    pub author: String,
    pub rank: u32,
    pub secret: String,
}

#[derive(Debug, Default)]
pub struct NoteCreate {
    pub slug: String,
    pub author: String,
    pub rank: u32,
}

#[derive(Debug, Default)]
pub struct NoteUpdate {
    pub slug: Option<String>,
    pub rank: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteView {
    pub code: String,
    pub slug: String,
    pub author: String,
    pub rank: u32,
}

#[async_trait]
impl ResourceEntity for Note {
    const NAME: &'static str = "notes";
    type Create = NoteCreate;
    type Update = NoteUpdate;
    type View = NoteView;
    type Context = ();

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn code(&self) -> &str {
        &self.code
    }

    fn author(&self) -> Option<&str> {
        Some(&self.author)
    }

    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        vec![("slug", self.slug.clone())]
    }

    fn from_create_params(params: NoteCreate) -> Result<Self, ValidationError> {
        if params.slug.is_empty() {
            return Err(ValidationError::new("slug", "must not be empty"));
        }
        Ok(Self {
            id: None,
            code: format!("note-{}", params.slug),
            slug: params.slug,
            author: params.author,
            rank: params.rank,
            secret: "hidden".into(),
        })
    }

    fn apply_update(&mut self, update: NoteUpdate) -> Result<bool, ValidationError> {
        let mut changed = false;
        if let Some(slug) = update.slug {
            self.slug = slug;
            changed = true;
        }
        if let Some(rank) = update.rank {
            self.rank = rank;
            changed = true;
        }
        Ok(changed)
    }

    fn to_view(&self) -> NoteView {
        NoteView {
            code: self.code.clone(),
            slug: self.slug.clone(),
            author: self.author.clone(),
            rank: self.rank,
        }
    }
}
