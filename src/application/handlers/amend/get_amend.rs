//! GetAmendHandler / ListTextAmendsHandler - Query handlers for amendments.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::amend::{Amend, AmendError};
use crate::domain::foundation::{AmendId, TextId};
use crate::domain::patch::{Edit, PatchConflict, PatchEngine};
use crate::ports::{AmendRepository, TextRepository};

/// Query to get an amendment by ID.
#[derive(Debug, Clone)]
pub struct GetAmendQuery {
    pub amend_id: AmendId,
}

/// An amendment with a preview of its effect on the current body.
#[derive(Debug, Clone, Serialize)]
pub struct AmendView {
    pub amend: Amend,
    /// Diff the patch would produce on the current body, or the conflict
    /// that would close it. `None` once the amendment is closed.
    pub preview: Option<Result<Vec<Edit>, PatchConflict>>,
}

/// Handler for retrieving an amendment.
pub struct GetAmendHandler {
    texts: Arc<dyn TextRepository>,
    amends: Arc<dyn AmendRepository>,
    engine: PatchEngine,
}

impl GetAmendHandler {
    pub fn new(
        texts: Arc<dyn TextRepository>,
        amends: Arc<dyn AmendRepository>,
        engine: PatchEngine,
    ) -> Self {
        Self {
            texts,
            amends,
            engine,
        }
    }

    pub async fn handle(&self, query: GetAmendQuery) -> Result<AmendView, AmendError> {
        let amend = self
            .amends
            .find_by_id(&query.amend_id)
            .await?
            .ok_or(AmendError::NotFound(query.amend_id))?;

        if amend.is_closed() {
            return Ok(AmendView {
                amend,
                preview: None,
            });
        }

        let text = self
            .texts
            .find_by_id(amend.text_id())
            .await?
            .ok_or(AmendError::TextNotFound(*amend.text_id()))?;
        let preview = self.engine.preview(text.body(), amend.patch());
        Ok(AmendView {
            amend,
            preview: Some(preview),
        })
    }
}

/// Query to list a text's amendments.
#[derive(Debug, Clone)]
pub struct ListTextAmendsQuery {
    pub text_id: TextId,
    /// Only amendments still open for votes.
    pub open_only: bool,
}

/// Handler for listing a text's amendments, oldest first.
pub struct ListTextAmendsHandler {
    amends: Arc<dyn AmendRepository>,
}

impl ListTextAmendsHandler {
    pub fn new(amends: Arc<dyn AmendRepository>) -> Self {
        Self { amends }
    }

    pub async fn handle(&self, query: ListTextAmendsQuery) -> Result<Vec<Amend>, AmendError> {
        let amends = if query.open_only {
            self.amends.find_open_by_text(&query.text_id).await?
        } else {
            self.amends.find_by_text(&query.text_id).await?
        };
        Ok(amends)
    }
}
