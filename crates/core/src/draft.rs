//! Upload draft: the in-progress state of a single upload.
//!
//! A draft exists from the moment a file is selected until the upload
//! succeeds or the user removes the file. It is never persisted. The
//! pipeline moves the draft through its statuses; on failure the draft keeps
//! its contents so the same upload can be retried by hand.

use serde::Serialize;

use crate::data_url::ImagePayload;
use crate::error::CoreError;
use crate::tags::{parse_tag_list, TagInput};

/// Where a draft is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    Idle,
    Uploading,
    Analyzing,
    Done,
    Failed,
}

impl DraftStatus {
    /// `true` while a pipeline run owns the draft.
    pub fn is_busy(self) -> bool {
        matches!(self, DraftStatus::Uploading | DraftStatus::Analyzing)
    }
}

/// User-editable upload state.
#[derive(Debug, Clone)]
pub struct UploadDraft {
    image: Option<ImagePayload>,
    /// Name as typed; may be blank.
    pub name: String,
    /// Comma-separated tags as typed.
    pub tags: String,
    status: DraftStatus,
    last_error: Option<String>,
}

impl Default for UploadDraft {
    fn default() -> Self {
        Self {
            image: None,
            name: String::new(),
            tags: String::new(),
            status: DraftStatus::Idle,
            last_error: None,
        }
    }
}

impl UploadDraft {
    /// Start a draft from a selected image.
    pub fn new(image: ImagePayload) -> Self {
        let mut draft = Self::default();
        draft.select_image(image);
        draft
    }

    /// Build a draft from the fields of an upload invocation.
    pub fn from_invocation(
        image_data_url: &str,
        name: Option<&str>,
        tags: Option<&TagInput>,
    ) -> Result<Self, CoreError> {
        let image = ImagePayload::from_data_url(image_data_url)?;
        let mut draft = Self::new(image);
        draft.name = name.unwrap_or_default().to_string();
        draft.tags = tags.map(TagInput::to_text).unwrap_or_default();
        Ok(draft)
    }

    /// Replace the selected image. Any previous failure is forgotten.
    pub fn select_image(&mut self, image: ImagePayload) {
        self.image = Some(image);
        self.status = DraftStatus::Idle;
        self.last_error = None;
    }

    pub fn image(&self) -> Option<&ImagePayload> {
        self.image.as_ref()
    }

    /// Data URL of the selected image, suitable for an `<img src>`.
    pub fn preview(&self) -> Option<String> {
        self.image.as_ref().map(ImagePayload::to_data_url)
    }

    pub fn status(&self) -> DraftStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Trimmed name, or `None` when blank.
    pub fn resolved_name(&self) -> Option<String> {
        let name = self.name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    /// Canonical tag list parsed from the text field.
    pub fn resolved_tags(&self) -> Vec<String> {
        parse_tag_list(&self.tags)
    }

    /// Check the draft can be submitted and return its image.
    pub fn validate(&self, require_name: bool) -> Result<&ImagePayload, CoreError> {
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| CoreError::Validation("Please select a file first.".into()))?;
        if require_name && self.resolved_name().is_none() {
            return Err(CoreError::Validation(
                "A name is required for this wallpaper.".into(),
            ));
        }
        Ok(image)
    }

    /// Claim the draft for a pipeline run.
    ///
    /// Rejects a second submission while one is already in flight.
    pub fn begin(&mut self) -> Result<(), CoreError> {
        if self.status.is_busy() {
            return Err(CoreError::Conflict(
                "An upload for this draft is already in progress".into(),
            ));
        }
        self.status = DraftStatus::Uploading;
        self.last_error = None;
        Ok(())
    }

    /// Move to the analysis step.
    pub fn mark_analyzing(&mut self) {
        self.status = DraftStatus::Analyzing;
    }

    /// Move back to uploading (used for the persisting step).
    pub fn mark_uploading(&mut self) {
        self.status = DraftStatus::Uploading;
    }

    /// Record a failed run; contents are kept for a manual retry.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = DraftStatus::Failed;
        self.last_error = Some(message.into());
    }

    /// Record a successful run and clear the draft contents.
    pub fn complete(&mut self) {
        self.image = None;
        self.name.clear();
        self.tags.clear();
        self.last_error = None;
        self.status = DraftStatus::Done;
    }

    /// Discard the draft (the user removed the file).
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const PNG_URL: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn draft() -> UploadDraft {
        UploadDraft::from_invocation(PNG_URL, None, None).unwrap()
    }

    #[test]
    fn new_draft_is_idle_with_preview() {
        let d = draft();
        assert_eq!(d.status(), DraftStatus::Idle);
        assert_eq!(d.preview().as_deref(), Some(PNG_URL));
    }

    #[test]
    fn invocation_fields_populate_draft() {
        let tags = TagInput::List(vec!["Nature".into(), "sunset".into()]);
        let d = UploadDraft::from_invocation(PNG_URL, Some(" Sunset "), Some(&tags)).unwrap();
        assert_eq!(d.resolved_name().as_deref(), Some("Sunset"));
        assert_eq!(d.resolved_tags(), vec!["nature", "sunset"]);
    }

    #[test]
    fn invalid_image_is_rejected() {
        assert_matches!(
            UploadDraft::from_invocation("not a data url", None, None),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn name_mandate_is_enforced() {
        let d = draft();
        assert_matches!(d.validate(true), Err(CoreError::Validation(_)));
        assert!(d.validate(false).is_ok());
    }

    #[test]
    fn empty_draft_cannot_be_submitted() {
        assert_matches!(
            UploadDraft::default().validate(false),
            Err(CoreError::Validation(msg)) if msg == "Please select a file first."
        );
    }

    #[test]
    fn begin_rejects_duplicate_submission() {
        let mut d = draft();
        d.begin().unwrap();
        assert!(d.status().is_busy());
        assert_matches!(d.begin(), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn failure_preserves_contents_for_retry() {
        let mut d = draft();
        d.name = "Sunset".into();
        d.begin().unwrap();
        d.fail("rate limited");
        assert_eq!(d.status(), DraftStatus::Failed);
        assert_eq!(d.last_error(), Some("rate limited"));
        assert!(d.image().is_some());
        assert_eq!(d.name, "Sunset");
        d.begin().unwrap();
        assert_eq!(d.last_error(), None);
    }

    #[test]
    fn completion_resets_contents() {
        let mut d = draft();
        d.name = "Sunset".into();
        d.tags = "nature".into();
        d.begin().unwrap();
        d.mark_analyzing();
        d.complete();
        assert_eq!(d.status(), DraftStatus::Done);
        assert!(d.image().is_none());
        assert!(d.name.is_empty());
        assert!(d.tags.is_empty());
    }

    #[test]
    fn clear_returns_to_idle() {
        let mut d = draft();
        d.fail("boom");
        d.clear();
        assert_eq!(d.status(), DraftStatus::Idle);
        assert!(d.preview().is_none());
    }
}
