use classbase_store::DocumentPath;
use classbase_store::path::{InvalidSegment, check_segment};
use validator::ValidationError;

/// User documents, keyed by identity uid.
pub const USERS: &str = "users";

/// Class documents. Their content is not interpreted by the API.
pub const CLASSES: &str = "classes";

/// `users/<uid>`. Fails for a uid that cannot name a single document.
pub fn user_path(uid: &str) -> Result<DocumentPath, InvalidSegment> {
    DocumentPath::try_new(USERS, uid)
}

pub fn class_path(class_id: &str) -> DocumentPath {
    DocumentPath::new(CLASSES, class_id)
}

/// `validator` rule for `classId`. Empty values pass; callers treat them as
/// absent.
pub fn validate_class_id(class_id: &str) -> Result<(), ValidationError> {
    if class_id.is_empty() {
        return Ok(());
    }
    check_segment(class_id)
        .map_err(|_| ValidationError::new("document_id").with_message("classId is invalid".into()))
}
