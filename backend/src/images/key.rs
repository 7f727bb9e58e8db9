use uuid::Uuid;

/// Object store key for an image: `uploads/<username>/<image_id>.<extension>`
///
/// Unique per record because the record id is.
#[must_use]
pub fn storage_key(username: &str, image_id: &Uuid, extension: &str) -> String {
    format!("uploads/{username}/{image_id}.{extension}")
}
