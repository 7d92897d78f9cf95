/// An uploaded blob handed from a handler to the file store
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub data: Vec<u8>,
    pub original_name: String,
    pub content_type: String,
}

/// Allowed MIME types for profile images
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif"];

/// Maximum profile image size in bytes (2MB)
pub const MAX_PROFILE_IMAGE_SIZE: usize = 2 * 1024 * 1024;

/// Check if a MIME type is an allowed profile image type
pub fn is_profile_image_allowed(content_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&content_type)
}
