/// Folder (relative to the storage root) for user profile images
pub const USER_UPLOAD_FOLDER: &str = "uploads/users";

/// Active user state code as stored in the database
pub const STATE_ACTIVE: &str = "A";

/// Inactive user state code as stored in the database
pub const STATE_INACTIVE: &str = "I";
