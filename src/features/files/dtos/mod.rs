mod file_dto;

pub use file_dto::{is_profile_image_allowed, NewUpload, ALLOWED_IMAGE_TYPES, MAX_PROFILE_IMAGE_SIZE};
