use thiserror::Error;

/// Rejections raised before a request ever leaves the client.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ValidationError {
    #[error("title is too short: {len} characters, at least {min} required")]
    TitleTooShort { len: usize, min: usize },
    #[error("title is too long: {len} characters, at most {max} allowed")]
    TitleTooLong { len: usize, max: usize },
}
