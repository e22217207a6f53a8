//! Data Transfer Objects - request/response bodies of the API.
//!
//! Request bodies derive [`Validate`]; required fields are `Option`s marked
//! `required` so a missing field is reported per field instead of failing
//! deserialization as a whole.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        required(message = "This field is required."),
        email(message = "Enter a valid email address.")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 255, message = "Username must be 1-255 characters.")
    )]
    pub username: Option<String>,

    #[validate(
        required(message = "This field is required."),
        length(min = 6, message = "Ensure this field has at least 6 characters.")
    )]
    pub password: Option<String>,

    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub first_name: Option<String>,

    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub last_name: Option<String>,

    pub date_of_birth: Option<NaiveDate>,

    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(required(message = "This field is required."))]
    pub email: Option<String>,

    #[validate(required(message = "This field is required."))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(
        required(message = "This field is required."),
        email(message = "Enter a valid email address.")
    )]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(
        required(message = "This field is required."),
        length(min = 6, message = "Ensure this field has at least 6 characters.")
    )]
    pub password: Option<String>,
}

/// `email` and `username` are accepted only so that changing them can be
/// refused with a field error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,

    pub username: Option<String>,

    #[validate(length(min = 6, message = "Ensure this field has at least 6 characters."))]
    pub password: Option<String>,

    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub first_name: Option<String>,

    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub last_name: Option<String>,

    pub date_of_birth: Option<NaiveDate>,

    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub profile_image: Option<String>,
    pub points: i64,
}

/// Plain confirmation body for actions with nothing else to return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailResponse {
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

// ============================================================================
// Posts & tags
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagInput {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 240, message = "Title must be 1-240 characters.")
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "This field is required."),
        length(max = 255, message = "Ensure this field has no more than 255 characters.")
    )]
    pub description: Option<String>,

    #[validate(required(message = "This field is required."))]
    pub body: Option<String>,

    pub cover_image: Option<String>,

    #[serde(default)]
    pub tags: Vec<TagInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 240, message = "Title must be 1-240 characters."))]
    pub title: Option<String>,

    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub description: Option<String>,

    pub body: Option<String>,

    pub cover_image: Option<String>,

    /// Present means "replace the post's tags with these".
    pub tags: Option<Vec<TagInput>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostListQuery {
    /// `{title,comments,date,update}-{asc,desc}`
    pub sort: Option<String>,
    /// Comma-separated tag ids.
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTagRequest {
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 255, message = "Name must be 1-255 characters.")
    )]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagResponse {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummaryResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub author: Uuid,
    pub description: String,
    pub tags: Vec<TagResponse>,
    pub cover_image: Option<String>,
    pub number_of_comments: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub summary: PostSummaryResponse,
    pub body: String,
    pub images: Vec<ImageResponse>,
    pub comments: Vec<CommentResponse>,
}

// ============================================================================
// Comments & votes
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(required(message = "This field is required."))]
    pub post: Option<Uuid>,

    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 1000, message = "Comment must be 1-1000 characters.")
    )]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 1000, message = "Comment must be 1-1000 characters.")
    )]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post: Uuid,
    pub author: Uuid,
    pub text: String,
    pub number_of_upvotes: u64,
    pub number_of_downvotes: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_vote_type(value: &str) -> Result<(), ValidationError> {
    match value {
        "upvote" | "downvote" => Ok(()),
        _ => Err(ValidationError::new("choice")
            .with_message(format!("\"{value}\" is not a valid choice.").into())),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct VoteRequest {
    #[validate(required(message = "This field is required."))]
    pub comment: Option<Uuid>,

    #[validate(
        required(message = "This field is required."),
        custom(function = "validate_vote_type")
    )]
    pub vote_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub comment: Uuid,
    pub vote_type: String,
    pub created_at: DateTime<Utc>,
}

/// What a vote submission did: `created`, `replaced` or `removed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteActionResponse {
    pub action: String,
    pub vote: VoteResponse,
}

// ============================================================================
// Images
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateImageRequest {
    #[validate(required(message = "This field is required."))]
    pub post: Option<Uuid>,

    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 100, message = "Title must be 1-100 characters.")
    )]
    pub title: Option<String>,

    /// Client-side file name; only its extension is kept.
    #[validate(required(message = "This field is required."))]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateImageRequest {
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 100, message = "Title must be 1-100 characters.")
    )]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    pub id: Uuid,
    pub post: Uuid,
    pub title: String,
    pub image: String,
}

/// Value of a field that passed `required` validation.
pub fn required<T>(value: Option<T>) -> T
where
    T: Default,
{
    value.unwrap_or_default()
}
