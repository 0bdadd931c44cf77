/// Post handlers - multipart upload, listing, read, update, delete
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures::{StreamExt, TryStreamExt};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;
use validator::Validate;
use video_core::{
    constants::{ALLOWED_EXTENSIONS, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH},
    file_extension, resolve_management_access, resolve_read_access,
};

use crate::error::{AppError, Result};
use crate::handlers::{with_author, with_authors};
use crate::middleware::CurrentUser;
use crate::models::{MessageResponse, NewPost, UpdatePostRequest};
use crate::state::AppState;

/// Text form fields are small; cap them well below the video limit
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Fields collected from the upload form
#[derive(Debug, Default)]
struct UploadForm {
    title: Option<String>,
    description: Option<String>,
    is_public: bool,
    video: Option<StoredVideo>,
}

#[derive(Debug)]
struct StoredVideo {
    storage_key: String,
    original_name: String,
    size: u64,
}

/// Form checkbox semantics: "true", "1", "yes" (any case) mean true
fn parse_form_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

fn validate_title(title: Option<&str>) -> Result<String> {
    let title = title.unwrap_or_default();
    let len = title.chars().count();
    if len == 0 || len > MAX_TITLE_LENGTH {
        return Err(AppError::Validation(format!(
            "Title must be between 1 and {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(title.to_string())
}

fn validate_description(description: Option<String>) -> Result<Option<String>> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LENGTH => Err(AppError::Validation(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        ))),
        Some(d) if d.is_empty() => Ok(None),
        other => Ok(other),
    }
}

fn allowed_extension(file_name: &str) -> Result<String> {
    file_extension(file_name)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| {
            AppError::UnsupportedFormat(format!(
                "Invalid file type. Allowed: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })
}

async fn read_text_field(field: &mut Field) -> Result<String> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;
        if buf.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(AppError::BadRequest("Form field too large".to_string()));
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf).map_err(|_| AppError::BadRequest("Form field is not valid UTF-8".to_string()))
}

/// Stream the video part into blob storage, enforcing the size limit.
///
/// `form.video` is filled in as soon as the blob exists so the caller can
/// remove it if anything later fails.
async fn store_video_field(state: &AppState, field: &mut Field, form: &mut UploadForm) -> Result<()> {
    if form.video.is_some() {
        return Err(AppError::BadRequest("Only one video file is allowed".to_string()));
    }

    let original_name = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .map(str::to_string)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::BadRequest("Video file name is required".to_string()))?;
    let extension = allowed_extension(&original_name)?;

    let storage_key = format!("{}{}", Uuid::new_v4(), extension);
    let mut writer = state.blobs.create(&storage_key).await?;
    form.video = Some(StoredVideo {
        storage_key: storage_key.clone(),
        original_name,
        size: 0,
    });

    let limit = state.settings.max_upload_bytes;
    let mut size: u64 = 0;
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;
        size += chunk.len() as u64;
        if size > limit {
            return Err(AppError::UploadTooLarge {
                limit_mb: limit / (1024 * 1024),
            });
        }
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
    }
    writer
        .shutdown()
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    if let Some(video) = form.video.as_mut() {
        video.size = size;
    }
    tracing::debug!(storage_key = %storage_key, size, "video stored");
    Ok(())
}

async fn read_upload_form(state: &AppState, payload: &mut Multipart, form: &mut UploadForm) -> Result<()> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = Some(read_text_field(&mut field).await?),
            "description" => form.description = Some(read_text_field(&mut field).await?),
            "is_public" => form.is_public = parse_form_bool(&read_text_field(&mut field).await?),
            "video" => store_video_field(state, &mut field, form).await?,
            _ => {
                // Drain unknown parts so the stream can advance
                while field.try_next().await.map_err(|e| AppError::BadRequest(e.to_string()))?.is_some() {}
            }
        }
    }
    Ok(())
}

/// Create a post from a multipart upload (`title`, `description`, `is_public`, `video`)
pub async fn create_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let mut form = UploadForm::default();

    let result = async {
        read_upload_form(&state, &mut payload, &mut form).await?;

        let title = validate_title(form.title.as_deref())?;
        let description = validate_description(form.description.take())?;
        let video = form
            .video
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("Video file is required".to_string()))?;

        let post = state
            .posts
            .create_post(NewPost {
                title,
                description,
                video_filename: video.storage_key.clone(),
                video_original_name: video.original_name.clone(),
                video_size: i64::try_from(video.size)
                    .map_err(|_| AppError::BadRequest("Video file too large".to_string()))?,
                author_id: user.0.id,
                is_public: form.is_public,
            })
            .await?;

        Ok::<_, AppError>(post)
    }
    .await;

    match result {
        Ok(post) => {
            tracing::info!(post_id = %post.id, author_id = %post.author_id, "post created");
            Ok(HttpResponse::Created().json(with_author(&state, post).await?))
        }
        Err(err) => {
            if let Some(video) = form.video {
                if let Err(e) = state.blobs.delete(&video.storage_key).await {
                    tracing::error!(storage_key = %video.storage_key, error = %e, "failed to remove partial upload");
                }
            }
            Err(err)
        }
    }
}

/// Posts the caller may read, newest first
pub async fn list_posts(state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse> {
    let posts = if user.0.is_admin {
        state.posts.list_all_posts().await?
    } else {
        state.posts.list_readable_posts(user.0.id).await?
    };
    Ok(HttpResponse::Ok().json(with_authors(&state, posts).await?))
}

pub async fn get_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    resolve_read_access(state.access.as_ref(), post_id, &user.identity()).await?;

    let post = state.posts.find_post(post_id).await?.ok_or(AppError::PostNotFound)?;
    Ok(HttpResponse::Ok().json(with_author(&state, post).await?))
}

pub async fn update_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<Uuid>,
    req: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    resolve_management_access(state.access.as_ref(), post_id, &user.identity()).await?;

    let req = req.into_inner();
    req.validate()?;

    let post = state
        .posts
        .update_post(post_id, req.into())
        .await?
        .ok_or(AppError::PostNotFound)?;

    tracing::info!(post_id = %post.id, user_id = %user.0.id, "post updated");
    Ok(HttpResponse::Ok().json(with_author(&state, post).await?))
}

/// Delete the blob, then the row (grants cascade)
pub async fn delete_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    let resource = resolve_management_access(state.access.as_ref(), post_id, &user.identity()).await?;

    state.blobs.delete(&resource.storage_key).await?;
    if !state.posts.delete_post(post_id).await? {
        return Err(AppError::PostNotFound);
    }

    tracing::info!(post_id = %post_id, user_id = %user.0.id, "post deleted");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted successfully")))
}
