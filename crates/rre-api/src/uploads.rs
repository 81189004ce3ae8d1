use axum::extract::{Multipart, State};
use axum::Json;
use tracing::info;

use rre_types::api::{MediaRef, UploadResponse};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

const ALLOWED_DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;
const MAX_DOCUMENT_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadKind {
    Image,
    Document,
}

impl UploadKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(UploadKind::Image),
            "document" => Some(UploadKind::Document),
            _ => None,
        }
    }

    fn dir(self) -> &'static str {
        match self {
            UploadKind::Image => "image",
            UploadKind::Document => "document",
        }
    }

    fn allowed_types(self) -> &'static [&'static str] {
        match self {
            UploadKind::Image => ALLOWED_IMAGE_TYPES,
            UploadKind::Document => ALLOWED_DOCUMENT_TYPES,
        }
    }

    fn max_size(self) -> usize {
        match self {
            UploadKind::Image => MAX_IMAGE_SIZE,
            UploadKind::Document => MAX_DOCUMENT_SIZE,
        }
    }
}

struct PendingFile {
    name: String,
    mime: String,
    data: Vec<u8>,
}

/// POST /wall/upload — multipart `files[]` plus a `type` field. The whole
/// batch is validated before any byte reaches disk; one bad file rejects
/// the call with nothing written.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut kind: Option<UploadKind> = None;
    let mut files: Vec<PendingFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Formulaire invalide: {e}")))?
    {
        match field.name() {
            Some("type") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Formulaire invalide: {e}")))?;
                kind = Some(UploadKind::parse(&value).ok_or_else(|| {
                    ApiError::Validation("Type invalide: \"image\" ou \"document\" attendu".into())
                })?);
            }
            Some("files") => {
                let name = field.file_name().unwrap_or("fichier").to_string();
                let mime = field.content_type().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Lecture du fichier: {e}")))?
                    .to_vec();
                files.push(PendingFile { name, mime, data });
            }
            _ => {}
        }
    }

    let kind = kind.ok_or_else(|| {
        ApiError::Validation("Type invalide: \"image\" ou \"document\" attendu".into())
    })?;
    if files.is_empty() {
        return Err(ApiError::Validation("Aucun fichier fourni".into()));
    }

    validate_batch(kind, &files)?;

    let mut uploaded = Vec::with_capacity(files.len());
    for file in &files {
        let url = state
            .media
            .save(kind.dir(), &file.name, &file.data)
            .await
            .map_err(ApiError::Dependency)?;
        uploaded.push(MediaRef {
            name: file.name.clone(),
            url,
            size: file.data.len() as i64,
            mime_type: Some(file.mime.clone()),
        });
    }

    info!(count = uploaded.len(), kind = kind.dir(), "Files uploaded");
    Ok(Json(UploadResponse { files: uploaded }))
}

fn validate_batch(kind: UploadKind, files: &[PendingFile]) -> Result<(), ApiError> {
    for file in files {
        if !kind.allowed_types().contains(&file.mime.as_str()) {
            return Err(ApiError::Validation(format!(
                "Type de fichier non autorisé pour {}: {}",
                kind.dir(),
                file.mime
            )));
        }
        if file.data.len() > kind.max_size() {
            return Err(ApiError::Validation(format!(
                "Fichier trop volumineux ({} Mo maximum)",
                kind.max_size() / (1024 * 1024)
            )));
        }
    }
    Ok(())
}
