use axum::extract::{multipart::MultipartError, Multipart};
use bytes::Bytes;
use serde::Deserialize;

use crate::forms::{is_blank, FormErrors, REQUIRED};
use crate::repo::models::Group;
use crate::storage::ext_from_mime;

/// What the post form shows in its inputs.
#[derive(Debug, Default, Clone)]
pub struct PostFormValues {
    pub text: String,
    pub group: Option<i64>,
}

#[derive(Debug)]
pub struct ImageUpload {
    pub content_type: String,
    pub body: Bytes,
}

/// Raw multipart body of the create/edit form.
#[derive(Debug, Default)]
pub struct PostSubmission {
    pub text: String,
    pub group: String,
    pub image: Option<ImageUpload>,
}

/// A submission that passed validation.
#[derive(Debug)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<ImageUpload>,
}

impl PostSubmission {
    pub async fn from_multipart(mut mp: Multipart) -> Result<Self, MultipartError> {
        let mut sub = PostSubmission::default();
        while let Some(field) = mp.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "text" => sub.text = field.text().await?,
                "group" => sub.group = field.text().await?,
                "image" => {
                    let named = field.file_name().is_some_and(|n| !n.is_empty());
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let body = field.bytes().await?;
                    // an untouched file input still sends an empty, nameless part
                    if named || !body.is_empty() {
                        sub.image = Some(ImageUpload { content_type, body });
                    }
                }
                _ => {}
            }
        }
        Ok(sub)
    }

    fn group_id(&self) -> Option<i64> {
        self.group.trim().parse::<i64>().ok()
    }

    pub fn values(&self) -> PostFormValues {
        PostFormValues {
            text: self.text.clone(),
            group: self.group_id(),
        }
    }

    pub fn validate(&self, groups: &[Group]) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if is_blank(&self.text) {
            errors.add("text", REQUIRED);
        }
        if !self.group.trim().is_empty() {
            let known = self
                .group_id()
                .is_some_and(|id| groups.iter().any(|g| g.id == id));
            if !known {
                errors.add(
                    "group",
                    "Select a valid choice. That choice is not one of the available choices.",
                );
            }
        }
        if let Some(image) = &self.image {
            if image.body.is_empty() {
                errors.add("image", "The submitted file is empty.");
            } else if ext_from_mime(&image.content_type).is_none() {
                errors.add(
                    "image",
                    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
                );
            }
        }
        errors.into_result()
    }

    /// Call only after [`PostSubmission::validate`] succeeded.
    pub fn into_clean(self) -> CleanPost {
        let group_id = self.group_id();
        CleanPost {
            text: self.text,
            group_id,
            image: self.image,
        }
    }
}

/// Body of `POST /posts/{id}/comment/`.
#[derive(Debug, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn is_valid(&self) -> bool {
        !is_blank(&self.text)
    }
}
