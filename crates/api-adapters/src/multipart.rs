//! Reads the post form, which is multipart because of the optional image.

use axum::extract::Multipart;
use domains::Upload;
use services::PostInput;

use crate::error::ApiResult;

pub async fn read_post_form(mut multipart: Multipart) -> ApiResult<PostInput> {
    let mut input = PostInput::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "title" => input.title = field.text().await?,
            "category" => input.category = field.text().await?,
            "content" => input.content = field.text().await?,
            "tag" => input.tag = field.text().await?,
            "image" => {
                let file_name = field.file_name().filter(|n| !n.is_empty()).map(str::to_owned);
                let declared = field.content_type().map(str::to_owned);
                let data = field.bytes().await?;
                // An untouched file input still submits an empty part.
                if data.is_empty() && file_name.is_none() {
                    continue;
                }
                let content_type = declared
                    .or_else(|| {
                        file_name
                            .as_deref()
                            .and_then(|n| mime_guess::from_path(n).first_raw())
                            .map(str::to_owned)
                    })
                    .unwrap_or_else(|| "application/octet-stream".to_owned());
                input.image = Some(Upload {
                    file_name,
                    content_type,
                    data,
                });
            }
            _ => {
                tracing::debug!(field = %name, "ignoring unknown form field");
            }
        }
    }
    Ok(input)
}
