use crate::errors::AppletflowError;
use aws_sdk_s3::primitives::ByteStream;

pub async fn upload_to_s3(
    s3_client: &aws_sdk_s3::Client,
    bytes: Vec<u8>,
    bucket: &str,
    key: &str,
    content_type: &str,
) -> Result<(), AppletflowError> {
    let put_object = s3_client
        .put_object()
        .key(key)
        .bucket(bucket)
        .content_type(content_type)
        .cache_control("no-store");
    let body = ByteStream::from(bytes);

    put_object
        .body(body)
        .send()
        .await
        .map_err(|e| AppletflowError::StorageError(format!("Failed to upload to S3: {:?}", e)))?;

    Ok(())
}

/// Object body and content type, `None` for a missing key.
pub async fn download_from_s3(
    s3_client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
) -> Result<Option<(Vec<u8>, Option<String>)>, AppletflowError> {
    let output = match s3_client.get_object().bucket(bucket).key(key).send().await {
        Ok(output) => output,
        Err(e) => {
            if e.as_service_error().map(|se| se.is_no_such_key()).unwrap_or(false) {
                return Ok(None);
            }

            return Err(AppletflowError::StorageError(format!(
                "Failed to download from S3: {:?}",
                e
            )));
        }
    };

    let content_type = output.content_type().map(str::to_string);
    let bytes = output
        .body
        .collect()
        .await
        .map_err(|e| AppletflowError::StorageError(format!("Failed to read S3 object body: {:?}", e)))?
        .into_bytes()
        .to_vec();

    Ok(Some((bytes, content_type)))
}
