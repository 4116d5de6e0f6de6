use aws_sdk_s3::{
    Client as S3Client,
    error::SdkError,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
};

/// Ensures the gallery bucket exists, creating it with the correct location
/// constraint if needed. "Already exists" outcomes are not errors.
pub async fn ensure_bucket_exists(
    client: &S3Client,
    bucket_name: &str,
    region_str: &str,
) -> anyhow::Result<()> {
    let bucket_config = if region_str != "us-east-1" {
        Some(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region_str))
                .build(),
        )
    } else {
        None
    };

    let mut request = client.create_bucket().bucket(bucket_name);
    if let Some(config) = bucket_config {
        request = request.create_bucket_configuration(config);
    }

    match request.send().await {
        Ok(_) => {
            tracing::info!("startup: bucket '{bucket_name}' created or already exists");
            Ok(())
        }
        Err(sdk_err) => {
            if let SdkError::ServiceError(service_err) = &sdk_err {
                let code = service_err.err().meta().code();
                if code == Some("BucketAlreadyOwnedByYou") || code == Some("BucketAlreadyExists") {
                    tracing::info!("startup: bucket '{bucket_name}' already exists");
                    return Ok(());
                }
            }
            tracing::error!("startup: failed to create bucket '{bucket_name}': {sdk_err}");
            Err(anyhow::Error::new(sdk_err)
                .context(format!("startup: failed to create bucket '{bucket_name}'")))
        }
    }
}
