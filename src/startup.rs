use crate::{errors::AppError, repositories::OWNER_INDEX};
use aws_sdk_dynamodb::{
    error::SdkError as DynamoSdkError,
    types::{
        AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection,
        ProjectionType, ScalarAttributeType,
    },
    Client as DynamoDbClient,
};
use aws_sdk_s3::{
    error::SdkError as S3SdkError,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
    Client as S3Client,
};

fn string_attribute(name: &str) -> Result<AttributeDefinition, AppError> {
    Ok(AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()?)
}

fn hash_key(name: &str) -> Result<KeySchemaElement, AppError> {
    Ok(KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(KeyType::Hash)
        .build()?)
}

/// Creates the user meme table and its owner index if they don't exist.
pub async fn create_dynamodb_table_if_not_exists(client: &DynamoDbClient, table_name: &str) -> Result<(), AppError> {
    let owner_index = GlobalSecondaryIndex::builder()
        .index_name(OWNER_INDEX)
        .key_schema(hash_key("user_id")?)
        .projection(Projection::builder().projection_type(ProjectionType::All).build())
        .build()?;

    let result = client
        .create_table()
        .table_name(table_name)
        .attribute_definitions(string_attribute("meme_id")?)
        .attribute_definitions(string_attribute("user_id")?)
        .key_schema(hash_key("meme_id")?)
        .global_secondary_indexes(owner_index)
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await;

    match result {
        Ok(_) => {
            tracing::info!("Startup: Table '{}' created successfully or setup initiated.", table_name);
            Ok(())
        }
        Err(e) => {
            if let DynamoSdkError::ServiceError(service_err) = &e {
                if service_err.err().is_resource_in_use_exception() {
                    tracing::info!("Startup: Table '{}' already exists, no action needed.", table_name);
                    return Ok(());
                }
                tracing::error!("Startup: Service error creating DynamoDB table '{}': {:?}", table_name, service_err);
            }
            Err(AppError::InitError(format!(
                "Startup: failed to create DynamoDB table '{}': {}",
                table_name, e
            )))
        }
    }
}

/// Ensures the S3 bucket exists, creating it with the correct location constraint if needed.
pub async fn ensure_s3_bucket_exists(client: &S3Client, bucket_name: &str, region_str: &str) -> Result<(), AppError> {
    let mut request = client.create_bucket().bucket(bucket_name);
    if region_str != "us-east-1" {
        request = request.create_bucket_configuration(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region_str))
                .build(),
        );
    }

    match request.send().await {
        Ok(_) => {
            tracing::info!("Startup: S3 bucket '{}' created.", bucket_name);
            Ok(())
        }
        Err(sdk_err) => {
            if let S3SdkError::ServiceError(service_err) = &sdk_err {
                let code = service_err.err().meta().code();
                if code == Some("BucketAlreadyOwnedByYou") || code == Some("BucketAlreadyExists") {
                    tracing::info!("Startup: S3 bucket '{}' already exists.", bucket_name);
                    return Ok(());
                }
                tracing::error!("Startup: Service error creating S3 bucket '{}': {:?}", bucket_name, service_err);
            }
            Err(AppError::InitError(format!(
                "Startup: failed to create S3 bucket '{}': {}",
                bucket_name, sdk_err
            )))
        }
    }
}
