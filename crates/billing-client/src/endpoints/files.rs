//! File storage endpoints

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::UploadedFile;

pub async fn mine(client: &ApiClient) -> Result<Vec<UploadedFile>, ApiError> {
    client.get("/files/my").await
}

pub async fn upload(
    client: &ApiClient,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<UploadedFile, ApiError> {
    client.upload("/files", file_name, bytes).await
}

pub async fn download(client: &ApiClient, id: &str) -> Result<Vec<u8>, ApiError> {
    client.download(&format!("/files/{id}/download")).await
}

pub async fn get(client: &ApiClient, id: &str) -> Result<UploadedFile, ApiError> {
    client.get(&format!("/files/{id}")).await
}

pub async fn delete(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.delete(&format!("/files/{id}")).await
}
