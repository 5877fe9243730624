use std::collections::HashMap;

use crate::error::StoreError;

pub(crate) const SERVICE_NAME: &str = "digests-api";

async fn open() -> Result<oo7::Keyring, StoreError> {
    oo7::Keyring::new()
        .await
        .map_err(|e| StoreError::Keyring(format!("Failed to connect to keyring: {}", e)))
}

fn attributes(api_url: &str) -> HashMap<&str, &str> {
    let mut attrs = HashMap::new();
    attrs.insert("service", SERVICE_NAME);
    attrs.insert("api", api_url);
    attrs
}

/// Store the API bearer token for `api_url` in the system keyring.
pub async fn store_token(api_url: &str, token: &str) -> Result<(), StoreError> {
    let keyring = open().await?;
    keyring
        .create_item(
            &format!("Digests API ({})", api_url),
            &attributes(api_url),
            token.as_bytes(),
            true, // replace existing
        )
        .await
        .map_err(|e| StoreError::Keyring(format!("Failed to store token: {}", e)))?;
    log::info!("Stored API token for {}", api_url);
    Ok(())
}

/// Load the API bearer token for `api_url`, if one was stored.
pub async fn load_token(api_url: &str) -> Result<Option<String>, StoreError> {
    let keyring = open().await?;
    let items = keyring
        .search_items(&attributes(api_url))
        .await
        .map_err(|e| StoreError::Keyring(format!("Failed to search keyring: {}", e)))?;

    let Some(item) = items.first() else {
        return Ok(None);
    };
    let secret = item
        .secret()
        .await
        .map_err(|e| StoreError::Keyring(format!("Failed to read secret: {}", e)))?;
    let token = String::from_utf8(secret.to_vec())
        .map_err(|e| StoreError::Keyring(format!("Invalid UTF-8 in secret: {}", e)))?;
    Ok(Some(token).filter(|t| !t.is_empty()))
}

pub async fn delete_token(api_url: &str) -> Result<(), StoreError> {
    let keyring = open().await?;
    let items = keyring
        .search_items(&attributes(api_url))
        .await
        .map_err(|e| StoreError::Keyring(format!("Failed to search keyring: {}", e)))?;
    for item in items {
        item.delete()
            .await
            .map_err(|e| StoreError::Keyring(format!("Failed to delete token: {}", e)))?;
    }
    Ok(())
}
