//! Delivery address book.

use shopbag_core::types::AddressId;
use tracing::instrument;

use crate::BackendClient;
use crate::auth::Credentials;
use crate::error::BackendError;
use crate::types::{Address, AddressInput};

impl BackendClient {
    /// # Errors
    ///
    /// Returns `NotLoggedIn` without credentials.
    #[instrument(skip(self, credentials))]
    pub async fn addresses(&self, credentials: &Credentials) -> Result<Vec<Address>, BackendError> {
        let url = self.endpoint("/api/addresses")?;
        let body = self
            .send_authorized(credentials, |http| Ok(http.get(url.clone())))
            .await?;
        Self::parse(&body, "addresses")
    }

    /// The member's default address. An empty answer means none is set.
    ///
    /// # Errors
    ///
    /// Returns `NotLoggedIn` without credentials.
    #[instrument(skip(self, credentials))]
    pub async fn default_address(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Address>, BackendError> {
        let url = self.endpoint("/api/addresses/default")?;
        let result = self
            .send_authorized(credentials, |http| Ok(http.get(url.clone())))
            .await;
        let body = match result {
            Ok(body) => body,
            Err(BackendError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" || trimmed == "{}" {
            return Ok(None);
        }
        Self::parse(trimmed, "default address").map(Some)
    }

    /// # Errors
    ///
    /// Returns `Rejected` with the backend's message when the address is
    /// refused (for example when the address book is full).
    #[instrument(skip(self, credentials, input))]
    pub async fn create_address(
        &self,
        credentials: &Credentials,
        input: &AddressInput,
    ) -> Result<(), BackendError> {
        let url = self.endpoint("/api/addresses")?;
        self.send_authorized(credentials, |http| Ok(http.post(url.clone()).json(input)))
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NotFound` for unknown addresses.
    #[instrument(skip(self, credentials, input), fields(address_id = %id))]
    pub async fn update_address(
        &self,
        credentials: &Credentials,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("/api/addresses/{id}"))?;
        self.send_authorized(credentials, |http| Ok(http.patch(url.clone()).json(input)))
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NotFound` for unknown addresses.
    #[instrument(skip(self, credentials), fields(address_id = %id))]
    pub async fn delete_address(
        &self,
        credentials: &Credentials,
        id: AddressId,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("/api/addresses/{id}"))?;
        self.send_authorized(credentials, |http| Ok(http.delete(url.clone())))
            .await?;
        Ok(())
    }
}
