use super::schemas::{AuthRequest, AuthResponse, Booking, BookingResponse};
use crate::{metadata::RequestMetadata, ApiClient, Payload, Result};
use http::Method;

/// Token endpoint.
pub const AUTH_ENDPOINT: &str = "/auth";

/// Booking collection endpoint.
pub const BOOKING_ENDPOINT: &str = "/booking";

/// Client for the Restful-Booker API.
///
/// # Examples
///
/// ```no_run
/// use booker_client::booker::{Booking, BookingDates, BookerClient};
/// use chrono::NaiveDate;
///
/// # async fn example() -> Result<(), booker_client::Error> {
/// let client = BookerClient::new("https://restful-booker.herokuapp.com")?;
/// let token = client.create_auth_token("admin", "password123").await?;
///
/// let created = client
///     .create_booking(&Booking {
///         first_name: "Alex".to_string(),
///         last_name: "Tester".to_string(),
///         total_price: 150,
///         deposit_paid: true,
///         booking_dates: BookingDates {
///             checkin: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///             checkout: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
///         },
///         additional_needs: None,
///     })
///     .await?;
///
/// client.delete_booking(created.booking_id, &token).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BookerClient {
    api: ApiClient,
}

impl BookerClient {
    /// Creates a client with default transport settings.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let api = ApiClient::builder()
            .base_url(base_url)?
            .default_header("Accept", "application/json")?
            .build()?;
        Ok(Self { api })
    }

    /// Wraps an already configured facade.
    ///
    /// The API answers some writes with plain text unless `Accept: application/json`
    /// is set, so configure that header on `api`.
    pub fn from_api(api: ApiClient) -> Self {
        Self { api }
    }

    /// The underlying facade, for raw requests.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Releases the underlying connection pool handle.
    pub fn close(self) {
        self.api.close();
    }

    /// Authenticates and returns the session token.
    pub async fn create_auth_token(&self, username: &str, password: &str) -> Result<String> {
        let payload = AuthRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self.api.post(AUTH_ENDPOINT, &payload).await?;
        let auth: AuthResponse = response.json()?;
        Ok(auth.token)
    }

    /// Creates a booking.
    pub async fn create_booking(&self, booking: &Booking) -> Result<BookingResponse> {
        self.api.post(BOOKING_ENDPOINT, booking).await?.json()
    }

    /// Fetches a booking by id.
    pub async fn get_booking(&self, booking_id: u64) -> Result<Booking> {
        self.api.get(booking_path(booking_id)).await?.json()
    }

    /// Replaces a booking. Requires a token from [`create_auth_token`](Self::create_auth_token).
    pub async fn update_booking(
        &self,
        booking_id: u64,
        booking: &Booking,
        token: &str,
    ) -> Result<Booking> {
        let metadata = RequestMetadata::new(Method::PUT, booking_path(booking_id))
            .with_header("Cookie", token_cookie(token))?;

        self.api
            .call(metadata, Some(Payload::from(booking)))
            .await?
            .json()
    }

    /// Deletes a booking. The API answers `201 Created` with a plain-text body.
    pub async fn delete_booking(&self, booking_id: u64, token: &str) -> Result<()> {
        let metadata = RequestMetadata::new(Method::DELETE, booking_path(booking_id))
            .with_header("Cookie", token_cookie(token))?;

        self.api.call(metadata, None).await?;
        Ok(())
    }
}

fn booking_path(booking_id: u64) -> String {
    format!("{}/{}", BOOKING_ENDPOINT, booking_id)
}

fn token_cookie(token: &str) -> String {
    format!("token={}", token)
}
