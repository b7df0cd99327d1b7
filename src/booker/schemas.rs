//! Wire schemas of the booking API.
//!
//! Each struct's `FIELDS` table is the authoritative internal-name to wire-name
//! mapping; the serde `rename` attributes must agree with it.

use crate::payload::{FieldMapping, Schema};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Credentials for `POST /auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl Schema for AuthRequest {
    const FIELDS: &'static [FieldMapping] = &[
        FieldMapping::new("username", "username"),
        FieldMapping::new("password", "password"),
    ];
}

/// Successful `POST /auth` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Session token, sent back as the `token` cookie on writes.
    pub token: String,
}

impl Schema for AuthResponse {
    const FIELDS: &'static [FieldMapping] = &[FieldMapping::new("token", "token")];
}

/// Stay dates, sent as ISO-8601 calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDates {
    /// Arrival date.
    pub checkin: NaiveDate,
    /// Departure date.
    pub checkout: NaiveDate,
}

impl Schema for BookingDates {
    const FIELDS: &'static [FieldMapping] = &[
        FieldMapping::new("checkin", "checkin"),
        FieldMapping::new("checkout", "checkout"),
    ];
}

/// A booking as created, read and updated through `/booking`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Guest first name.
    #[serde(rename = "firstname")]
    pub first_name: String,
    /// Guest last name.
    #[serde(rename = "lastname")]
    pub last_name: String,
    /// Price of the whole stay, in whole currency units.
    #[serde(rename = "totalprice")]
    pub total_price: i64,
    /// Whether the deposit was paid.
    #[serde(rename = "depositpaid")]
    pub deposit_paid: bool,
    /// Stay dates.
    #[serde(rename = "bookingdates")]
    pub booking_dates: BookingDates,
    /// Free-text requests such as "Breakfast". Sent as `null` when absent.
    #[serde(rename = "additionalneeds", default)]
    pub additional_needs: Option<String>,
}

impl Schema for Booking {
    const FIELDS: &'static [FieldMapping] = &[
        FieldMapping::new("first_name", "firstname"),
        FieldMapping::new("last_name", "lastname"),
        FieldMapping::new("total_price", "totalprice"),
        FieldMapping::new("deposit_paid", "depositpaid"),
        FieldMapping::new("booking_dates", "bookingdates"),
        FieldMapping::new("additional_needs", "additionalneeds"),
    ];
}

/// `POST /booking` response: the new id and the stored booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingResponse {
    /// Id assigned by the server.
    #[serde(rename = "bookingid")]
    pub booking_id: u64,
    /// The booking as stored.
    pub booking: Booking,
}

impl Schema for BookingResponse {
    const FIELDS: &'static [FieldMapping] = &[
        FieldMapping::new("booking_id", "bookingid"),
        FieldMapping::new("booking", "booking"),
    ];
}
