//! Restful-Booker endpoints and schemas.
//!
//! A thin layer over [`ApiClient`](crate::ApiClient): it knows the endpoint paths,
//! the auth cookie convention and the JSON shapes, and nothing else. Transport
//! behavior, retries and error mapping all come from the facade.

mod client;
mod schemas;

pub use client::{BookerClient, AUTH_ENDPOINT, BOOKING_ENDPOINT};
pub use schemas::{AuthRequest, AuthResponse, Booking, BookingDates, BookingResponse};
