//! Data models for Gatherly

pub mod booking;
pub mod event;
pub mod user;

pub use booking::{Booking, BookingState, NewBooking, PaymentState};
pub use event::{CreateEventRequest, Event, EventStatus, FeeStatus, NewEvent};
pub use user::{AuthUser, UserRole};
