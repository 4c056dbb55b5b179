pub mod booking;
pub mod seat;
pub mod user;

pub use booking::{BookedSeatMap, BookingStatus, Occupant, Weekday};
pub use seat::Seat;
pub use user::{User, UserRole};
