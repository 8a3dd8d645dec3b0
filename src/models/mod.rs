pub mod booking;
pub mod movie;
pub mod screening;
pub mod seat;
pub mod seat_map;

pub use booking::{Booking, NewBooking};
pub use movie::{Movie, NewMovie};
pub use screening::{NewScreening, Screening, Slot};
pub use seat::Seat;
pub use seat_map::{RoomLayout, SeatMap};
