pub mod balance;
pub mod calendar;
pub mod holiday;
pub mod me;
pub mod leave_request;
