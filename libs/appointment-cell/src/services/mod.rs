pub mod booking;
pub mod listing;
pub mod serial;

pub use booking::AppointmentBookingService;
pub use listing::AppointmentListingService;
pub use serial::SerialReportService;
