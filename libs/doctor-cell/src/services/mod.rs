pub mod catalog;
pub mod directory;
pub mod registration;

pub use catalog::CatalogService;
pub use directory::DoctorDirectory;
pub use registration::RegistrationService;
