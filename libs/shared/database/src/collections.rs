//! Collection (table) names.

pub const DOCTORS: &str = "doctors";
pub const SERVICES: &str = "services";
pub const CART_ITEMS: &str = "cart_items";
pub const DOCTOR_REGISTRATIONS: &str = "doctor_registrations";
pub const APPOINTMENTS: &str = "appointments";
pub const CHAT_MESSAGES: &str = "chat_messages";
pub const USERS: &str = "users";
