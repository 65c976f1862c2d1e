pub mod cart;
pub mod users;

pub use cart::CartService;
pub use users::UserService;
