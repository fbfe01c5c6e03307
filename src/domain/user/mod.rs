//! User domain
//!
//! Account entity, registration validation and the user store trait.

mod entity;
mod repository;
mod validation;

pub use entity::{NewUser, User, UserId, UserRole, UserState};
pub use repository::UserRepository;
pub use validation::{validate_email, validate_password, validate_username, UserValidationError};

#[cfg(test)]
pub use repository::mock::MockUserRepository;
