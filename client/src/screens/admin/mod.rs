pub mod crud;
pub mod requests;
pub mod roles;

pub use crud::AdminCrud;
pub use requests::{actions_for, AdminRequestsViewModel, RequestAction};
pub use roles::RoleForm;
