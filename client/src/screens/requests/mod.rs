pub mod form;
pub mod view_model;

pub use form::EarlyRequestForm;
pub use view_model::RequestsViewModel;
