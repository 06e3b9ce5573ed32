mod account;
mod get;
mod update;

pub use account::{handle_change_password, handle_delete_account};
pub use get::handle_get_profile;
pub use update::handle_update_profile;
