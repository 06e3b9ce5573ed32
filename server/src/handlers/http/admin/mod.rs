mod devices;
mod users;

pub use devices::{handle_create_device_admin, handle_list_all_devices};
pub use users::{handle_create_user, handle_delete_user, handle_list_users, handle_update_user};
