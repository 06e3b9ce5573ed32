mod manage;
mod readings;

pub use manage::{
    handle_create_device, handle_delete_device, handle_list_devices, handle_update_device,
};
pub use readings::{handle_delete_reading, handle_get_readings};
