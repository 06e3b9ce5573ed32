pub mod device;
pub mod json_error;
pub mod jwt;
pub mod login;
pub mod register;
pub mod role;
pub mod sensor;
pub mod server_config;
pub mod user;

pub use self::device::{AdminNewDeviceData, DeviceInfo, DeviceUpdateData, NewDeviceData};
pub use self::json_error::ErrorResponse;
pub use self::jwt::JwtClaims;
pub use self::login::{LoginData, LoginError, LoginResponse};
pub use self::register::{RegistrationData, RegistrationError, RegistrationResponse};
pub use self::role::Role;
pub use self::sensor::{ReadingData, ReadingInfo};
pub use self::user::{
    AdminNewUserData, AdminUserUpdateData, PasswordChangeData, ProfileUpdateData, UserInfo,
};
