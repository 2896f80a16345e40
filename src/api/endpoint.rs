pub type Endpoint = str;

pub const TOKEN: &Endpoint = "/account/v1.0/token";
pub const CURRENT_DATA: &Endpoint = "/device/v1.0/currentData";
