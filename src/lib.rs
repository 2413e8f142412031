pub mod messaging;
pub mod state;
pub mod test_util;
pub mod wire;
