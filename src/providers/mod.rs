pub mod sender;
pub mod utils;

pub use sender::{ProviderSender, TxSender};
pub use utils::*;
