// Not every utils is used in every test, so we allow dead code
#![allow(unused_imports, dead_code)]

pub use object_transfer::test_utils::FakeStore;
mod test_setup;
pub use test_setup::*;
mod utils;
pub use utils::*;
