mod admin;
mod contribution;
mod loan;
mod member;

pub use admin::*;
pub use contribution::*;
pub use loan::*;
pub use member::*;

pub(crate) fn default_true() -> bool {
    true
}
