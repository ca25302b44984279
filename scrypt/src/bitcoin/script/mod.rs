mod base;
mod builder;
mod byte_seq;
mod op;

pub use base::*;
pub use builder::*;
pub use byte_seq::*;
pub use op::*;
