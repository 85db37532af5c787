mod diagnostic;
mod layout;

pub use diagnostic::Diagnostic;
pub use layout::{Layout, Node, TargetName};
