pub mod apply;
pub mod locate;
pub mod text;

pub use apply::{apply, ApplyArgs};
pub use locate::{locate, LocateArgs};
pub use text::{text, TextArgs};
