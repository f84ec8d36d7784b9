pub mod error;
pub mod evidence;
pub mod outcome;
pub mod snapshots;
pub mod traits;
pub mod types;

pub use error::*;
pub use evidence::EvidenceAccumulator;
pub use outcome::*;
pub use snapshots::*;
pub use traits::*;
pub use types::*;
