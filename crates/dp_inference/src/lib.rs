pub mod router;
pub mod speech;

pub use router::RouterClient;
pub use speech::KokoroClient;
