pub mod auto_relister;
pub mod kickstarter;
pub mod offer_sniper;
pub mod photo_shuffler;
pub mod purgatory;
pub mod repricer;
pub mod resurrector;
pub mod smart_queue;
pub mod store_pulse;
pub mod zombie_killer;

pub use auto_relister::AutoRelister;
pub use kickstarter::Kickstarter;
pub use offer_sniper::OfferSniper;
pub use photo_shuffler::PhotoShuffler;
pub use purgatory::Purgatory;
pub use repricer::{Repricer, RepriceRunResult};
pub use resurrector::Resurrector;
pub use smart_queue::SmartQueue;
pub use store_pulse::StorePulse;
pub use zombie_killer::{ZombieKiller, ZombieScanResult};
