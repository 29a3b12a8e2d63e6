pub mod campaign;
pub mod job_log;
pub mod listing;
pub mod listing_snapshot;
pub mod offer_record;
pub mod profit_record;
pub mod queue_entry;
pub mod status;
pub mod zombie_record;

pub use campaign::Campaign;
pub use job_log::JobLog;
pub use listing::Listing;
pub use listing_snapshot::ListingSnapshot;
pub use offer_record::OfferRecord;
pub use profit_record::ProfitRecord;
pub use queue_entry::QueueEntry;
pub use status::{
    CampaignStatus, CampaignType, JobStatus, ListingStatus, OfferAction, OfferStatus,
    QueueStatus, StrSource, ZombieAction,
};
pub use zombie_record::ZombieRecord;
