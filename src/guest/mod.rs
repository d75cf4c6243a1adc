//! Everything that runs on behalf of an anonymous guest: the message
//! quota, the storage it persists to and the temporary conversation.
pub mod clock;
pub mod conversation;
pub mod fingerprint;
pub mod quota;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use conversation::{ConversationData, GuestConversation, GuestMessage};
pub use fingerprint::{FingerprintSignals, FingerprintSource, StaticFingerprint};
pub use quota::{GuestQuotaRecord, GuestQuotaTracker, QuotaConfig, QuotaStatus};
pub use storage::{FileStorage, GuestStores, MemoryStorage, StoragePort};
