// Keysync State
// Records describing what the framework currently believes is pressed

mod records;

pub use records::{KeyRecords, LockRecord, MappingRecord, PressingRecord};
