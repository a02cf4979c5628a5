pub mod reading;
pub mod resource;
pub mod tariff;

pub use reading::{Reading, ReadingPair};
pub use resource::{ResourceId, TrackedResource};
pub use tariff::{Tariff, TariffSnapshot};
