// Adapters layer: concrete implementations of the domain ports (http, local files, clock, device).

pub mod clock;
pub mod demo_store;
pub mod locator;
pub mod memory;
pub mod nominatim;
pub mod supabase;

pub use clock::{ManualClock, SystemClock};
pub use demo_store::DemoLeadStore;
pub use locator::{FixedLocator, UnavailableLocator};
pub use memory::{FileMemory, InMemoryStore};
pub use nominatim::NominatimGeocoder;
pub use supabase::SupabaseLeadStore;
