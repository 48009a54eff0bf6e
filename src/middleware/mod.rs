/// Middleware module
///
/// Custom middleware wrapped around parts of the route table.

mod hit_counter;

pub use hit_counter::HitCounter;
