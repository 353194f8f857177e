mod event;
mod result;
mod swim_time;
mod swimmer;
mod swimmer_name;

pub use event::{Course, Event, EventKey, Stroke};
pub use result::{NewResult, SwimResult};
pub use swim_time::SwimTime;
pub use swimmer::Swimmer;
pub use swimmer_name::SwimmerName;
