pub mod alarms;
pub mod heatmap;
pub mod map;
pub mod objects;
