pub mod chart;
pub mod event;
pub mod instrument;
pub mod price;
pub mod settings;
pub mod summary;
pub mod visibility;
