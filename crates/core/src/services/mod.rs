pub mod analytics_service;
pub mod chart_service;
pub mod price_service;
pub mod window_service;
