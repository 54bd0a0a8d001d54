pub mod about;
pub mod app;
pub mod detail_panel;
pub mod leads_panel;
pub mod logging;
pub mod opportunities_panel;
