pub mod health;
pub mod menu;

pub use menu::PanelMenuRequest;
